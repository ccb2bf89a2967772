//! The `gid://` URI variant.
//!
//! Grammar: `gid://<app>/<model_name>/<model_id>[?<query>]`
//!
//! - `app` is the authority and must match `[A-Za-z0-9-]+`
//! - the path holds exactly two non-empty segments; `model_name` is opaque
//!   and may contain namespace separators such as `Outer::Inner`
//! - query parameters are ordered, single-valued, and last-write-wins

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use crate::error::{GidError, UriError};

/// The only scheme accepted by [`GidUri::parse`].
pub const SCHEME: &str = "gid";

/// Validates an app name, returning it unchanged on success.
///
/// App names are non-empty and limited to ASCII alphanumerics and hyphens.
/// Validation is case-preserving.
pub fn validate_app(name: &str) -> Result<&str, GidError> {
    if name.is_empty() {
        return Err(GidError::InvalidApp {
            name: name.to_string(),
            reason: "app name cannot be blank",
        });
    }

    if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
        return Err(GidError::InvalidApp {
            name: name.to_string(),
            reason: "only alphanumeric characters and hyphens are allowed",
        });
    }

    Ok(name)
}

/// Ordered query parameters.
///
/// Keys are case-sensitive. Inserting an existing key replaces its value in
/// place, so repeated keys resolve to the last value written.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Params {
    entries: Vec<(String, String)>,
}

impl Params {
    /// Creates an empty parameter list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a parameter, returning the previous value if the key existed.
    ///
    /// Values are stored in their string form, so numbers become text.
    pub fn insert(&mut self, key: impl Into<String>, value: impl ToString) -> Option<String> {
        let key = key.into();
        let value = value.to_string();

        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => Some(std::mem::replace(existing, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    /// Collapses a multi-valued parameter to its last value.
    ///
    /// An empty value list leaves the parameters untouched.
    pub fn insert_multi<I, V>(&mut self, key: impl Into<String>, values: I) -> Option<String>
    where
        I: IntoIterator<Item = V>,
        V: ToString,
    {
        let last = values.into_iter().last()?;
        self.insert(key, last)
    }

    /// Gets a parameter value.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Removes a parameter.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        let index = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(index).1)
    }

    /// Check if a key exists.
    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over key-value pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K, V> FromIterator<(K, V)> for Params
where
    K: Into<String>,
    V: ToString,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Self::new();
        params.extend(iter);
        params
    }
}

impl<K, V> Extend<(K, V)> for Params
where
    K: Into<String>,
    V: ToString,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

/// A parsed and validated `gid://` URI.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GidUri {
    app: String,
    model_name: String,
    model_id: String,
    params: Params,
}

impl GidUri {
    /// Parses a `gid://` URI, failing on any grammar violation.
    pub fn parse(text: &str) -> Result<Self, UriError> {
        let Some((scheme, rest)) = text.split_once(':') else {
            return Err(UriError::bad_scheme(text));
        };

        if scheme != SCHEME {
            return Err(UriError::bad_scheme(text));
        }

        let Some(rest) = rest.strip_prefix("//") else {
            return Err(UriError::invalid(text, "missing app"));
        };

        if rest.contains('#') {
            return Err(UriError::invalid(text, "fragments are not allowed"));
        }

        let (hier, query) = match rest.split_once('?') {
            Some((hier, query)) => (hier, Some(query)),
            None => (rest, None),
        };

        let (authority, path) = match hier.find('/') {
            Some(index) => hier.split_at(index),
            None => (hier, ""),
        };

        if authority.is_empty() {
            return Err(UriError::invalid(text, "missing app"));
        }

        validate_app(authority).map_err(|e| UriError::invalid(text, e.to_string()))?;

        let path = path.strip_prefix('/').unwrap_or(path);
        let segments: Vec<&str> = path.split('/').collect();

        let [model_name, model_id] = segments.as_slice() else {
            return Err(UriError::invalid(
                text,
                format!(
                    "expected a model name and a model id, found {} path segment(s)",
                    segments.iter().filter(|s| !s.is_empty()).count()
                ),
            ));
        };

        if model_name.is_empty() {
            return Err(UriError::invalid(text, "missing model name"));
        }

        if model_id.is_empty() {
            return Err(UriError::invalid(text, "missing model id"));
        }

        let params = match query {
            Some(query) => parse_query(text, query)?,
            None => Params::new(),
        };

        Ok(Self {
            app: authority.to_string(),
            model_name: decode_segment(text, model_name)?,
            model_id: decode_segment(text, model_id)?,
            params,
        })
    }

    /// Builds a URI from its components.
    ///
    /// Each component is validated on its own, so components passed in the
    /// wrong order still produce a (different) URI when they happen to be
    /// individually valid.
    pub fn build(
        app: &str,
        model_name: impl Into<String>,
        model_id: impl Into<String>,
        params: Params,
    ) -> Result<Self, GidError> {
        let model_name = model_name.into();
        let model_id = model_id.into();
        let rendered = format!("{SCHEME}://{app}/{model_name}/{model_id}");

        validate_app(app)?;

        if model_name.is_empty() {
            return Err(UriError::invalid(&rendered, "missing model name").into());
        }

        if model_id.is_empty() {
            return Err(UriError::invalid(&rendered, "missing model id").into());
        }

        if params.contains_key("") {
            return Err(UriError::invalid(&rendered, "empty param key").into());
        }

        Ok(Self {
            app: app.to_string(),
            model_name,
            model_id,
            params,
        })
    }

    pub fn app(&self) -> &str {
        &self.app
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    /// Returns the query parameters.
    ///
    /// Callers that need to change them must clone; the URI itself never
    /// changes after construction.
    pub fn params(&self) -> &Params {
        &self.params
    }
}

impl fmt::Display for GidUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}://{}/{}/{}",
            SCHEME,
            self.app,
            encode_segment(&self.model_name),
            encode_segment(&self.model_id)
        )?;

        for (i, (key, value)) in self.params.iter().enumerate() {
            let sep = if i == 0 { '?' } else { '&' };
            write!(
                f,
                "{}{}={}",
                sep,
                urlencoding::encode(key),
                urlencoding::encode(value)
            )?;
        }

        Ok(())
    }
}

impl FromStr for GidUri {
    type Err = UriError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn parse_query(uri: &str, query: &str) -> Result<Params, UriError> {
    let mut params = Params::new();

    for pair in query.split('&').filter(|p| !p.is_empty()) {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        let key = decode_query_component(uri, key)?;
        if key.is_empty() {
            continue;
        }
        params.insert(key, decode_query_component(uri, value)?);
    }

    Ok(params)
}

fn decode_query_component(uri: &str, raw: &str) -> Result<String, UriError> {
    let raw = raw.replace('+', " ");
    urlencoding::decode(&raw)
        .map(Cow::into_owned)
        .map_err(|e| UriError::invalid(uri, format!("invalid query escape: {e}")))
}

fn decode_segment(uri: &str, raw: &str) -> Result<String, UriError> {
    urlencoding::decode(raw)
        .map(Cow::into_owned)
        .map_err(|e| UriError::invalid(uri, format!("invalid path escape: {e}")))
}

/// Percent-encodes the bytes of a path segment that are not RFC 3986 `pchar`s.
fn encode_segment(segment: &str) -> Cow<'_, str> {
    fn is_pchar(b: u8) -> bool {
        b.is_ascii_alphanumeric() || b"-._~!$&'()*+,;=:@".contains(&b)
    }

    if segment.bytes().all(is_pchar) {
        return Cow::Borrowed(segment);
    }

    let mut out = String::with_capacity(segment.len() + 8);
    for b in segment.bytes() {
        if is_pchar(b) {
            out.push(char::from(b));
        } else {
            out.push_str(&format!("%{b:02X}"));
        }
    }
    Cow::Owned(out)
}
