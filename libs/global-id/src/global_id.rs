//! The global identifier value type.

use std::borrow::Cow;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use std::sync::Arc;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};

use crate::config;
use crate::error::{GidError, UriError};
use crate::identification::Identifiable;
use crate::locator::{self, LocateOptions};
use crate::model::{ModelClass, Record};
use crate::signed::SignedGlobalId;
use crate::uri::{GidUri, Params};

/// Options for [`GlobalId::create`].
#[derive(Debug, Clone, Default)]
pub struct GidOptions {
    app: Option<String>,
    params: Params,
}

impl GidOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the process-wide default app. An empty name is rejected at
    /// creation time.
    pub fn app(mut self, app: impl Into<String>) -> Self {
        self.app = Some(app.into());
        self
    }

    /// Adds a query parameter to the created URI.
    pub fn param(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.params.insert(key, value);
        self
    }
}

/// A `gid://app/Model/id` reference to an application object.
///
/// Equality and hashing are defined over the canonical text form.
#[derive(Debug, Clone)]
pub struct GlobalId {
    uri: GidUri,
}

impl GlobalId {
    /// Builds a global id for `model`.
    ///
    /// The app comes from `options` when set, otherwise from the process-wide
    /// configuration. Having neither is an error.
    pub fn create<T: Identifiable + ?Sized>(model: &T, options: &GidOptions) -> Result<Self, GidError> {
        let app = match &options.app {
            Some(app) => app.clone(),
            None => config::current()
                .app()
                .map(str::to_string)
                .ok_or(GidError::InvalidApp {
                    name: String::new(),
                    reason: "no app given and no default app configured",
                })?,
        };

        let uri = GidUri::build(
            &app,
            model.model_name().into_owned(),
            model.id(),
            options.params.clone(),
        )?;

        Ok(Self { uri })
    }

    /// Parses either the `gid://` text form or the transport-safe param form.
    ///
    /// Returns `None` for anything that isn't a valid identifier.
    pub fn parse(text: &str) -> Option<Self> {
        if let Ok(uri) = GidUri::parse(text) {
            return Some(Self { uri });
        }

        let encoded = text.trim_end_matches('=');
        let bytes = URL_SAFE_NO_PAD.decode(encoded).ok()?;
        let decoded = String::from_utf8(bytes).ok()?;
        GidUri::parse(&decoded).ok().map(Self::from)
    }

    /// Returns the URL- and filename-safe encoding of the text form.
    pub fn to_param(&self) -> String {
        URL_SAFE_NO_PAD.encode(self.to_string())
    }

    pub fn uri(&self) -> &GidUri {
        &self.uri
    }

    pub fn app(&self) -> &str {
        self.uri.app()
    }

    pub fn model_name(&self) -> &str {
        self.uri.model_name()
    }

    pub fn model_id(&self) -> &str {
        self.uri.model_id()
    }

    pub fn params(&self) -> &Params {
        self.uri.params()
    }

    /// Looks up the registered model type in the process-wide locator.
    pub fn model_class(&self) -> Option<Arc<ModelClass>> {
        locator::global().models().get(self.model_name())
    }

    /// Resolves this identifier through the process-wide locator.
    pub fn find(&self, options: &LocateOptions) -> Option<Record> {
        locator::global().locate(self, options)
    }
}

impl From<GidUri> for GlobalId {
    fn from(uri: GidUri) -> Self {
        Self { uri }
    }
}

impl fmt::Display for GlobalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.uri, f)
    }
}

impl FromStr for GlobalId {
    type Err = UriError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        GidUri::parse(s).map(Self::from)
    }
}

impl PartialEq for GlobalId {
    fn eq(&self, other: &Self) -> bool {
        self.to_string() == other.to_string()
    }
}

impl Eq for GlobalId {}

impl PartialEq<SignedGlobalId> for GlobalId {
    fn eq(&self, other: &SignedGlobalId) -> bool {
        self == other.global_id()
    }
}

impl Hash for GlobalId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.to_string().hash(state);
    }
}

impl serde::Serialize for GlobalId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> serde::Deserialize<'de> for GlobalId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Anything the locator can turn into a [`GlobalId`].
pub trait Locatable {
    /// Returns the identifier, or `None` if the input isn't one.
    fn as_global_id(&self) -> Option<Cow<'_, GlobalId>>;
}

impl Locatable for GlobalId {
    fn as_global_id(&self) -> Option<Cow<'_, GlobalId>> {
        Some(Cow::Borrowed(self))
    }
}

impl Locatable for SignedGlobalId {
    fn as_global_id(&self) -> Option<Cow<'_, GlobalId>> {
        Some(Cow::Borrowed(self.global_id()))
    }
}

impl Locatable for str {
    fn as_global_id(&self) -> Option<Cow<'_, GlobalId>> {
        GlobalId::parse(self).map(Cow::Owned)
    }
}

impl Locatable for String {
    fn as_global_id(&self) -> Option<Cow<'_, GlobalId>> {
        self.as_str().as_global_id()
    }
}

impl<T: Locatable + ?Sized> Locatable for &T {
    fn as_global_id(&self) -> Option<Cow<'_, GlobalId>> {
        (**self).as_global_id()
    }
}
