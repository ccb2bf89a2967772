//! Signed global identifiers.
//!
//! A signed id wraps a [`GlobalId`] together with a purpose and an optional
//! absolute expiration, and serializes the three through a
//! [`MessageVerifier`]. Parsing a token that is forged, expired, or signed
//! for another purpose yields `None`; only a missing verifier is an error.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::config::{self, GlobalIdConfig};
use crate::error::GidError;
use crate::global_id::{GidOptions, GlobalId};
use crate::identification::Identifiable;
use crate::locator::{self, LocateOptions};
use crate::model::{ModelClass, Record};
use crate::uri::{GidUri, Params};
use crate::verifier::MessageVerifier;

/// Purpose used when none is given at signing or verification time.
pub const DEFAULT_PURPOSE: &str = "default";

fn default_purpose() -> String {
    DEFAULT_PURPOSE.to_string()
}

fn purpose_or_default<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_else(default_purpose))
}

/// The signed message body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedPayload {
    /// Canonical `gid://` text.
    pub gid: String,

    /// Absent or null reads as [`DEFAULT_PURPOSE`].
    #[serde(default = "default_purpose", deserialize_with = "purpose_or_default")]
    pub purpose: String,

    /// Absolute deadline, compared against verification time.
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

/// Options for creating a signed id.
#[derive(Debug, Clone, Default)]
pub struct SignOptions {
    gid: GidOptions,
    purpose: Option<String>,
    expires_in: Option<Option<Duration>>,
    expires_at: Option<Option<DateTime<Utc>>>,
    verifier: Option<Arc<dyn MessageVerifier>>,
    now: Option<DateTime<Utc>>,
}

impl SignOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the default app of the wrapped identifier.
    pub fn app(mut self, app: impl Into<String>) -> Self {
        self.gid = self.gid.app(app);
        self
    }

    /// Adds a query parameter to the wrapped identifier.
    pub fn param(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.gid = self.gid.param(key, value);
        self
    }

    /// Scopes the token to a purpose (the `for:` option).
    pub fn purpose(mut self, purpose: impl Into<String>) -> Self {
        self.purpose = Some(purpose.into());
        self
    }

    /// Relative expiration, converted to an absolute deadline at signing.
    ///
    /// Passing `None` disables expiration even when a default is configured.
    pub fn expires_in(mut self, expires_in: impl Into<Option<Duration>>) -> Self {
        self.expires_in = Some(expires_in.into());
        self
    }

    /// Absolute expiration. Wins over `expires_in` when both are set.
    ///
    /// Passing `None` disables expiration even when a default is configured.
    pub fn expires_at(mut self, expires_at: impl Into<Option<DateTime<Utc>>>) -> Self {
        self.expires_at = Some(expires_at.into());
        self
    }

    pub fn verifier(mut self, verifier: Arc<dyn MessageVerifier>) -> Self {
        self.verifier = Some(verifier);
        self
    }

    /// Signs as if the current time were `now`.
    pub fn at(mut self, now: DateTime<Utc>) -> Self {
        self.now = Some(now);
        self
    }

    fn resolve_expiration(
        &self,
        config: &GlobalIdConfig,
        now: DateTime<Utc>,
    ) -> Result<Option<DateTime<Utc>>, GidError> {
        if let Some(expires_at) = self.expires_at {
            return Ok(expires_at);
        }

        let expires_in = match self.expires_in {
            Some(expires_in) => expires_in,
            None => config.expires_in(),
        };

        expires_in
            .map(|d| {
                now.checked_add_signed(d)
                    .ok_or_else(|| GidError::ExpirationOutOfRange(format!("{now} + {d}")))
            })
            .transpose()
    }
}

/// Options for verifying a signed token.
#[derive(Debug, Clone, Default)]
pub struct ParseOptions {
    purpose: Option<String>,
    verifier: Option<Arc<dyn MessageVerifier>>,
    now: Option<DateTime<Utc>>,
}

impl ParseOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// The purpose the token must have been signed for. Defaults to
    /// [`DEFAULT_PURPOSE`].
    pub fn purpose(mut self, purpose: impl Into<String>) -> Self {
        self.purpose = Some(purpose.into());
        self
    }

    pub fn verifier(mut self, verifier: Arc<dyn MessageVerifier>) -> Self {
        self.verifier = Some(verifier);
        self
    }

    /// Verifies as if the current time were `now`.
    pub fn at(mut self, now: DateTime<Utc>) -> Self {
        self.now = Some(now);
        self
    }

    pub(crate) fn from_parts(
        purpose: Option<String>,
        verifier: Option<Arc<dyn MessageVerifier>>,
        now: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            purpose,
            verifier,
            now,
        }
    }
}

fn resolve_verifier(
    explicit: Option<&Arc<dyn MessageVerifier>>,
) -> Result<Arc<dyn MessageVerifier>, GidError> {
    match explicit {
        Some(verifier) => Ok(Arc::clone(verifier)),
        None => config::current()
            .verifier()
            .cloned()
            .ok_or(GidError::MissingVerifier),
    }
}

/// A tamper-evident, optionally purpose-scoped and expiring global id.
#[derive(Debug, Clone)]
pub struct SignedGlobalId {
    gid: GlobalId,
    purpose: String,
    expires_at: Option<DateTime<Utc>>,
    token: String,
}

impl SignedGlobalId {
    /// Builds and signs an identifier for `model`.
    pub fn create<T: Identifiable + ?Sized>(model: &T, options: &SignOptions) -> Result<Self, GidError> {
        let gid = GlobalId::create(model, &options.gid)?;
        Self::new(gid, options)
    }

    /// Signs an existing identifier.
    ///
    /// App and params in `options` are ignored; they only apply to
    /// [`SignedGlobalId::create`].
    pub fn new(gid: GlobalId, options: &SignOptions) -> Result<Self, GidError> {
        let verifier = resolve_verifier(options.verifier.as_ref())?;
        let config = config::current();
        let now = options.now.unwrap_or_else(Utc::now);

        let payload = SignedPayload {
            gid: gid.to_string(),
            purpose: options.purpose.clone().unwrap_or_else(default_purpose),
            expires_at: options.resolve_expiration(&config, now)?,
        };

        let token = verifier.generate(&serde_json::to_vec(&payload)?);

        Ok(Self {
            gid,
            purpose: payload.purpose,
            expires_at: payload.expires_at,
            token,
        })
    }

    /// Signs the identifier described by `uri`.
    pub fn from_uri(uri: GidUri, options: &SignOptions) -> Result<Self, GidError> {
        Self::new(GlobalId::from(uri), options)
    }

    /// Verifies a token.
    ///
    /// Returns `Ok(None)` when the token is forged, malformed, expired, or was
    /// signed for a different purpose. Fails only when no verifier is
    /// available at all.
    pub fn parse(token: &str, options: &ParseOptions) -> Result<Option<Self>, GidError> {
        let verifier = resolve_verifier(options.verifier.as_ref())?;

        let bytes = match verifier.verify(token) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::debug!(error = %e, "rejected signed global id");
                return Ok(None);
            }
        };

        let payload: SignedPayload = match serde_json::from_slice(&bytes) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::debug!(error = %e, "signed global id carries an unreadable payload");
                return Ok(None);
            }
        };

        let Ok(uri) = GidUri::parse(&payload.gid) else {
            tracing::debug!(gid = %payload.gid, "signed global id carries an invalid gid");
            return Ok(None);
        };

        let sgid = Self {
            gid: GlobalId::from(uri),
            purpose: payload.purpose,
            expires_at: payload.expires_at,
            token: token.to_string(),
        };

        Ok(sgid.verified(options))
    }

    /// Returns a copy of `self` if it is unexpired and was signed for the
    /// purpose named in `options`.
    pub fn verified(&self, options: &ParseOptions) -> Option<Self> {
        let now = options.now.unwrap_or_else(Utc::now);

        if self.is_expired_at(now) {
            tracing::debug!(gid = %self.gid, expires_at = ?self.expires_at, "signed global id expired");
            return None;
        }

        let expected = options.purpose.as_deref().unwrap_or(DEFAULT_PURPOSE);
        if self.purpose != expected {
            tracing::debug!(
                gid = %self.gid,
                purpose = %self.purpose,
                expected,
                "signed global id purpose mismatch"
            );
            return None;
        }

        Some(self.clone())
    }

    /// Returns true if the deadline is at or before `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|deadline| deadline <= now)
    }

    pub fn global_id(&self) -> &GlobalId {
        &self.gid
    }

    pub fn purpose(&self) -> &str {
        &self.purpose
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    pub fn app(&self) -> &str {
        self.gid.app()
    }

    pub fn model_name(&self) -> &str {
        self.gid.model_name()
    }

    pub fn model_id(&self) -> &str {
        self.gid.model_id()
    }

    pub fn params(&self) -> &Params {
        self.gid.params()
    }

    pub fn model_class(&self) -> Option<Arc<ModelClass>> {
        self.gid.model_class()
    }

    /// The signed token.
    pub fn to_text(&self) -> &str {
        &self.token
    }

    /// Same as [`SignedGlobalId::to_text`].
    pub fn to_param(&self) -> &str {
        &self.token
    }

    /// Resolves the wrapped identifier through the process-wide locator.
    pub fn find(&self, options: &LocateOptions) -> Option<Record> {
        locator::global().locate(&self.gid, options)
    }
}

impl fmt::Display for SignedGlobalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.token)
    }
}

impl PartialEq for SignedGlobalId {
    fn eq(&self, other: &Self) -> bool {
        self.gid == other.gid && self.purpose == other.purpose && self.expires_at == other.expires_at
    }
}

impl Eq for SignedGlobalId {}

impl PartialEq<GlobalId> for SignedGlobalId {
    fn eq(&self, other: &GlobalId) -> bool {
        &self.gid == other
    }
}

impl Hash for SignedGlobalId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.gid.hash(state);
        self.purpose.hash(state);
        self.expires_at.hash(state);
    }
}

impl Serialize for SignedGlobalId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.token)
    }
}

/// Anything the locator can verify into a [`SignedGlobalId`].
pub trait SignedLocatable {
    /// Verifies the input, returning `Ok(None)` on any trust failure.
    fn verify_signed(&self, options: &ParseOptions) -> Result<Option<SignedGlobalId>, GidError>;
}

impl SignedLocatable for SignedGlobalId {
    fn verify_signed(&self, options: &ParseOptions) -> Result<Option<SignedGlobalId>, GidError> {
        Ok(self.verified(options))
    }
}

impl SignedLocatable for str {
    fn verify_signed(&self, options: &ParseOptions) -> Result<Option<SignedGlobalId>, GidError> {
        SignedGlobalId::parse(self, options)
    }
}

impl SignedLocatable for String {
    fn verify_signed(&self, options: &ParseOptions) -> Result<Option<SignedGlobalId>, GidError> {
        SignedGlobalId::parse(self, options)
    }
}

impl<T: SignedLocatable + ?Sized> SignedLocatable for &T {
    fn verify_signed(&self, options: &ParseOptions) -> Result<Option<SignedGlobalId>, GidError> {
        (**self).verify_signed(options)
    }
}
