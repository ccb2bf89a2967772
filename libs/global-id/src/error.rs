//! Error types for identifier parsing, signing, and resolution.

use thiserror::Error;

/// Grammar violations raised by the strict `gid://` codec.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UriError {
    /// The scheme is not exactly `gid` (or there is no scheme at all).
    #[error("bad URI '{uri}': expected scheme 'gid'")]
    BadScheme { uri: String },

    /// A required component is missing, empty, or malformed.
    #[error("invalid component in '{uri}': {reason}")]
    InvalidComponent { uri: String, reason: String },
}

impl UriError {
    pub(crate) fn bad_scheme(uri: &str) -> Self {
        UriError::BadScheme {
            uri: uri.to_string(),
        }
    }

    pub(crate) fn invalid(uri: &str, reason: impl Into<String>) -> Self {
        UriError::InvalidComponent {
            uri: uri.to_string(),
            reason: reason.into(),
        }
    }

    /// Returns true if the scheme was wrong or missing.
    pub fn is_bad_scheme(&self) -> bool {
        matches!(self, UriError::BadScheme { .. })
    }
}

/// Errors surfaced by the identifier, locator, and signed-token APIs.
///
/// Untrusted input (malformed text, forged or expired tokens) never produces
/// one of these from the lenient `parse`/`locate` paths; those return `None`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GidError {
    /// Strict parsing or building failed.
    #[error(transparent)]
    Uri(#[from] UriError),

    /// The app name is empty or contains characters outside `[A-Za-z0-9-]`.
    #[error("invalid app name '{name}': {reason}")]
    InvalidApp { name: String, reason: &'static str },

    /// A locator was registered under a name that can never match an app.
    #[error("invalid locator name '{0}': app names cannot contain underscores")]
    InvalidLocatorName(String),

    /// A relative expiration overflows the representable time range.
    #[error("expiration out of range: {0}")]
    ExpirationOutOfRange(String),

    /// No verifier was passed and no process-wide default is configured.
    #[error("no verifier configured: pass one explicitly or install a default")]
    MissingVerifier,

    /// A batch lookup could not find one of the requested records.
    #[error("couldn't find {model_name} with id '{model_id}'")]
    MissingRecord { model_name: String, model_id: String },

    /// The signed payload could not be serialized.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl GidError {
    /// Returns true for configuration and programmer errors that callers are
    /// expected to fix rather than handle (bad app names, missing verifier).
    pub fn is_invalid_argument(&self) -> bool {
        matches!(
            self,
            GidError::InvalidApp { .. }
                | GidError::InvalidLocatorName(_)
                | GidError::ExpirationOutOfRange(_)
                | GidError::MissingVerifier
        )
    }

    /// Returns true if a batch lookup missed a record.
    pub fn is_missing_record(&self) -> bool {
        matches!(self, GidError::MissingRecord { .. })
    }
}

impl From<serde_json::Error> for GidError {
    fn from(err: serde_json::Error) -> Self {
        GidError::Serialization(err.to_string())
    }
}
