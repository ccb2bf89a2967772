//! Message signing and verification.
//!
//! The signed-identifier layer never looks inside tokens; it hands payload
//! bytes to a [`MessageVerifier`] and gets an opaque ASCII token back.

use std::fmt;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Separator between the encoded payload and its MAC.
const TOKEN_SEPARATOR: &str = "--";

/// Reasons a token failed verification.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VerifyError {
    /// The token does not have the expected shape.
    #[error("malformed token: {0}")]
    Malformed(String),

    /// The signature does not match the payload.
    #[error("signature mismatch")]
    InvalidSignature,
}

/// Signs payloads into tokens and verifies tokens back into payloads.
pub trait MessageVerifier: Send + Sync + fmt::Debug {
    /// Produces an authenticated, ASCII-safe token for `payload`.
    fn generate(&self, payload: &[u8]) -> String;

    /// Checks a token's authenticity and returns the payload it carries.
    fn verify(&self, token: &str) -> Result<Vec<u8>, VerifyError>;
}

/// HMAC-SHA256 verifier.
///
/// Tokens look like `base64(payload)--hex(mac)`.
#[derive(Clone)]
pub struct HmacVerifier {
    secret: Vec<u8>,
}

impl HmacVerifier {
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        Self {
            secret: secret.as_ref().to_vec(),
        }
    }

    fn mac(&self) -> HmacSha256 {
        match HmacSha256::new_from_slice(&self.secret) {
            Ok(mac) => mac,
            Err(_) => unreachable!("HMAC key length is unrestricted"),
        }
    }
}

impl fmt::Debug for HmacVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HmacVerifier")
            .field("secret", &"[redacted]")
            .finish()
    }
}

impl MessageVerifier for HmacVerifier {
    fn generate(&self, payload: &[u8]) -> String {
        let data = STANDARD.encode(payload);
        let mut mac = self.mac();
        mac.update(data.as_bytes());
        let digest = hex::encode(mac.finalize().into_bytes());
        format!("{data}{TOKEN_SEPARATOR}{digest}")
    }

    fn verify(&self, token: &str) -> Result<Vec<u8>, VerifyError> {
        let Some((data, digest)) = token.rsplit_once(TOKEN_SEPARATOR) else {
            return Err(VerifyError::Malformed("missing signature separator".into()));
        };

        if data.is_empty() || digest.is_empty() {
            return Err(VerifyError::Malformed("empty payload or signature".into()));
        }

        let digest = hex::decode(digest)
            .map_err(|e| VerifyError::Malformed(format!("signature is not hex: {e}")))?;

        let mut mac = self.mac();
        mac.update(data.as_bytes());
        mac.verify_slice(&digest)
            .map_err(|_| VerifyError::InvalidSignature)?;

        STANDARD
            .decode(data)
            .map_err(|e| VerifyError::Malformed(format!("payload is not base64: {e}")))
    }
}
