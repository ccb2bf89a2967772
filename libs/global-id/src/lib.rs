//! # global-id
//!
//! Reversible, app-scoped references to application objects.
//!
//! ## Design Principles
//!
//! - An identifier names an app, a model type, and an id; nothing else is stored
//! - Every identifier has a canonical text form with strict parsing
//! - Lenient parsing (`GlobalId::parse`) returns `None` instead of failing
//! - Signed identifiers are tamper-evident and may be scoped to a purpose and deadline
//! - Untrusted input never resolves to a record
//!
//! ## Format
//!
//! `gid://{app}/{model_name}/{model_id}[?{key}={value}&...]`
//!
//! Examples:
//! - `gid://bcx/Person/5`
//! - `gid://bcx/Person::Child/4`
//! - `gid://bcx/Person/5?hello=world`
//!
//! The param form is the unpadded URL-safe base64 of the text form:
//! `Z2lkOi8vYmN4L1BlcnNvbi81`.

pub mod config;
mod error;
mod global_id;
mod identification;
pub mod locator;
mod model;
mod signed;
mod uri;
mod verifier;

pub use config::GlobalIdConfig;
pub use error::{GidError, UriError};
pub use global_id::{GidOptions, GlobalId, Locatable};
pub use identification::Identifiable;
pub use locator::{DefaultResolver, LocateOptions, Locator, Resolver};
pub use model::{capability, Finder, Matcher, Model, ModelClass, ModelRegistry, Record, TypeFilter};
pub use signed::{
    ParseOptions, SignOptions, SignedGlobalId, SignedLocatable, SignedPayload, DEFAULT_PURPOSE,
};
pub use uri::{validate_app, GidUri, Params, SCHEME};
pub use verifier::{HmacVerifier, MessageVerifier, VerifyError};
