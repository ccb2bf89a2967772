//! The capability an application object needs to be referenced by a global id.

use std::borrow::Cow;

use crate::error::GidError;
use crate::global_id::{GidOptions, GlobalId};
use crate::signed::{SignOptions, SignedGlobalId};

/// An application object that can be identified by type name and id.
///
/// ```ignore
/// #[derive(Debug)]
/// struct Person { id: String }
///
/// impl Identifiable for Person {
///     fn model_name(&self) -> Cow<'_, str> { Cow::Borrowed("Person") }
///     fn id(&self) -> String { self.id.clone() }
/// }
///
/// let gid = Person { id: "5".into() }.to_gid()?;
/// assert_eq!(gid.to_string(), "gid://bcx/Person/5");
/// ```
pub trait Identifiable {
    /// The type name used as the URI's model segment, e.g. `Person::Child`.
    fn model_name(&self) -> Cow<'_, str>;

    /// The object's id in string form.
    fn id(&self) -> String;

    /// Builds a global id using the process-wide default app.
    fn to_global_id(&self) -> Result<GlobalId, GidError> {
        GlobalId::create(self, &GidOptions::default())
    }

    fn to_gid(&self) -> Result<GlobalId, GidError> {
        self.to_global_id()
    }

    /// Builds a signed global id.
    fn to_signed_global_id(&self, options: &SignOptions) -> Result<SignedGlobalId, GidError> {
        SignedGlobalId::create(self, options)
    }

    fn to_sgid(&self, options: &SignOptions) -> Result<SignedGlobalId, GidError> {
        self.to_signed_global_id(options)
    }
}
