//! Model types known to the default resolver.
//!
//! Applications register each resolvable type under the same name its
//! objects report from [`Identifiable::model_name`]. A registration carries a
//! [`Finder`], an optional parent type, and the capabilities the type
//! implements. Type filters are evaluated against this registry.

use std::any::Any;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use crate::identification::Identifiable;

/// Well-known capability names.
pub mod capability {
    /// Implemented by every registered model type.
    pub const IDENTIFICATION: &str = "GlobalId::Identification";
}

/// A located application object.
pub type Record = Arc<dyn Model>;

/// An identifiable object that can be handed back from a lookup.
pub trait Model: Identifiable + Any + Send + Sync + fmt::Debug {
    fn as_any(&self) -> &dyn Any;
}

impl<T> Model for T
where
    T: Identifiable + Any + Send + Sync + fmt::Debug,
{
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Looks up records of one model type by id.
pub trait Finder: Send + Sync {
    fn find(&self, id: &str) -> Option<Record>;

    /// Fetches many records at once, omitting ids that don't exist.
    fn find_all(&self, ids: &[&str]) -> Vec<Record> {
        ids.iter().filter_map(|id| self.find(id)).collect()
    }
}

impl<F> Finder for F
where
    F: Fn(&str) -> Option<Record> + Send + Sync,
{
    fn find(&self, id: &str) -> Option<Record> {
        self(id)
    }
}

/// A registered model type.
#[derive(Clone)]
pub struct ModelClass {
    name: String,
    parent: Option<String>,
    capabilities: Vec<String>,
    finder: Arc<dyn Finder>,
}

impl ModelClass {
    pub fn new(name: impl Into<String>, finder: impl Finder + 'static) -> Self {
        Self {
            name: name.into(),
            parent: None,
            capabilities: Vec::new(),
            finder: Arc::new(finder),
        }
    }

    /// Declares this type a subtype of `parent`.
    pub fn inherits(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    /// Declares a capability this type implements.
    pub fn implements(mut self, capability: impl Into<String>) -> Self {
        self.capabilities.push(capability.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    pub fn capabilities(&self) -> &[String] {
        &self.capabilities
    }

    pub fn finder(&self) -> &dyn Finder {
        self.finder.as_ref()
    }
}

impl fmt::Debug for ModelClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelClass")
            .field("name", &self.name)
            .field("parent", &self.parent)
            .field("capabilities", &self.capabilities)
            .finish_non_exhaustive()
    }
}

/// Maps model names to their registered types.
#[derive(Debug, Default)]
pub struct ModelRegistry {
    classes: RwLock<HashMap<String, Arc<ModelClass>>>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a model type, replacing any previous registration under the
    /// same name.
    pub fn register(&self, class: ModelClass) -> Option<Arc<ModelClass>> {
        tracing::debug!(model = class.name(), parent = class.parent(), "registering model type");
        self.classes
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(class.name.clone(), Arc::new(class))
    }

    pub fn get(&self, name: &str) -> Option<Arc<ModelClass>> {
        self.classes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    /// Returns the type itself followed by its registered ancestors.
    ///
    /// The walk stops at the first unregistered parent or at a cycle.
    pub fn ancestors(&self, name: &str) -> Vec<Arc<ModelClass>> {
        let classes = self.classes.read().unwrap_or_else(PoisonError::into_inner);
        let mut chain = Vec::new();
        let mut seen = HashSet::new();
        let mut next = Some(name);

        while let Some(current) = next {
            if !seen.insert(current) {
                break;
            }
            let Some(class) = classes.get(current) else {
                break;
            };
            chain.push(Arc::clone(class));
            next = class.parent.as_deref();
        }

        chain
    }

    /// Returns true if `name` is `type_name` or one of its subtypes.
    pub fn is_a(&self, name: &str, type_name: &str) -> bool {
        self.ancestors(name).iter().any(|c| c.name == type_name)
    }

    /// Returns true if `name` or an ancestor implements `capability`.
    pub fn implements(&self, name: &str, capability: &str) -> bool {
        let chain = self.ancestors(name);
        if chain.is_empty() {
            return false;
        }
        capability == capability::IDENTIFICATION
            || chain
                .iter()
                .any(|c| c.capabilities.iter().any(|cap| cap == capability))
    }
}

/// One element of a type filter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Matcher {
    /// Matches the named type and its subtypes.
    Type(String),
    /// Matches any type implementing the named capability.
    Capability(String),
}

impl Matcher {
    pub fn of_type(name: impl Into<String>) -> Self {
        Matcher::Type(name.into())
    }

    pub fn capability(name: impl Into<String>) -> Self {
        Matcher::Capability(name.into())
    }

    fn matches(&self, registry: &ModelRegistry, model_name: &str) -> bool {
        match self {
            Matcher::Type(type_name) => registry.is_a(model_name, type_name),
            Matcher::Capability(capability) => registry.implements(model_name, capability),
        }
    }
}

/// Restricts lookups to certain types (the `only:` option).
///
/// A model passes if any matcher accepts it. An empty filter accepts nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeFilter {
    matchers: Vec<Matcher>,
}

impl TypeFilter {
    pub fn of_type(name: impl Into<String>) -> Self {
        Matcher::of_type(name).into()
    }

    pub fn capability(name: impl Into<String>) -> Self {
        Matcher::capability(name).into()
    }

    pub fn any_of(matchers: impl IntoIterator<Item = Matcher>) -> Self {
        Self {
            matchers: matchers.into_iter().collect(),
        }
    }

    /// Also accept `name` and its subtypes.
    pub fn or_type(mut self, name: impl Into<String>) -> Self {
        self.matchers.push(Matcher::of_type(name));
        self
    }

    /// Also accept types implementing `capability`.
    pub fn or_capability(mut self, capability: impl Into<String>) -> Self {
        self.matchers.push(Matcher::capability(capability));
        self
    }

    pub fn matchers(&self) -> &[Matcher] {
        &self.matchers
    }

    pub fn matches(&self, registry: &ModelRegistry, model_name: &str) -> bool {
        self.matchers
            .iter()
            .any(|m| m.matches(registry, model_name))
    }
}

impl From<Matcher> for TypeFilter {
    fn from(matcher: Matcher) -> Self {
        Self {
            matchers: vec![matcher],
        }
    }
}

impl From<Vec<Matcher>> for TypeFilter {
    fn from(matchers: Vec<Matcher>) -> Self {
        Self { matchers }
    }
}
