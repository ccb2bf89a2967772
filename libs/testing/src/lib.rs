//! Shared test fixtures for global-id.
//!
//! Provides a small model hierarchy (`Person`, `Person::Child`, and an
//! unrelated `PersonModel`), finders that count batch fetches, and a fixed
//! signing configuration.

use std::borrow::Cow;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use global_id::{
    Finder, GlobalIdConfig, HmacVerifier, Identifiable, Locator, MessageVerifier, ModelClass,
    Record,
};

/// App name used by the default test configuration.
pub const TEST_APP: &str = "bcx";

/// Secret used by [`test_verifier`].
pub const TEST_SECRET: &str = "muchSECRETsoHIDDEN";

/// A `Person` id the fixture finders never find.
pub const HARDCODED_ID_FOR_MISSING_PERSON: &str = "1000";

/// Capability implemented by [`PersonModel`].
pub const ACTIVE_MODEL: &str = "ActiveModel";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Person {
    pub id: String,
}

impl Person {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

impl Identifiable for Person {
    fn model_name(&self) -> Cow<'_, str> {
        Cow::Borrowed("Person")
    }

    fn id(&self) -> String {
        self.id.clone()
    }
}

/// Registered as `Person::Child`, a subtype of `Person`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonChild {
    pub id: String,
}

impl PersonChild {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

impl Identifiable for PersonChild {
    fn model_name(&self) -> Cow<'_, str> {
        Cow::Borrowed("Person::Child")
    }

    fn id(&self) -> String {
        self.id.clone()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonModel {
    pub id: String,
}

impl PersonModel {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

impl Identifiable for PersonModel {
    fn model_name(&self) -> Cow<'_, str> {
        Cow::Borrowed("PersonModel")
    }

    fn id(&self) -> String {
        self.id.clone()
    }
}

#[derive(Debug, Clone, Copy)]
enum Kind {
    Person,
    Child,
    Model,
}

/// Finds any id except [`HARDCODED_ID_FOR_MISSING_PERSON`] and counts
/// `find_all` calls.
#[derive(Debug, Clone)]
struct FixtureFinder {
    kind: Kind,
    batches: Arc<AtomicUsize>,
}

impl Finder for FixtureFinder {
    fn find(&self, id: &str) -> Option<Record> {
        if id == HARDCODED_ID_FOR_MISSING_PERSON {
            return None;
        }
        let record: Record = match self.kind {
            Kind::Person => Arc::new(Person::new(id)),
            Kind::Child => Arc::new(PersonChild::new(id)),
            Kind::Model => Arc::new(PersonModel::new(id)),
        };
        Some(record)
    }

    fn find_all(&self, ids: &[&str]) -> Vec<Record> {
        self.batches.fetch_add(1, Ordering::SeqCst);
        ids.iter().filter_map(|id| self.find(id)).collect()
    }
}

/// Batch-fetch counters for the registered fixture types.
#[derive(Debug, Clone, Default)]
pub struct Fixtures {
    person: Arc<AtomicUsize>,
    child: Arc<AtomicUsize>,
    model: Arc<AtomicUsize>,
}

impl Fixtures {
    /// Number of `find_all` calls made for `model_name` so far.
    pub fn batch_fetches(&self, model_name: &str) -> usize {
        let counter = match model_name {
            "Person" => &self.person,
            "Person::Child" => &self.child,
            "PersonModel" => &self.model,
            _ => return 0,
        };
        counter.load(Ordering::SeqCst)
    }
}

/// Registers the fixture model types with `locator`.
pub fn register_fixtures(locator: &Locator) -> Fixtures {
    let fixtures = Fixtures::default();

    let finder = |kind, batches: &Arc<AtomicUsize>| FixtureFinder {
        kind,
        batches: Arc::clone(batches),
    };

    locator.register_model(ModelClass::new("Person", finder(Kind::Person, &fixtures.person)));
    locator.register_model(
        ModelClass::new("Person::Child", finder(Kind::Child, &fixtures.child)).inherits("Person"),
    );
    locator.register_model(
        ModelClass::new("PersonModel", finder(Kind::Model, &fixtures.model)).implements(ACTIVE_MODEL),
    );

    fixtures
}

pub fn test_verifier() -> Arc<dyn MessageVerifier> {
    Arc::new(HmacVerifier::new(TEST_SECRET))
}

/// Default app `bcx` with the test verifier and no default expiration.
pub fn test_config() -> GlobalIdConfig {
    match GlobalIdConfig::new().with_app(TEST_APP) {
        Ok(config) => config.with_shared_verifier(test_verifier()),
        Err(e) => panic!("test app name rejected: {e}"),
    }
}

/// Downcasts a located record to a concrete fixture type.
pub fn record_as<T: 'static>(record: &Record) -> Option<&T> {
    record.as_any().downcast_ref::<T>()
}

/// The ids of `records`, in order.
pub fn ids(records: &[Record]) -> Vec<String> {
    records.iter().map(|r| r.id()).collect()
}
