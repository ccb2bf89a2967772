//! Resolution through the locator, single and batched, signed and unsigned.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use global_id::{
    capability, config, GlobalId, Identifiable, LocateOptions, Locator, Record, Resolver,
    SignOptions, SignedGlobalId, TypeFilter,
};
use global_id_testing::{
    ids, record_as, register_fixtures, test_config, Fixtures, Person, PersonChild,
    HARDCODED_ID_FOR_MISSING_PERSON,
};
use serial_test::serial;

fn setup() -> (config::ConfigGuard, Locator, Fixtures) {
    let guard = config::scoped(test_config());
    let locator = Locator::new();
    let fixtures = register_fixtures(&locator);
    (guard, locator, fixtures)
}

fn none() -> LocateOptions {
    LocateOptions::new()
}

fn only(filter: impl Into<TypeFilter>) -> LocateOptions {
    LocateOptions::new().only(filter)
}

fn assert_person(found: Option<Record>, id: &str) {
    let found = found.expect("record should be found");
    assert_eq!(record_as::<Person>(&found), Some(&Person::new(id)));
}

#[test]
#[serial]
fn test_by_gid() {
    let (_guard, locator, _) = setup();
    let gid = Person::new("id").to_gid().unwrap();

    assert_person(locator.locate(&gid, &none()), "id");
    assert_person(locator.locate(&gid, &only(TypeFilter::of_type("Person"))), "id");
    assert_person(
        locator.locate(&gid, &only(TypeFilter::of_type("String").or_type("Person"))),
        "id",
    );
    assert_person(
        locator.locate(&gid, &only(TypeFilter::capability(capability::IDENTIFICATION))),
        "id",
    );
    assert_person(
        locator.locate(
            &gid,
            &only(TypeFilter::of_type("String").or_capability(capability::IDENTIFICATION)),
        ),
        "id",
    );

    assert!(locator.locate(&gid, &only(TypeFilter::of_type("String"))).is_none());
    assert!(locator.locate(&gid, &only(TypeFilter::capability("Forwardable"))).is_none());
}

#[test]
#[serial]
fn test_by_gid_subtype_match() {
    let (_guard, locator, _) = setup();
    let gid = PersonChild::new("id").to_gid().unwrap();
    let found = locator.locate(&gid, &only(TypeFilter::of_type("Person"))).unwrap();
    assert_eq!(record_as::<PersonChild>(&found), Some(&PersonChild::new("id")));
}

#[test]
#[serial]
fn test_by_text_and_param() {
    let (_guard, locator, _) = setup();
    let gid = Person::new("id").to_gid().unwrap();

    assert_person(locator.locate(gid.to_string(), &none()), "id");
    assert_person(locator.locate(gid.to_param(), &none()), "id");
}

#[test]
#[serial]
fn test_non_gid_returns_none() {
    let (_guard, locator, _) = setup();
    for text in [
        "This is not a GID",
        "http://app/Person/1",
        "gid://Person/1",
        "gid://app/Person",
        "gid://app/Person/1/2",
    ] {
        assert!(locator.locate(text, &none()).is_none(), "{text}");
    }
}

#[test]
#[serial]
fn test_many_gids_preserve_order() {
    let (_guard, locator, fixtures) = setup();
    let gids = [
        Person::new("1").to_gid().unwrap(),
        PersonChild::new("1").to_gid().unwrap(),
        Person::new("2").to_gid().unwrap(),
    ];

    let found = locator.locate_many(&gids, &none()).unwrap();
    assert_eq!(ids(&found), vec!["1", "1", "2"]);
    assert_eq!(record_as::<Person>(&found[0]), Some(&Person::new("1")));
    assert_eq!(record_as::<PersonChild>(&found[1]), Some(&PersonChild::new("1")));
    assert_eq!(record_as::<Person>(&found[2]), Some(&Person::new("2")));

    assert_eq!(fixtures.batch_fetches("Person"), 1);
    assert_eq!(fixtures.batch_fetches("Person::Child"), 1);
}

#[test]
#[serial]
fn test_many_gids_with_subtype_filter() {
    let (_guard, locator, fixtures) = setup();
    let gids = [
        Person::new("1").to_gid().unwrap(),
        PersonChild::new("1").to_gid().unwrap(),
        Person::new("2").to_gid().unwrap(),
    ];

    let found = locator
        .locate_many(&gids, &only(TypeFilter::of_type("Person::Child")))
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(record_as::<PersonChild>(&found[0]), Some(&PersonChild::new("1")));
    assert_eq!(fixtures.batch_fetches("Person"), 0);
}

#[test]
#[serial]
fn test_many_sgids_as_plain_ids() {
    let (_guard, locator, _) = setup();
    let sgids: Vec<SignedGlobalId> = [Person::new("1"), Person::new("2")]
        .iter()
        .map(|p| p.to_sgid(&SignOptions::new()).unwrap())
        .collect();

    let found = locator.locate_many(&sgids, &none()).unwrap();
    assert_eq!(ids(&found), vec!["1", "2"]);
}

#[test]
#[serial]
fn test_many_missing_record() {
    let (_guard, locator, _) = setup();
    let gids = [
        Person::new("1").to_gid().unwrap(),
        Person::new(HARDCODED_ID_FOR_MISSING_PERSON).to_gid().unwrap(),
    ];

    let err = locator.locate_many(&gids, &none()).unwrap_err();
    assert!(err.is_missing_record());
    assert!(err.to_string().contains(HARDCODED_ID_FOR_MISSING_PERSON));

    let found = locator
        .locate_many(&gids, &LocateOptions::new().ignore_missing(true))
        .unwrap();
    assert_eq!(ids(&found), vec!["1"]);
}

#[test]
#[serial]
fn test_many_mixed_inputs() {
    let (_guard, locator, _) = setup();
    let gid = Person::new("1").to_gid().unwrap();
    let inputs = vec![gid.to_string(), "not a gid".to_string(), gid.to_param()];

    let found = locator.locate_many(&inputs, &none()).unwrap();
    assert_eq!(ids(&found), vec!["1", "1"]);
}

#[test]
#[serial]
fn test_by_sgid() {
    let (_guard, locator, _) = setup();
    let sgid = Person::new("id").to_sgid(&SignOptions::new()).unwrap();

    assert_person(locator.locate_signed(&sgid, &none()).unwrap(), "id");
    assert_person(locator.locate_signed(sgid.to_text(), &none()).unwrap(), "id");
    assert_person(
        locator
            .locate_signed(&sgid, &only(TypeFilter::of_type("String").or_type("Person")))
            .unwrap(),
        "id",
    );
    assert_person(
        locator
            .locate_signed(&sgid, &only(TypeFilter::capability(capability::IDENTIFICATION)))
            .unwrap(),
        "id",
    );

    assert!(locator
        .locate_signed(&sgid, &only(TypeFilter::of_type("String")))
        .unwrap()
        .is_none());
    assert!(locator
        .locate_signed(&sgid, &only(TypeFilter::capability("Enumerable")))
        .unwrap()
        .is_none());
    assert!(locator
        .locate_signed("This is not a SGID", &none())
        .unwrap()
        .is_none());
}

#[test]
#[serial]
fn test_by_sgid_subtype_match() {
    let (_guard, locator, _) = setup();
    let sgid = PersonChild::new("id").to_sgid(&SignOptions::new()).unwrap();
    let found = locator
        .locate_signed(&sgid, &only(TypeFilter::of_type("Person")))
        .unwrap()
        .unwrap();
    assert_eq!(found.id(), sgid.model_id());
}

#[test]
#[serial]
fn test_by_sgid_purpose() {
    let (_guard, locator, _) = setup();
    let login = Person::new("id")
        .to_sgid(&SignOptions::new().purpose("login"))
        .unwrap();

    assert_person(
        locator
            .locate_signed(login.to_text(), &LocateOptions::new().purpose("login"))
            .unwrap(),
        "id",
    );
    assert!(locator
        .locate_signed(login.to_text(), &LocateOptions::new().purpose("like_button"))
        .unwrap()
        .is_none());
    assert!(locator.locate_signed(&login, &none()).unwrap().is_none());
}

#[test]
#[serial]
fn test_by_sgid_without_verifier_fails() {
    let (_guard, locator, _) = setup();
    let token = Person::new("id").to_sgid(&SignOptions::new()).unwrap().to_string();
    config::set_verifier(None);

    let err = locator.locate_signed(&token, &none()).unwrap_err();
    assert!(err.is_invalid_argument());
}

#[test]
#[serial]
fn test_many_sgids() {
    let (_guard, locator, _) = setup();
    let models = [Person::new("1"), Person::new("2")];
    let sgids: Vec<String> = models
        .iter()
        .map(|p| p.to_sgid(&SignOptions::new()).unwrap().to_string())
        .collect();

    let found = locator.locate_many_signed(&sgids, &none()).unwrap();
    assert_eq!(ids(&found), vec!["1", "2"]);
}

#[test]
#[serial]
fn test_many_sgids_with_purpose_and_filter() {
    let (_guard, locator, _) = setup();
    let adoption = SignOptions::new().purpose("adoption");
    let sgids = vec![
        Person::new("1").to_sgid(&adoption).unwrap().to_string(),
        PersonChild::new("1").to_sgid(&SignOptions::new()).unwrap().to_string(),
        PersonChild::new("2").to_sgid(&adoption).unwrap().to_string(),
    ];

    let options = LocateOptions::new()
        .purpose("adoption")
        .only(TypeFilter::of_type("Person::Child"));
    let found = locator.locate_many_signed(&sgids, &options).unwrap();

    assert_eq!(found.len(), 1);
    assert_eq!(record_as::<PersonChild>(&found[0]), Some(&PersonChild::new("2")));
}

struct BarResolver;

impl Resolver for BarResolver {
    fn locate(&self, gid: &GlobalId, _options: &LocateOptions) -> Option<Record> {
        Some(Arc::new(Person::new(format!("bar-{}", gid.model_id()))))
    }
}

#[test]
#[serial]
fn test_custom_resolver_closure() {
    let (_guard, locator, _) = setup();
    locator
        .register("foo", |_: &GlobalId| -> Option<Record> {
            Some(Arc::new(Person::new("foo")))
        })
        .unwrap();

    assert_person(locator.locate("gid://foo/Person/1", &none()), "foo");
    assert_person(locator.locate("gid://bcx/Person/1", &none()), "1");
}

#[test]
#[serial]
fn test_custom_resolver_value() {
    let (_guard, locator, _) = setup();
    locator.register("bar", BarResolver).unwrap();
    assert_person(locator.locate("gid://bar/Person/1", &none()), "bar-1");
}

#[test]
#[serial]
fn test_custom_resolver_case_insensitive() {
    let (_guard, locator, _) = setup();
    locator
        .register("insensitive", |_: &GlobalId| -> Option<Record> {
            Some(Arc::new(Person::new("insensitive")))
        })
        .unwrap();
    assert_person(locator.locate("gid://InSeNsItIvE/Person/1", &none()), "insensitive");
}

#[test]
#[serial]
fn test_custom_resolver_name_cannot_have_underscore() {
    let (_guard, locator, _) = setup();
    let err = locator
        .register("under_score", |_: &GlobalId| -> Option<Record> { None })
        .unwrap_err();
    assert!(err.is_invalid_argument());
}

#[test]
#[serial]
fn test_custom_resolver_batches_once_per_app() {
    let (_guard, locator, _) = setup();

    struct Counting(Arc<AtomicUsize>);

    impl Resolver for Counting {
        fn locate(&self, gid: &GlobalId, _options: &LocateOptions) -> Option<Record> {
            Some(Arc::new(Person::new(gid.model_id())))
        }

        fn locate_many(
            &self,
            gids: &[GlobalId],
            options: &LocateOptions,
        ) -> Result<Vec<Option<Record>>, global_id::GidError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(gids.iter().map(|gid| self.locate(gid, options)).collect())
        }
    }

    let calls = Arc::new(AtomicUsize::new(0));
    locator.register("ext", Counting(Arc::clone(&calls))).unwrap();

    let found = locator
        .locate_many(
            [
                "gid://ext/Person/a",
                "gid://bcx/Person/b",
                "gid://EXT/Thing/c",
            ],
            &none(),
        )
        .unwrap();

    assert_eq!(ids(&found), vec!["a", "b", "c"]);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
#[serial]
fn test_custom_resolver_miss_in_batch() {
    let (_guard, locator, _) = setup();
    locator
        .register("sparse", |gid: &GlobalId| -> Option<Record> {
            (gid.model_id() != "gone").then(|| Arc::new(Person::new(gid.model_id())) as Record)
        })
        .unwrap();

    let gids = ["gid://sparse/Person/a", "gid://sparse/Person/gone", "gid://bcx/Person/b"];

    let err = locator.locate_many(gids, &none()).unwrap_err();
    assert!(err.is_missing_record());

    let found = locator
        .locate_many(gids, &LocateOptions::new().ignore_missing(true))
        .unwrap();
    assert_eq!(ids(&found), vec!["a", "b"]);
}
