//! Global identifier creation, encoding, and lookup.

use global_id::{
    capability, config, locator, GidOptions, GlobalId, Identifiable, LocateOptions, Matcher,
    TypeFilter,
};
use global_id_testing::{
    record_as, register_fixtures, test_config, Person, PersonChild, PersonModel, ACTIVE_MODEL,
};
use serial_test::serial;

const UUID: &str = "7ef9b614-353c-43a1-a203-ab2307851990";

struct Gids {
    person: GlobalId,
    uuid: GlobalId,
    namespaced: GlobalId,
    model: GlobalId,
}

fn setup() -> (config::ConfigGuard, Gids) {
    register_fixtures(locator::global());
    let guard = config::scoped(test_config());
    let gids = Gids {
        person: Person::new("5").to_gid().unwrap(),
        uuid: Person::new(UUID).to_gid().unwrap(),
        namespaced: PersonChild::new("4").to_gid().unwrap(),
        model: PersonModel::new("1").to_gid().unwrap(),
    };
    (guard, gids)
}

fn only(filter: impl Into<TypeFilter>) -> LocateOptions {
    LocateOptions::new().only(filter)
}

#[test]
#[serial]
fn test_as_string() {
    let (_guard, gids) = setup();
    assert_eq!(gids.person.to_string(), "gid://bcx/Person/5");
    assert_eq!(gids.uuid.to_string(), format!("gid://bcx/Person/{UUID}"));
    assert_eq!(gids.namespaced.to_string(), "gid://bcx/Person::Child/4");
    assert_eq!(gids.model.to_string(), "gid://bcx/PersonModel/1");
}

#[test]
#[serial]
fn test_as_param() {
    let (_guard, gids) = setup();
    let cases = [
        (&gids.person, "Z2lkOi8vYmN4L1BlcnNvbi81"),
        (
            &gids.uuid,
            "Z2lkOi8vYmN4L1BlcnNvbi83ZWY5YjYxNC0zNTNjLTQzYTEtYTIwMy1hYjIzMDc4NTE5OTA",
        ),
        (&gids.namespaced, "Z2lkOi8vYmN4L1BlcnNvbjo6Q2hpbGQvNA"),
        (&gids.model, "Z2lkOi8vYmN4L1BlcnNvbk1vZGVsLzE"),
    ];

    for (gid, param) in cases {
        assert_eq!(gid.to_param(), param);
        assert_eq!(GlobalId::parse(param).as_ref(), Some(gid));
    }
}

#[test]
#[serial]
fn test_model_components() {
    let (_guard, gids) = setup();
    assert_eq!(gids.uuid.model_id(), UUID);
    assert_eq!(gids.namespaced.model_id(), "4");
    assert_eq!(gids.person.model_name(), "Person");
    assert_eq!(gids.namespaced.model_name(), "Person::Child");
    assert_eq!(gids.model.model_name(), "PersonModel");
    assert_eq!(gids.person.app(), "bcx");
}

#[test]
#[serial]
fn test_model_class() {
    let (_guard, gids) = setup();
    assert_eq!(gids.person.model_class().unwrap().name(), "Person");
    assert_eq!(gids.uuid.model_class().unwrap().name(), "Person");
    let child = gids.namespaced.model_class().unwrap();
    assert_eq!(child.name(), "Person::Child");
    assert_eq!(child.parent(), Some("Person"));
    assert_eq!(gids.model.model_class().unwrap().name(), "PersonModel");
    assert!(GlobalId::parse("gid://bcx/Unknown/1")
        .unwrap()
        .model_class()
        .is_none());
}

#[test]
#[serial]
fn test_find() {
    let (_guard, gids) = setup();
    let found = gids.person.find(&LocateOptions::new()).unwrap();
    assert_eq!(record_as::<Person>(&found), Some(&Person::new("5")));

    let found = gids.uuid.find(&LocateOptions::new()).unwrap();
    assert_eq!(record_as::<Person>(&found), Some(&Person::new(UUID)));

    let found = gids.namespaced.find(&LocateOptions::new()).unwrap();
    assert_eq!(record_as::<PersonChild>(&found), Some(&PersonChild::new("4")));

    let found = gids.model.find(&LocateOptions::new()).unwrap();
    assert_eq!(record_as::<PersonModel>(&found), Some(&PersonModel::new("1")));
}

#[test]
#[serial]
fn test_find_with_type() {
    let (_guard, gids) = setup();
    assert!(gids.person.find(&only(TypeFilter::of_type("Person"))).is_some());
    assert!(gids.uuid.find(&only(TypeFilter::of_type("Person"))).is_some());
    assert!(gids.model.find(&only(TypeFilter::of_type("PersonModel"))).is_some());

    assert!(gids.person.find(&only(TypeFilter::of_type("Hash"))).is_none());
    assert!(gids.uuid.find(&only(TypeFilter::of_type("Array"))).is_none());
    assert!(gids.namespaced.find(&only(TypeFilter::of_type("String"))).is_none());
    assert!(gids.model.find(&only(TypeFilter::of_type("Float"))).is_none());
}

#[test]
#[serial]
fn test_find_with_subtype() {
    let (_guard, gids) = setup();
    let found = gids.namespaced.find(&only(TypeFilter::of_type("Person"))).unwrap();
    assert_eq!(record_as::<PersonChild>(&found), Some(&PersonChild::new("4")));

    assert!(gids.person.find(&only(TypeFilter::of_type("Person::Child"))).is_none());
}

#[test]
#[serial]
fn test_find_with_capability() {
    let (_guard, gids) = setup();
    let identification = || only(TypeFilter::capability(capability::IDENTIFICATION));

    assert!(gids.person.find(&identification()).is_some());
    assert!(gids.uuid.find(&identification()).is_some());
    assert!(gids.namespaced.find(&identification()).is_some());
    assert!(gids.model.find(&only(TypeFilter::capability(ACTIVE_MODEL))).is_some());

    assert!(gids.person.find(&only(TypeFilter::capability("Enumerable"))).is_none());
    assert!(gids.person.find(&only(TypeFilter::capability(ACTIVE_MODEL))).is_none());
    assert!(gids.model.find(&only(TypeFilter::capability("Enumerable"))).is_none());
}

#[test]
#[serial]
fn test_find_with_multiple_matchers() {
    let (_guard, gids) = setup();
    assert!(gids
        .person
        .find(&only(TypeFilter::of_type("Integer").or_type("Person")))
        .is_some());
    assert!(gids
        .model
        .find(&only(TypeFilter::of_type("String").or_capability(ACTIVE_MODEL)))
        .is_some());
    assert!(gids
        .namespaced
        .find(&only(vec![
            Matcher::of_type("Integer"),
            Matcher::capability(capability::IDENTIFICATION),
        ]))
        .is_some());

    assert!(gids
        .person
        .find(&only(TypeFilter::of_type("Integer").or_type("Numeric")))
        .is_none());
    assert!(gids
        .namespaced
        .find(&only(TypeFilter::capability("Enumerable").or_capability("Forwardable")))
        .is_none());
    assert!(gids.person.find(&only(TypeFilter::default())).is_none());
}

#[test]
#[serial]
fn test_param_form_finds() {
    let (_guard, gids) = setup();
    let param = gids.person.to_param();
    assert_eq!(GlobalId::parse(&param), Some(gids.person.clone()));

    let found = locator::global().locate(&param, &LocateOptions::new()).unwrap();
    assert_eq!(found.id(), gids.person.model_id());
}

#[test]
#[serial]
fn test_app_option() {
    let (_guard, _) = setup();
    let gid = GlobalId::create(&Person::new("5"), &GidOptions::new()).unwrap();
    assert_eq!(gid.to_string(), "gid://bcx/Person/5");

    let gid = GlobalId::create(&Person::new("5"), &GidOptions::new().app("foo")).unwrap();
    assert_eq!(gid.to_string(), "gid://foo/Person/5");

    let err = GlobalId::create(&Person::new("5"), &GidOptions::new().app("")).unwrap_err();
    assert!(err.is_invalid_argument());
}

#[test]
#[serial]
fn test_create_without_any_app_fails() {
    let _guard = config::scoped(config::GlobalIdConfig::new());
    let err = Person::new("5").to_gid().unwrap_err();
    assert!(err.is_invalid_argument());
}

#[test]
#[serial]
fn test_invalid_default_app() {
    let (_guard, _) = setup();
    assert!(config::set_app("").unwrap_err().is_invalid_argument());
    assert!(config::set_app("blog_app").unwrap_err().is_invalid_argument());
    assert_eq!(config::current().app(), Some("bcx"));
}

#[test]
fn test_custom_params() {
    let gid = GlobalId::parse("gid://bcx/Person/5?hello=world").unwrap();
    assert_eq!(gid.params().get("hello"), Some("world"));
}
