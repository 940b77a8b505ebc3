mod common;

use common::{object_at, Fixture, EMPLOYEE};
use graft_core::{AccessKind, MemoryStore, ObjectMetadata, WalkerConfig};
use graft_model::{CollectionKind, Node, ObjectRef, Origin, TypeKey, Value};
use pretty_assertions::assert_eq;

#[test]
fn null_stays_null() {
    let fx = Fixture::new();
    assert_eq!(fx.walker.disconnect(&Value::Null).unwrap(), Value::Null);
}

#[test]
fn scalars_are_returned_unchanged() {
    let fx = Fixture::new();
    let text = Value::text("unchanged");

    let out = fx.walker.disconnect(&text).unwrap();
    match (&text, &out) {
        (Value::Text(a), Value::Text(b)) => assert!(std::sync::Arc::ptr_eq(a, b)),
        other => panic!("expected text, got {other:?}"),
    }
    assert_eq!(fx.walker.disconnect(&Value::from(42)).unwrap(), Value::from(42));
}

#[test]
fn cyclic_graph_keeps_its_shape() {
    let fx = Fixture::new();
    let ann = fx.employee(1, "Ann");
    let bob = fx.employee(2, "Bob");
    ann.set_attr("manager", bob.clone());
    bob.set_attr("manager", ann.clone());
    object_at(&ann, "colleagues").write().push(Value::from(bob.clone()));
    object_at(&bob, "colleagues").write().push(Value::from(ann.clone()));

    let copy_ann = fx.detach(&ann);
    let copy_bob = object_at(&copy_ann, "manager");

    assert!(!copy_ann.ptr_eq(&ann));
    assert!(!copy_bob.ptr_eq(&bob));
    assert_eq!(copy_bob.attr("name"), Value::from("Bob"));
    assert_eq!(copy_bob.attr("manager"), Value::from(copy_ann.clone()));
    assert_eq!(
        object_at(&copy_ann, "colleagues").items(),
        vec![Value::from(copy_bob.clone())]
    );
    assert_eq!(
        object_at(&copy_bob, "colleagues").items(),
        vec![Value::from(copy_ann.clone())]
    );
}

#[test]
fn shared_references_stay_shared() {
    let fx = Fixture::new();
    let boss = fx.employee(1, "Boss");
    let ann = fx.employee(2, "Ann");
    let bob = fx.employee(3, "Bob");
    ann.set_attr("manager", boss.clone());
    bob.set_attr("manager", boss.clone());
    let team = Value::object(Node::list(vec![Value::from(ann), Value::from(bob)]));

    let copy = fx.walker.disconnect(&team).unwrap();
    let members = copy.as_object().unwrap().items();

    let first = object_at(members[0].as_object().unwrap(), "manager");
    let second = object_at(members[1].as_object().unwrap(), "manager");
    assert!(first.ptr_eq(&second));
    assert!(!first.ptr_eq(&boss));
}

#[test]
fn reuse_mode_returns_source_and_severs_containers() {
    let fx = Fixture::with_config(WalkerConfig::new());
    let ann = fx.employee(1, "Ann");
    let managed_tags = object_at(&ann, "tags");
    managed_tags.write().push(Value::from("rust"));

    let out = fx.walker.disconnect(&Value::from(ann.clone())).unwrap();

    assert!(out.as_object().unwrap().ptr_eq(&ann));
    let tags = object_at(&ann, "tags");
    assert!(!tags.ptr_eq(&managed_tags));
    assert_eq!(tags.read().origin(), Origin::Plain);
    assert_eq!(tags.items(), vec![Value::from("rust")]);
}

#[test]
fn proxies_are_rematerialised_even_without_clone_mode() {
    let fx = Fixture::with_config(WalkerConfig::new());
    let proxy = ObjectRef::new(
        Node::bean(EMPLOYEE)
            .with_attr("id", 9)
            .with_attr("name", "Proxy")
            .with_origin(Origin::Managed {
                proxy: true,
                loaded: true,
            }),
    );

    let copy = fx.detach(&proxy);

    assert!(!copy.ptr_eq(&proxy));
    assert_eq!(copy.type_key(), proxy.type_key());
    assert_eq!(copy.read().origin(), Origin::Plain);
    assert_eq!(copy.attr("name"), Value::from("Proxy"));
}

#[test]
fn unloaded_containers_become_empty() {
    let fx = Fixture::new();
    let ann = fx.employee(1, "Ann");
    let lazy = MemoryStore::lazy_collection(CollectionKind::List);
    ann.set_attr("colleagues", lazy.clone());
    ann.set_attr("attrs", MemoryStore::lazy_map());
    ann.set_attr("manager", MemoryStore::placeholder(EMPLOYEE));

    let copy = fx.detach(&ann);

    let colleagues = object_at(&copy, "colleagues");
    assert!(!colleagues.ptr_eq(&lazy));
    assert!(colleagues.is_empty());
    assert_eq!(colleagues.read().origin(), Origin::Plain);
    assert!(object_at(&copy, "attrs").is_empty());
    assert_eq!(copy.attr("manager"), Value::Null);
}

#[test]
fn unloaded_containers_become_null_when_disabled() {
    let fx = Fixture::with_config(
        WalkerConfig::new()
            .with_clone_objects(true)
            .with_create_empty_collections(false),
    );
    let ann = fx.employee(1, "Ann");
    ann.set_attr("colleagues", MemoryStore::lazy_collection(CollectionKind::List));

    let copy = fx.detach(&ann);

    assert_eq!(copy.attr("colleagues"), Value::Null);
}

#[test]
fn flushes_once_per_object_when_enabled() {
    let fx = Fixture::with_config(
        WalkerConfig::new()
            .with_clone_objects(true)
            .with_flush_automatically(true),
    );
    let ann = fx.employee(1, "Ann");
    ann.set_attr("manager", fx.employee(2, "Bob"));

    fx.detach(&ann);

    assert_eq!(fx.store.flush_count(), 2);
}

#[test]
fn never_flushes_by_default() {
    let fx = Fixture::new();
    fx.detach(&fx.employee(1, "Ann"));
    assert_eq!(fx.store.flush_count(), 0);
}

#[test]
fn custom_metadata_limits_the_walk() {
    let fx = Fixture::new();
    let ann = fx.employee(1, "Ann");
    let names_only = ObjectMetadata::new(EMPLOYEE).with_property("name", AccessKind::Field);

    let copy = fx
        .walker
        .traversal()
        .with_metadata(names_only)
        .disconnect(&Value::from(ann))
        .unwrap();
    let copy = copy.as_object().unwrap();

    assert_eq!(copy.attr("name"), Value::from("Ann"));
    assert_eq!(copy.attr("id"), Value::Null);
}

#[test]
fn maps_copy_keys_and_values() {
    let fx = Fixture::new();
    let ann = fx.employee(1, "Ann");
    let bob = fx.employee(2, "Bob");
    object_at(&ann, "attrs")
        .write()
        .insert(Value::from("buddy"), Value::from(bob.clone()));

    let copy = fx.detach(&ann);
    let entries = object_at(&copy, "attrs").entries();

    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].0, Value::from("buddy"));
    let buddy = entries[0].1.as_object().unwrap();
    assert!(!buddy.ptr_eq(&bob));
    assert_eq!(buddy.attr("name"), Value::from("Bob"));
}

#[test]
fn arrays_copy_scalars_and_walk_objects() {
    let fx = Fixture::new();
    let ann = fx.employee(1, "Ann");
    let bob = fx.employee(2, "Bob");
    let scores = ObjectRef::new(Node::array(TypeKey::INT, vec![Value::from(1), Value::from(2)]));
    ann.set_attr("scores", scores.clone());
    let peers = Value::object(Node::array(EMPLOYEE, vec![Value::from(bob.clone()), Value::Null]));

    let copy = fx.detach(&ann);
    let copied_scores = object_at(&copy, "scores");
    assert!(!copied_scores.ptr_eq(&scores));
    assert_eq!(copied_scores.items(), vec![Value::from(1), Value::from(2)]);

    let copied_peers = fx.walker.disconnect(&peers).unwrap();
    let items = copied_peers.as_object().unwrap().items();
    assert_eq!(items.len(), 2);
    assert!(!items[0].as_object().unwrap().ptr_eq(&bob));
    assert_eq!(items[1], Value::Null);
}

#[test]
fn undeclared_container_types_keep_their_content() {
    let fx = Fixture::new();
    let ann = fx.employee(1, "Ann");
    let bag = ObjectRef::new(Node::collection(
        "Bag",
        CollectionKind::List,
        vec![Value::from(1), Value::from(ann.clone())],
    ));

    let copy = fx.walker.disconnect(&Value::from(bag.clone())).unwrap();
    let copy = copy.as_object().unwrap();
    assert!(!copy.ptr_eq(&bag));
    assert_eq!(copy.type_key(), TypeKey::new("Bag"));

    let items = copy.items();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0], Value::from(1));
    let copy_ann = items[1].as_object().unwrap();
    assert!(!copy_ann.ptr_eq(&ann));
    assert_eq!(copy_ann.attr("name"), Value::from("Ann"));
}
