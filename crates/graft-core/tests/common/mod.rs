//! Shared fixtures for graft-core integration tests

#![allow(dead_code)]

use graft_core::{
    AccessKind, EntityDescriptor, MemoryStore, SchemaBuilder, SchemaRegistry, Walker, WalkerConfig,
};
use graft_model::{Node, ObjectRef, Value};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

pub const EMPLOYEE: &str = "Employee";
pub const DEPARTMENT: &str = "Department";

/// Route walker logs to the test harness, once per binary
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn email_accessor() -> AccessKind {
    AccessKind::accessor(
        |node: &Node| node.attr("email").cloned().unwrap_or_default(),
        |node: &mut Node, value: Value| {
            if value.as_text().is_some_and(|text| !text.contains('@')) {
                return Err(format!("invalid email address {value}"));
            }
            node.set_attr("email", value);
            Ok(())
        },
    )
}

/// Person <- Employee, Department, and two value types
pub fn schema() -> SchemaRegistry {
    let mut builder = SchemaBuilder::new();
    builder
        .add_type("Person")
        .fields(["id", "name"])
        .done()
        .expect("person");
    builder
        .add_type(EMPLOYEE)
        .extends("Person")
        .fields([
            "version",
            "manager",
            "colleagues",
            "tags",
            "attrs",
            "address",
            "scores",
            "salary",
        ])
        .property("email", email_accessor())
        .done()
        .expect("employee");
    builder
        .add_type(DEPARTMENT)
        .fields(["id", "name", "staff"])
        .done()
        .expect("department");
    builder
        .add_type("Address")
        .fields(["street", "city"])
        .done()
        .expect("address");
    builder
        .add_type("Skill")
        .fields(["code", "level"])
        .equality(|a, b| a.attr("code") == b.attr("code"))
        .done()
        .expect("skill");
    builder.build().expect("schema")
}

pub struct Fixture {
    pub store: Arc<MemoryStore>,
    pub walker: Walker,
}

impl Fixture {
    /// Clone-mode walker over a store managing employees and departments
    pub fn new() -> Self {
        Self::with_config(WalkerConfig::new().with_clone_objects(true))
    }

    pub fn with_config(config: WalkerConfig) -> Self {
        init_tracing();
        let store = Arc::new(
            MemoryStore::new()
                .with_entity(EntityDescriptor::new(EMPLOYEE, "id").with_version("version"))
                .with_entity(EntityDescriptor::new(DEPARTMENT, "id")),
        );
        let walker = Walker::new(store.clone(), Arc::new(schema())).with_config(config);
        Self { store, walker }
    }

    /// Persisted employee at version 1 with loaded, empty containers
    pub fn employee(&self, id: i64, name: &str) -> ObjectRef {
        self.store
            .persist(
                Node::bean(EMPLOYEE)
                    .with_attr("id", id)
                    .with_attr("name", name)
                    .with_attr("version", 1)
                    .with_attr("colleagues", MemoryStore::managed(Node::list(Vec::new())))
                    .with_attr("tags", MemoryStore::managed(Node::set(Vec::new())))
                    .with_attr("attrs", MemoryStore::managed(Node::map(Vec::new()))),
            )
            .expect("persist employee")
    }

    /// Persisted department staffed with `staff`
    pub fn department(&self, id: i64, staff: &[ObjectRef]) -> ObjectRef {
        let staff = staff.iter().cloned().map(Value::from).collect();
        self.store
            .persist(
                Node::bean(DEPARTMENT)
                    .with_attr("id", id)
                    .with_attr("name", "Engineering")
                    .with_attr("staff", MemoryStore::managed(Node::list(staff))),
            )
            .expect("persist department")
    }

    /// Disconnect an object that is known to stay an object
    pub fn detach(&self, obj: &ObjectRef) -> ObjectRef {
        self.walker
            .disconnect(&Value::from(obj.clone()))
            .expect("disconnect")
            .as_object()
            .cloned()
            .expect("detached object")
    }
}

/// Object behind a property, panicking if it is not one
pub fn object_at(obj: &ObjectRef, property: &str) -> ObjectRef {
    obj.attr(property)
        .as_object()
        .cloned()
        .unwrap_or_else(|| panic!("{property} is not an object"))
}
