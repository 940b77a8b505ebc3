//! Graft Core
//!
//! Disconnect and reconcile object graphs against a persistence store.
//!
//! # Core Concepts
//!
//! - [`Walker`]: identity-preserving traversal for `disconnect` and `apply`
//! - [`Handler`]: per-type strategy for containers, scalars and lazy handles
//! - [`HandlerRegistry`]: type to handler resolution with supertype fallback
//! - [`SchemaRegistry`]: declared types, properties and domain equality
//! - [`Store`]: the persistence collaborator, with [`MemoryStore`] in memory
//!
//! # Example
//!
//! ```
//! use graft_core::prelude::*;
//! use graft_model::{Node, Value};
//! use std::sync::Arc;
//!
//! let mut schema = SchemaBuilder::new();
//! schema
//!     .add_type("Employee")
//!     .fields(["id", "name", "version"])
//!     .done()?;
//!
//! let store = Arc::new(
//!     MemoryStore::new().with_entity(EntityDescriptor::new("Employee", "id").with_version("version")),
//! );
//! let ann = store.persist(
//!     Node::bean("Employee")
//!         .with_attr("id", 7)
//!         .with_attr("name", "Ann")
//!         .with_attr("version", 1),
//! )?;
//!
//! let walker = Walker::new(store.clone(), Arc::new(schema.build()?))
//!     .with_config(WalkerConfig::new().with_clone_objects(true));
//!
//! // A stale copy is rejected once the store has moved on
//! let stale = walker.disconnect(&Value::from(ann.clone()))?;
//! ann.set_attr("version", 2);
//! let err = walker.apply(&stale).unwrap_err();
//! assert!(err.is_optimistic_lock());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod access;
pub mod adjacency;
pub mod config;
pub mod error;
pub mod handler;
pub mod memory;
pub mod metadata;
pub mod registry;
pub mod schema;
pub mod store;
pub mod walker;

// Re-exports
pub use access::PropertyAccessor;
pub use adjacency::AdjacencyMap;
pub use config::WalkerConfig;
pub use error::{ConfigError, PropertyAccessError, ReconcileError, Result, SchemaError, StoreError};
pub use handler::{
    find_pendant, ArrayHandler, BasicTypeHandler, CollectionHandler, Handler, MapHandler,
    NullHandler,
};
pub use memory::MemoryStore;
pub use metadata::{AccessKind, Getter, MetadataCache, MetadataResolver, ObjectMetadata, Setter};
pub use registry::{HandlerRegistry, TypePredicate};
pub use schema::{derived, EqualityFn, SchemaBuilder, SchemaRegistry, TypeBuilder, TypeHierarchy};
pub use store::{EntityDescriptor, MetadataSource, Store};
pub use walker::{Traversal, Walker};

pub mod prelude {
    //! Common imports for working with Graft Core
    pub use crate::{
        EntityDescriptor, Handler, HandlerRegistry, MemoryStore, ReconcileError, SchemaBuilder,
        SchemaRegistry, Store, Walker, WalkerConfig,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
