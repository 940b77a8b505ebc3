//! Graft Model
//!
//! Provides the object model walked by the graft engine: runtime type keys,
//! scalar and object values, and shared graph nodes with identity semantics.
//!
//! # Example
//! ```
//! use graft_model::{Node, ObjectRef, Value};
//!
//! let ann = ObjectRef::new(Node::bean("Employee").with_attr("name", "Ann"));
//! ann.set_attr("manager", ann.clone());
//!
//! assert_eq!(ann.attr("manager"), Value::from(ann.clone()));
//! ```

mod node;
mod type_key;
mod value;

pub use node::{Attributes, CollectionKind, Node, NodeData, Origin};
pub use type_key::TypeKey;
pub use value::{ObjectRef, Value};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
