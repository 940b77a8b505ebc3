//! Values and shared object handles
//!
//! Provides [`Value`], the unit every property, element and map entry holds,
//! and [`ObjectRef`], the identity-bearing handle to a graph [`Node`].

use crate::node::Node;
use crate::type_key::TypeKey;
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::fmt::{self, Debug, Display, Formatter};
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// A value in an object graph
///
/// Scalars are value types and compare by value. Floats compare by bit
/// pattern, so `NaN` equals itself and `0.0` differs from `-0.0`. `Object`
/// compares by identity: two handles are equal only when they point at the
/// same node.
#[derive(Debug, Clone, Default)]
pub enum Value {
    /// Absent value
    #[default]
    Null,
    /// Boolean scalar
    Bool(bool),
    /// Integer scalar
    Int(i64),
    /// Floating point scalar
    Float(f64),
    /// Text scalar; clones share the allocation
    Text(Arc<str>),
    /// Reference to a graph node
    Object(ObjectRef),
}

impl Value {
    /// Create a text value
    #[inline]
    #[must_use]
    pub fn text(text: &str) -> Self {
        Self::Text(Arc::from(text))
    }

    /// Wrap a node into a fresh object value
    #[inline]
    #[must_use]
    pub fn object(node: Node) -> Self {
        Self::Object(ObjectRef::new(node))
    }

    /// Check for [`Value::Null`]
    #[inline]
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Object handle, if this is an object
    #[inline]
    #[must_use]
    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Self::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// Integer content, if this is an integer
    #[inline]
    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Text content, if this is text
    #[inline]
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(v) => Some(v),
            _ => None,
        }
    }

    /// Runtime type of this value (`None` for null)
    #[must_use]
    pub fn type_key(&self) -> Option<TypeKey> {
        match self {
            Self::Null => None,
            Self::Bool(_) => Some(TypeKey::BOOL),
            Self::Int(_) => Some(TypeKey::INT),
            Self::Float(_) => Some(TypeKey::FLOAT),
            Self::Text(_) => Some(TypeKey::TEXT),
            Self::Object(obj) => Some(obj.type_key()),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a.to_bits() == b.to_bits(),
            (Self::Text(a), Self::Text(b)) => a == b,
            (Self::Object(a), Self::Object(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Text(v) => write!(f, "{v:?}"),
            Self::Object(obj) => write!(f, "{obj:?}"),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::text(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Text(Arc::from(v))
    }
}

impl From<ObjectRef> for Value {
    fn from(obj: ObjectRef) -> Self {
        Self::Object(obj)
    }
}

impl From<Node> for Value {
    fn from(node: Node) -> Self {
        Self::object(node)
    }
}

/// Shared, interior-mutable handle to a graph node
///
/// Identity is the address of the shared allocation: equality and hashing
/// never look at node content, so domain-level equality cannot make two
/// distinct nodes collide.
#[derive(Clone)]
pub struct ObjectRef(Arc<RwLock<Node>>);

impl ObjectRef {
    /// Allocate a new node
    #[inline]
    #[must_use]
    pub fn new(node: Node) -> Self {
        Self(Arc::new(RwLock::new(node)))
    }

    /// Identity of the node (stable while any handle is alive)
    #[inline]
    #[must_use]
    pub fn addr(&self) -> usize {
        Arc::as_ptr(&self.0) as usize
    }

    /// Check whether both handles point at the same node
    #[inline]
    #[must_use]
    pub fn ptr_eq(&self, other: &ObjectRef) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Shared read access
    ///
    /// Guards must not be held across a traversal step; copy out what you
    /// need and drop the guard.
    #[inline]
    pub fn read(&self) -> RwLockReadGuard<'_, Node> {
        self.0.read()
    }

    /// Exclusive write access
    #[inline]
    pub fn write(&self) -> RwLockWriteGuard<'_, Node> {
        self.0.write()
    }

    /// Runtime type of the node
    #[must_use]
    pub fn type_key(&self) -> TypeKey {
        self.read().type_key().clone()
    }

    /// Raw attribute of a bean node (null when absent or not a bean)
    #[must_use]
    pub fn attr(&self, name: &str) -> Value {
        self.read().attr(name).cloned().unwrap_or_default()
    }

    /// Set a raw attribute on a bean node
    ///
    /// Returns `false` if the node is not a bean.
    pub fn set_attr(&self, name: impl Into<String>, value: impl Into<Value>) -> bool {
        self.write().set_attr(name, value.into())
    }

    /// Snapshot of array or collection elements
    #[must_use]
    pub fn items(&self) -> Vec<Value> {
        self.read().items().map(<[Value]>::to_vec).unwrap_or_default()
    }

    /// Snapshot of map entries
    #[must_use]
    pub fn entries(&self) -> Vec<(Value, Value)> {
        self.read().entries().map(<[(Value, Value)]>::to_vec).unwrap_or_default()
    }

    /// Number of elements, entries or attributes
    #[must_use]
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Check if [`ObjectRef::len`] is zero
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl PartialEq for ObjectRef {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for ObjectRef {}

impl Hash for ObjectRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.addr().hash(state);
    }
}

impl Debug for ObjectRef {
    // Never recurses into content; graphs may be cyclic.
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.0.try_read() {
            Some(node) => write!(f, "{}@{:#x}", node.type_key(), self.addr()),
            None => write!(f, "<locked>@{:#x}", self.addr()),
        }
    }
}
