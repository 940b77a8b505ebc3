//! Graph nodes
//!
//! Provides [`Node`], the content behind an [`ObjectRef`](crate::ObjectRef):
//! a runtime type, an [`Origin`] telling caller-owned values apart from
//! backend-managed ones, and the shape-specific [`NodeData`].

use crate::type_key::TypeKey;
use crate::value::Value;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Raw attribute state of a bean, in declaration order
pub type Attributes = IndexMap<String, Value>;

/// Where a node came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Origin {
    /// Caller-owned value with no link to a backend
    #[default]
    Plain,
    /// Backend-managed entity or container
    Managed {
        /// Backend-generated stand-in for the real type
        proxy: bool,
        /// Content has been loaded
        loaded: bool,
    },
}

impl Origin {
    /// Loaded, non-proxy managed origin
    pub const MANAGED: Origin = Origin::Managed {
        proxy: false,
        loaded: true,
    };

    /// Check whether a backend owns the node
    #[inline]
    #[must_use]
    pub fn is_managed(self) -> bool {
        matches!(self, Self::Managed { .. })
    }

    /// Check whether the node is a backend proxy
    #[inline]
    #[must_use]
    pub fn is_proxy(self) -> bool {
        matches!(self, Self::Managed { proxy: true, .. })
    }

    /// Check whether the node content is available
    #[inline]
    #[must_use]
    pub fn is_loaded(self) -> bool {
        !matches!(self, Self::Managed { loaded: false, .. })
    }
}

/// Collection flavour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CollectionKind {
    /// Ordered, duplicates allowed
    List,
    /// Duplicates rejected by [`Value`] equality
    Set,
}

impl CollectionKind {
    /// Built-in type key of the flavour
    #[must_use]
    pub fn type_key(self) -> TypeKey {
        match self {
            Self::List => TypeKey::LIST,
            Self::Set => TypeKey::SET,
        }
    }
}

/// Shape-specific node content
#[derive(Debug, Clone)]
pub enum NodeData {
    /// Named attributes
    Bean(Attributes),
    /// Fixed-length array
    Array {
        /// Element type
        component: TypeKey,
        /// Elements
        items: Vec<Value>,
    },
    /// List or set
    Collection {
        /// Flavour
        kind: CollectionKind,
        /// Elements in iteration order
        items: Vec<Value>,
    },
    /// Insertion-ordered map with unique keys
    Map(Vec<(Value, Value)>),
    /// No inspectable content
    Opaque,
}

/// Content of a graph node
#[derive(Debug, Clone)]
pub struct Node {
    type_key: TypeKey,
    origin: Origin,
    data: NodeData,
}

impl Node {
    /// Empty bean of the given type
    #[must_use]
    pub fn bean(type_key: impl Into<TypeKey>) -> Self {
        Self {
            type_key: type_key.into(),
            origin: Origin::Plain,
            data: NodeData::Bean(Attributes::new()),
        }
    }

    /// List holding `items`
    #[must_use]
    pub fn list(items: Vec<Value>) -> Self {
        Self::collection(TypeKey::LIST, CollectionKind::List, items)
    }

    /// Set holding `items`, duplicates dropped
    #[must_use]
    pub fn set(items: Vec<Value>) -> Self {
        Self::collection(TypeKey::SET, CollectionKind::Set, items)
    }

    /// Collection of a custom type
    #[must_use]
    pub fn collection(type_key: impl Into<TypeKey>, kind: CollectionKind, items: Vec<Value>) -> Self {
        let mut node = Self {
            type_key: type_key.into(),
            origin: Origin::Plain,
            data: NodeData::Collection {
                kind,
                items: Vec::with_capacity(items.len()),
            },
        };
        node.set_items(items);
        node
    }

    /// Map holding `entries`; later duplicates of a key win
    #[must_use]
    pub fn map(entries: Vec<(Value, Value)>) -> Self {
        let mut node = Self {
            type_key: TypeKey::MAP,
            origin: Origin::Plain,
            data: NodeData::Map(Vec::with_capacity(entries.len())),
        };
        node.set_entries(entries);
        node
    }

    /// Array of `component` holding `items`
    #[must_use]
    pub fn array(component: impl Into<TypeKey>, items: Vec<Value>) -> Self {
        let component = component.into();
        Self {
            type_key: TypeKey::array_of(&component),
            origin: Origin::Plain,
            data: NodeData::Array { component, items },
        }
    }

    /// Node without inspectable content
    #[must_use]
    pub fn opaque(type_key: impl Into<TypeKey>) -> Self {
        Self {
            type_key: type_key.into(),
            origin: Origin::Plain,
            data: NodeData::Opaque,
        }
    }

    /// Set an attribute (no-op unless this is a bean)
    #[must_use]
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set_attr(name, value.into());
        self
    }

    /// Replace the origin
    #[inline]
    #[must_use]
    pub fn with_origin(mut self, origin: Origin) -> Self {
        self.origin = origin;
        self
    }

    /// Runtime type
    #[inline]
    #[must_use]
    pub fn type_key(&self) -> &TypeKey {
        &self.type_key
    }

    /// Origin
    #[inline]
    #[must_use]
    pub fn origin(&self) -> Origin {
        self.origin
    }

    /// Replace the origin in place
    #[inline]
    pub fn set_origin(&mut self, origin: Origin) {
        self.origin = origin;
    }

    /// Shape-specific content
    #[inline]
    #[must_use]
    pub fn data(&self) -> &NodeData {
        &self.data
    }

    /// Built-in type key of the content shape, `None` for beans and opaque nodes
    #[must_use]
    pub fn shape_key(&self) -> Option<TypeKey> {
        match &self.data {
            NodeData::Collection { kind, .. } => Some(kind.type_key()),
            NodeData::Map(_) => Some(TypeKey::MAP),
            NodeData::Array { component, .. } => Some(TypeKey::array_of(component)),
            NodeData::Bean(_) | NodeData::Opaque => None,
        }
    }

    /// Bean attributes
    #[must_use]
    pub fn attributes(&self) -> Option<&Attributes> {
        match &self.data {
            NodeData::Bean(attrs) => Some(attrs),
            _ => None,
        }
    }

    /// Raw attribute of a bean
    #[must_use]
    pub fn attr(&self, name: &str) -> Option<&Value> {
        self.attributes().and_then(|attrs| attrs.get(name))
    }

    /// Set a raw attribute, returning `false` if this is not a bean
    pub fn set_attr(&mut self, name: impl Into<String>, value: Value) -> bool {
        match &mut self.data {
            NodeData::Bean(attrs) => {
                attrs.insert(name.into(), value);
                true
            }
            _ => false,
        }
    }

    /// Elements of an array or collection
    #[must_use]
    pub fn items(&self) -> Option<&[Value]> {
        match &self.data {
            NodeData::Array { items, .. } | NodeData::Collection { items, .. } => Some(items),
            _ => None,
        }
    }

    /// Replace the elements of an array or collection
    ///
    /// Sets keep the first of any duplicates. Returns `false` if the node
    /// holds neither.
    pub fn set_items(&mut self, new_items: Vec<Value>) -> bool {
        match &mut self.data {
            NodeData::Array { items, .. } => {
                *items = new_items;
                true
            }
            NodeData::Collection { kind, items } => {
                items.clear();
                for value in new_items {
                    if *kind == CollectionKind::Set && items.contains(&value) {
                        continue;
                    }
                    items.push(value);
                }
                true
            }
            _ => false,
        }
    }

    /// Overwrite one array slot, returning `false` when out of range
    pub fn set_item(&mut self, index: usize, value: Value) -> bool {
        match &mut self.data {
            NodeData::Array { items, .. } => match items.get_mut(index) {
                Some(slot) => {
                    *slot = value;
                    true
                }
                None => false,
            },
            _ => false,
        }
    }

    /// Append to a collection, returning `false` if nothing was added
    pub fn push(&mut self, value: Value) -> bool {
        match &mut self.data {
            NodeData::Collection { kind, items } => {
                if *kind == CollectionKind::Set && items.contains(&value) {
                    return false;
                }
                items.push(value);
                true
            }
            _ => false,
        }
    }

    /// Map entries
    #[must_use]
    pub fn entries(&self) -> Option<&[(Value, Value)]> {
        match &self.data {
            NodeData::Map(entries) => Some(entries),
            _ => None,
        }
    }

    /// Replace all map entries, returning `false` if this is not a map
    pub fn set_entries(&mut self, new_entries: Vec<(Value, Value)>) -> bool {
        if !matches!(self.data, NodeData::Map(_)) {
            return false;
        }
        if let NodeData::Map(entries) = &mut self.data {
            entries.clear();
        }
        for (key, value) in new_entries {
            self.insert(key, value);
        }
        true
    }

    /// Insert or replace a map entry, returning the previous value
    pub fn insert(&mut self, key: Value, value: Value) -> Option<Value> {
        let NodeData::Map(entries) = &mut self.data else {
            return None;
        };
        if let Some(slot) = entries.iter_mut().find(|(k, _)| *k == key) {
            return Some(std::mem::replace(&mut slot.1, value));
        }
        entries.push((key, value));
        None
    }

    /// Look up a map value by key
    #[must_use]
    pub fn get(&self, key: &Value) -> Option<&Value> {
        self.entries()
            .and_then(|entries| entries.iter().find(|(k, _)| k == key))
            .map(|(_, v)| v)
    }

    /// Number of elements, entries or attributes
    #[must_use]
    pub fn len(&self) -> usize {
        match &self.data {
            NodeData::Bean(attrs) => attrs.len(),
            NodeData::Array { items, .. } | NodeData::Collection { items, .. } => items.len(),
            NodeData::Map(entries) => entries.len(),
            NodeData::Opaque => 0,
        }
    }

    /// Check if [`Node::len`] is zero
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Check for collection or map content
    #[must_use]
    pub fn is_container(&self) -> bool {
        matches!(self.data, NodeData::Collection { .. } | NodeData::Map(_))
    }

    /// Plain, empty node of the same concrete shape and type
    ///
    /// Arrays keep their length with every slot null.
    #[must_use]
    pub fn empty_like(&self) -> Node {
        let data = match &self.data {
            NodeData::Bean(_) => NodeData::Bean(Attributes::new()),
            NodeData::Array { component, items } => NodeData::Array {
                component: component.clone(),
                items: vec![Value::Null; items.len()],
            },
            NodeData::Collection { kind, items } => NodeData::Collection {
                kind: *kind,
                items: Vec::with_capacity(items.len()),
            },
            NodeData::Map(entries) => NodeData::Map(Vec::with_capacity(entries.len())),
            NodeData::Opaque => NodeData::Opaque,
        };
        Node {
            type_key: self.type_key.clone(),
            origin: Origin::Plain,
            data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_rejects_duplicates() {
        let mut set = Node::set(vec![Value::from(1), Value::from(2), Value::from(1)]);
        assert_eq!(set.len(), 2);
        assert!(!set.push(Value::from(2)));
        assert!(set.push(Value::from(3)));
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn map_keys_are_unique() {
        let mut map = Node::map(vec![(Value::from("a"), Value::from(1))]);
        let previous = map.insert(Value::from("a"), Value::from(2));

        assert_eq!(previous, Some(Value::from(1)));
        assert_eq!(map.len(), 1);
        assert_eq!(map.get(&Value::from("a")), Some(&Value::from(2)));
    }

    #[test]
    fn empty_like_keeps_shape_and_drops_origin() {
        let list = Node::list(vec![Value::from(1)]).with_origin(Origin::MANAGED);
        let empty = list.empty_like();

        assert_eq!(empty.type_key(), &TypeKey::LIST);
        assert_eq!(empty.origin(), Origin::Plain);
        assert!(empty.is_empty());

        let array = Node::array(TypeKey::INT, vec![Value::from(1), Value::from(2)]);
        assert_eq!(array.empty_like().items(), Some(&[Value::Null, Value::Null][..]));
    }

    #[test]
    fn attributes_only_on_beans() {
        let mut list = Node::list(Vec::new());
        assert!(!list.set_attr("name", Value::from("x")));

        let bean = Node::bean("Person").with_attr("name", "Ann");
        assert_eq!(bean.attr("name"), Some(&Value::from("Ann")));
    }

    #[test]
    fn origin_flags() {
        let placeholder = Origin::Managed {
            proxy: true,
            loaded: false,
        };
        assert!(placeholder.is_managed());
        assert!(placeholder.is_proxy());
        assert!(!placeholder.is_loaded());
        assert!(Origin::Plain.is_loaded());
    }
}
