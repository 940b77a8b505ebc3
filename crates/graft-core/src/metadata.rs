//! Object metadata
//!
//! Provides the per-type property list walked by the generic traversal:
//! - [`AccessKind`]: raw field access or getter/setter closures
//! - [`ObjectMetadata`]: ordered property names with their access kind
//! - [`MetadataResolver`]: where metadata for a type comes from
//! - [`MetadataCache`]: shared, lazily filled cache over a resolver

use dashmap::DashMap;
use graft_model::{Node, ObjectRef, TypeKey, Value};
use indexmap::IndexMap;
use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;
use tracing::debug;

/// Reads a derived property from a node
pub type Getter = Arc<dyn Fn(&Node) -> Value + Send + Sync>;

/// Writes a property through validation; `Err` carries the rejection reason
pub type Setter = Arc<dyn Fn(&mut Node, Value) -> Result<(), String> + Send + Sync>;

/// How a property is read and written
#[derive(Clone, Default)]
pub enum AccessKind {
    /// Raw attribute state, bypassing any derived logic
    #[default]
    Field,
    /// Getter/setter pair; a missing side makes the property read- or write-only
    Accessor {
        /// Read access
        getter: Option<Getter>,
        /// Write access
        setter: Option<Setter>,
    },
}

impl AccessKind {
    /// Read/write accessor
    #[must_use]
    pub fn accessor<G, S>(getter: G, setter: S) -> Self
    where
        G: Fn(&Node) -> Value + Send + Sync + 'static,
        S: Fn(&mut Node, Value) -> Result<(), String> + Send + Sync + 'static,
    {
        Self::Accessor {
            getter: Some(Arc::new(getter)),
            setter: Some(Arc::new(setter)),
        }
    }

    /// Getter without setter
    #[must_use]
    pub fn read_only<G>(getter: G) -> Self
    where
        G: Fn(&Node) -> Value + Send + Sync + 'static,
    {
        Self::Accessor {
            getter: Some(Arc::new(getter)),
            setter: None,
        }
    }

    /// Setter without getter
    #[must_use]
    pub fn write_only<S>(setter: S) -> Self
    where
        S: Fn(&mut Node, Value) -> Result<(), String> + Send + Sync + 'static,
    {
        Self::Accessor {
            getter: None,
            setter: Some(Arc::new(setter)),
        }
    }

    /// Check for read access
    #[must_use]
    pub fn is_readable(&self) -> bool {
        match self {
            Self::Field => true,
            Self::Accessor { getter, .. } => getter.is_some(),
        }
    }

    /// Check for write access
    #[must_use]
    pub fn is_writable(&self) -> bool {
        match self {
            Self::Field => true,
            Self::Accessor { setter, .. } => setter.is_some(),
        }
    }
}

impl Debug for AccessKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Field => f.write_str("Field"),
            Self::Accessor { getter, setter } => f
                .debug_struct("Accessor")
                .field("readable", &getter.is_some())
                .field("writable", &setter.is_some())
                .finish(),
        }
    }
}

/// Immutable property list of a type
///
/// # Example
/// ```
/// use graft_core::{AccessKind, ObjectMetadata};
///
/// let metadata = ObjectMetadata::new("Employee")
///     .with_properties(&AccessKind::Field, ["id", "name", "secret"])
///     .without_property("secret");
///
/// assert_eq!(metadata.property_names().collect::<Vec<_>>(), ["id", "name"]);
/// ```
#[derive(Debug, Clone)]
pub struct ObjectMetadata {
    type_key: TypeKey,
    properties: IndexMap<String, AccessKind>,
}

impl ObjectMetadata {
    /// Metadata without properties
    #[must_use]
    pub fn new(type_key: impl Into<TypeKey>) -> Self {
        Self {
            type_key: type_key.into(),
            properties: IndexMap::new(),
        }
    }

    /// Field-access metadata for the current attributes of a bean
    #[must_use]
    pub fn introspect(node: &Node) -> Self {
        let properties = node
            .attributes()
            .map(|attrs| attrs.keys().map(|name| (name.clone(), AccessKind::Field)).collect())
            .unwrap_or_default();
        Self {
            type_key: node.type_key().clone(),
            properties,
        }
    }

    /// Add or replace one property
    #[must_use]
    pub fn with_property(mut self, name: impl Into<String>, kind: AccessKind) -> Self {
        self.properties.insert(name.into(), kind);
        self
    }

    /// Add or replace several properties sharing an access kind
    #[must_use]
    pub fn with_properties<I, S>(mut self, kind: &AccessKind, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for name in names {
            self.properties.insert(name.into(), kind.clone());
        }
        self
    }

    /// Drop a property, keeping the order of the rest
    #[must_use]
    pub fn without_property(mut self, name: &str) -> Self {
        self.properties.shift_remove(name);
        self
    }

    /// Described type
    #[inline]
    #[must_use]
    pub fn type_key(&self) -> &TypeKey {
        &self.type_key
    }

    /// Access kind of a property
    #[inline]
    #[must_use]
    pub fn access(&self, name: &str) -> Option<&AccessKind> {
        self.properties.get(name)
    }

    /// Check whether a property is declared
    #[inline]
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.properties.contains_key(name)
    }

    /// Property names in declaration order
    pub fn property_names(&self) -> impl Iterator<Item = &str> {
        self.properties.keys().map(String::as_str)
    }

    /// Properties with their access kind
    pub fn properties(&self) -> impl Iterator<Item = (&str, &AccessKind)> {
        self.properties.iter().map(|(name, kind)| (name.as_str(), kind))
    }

    /// Number of properties
    #[must_use]
    pub fn len(&self) -> usize {
        self.properties.len()
    }

    /// Check for an empty property list
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}

/// Source of per-type metadata
pub trait MetadataResolver: Send + Sync + Debug {
    /// Metadata of a type, or `None` if the type is unknown
    fn resolve(&self, type_key: &TypeKey) -> Option<ObjectMetadata>;
}

/// Shared metadata cache
///
/// Entries are computed on first use and never invalidated. Concurrent
/// misses may resolve the same type twice; the overwrite is idempotent.
#[derive(Debug)]
pub struct MetadataCache {
    resolver: Arc<dyn MetadataResolver>,
    entries: DashMap<TypeKey, Arc<ObjectMetadata>>,
}

impl MetadataCache {
    /// Create an empty cache over a resolver
    #[must_use]
    pub fn new(resolver: Arc<dyn MetadataResolver>) -> Self {
        Self {
            resolver,
            entries: DashMap::new(),
        }
    }

    /// Metadata of a known type
    #[must_use]
    pub fn get(&self, type_key: &TypeKey) -> Option<Arc<ObjectMetadata>> {
        if let Some(hit) = self.entries.get(type_key) {
            return Some(Arc::clone(hit.value()));
        }

        let resolved = Arc::new(self.resolver.resolve(type_key)?);
        debug!(type_key = %type_key, properties = resolved.len(), "Resolved object metadata");
        self.entries.insert(type_key.clone(), Arc::clone(&resolved));
        Some(resolved)
    }

    /// Metadata of an object
    ///
    /// Beans of types unknown to the resolver are introspected from their
    /// current attributes; that result depends on the instance and is not
    /// cached.
    #[must_use]
    pub fn for_object(&self, obj: &ObjectRef) -> Option<Arc<ObjectMetadata>> {
        let type_key = obj.type_key();
        self.get(&type_key).or_else(|| {
            let node = obj.read();
            let introspected = node
                .attributes()
                .is_some()
                .then(|| Arc::new(ObjectMetadata::introspect(&node)));
            introspected
        })
    }

    /// Number of cached types
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check for an empty cache
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
