//! In-memory store
//!
//! Provides [`MemoryStore`], a reference [`Store`] keeping managed entities
//! in process memory. Useful for tests and for callers that reconcile
//! against an object cache rather than a database.

use crate::error::StoreError;
use crate::store::{EntityDescriptor, MetadataSource, Store};
use dashmap::DashMap;
use graft_model::{CollectionKind, Node, ObjectRef, Origin, TypeKey, Value};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, trace};

/// Origin of an unloaded proxy
const UNLOADED_PROXY: Origin = Origin::Managed {
    proxy: true,
    loaded: false,
};

/// Origin of an unloaded managed container
const UNLOADED_CONTAINER: Origin = Origin::Managed {
    proxy: false,
    loaded: false,
};

/// In-memory entity store
#[derive(Debug, Default)]
pub struct MemoryStore {
    descriptors: DashMap<TypeKey, Arc<EntityDescriptor>>,
    entities: RwLock<HashMap<TypeKey, Vec<ObjectRef>>>,
    removed: RwLock<Vec<ObjectRef>>,
    flushes: AtomicUsize,
}

impl MemoryStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With a managed entity type
    #[must_use]
    pub fn with_entity(self, descriptor: EntityDescriptor) -> Self {
        self.register(descriptor);
        self
    }

    /// Register a managed entity type
    pub fn register(&self, descriptor: EntityDescriptor) {
        debug!(type_key = %descriptor.type_key, id = %descriptor.id_property, "Registered entity type");
        self.descriptors
            .insert(descriptor.type_key.clone(), Arc::new(descriptor));
    }

    /// Take ownership of a bean as a loaded managed entity
    ///
    /// # Errors
    /// Fails if the type is not registered or the identifier is unset.
    pub fn persist(&self, node: Node) -> Result<ObjectRef, StoreError> {
        let obj = ObjectRef::new(node);
        self.persist_ref(&obj)?;
        Ok(obj)
    }

    /// Mark an existing object as a loaded managed entity
    ///
    /// # Errors
    /// Fails if the type is not registered or the identifier is unset.
    pub fn persist_ref(&self, obj: &ObjectRef) -> Result<(), StoreError> {
        let type_key = obj.type_key();
        let descriptor = self
            .entity(&type_key)
            .ok_or_else(|| StoreError::UnmanagedType(type_key.clone()))?;
        if self.identifier(&descriptor, obj)?.is_none() {
            return Err(StoreError::MissingIdentifier(type_key));
        }

        obj.write().set_origin(Origin::MANAGED);
        let mut entities = self.entities.write();
        let bucket = entities.entry(type_key).or_default();
        if !bucket.iter().any(|existing| existing.ptr_eq(obj)) {
            bucket.push(obj.clone());
        }
        Ok(())
    }

    /// Unloaded proxy standing in for an entity
    #[must_use]
    pub fn placeholder(type_key: impl Into<TypeKey>) -> ObjectRef {
        ObjectRef::new(Node::bean(type_key).with_origin(UNLOADED_PROXY))
    }

    /// Unloaded managed collection
    #[must_use]
    pub fn lazy_collection(kind: CollectionKind) -> ObjectRef {
        ObjectRef::new(Node::collection(kind.type_key(), kind, Vec::new()).with_origin(UNLOADED_CONTAINER))
    }

    /// Unloaded managed map
    #[must_use]
    pub fn lazy_map() -> ObjectRef {
        ObjectRef::new(Node::map(Vec::new()).with_origin(UNLOADED_CONTAINER))
    }

    /// Loaded managed container wrapping `node`
    #[must_use]
    pub fn managed(node: Node) -> ObjectRef {
        ObjectRef::new(node.with_origin(Origin::MANAGED))
    }

    /// Check whether the object is a stored entity
    #[must_use]
    pub fn contains(&self, obj: &ObjectRef) -> bool {
        self.entities
            .read()
            .get(&obj.type_key())
            .is_some_and(|bucket| bucket.iter().any(|existing| existing.ptr_eq(obj)))
    }

    /// Number of stored entities
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.read().values().map(Vec::len).sum()
    }

    /// Check for an empty store
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Entities removed so far, in removal order
    #[must_use]
    pub fn removed(&self) -> Vec<ObjectRef> {
        self.removed.read().clone()
    }

    /// Number of flushes so far
    #[must_use]
    pub fn flush_count(&self) -> usize {
        self.flushes.load(Ordering::Relaxed)
    }
}

impl MetadataSource for MemoryStore {
    fn entity(&self, type_key: &TypeKey) -> Option<Arc<EntityDescriptor>> {
        self.descriptors.get(type_key).map(|entry| Arc::clone(entry.value()))
    }
}

impl Store for MemoryStore {
    fn find(&self, type_key: &TypeKey, id: &Value) -> Result<Option<ObjectRef>, StoreError> {
        let descriptor = self
            .entity(type_key)
            .ok_or_else(|| StoreError::UnmanagedType(type_key.clone()))?;
        let entities = self.entities.read();
        let found = entities.get(type_key).and_then(|bucket| {
            bucket
                .iter()
                .find(|candidate| candidate.attr(&descriptor.id_property) == *id)
                .cloned()
        });
        trace!(type_key = %type_key, id = %id, found = found.is_some(), "Store lookup");
        Ok(found)
    }

    fn flush(&self) -> Result<(), StoreError> {
        self.flushes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn remove(&self, obj: &ObjectRef) -> Result<(), StoreError> {
        let type_key = obj.type_key();
        if self.entity(&type_key).is_none() {
            return Err(StoreError::UnmanagedType(type_key));
        }

        if let Some(bucket) = self.entities.write().get_mut(&type_key) {
            bucket.retain(|existing| !existing.ptr_eq(obj));
        }
        self.removed.write().push(obj.clone());
        debug!(entity = ?obj, "Removed entity");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> MemoryStore {
        MemoryStore::new().with_entity(EntityDescriptor::new("Employee", "id").with_version("version"))
    }

    #[test]
    fn persist_and_find() {
        let store = store();
        let ann = store
            .persist(Node::bean("Employee").with_attr("id", 1).with_attr("name", "Ann"))
            .unwrap();

        let found = store.find(&"Employee".into(), &Value::from(1)).unwrap().unwrap();
        assert!(found.ptr_eq(&ann));
        assert!(store.find(&"Employee".into(), &Value::from(2)).unwrap().is_none());
        assert_eq!(ann.read().origin(), Origin::MANAGED);
    }

    #[test]
    fn persist_requires_identifier_and_registration() {
        let store = store();
        assert_eq!(
            store.persist(Node::bean("Employee")).unwrap_err(),
            StoreError::MissingIdentifier("Employee".into())
        );
        assert_eq!(
            store.persist(Node::bean("Robot").with_attr("id", 1)).unwrap_err(),
            StoreError::UnmanagedType("Robot".into())
        );
    }

    #[test]
    fn remove_tracks_entities() {
        let store = store();
        let ann = store.persist(Node::bean("Employee").with_attr("id", 1)).unwrap();

        store.remove(&ann).unwrap();

        assert!(!store.contains(&ann));
        assert!(store.is_empty());
        assert_eq!(store.removed().len(), 1);
    }

    #[test]
    fn default_flags_follow_origin() {
        let store = store();
        let proxy = MemoryStore::placeholder("Employee");
        let lazy = MemoryStore::lazy_collection(CollectionKind::Set);
        let loaded = MemoryStore::managed(Node::list(Vec::new()));

        assert!(store.is_proxy(&proxy));
        assert!(!store.is_initialized(&Value::from(proxy)));
        assert!(store.is_managed_placeholder(&Value::from(lazy.clone())));
        assert!(!store.is_initialized(&Value::from(lazy)));
        assert!(store.is_managed_placeholder(&Value::from(loaded.clone())));
        assert!(store.is_initialized(&Value::from(loaded)));
        assert!(store.is_initialized(&Value::from(3)));
    }
}
