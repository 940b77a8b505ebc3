//! Identity graph walker
//!
//! Provides [`Walker`], the disconnect/apply engine, and [`Traversal`], the
//! state of one top-level call.
//!
//! Every top-level call owns a fresh [`AdjacencyMap`]. A source object is
//! recorded before its properties or elements are visited, which is what
//! makes cyclic graphs terminate and keeps shared references shared.
//! Values with a registered [`Handler`] are delegated to it; everything
//! else goes through the generic per-property traversal driven by
//! [`ObjectMetadata`].

use crate::access::PropertyAccessor;
use crate::adjacency::AdjacencyMap;
use crate::config::WalkerConfig;
use crate::error::{ReconcileError, Result};
use crate::handler::Handler;
use crate::metadata::{MetadataCache, ObjectMetadata};
use crate::registry::HandlerRegistry;
use crate::schema::SchemaRegistry;
use crate::store::Store;
use graft_model::{ObjectRef, TypeKey, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, trace};

/// Disconnect/apply engine
///
/// Cheap to share; all state of a call lives in its [`Traversal`].
///
/// # Example
/// ```
/// use graft_core::{EntityDescriptor, MemoryStore, SchemaBuilder, Walker};
/// use graft_model::{Node, Value};
/// use std::sync::Arc;
///
/// let mut schema = SchemaBuilder::new();
/// schema.add_type("Employee").fields(["id", "name"]).done()?;
/// let store = Arc::new(MemoryStore::new().with_entity(EntityDescriptor::new("Employee", "id")));
/// let ann = store.persist(Node::bean("Employee").with_attr("id", 1).with_attr("name", "Ann"))?;
///
/// let walker = Walker::new(store.clone(), Arc::new(schema.build()?))
///     .with_config(graft_core::WalkerConfig::new().with_clone_objects(true));
/// let copy = walker.disconnect(&Value::from(ann.clone()))?;
/// copy.as_object().unwrap().set_attr("name", "Anna");
///
/// walker.apply(&copy)?;
/// assert_eq!(ann.attr("name"), Value::from("Anna"));
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone)]
pub struct Walker {
    store: Arc<dyn Store>,
    schema: Arc<SchemaRegistry>,
    registry: Arc<HandlerRegistry>,
    metadata: Arc<MetadataCache>,
    config: WalkerConfig,
}

impl Walker {
    /// Create a walker with the built-in handlers and default configuration
    #[must_use]
    pub fn new(store: Arc<dyn Store>, schema: Arc<SchemaRegistry>) -> Self {
        Self {
            registry: Arc::new(HandlerRegistry::with_defaults(schema.clone())),
            metadata: Arc::new(MetadataCache::new(schema.clone())),
            store,
            schema,
            config: WalkerConfig::default(),
        }
    }

    /// With configuration
    #[inline]
    #[must_use]
    pub fn with_config(mut self, config: WalkerConfig) -> Self {
        self.config = config;
        self
    }

    /// With a shared handler registry
    #[inline]
    #[must_use]
    pub fn with_registry(mut self, registry: Arc<HandlerRegistry>) -> Self {
        self.registry = registry;
        self
    }

    /// With a shared metadata cache
    #[inline]
    #[must_use]
    pub fn with_metadata_cache(mut self, metadata: Arc<MetadataCache>) -> Self {
        self.metadata = metadata;
        self
    }

    /// Configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &WalkerConfig {
        &self.config
    }

    /// Handler registry
    #[inline]
    #[must_use]
    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    /// Metadata cache
    #[inline]
    #[must_use]
    pub fn metadata(&self) -> &MetadataCache {
        &self.metadata
    }

    /// Store collaborator
    #[inline]
    #[must_use]
    pub fn store(&self) -> &dyn Store {
        self.store.as_ref()
    }

    /// Schema registry
    #[inline]
    #[must_use]
    pub fn schema(&self) -> &SchemaRegistry {
        &self.schema
    }

    /// Start a traversal, e.g. to attach per-call metadata overrides
    #[must_use]
    pub fn traversal(&self) -> Traversal<'_> {
        Traversal::new(self)
    }

    /// Detach a graph from the store
    ///
    /// # Errors
    /// Property access and store failures abort the traversal.
    pub fn disconnect(&self, value: &Value) -> Result<Value> {
        self.traversal().disconnect(value)
    }

    /// Reconcile a detached graph, looking up its authoritative counterpart
    ///
    /// # Errors
    /// See [`Traversal::apply`].
    pub fn apply(&self, detached: &Value) -> Result<Value> {
        self.traversal().apply(detached)
    }

    /// Reconcile a detached graph onto a known authoritative counterpart
    ///
    /// Returns `authoritative` unchanged if either side is null.
    ///
    /// # Errors
    /// See [`Traversal::apply_to`].
    pub fn apply_to(&self, detached: &Value, authoritative: &Value) -> Result<Value> {
        self.traversal().apply_to(detached, authoritative)
    }

    /// Reconcile onto the object produced by `lookup`
    ///
    /// The lookup is skipped for a null `detached` value.
    ///
    /// # Errors
    /// Errors of `lookup` and of [`Traversal::apply_to`].
    pub fn apply_with<F>(&self, detached: &Value, lookup: F) -> Result<Value>
    where
        F: FnOnce(&dyn Store) -> Result<Value>,
    {
        let authoritative = if detached.is_null() {
            Value::Null
        } else {
            lookup(self.store())?
        };
        self.apply_to(detached, &authoritative)
    }
}

/// State of one top-level disconnect or apply call
#[derive(Debug)]
pub struct Traversal<'w> {
    walker: &'w Walker,
    adjacency: AdjacencyMap,
    overrides: HashMap<TypeKey, Arc<ObjectMetadata>>,
}

impl<'w> Traversal<'w> {
    /// Fresh traversal without visited objects
    #[must_use]
    pub fn new(walker: &'w Walker) -> Self {
        Self {
            walker,
            adjacency: AdjacencyMap::new(),
            overrides: HashMap::new(),
        }
    }

    /// Use custom metadata for its type during this traversal only
    #[must_use]
    pub fn with_metadata(mut self, metadata: ObjectMetadata) -> Self {
        debug!(type_key = %metadata.type_key(), "Using custom object metadata");
        self.overrides
            .insert(metadata.type_key().clone(), Arc::new(metadata));
        self
    }

    /// Owning walker
    #[inline]
    #[must_use]
    pub fn walker(&self) -> &'w Walker {
        self.walker
    }

    /// Store collaborator
    #[inline]
    #[must_use]
    pub fn store(&self) -> &'w dyn Store {
        self.walker.store()
    }

    /// Schema registry
    #[inline]
    #[must_use]
    pub fn schema(&self) -> &'w SchemaRegistry {
        self.walker.schema()
    }

    /// Configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &'w WalkerConfig {
        self.walker.config()
    }

    /// Visited objects so far
    #[inline]
    #[must_use]
    pub fn adjacency(&self) -> &AdjacencyMap {
        &self.adjacency
    }

    /// Record the counterpart of a source object
    pub fn record(&mut self, source: &ObjectRef, target: Value) {
        self.adjacency.insert(source, target);
    }

    /// Metadata of an object, per-call overrides first
    #[must_use]
    pub fn metadata_for(&self, obj: &ObjectRef) -> Option<Arc<ObjectMetadata>> {
        let type_key = obj.type_key();
        if let Some(custom) = self.overrides.get(&type_key) {
            return Some(Arc::clone(custom));
        }
        self.walker.metadata().for_object(obj)
    }

    /// Handler for the value's type, or for its container shape
    fn handler(&self, value: &Value) -> Option<(TypeKey, Arc<dyn Handler>)> {
        let type_key = value.type_key()?;
        let registry = self.walker.registry();
        if let Some(handler) = registry.get_handler(&type_key) {
            return Some((type_key, handler));
        }
        let shape = value.as_object().and_then(|obj| obj.read().shape_key())?;
        trace!(type_key = %type_key, shape = %shape, "Falling back to container shape handler");
        let handler = registry.get_handler(&shape)?;
        Some((type_key, handler))
    }

    /// Produce a detached counterpart of `value`
    ///
    /// # Errors
    /// Property access and store failures.
    pub fn disconnect(&mut self, value: &Value) -> Result<Value> {
        if value.is_null() {
            return Ok(Value::Null);
        }
        if let Some(mapped) = value.as_object().and_then(|obj| self.adjacency.get(obj)) {
            return Ok(mapped.clone());
        }

        if let Some((type_key, handler)) = self.handler(value) {
            debug!(handler = handler.name(), type_key = %type_key, "Invoking handler for disconnect");
            return handler.disconnect(self, value);
        }
        let Some(source) = value.as_object() else {
            return Ok(value.clone());
        };
        self.disconnect_object(source)
    }

    fn disconnect_object(&mut self, source: &ObjectRef) -> Result<Value> {
        let store = self.store();
        let config = self.config();

        let target = if config.clone_objects || store.is_proxy(source) {
            ObjectRef::new(source.read().empty_like())
        } else {
            source.clone()
        };
        self.record(source, Value::from(target.clone()));

        if config.flush_automatically {
            trace!("Flushing store");
            store.flush()?;
        }

        let Some(metadata) = self.metadata_for(source) else {
            return Ok(Value::from(target));
        };
        let type_key = source.type_key();
        let reader = PropertyAccessor::new(source, &metadata);
        let writer = PropertyAccessor::new(&target, &metadata);

        for name in metadata.property_names() {
            let value = reader.get(name)?;
            let detached = if value.is_null() {
                Value::Null
            } else if store.is_initialized(&value) {
                debug!(property = name, type_key = %type_key, "Disconnecting property");
                self.disconnect(&value)?
            } else if store.is_managed_placeholder(&value) && config.create_empty_collections {
                trace!(property = name, type_key = %type_key, "Replacing unloaded container with empty one");
                value
                    .as_object()
                    .map_or(Value::Null, |obj| Value::object(obj.read().empty_like()))
            } else {
                trace!(property = name, type_key = %type_key, "Dropping unloaded value");
                Value::Null
            };
            writer.set(name, detached)?;
        }
        Ok(Value::from(target))
    }

    /// Reconcile `detached`, looking up its authoritative counterpart
    ///
    /// Values with a handler are delegated to it; objects of unmanaged
    /// types are returned unchanged.
    ///
    /// # Errors
    /// - [`ReconcileError::UnsavedTransientInstance`] if the entity has no identifier
    /// - [`ReconcileError::EntityNotFound`] if the store has no such entity
    /// - any error of [`Traversal::apply_to`]
    pub fn apply(&mut self, detached: &Value) -> Result<Value> {
        if detached.is_null() {
            return Ok(Value::Null);
        }
        if let Some(mapped) = detached.as_object().and_then(|obj| self.adjacency.get(obj)) {
            return Ok(mapped.clone());
        }

        if let Some((type_key, handler)) = self.handler(detached) {
            debug!(handler = handler.name(), type_key = %type_key, "Invoking handler for apply");
            return handler.apply(self, detached);
        }
        let Some(obj) = detached.as_object() else {
            return Ok(detached.clone());
        };

        let store = self.store();
        let type_key = obj.type_key();
        let Some(descriptor) = store.entity(&type_key) else {
            trace!(type_key = %type_key, "Skipping object without entity metadata");
            self.record(obj, detached.clone());
            return Ok(detached.clone());
        };
        let id = store
            .identifier(&descriptor, obj)?
            .ok_or_else(|| ReconcileError::UnsavedTransientInstance {
                type_key: type_key.clone(),
            })?;

        debug!(type_key = %type_key, id = %id, "Looking up authoritative entity");
        let authoritative = store
            .find(&type_key, &id)?
            .ok_or(ReconcileError::EntityNotFound { type_key, id })?;
        self.apply_to(detached, &Value::from(authoritative))
    }

    /// Reconcile `detached` onto `authoritative`
    ///
    /// Returns `authoritative` unchanged if either side is null.
    ///
    /// # Errors
    /// - [`ReconcileError::NullIdentifier`] if the authoritative entity has no identifier
    /// - [`ReconcileError::LazyInitialization`] if it is an unloaded placeholder
    /// - [`ReconcileError::OptimisticLock`] on a version mismatch
    /// - [`ReconcileError::PropertyAccess`] on any read or write failure
    pub fn apply_to(&mut self, detached: &Value, authoritative: &Value) -> Result<Value> {
        if detached.is_null() || authoritative.is_null() {
            return Ok(authoritative.clone());
        }
        if let Some(obj) = detached.as_object() {
            if let Some(mapped) = self.adjacency.get(obj) {
                return Ok(mapped.clone());
            }
            self.record(obj, authoritative.clone());
        }

        if let Some((type_key, handler)) = self.handler(detached) {
            debug!(handler = handler.name(), type_key = %type_key, "Invoking handler for apply");
            return handler.apply_to(self, detached, authoritative);
        }
        let (Some(tr), Some(db)) = (detached.as_object(), authoritative.as_object()) else {
            return Ok(detached.clone());
        };
        self.apply_object(tr, db, detached, authoritative)
    }

    fn apply_object(
        &mut self,
        tr: &ObjectRef,
        db: &ObjectRef,
        detached: &Value,
        authoritative: &Value,
    ) -> Result<Value> {
        let store = self.store();
        let config = self.config();
        let type_key = db.type_key();

        let Some(descriptor) = store.entity(&type_key) else {
            trace!(type_key = %type_key, "Skipping object without entity metadata");
            return Ok(detached.clone());
        };
        if tr.ptr_eq(db) {
            trace!(type_key = %type_key, "Detached and authoritative object are the same");
            return Ok(authoritative.clone());
        }

        let id = store.identifier(&descriptor, db)?.ok_or_else(|| {
            ReconcileError::NullIdentifier {
                type_key: type_key.clone(),
            }
        })?;
        if !store.is_initialized(authoritative) {
            return Err(ReconcileError::LazyInitialization {
                type_key,
                reason: format!("entity {id} is not loaded"),
            });
        }

        let metadata = self
            .metadata_for(db)
            .unwrap_or_else(|| Arc::new(ObjectMetadata::new(type_key.clone())));
        let reader = PropertyAccessor::new(tr, &metadata);
        let writer = PropertyAccessor::new(db, &metadata);

        let version_property = store.version_property(&descriptor);
        if config.check_version && store.is_versioned(&descriptor) {
            if let Some(property) = version_property {
                trace!(type_key = %type_key, property, "Checking version");
                let current = read_version(&writer, db, property)?;
                let carried = read_version(&reader, tr, property)?;
                if !current.is_null() && current != carried {
                    return Err(ReconcileError::OptimisticLock {
                        type_key,
                        property: property.to_string(),
                        detached: carried,
                        authoritative: current,
                    });
                }
            }
        }

        for name in metadata.property_names() {
            if config.check_version && version_property == Some(name) {
                continue;
            }
            let tr_value = reader.get(name)?;
            let db_value = writer.get(name)?;
            if tr_value.is_null() || tr_value == db_value {
                trace!(property = name, type_key = %type_key, "Property unchanged");
                continue;
            }

            debug!(property = name, type_key = %type_key, "Applying property");
            let merged = self.reconcile(&tr_value, &db_value)?;
            if merged != db_value {
                writer.set(name, merged)?;
            }
        }
        Ok(authoritative.clone())
    }

    /// Reconcile a nested value, with or without a known counterpart
    ///
    /// Uses [`Traversal::apply`] when `authoritative` is null and
    /// [`Traversal::apply_to`] otherwise.
    ///
    /// # Errors
    /// See [`Traversal::apply`] and [`Traversal::apply_to`].
    pub fn reconcile(&mut self, detached: &Value, authoritative: &Value) -> Result<Value> {
        if authoritative.is_null() {
            self.apply(detached)
        } else {
            self.apply_to(detached, authoritative)
        }
    }
}

/// Read a version through metadata, or raw when it is not declared
fn read_version(accessor: &PropertyAccessor<'_>, obj: &ObjectRef, property: &str) -> Result<Value> {
    if accessor.property_names().any(|name| name == property) {
        Ok(accessor.get(property)?)
    } else {
        Ok(obj.attr(property))
    }
}
