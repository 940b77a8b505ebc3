//! Store collaborator
//!
//! Provides the interface the walker consumes from a persistence backend:
//! entity descriptors, identifier and version extraction, lookup by
//! identifier, placeholder detection, flush and removal.
//!
//! Default method bodies derive placeholder flags from the node [`Origin`]
//! and read identifiers as raw attributes, which is all most backends need.
//!
//! [`Origin`]: graft_model::Origin

use crate::error::StoreError;
use graft_model::{ObjectRef, TypeKey, Value};
use std::fmt::Debug;
use std::sync::Arc;

/// Managed entity description
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityDescriptor {
    /// Entity type
    pub type_key: TypeKey,
    /// Identifier property
    pub id_property: String,
    /// Version property of versioned entities
    pub version_property: Option<String>,
}

impl EntityDescriptor {
    /// Unversioned entity
    #[must_use]
    pub fn new(type_key: impl Into<TypeKey>, id_property: impl Into<String>) -> Self {
        Self {
            type_key: type_key.into(),
            id_property: id_property.into(),
            version_property: None,
        }
    }

    /// With a version property
    #[inline]
    #[must_use]
    pub fn with_version(mut self, property: impl Into<String>) -> Self {
        self.version_property = Some(property.into());
        self
    }
}

/// Source of entity descriptors
pub trait MetadataSource: Send + Sync + Debug {
    /// Descriptor of a managed type, `None` if the type is not reconcilable
    fn entity(&self, type_key: &TypeKey) -> Option<Arc<EntityDescriptor>>;
}

/// Persistence backend consumed by the walker
///
/// Calls are synchronous and may block.
pub trait Store: MetadataSource {
    /// Look up an entity by identifier
    ///
    /// # Errors
    /// Backend failures.
    fn find(&self, type_key: &TypeKey, id: &Value) -> Result<Option<ObjectRef>, StoreError>;

    /// Identifier of an entity, `None` if unset
    ///
    /// # Errors
    /// Backend failures.
    fn identifier(
        &self,
        descriptor: &EntityDescriptor,
        obj: &ObjectRef,
    ) -> Result<Option<Value>, StoreError> {
        let id = obj.attr(&descriptor.id_property);
        Ok((!id.is_null()).then_some(id))
    }

    /// Check whether the entity carries a version
    fn is_versioned(&self, descriptor: &EntityDescriptor) -> bool {
        descriptor.version_property.is_some()
    }

    /// Version property name
    fn version_property<'d>(&self, descriptor: &'d EntityDescriptor) -> Option<&'d str> {
        descriptor.version_property.as_deref()
    }

    /// Check whether a value is loaded (non-objects always are)
    fn is_initialized(&self, value: &Value) -> bool {
        value
            .as_object()
            .map_or(true, |obj| obj.read().origin().is_loaded())
    }

    /// Check whether a value is a backend-managed collection or map
    fn is_managed_placeholder(&self, value: &Value) -> bool {
        value.as_object().is_some_and(|obj| {
            let node = obj.read();
            node.origin().is_managed() && node.is_container()
        })
    }

    /// Check whether an object is a backend-generated proxy
    fn is_proxy(&self, obj: &ObjectRef) -> bool {
        obj.read().origin().is_proxy()
    }

    /// Synchronise pending state with the backend
    ///
    /// # Errors
    /// Backend failures.
    fn flush(&self) -> Result<(), StoreError> {
        Ok(())
    }

    /// Delete a managed entity
    ///
    /// # Errors
    /// Backend failures or an object that is not a managed entity.
    fn remove(&self, obj: &ObjectRef) -> Result<(), StoreError>;
}
