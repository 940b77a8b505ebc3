//! Error types for Graft Core
//!
//! Provides the failure taxonomy of a traversal:
//! - Missing identifiers and entities
//! - Lazy placeholder misuse
//! - Optimistic version conflicts
//! - Property read/write failures
//! - Backend, schema and configuration errors
//!
//! Every error aborts the traversal it occurs in. Nothing is retried or
//! swallowed; partially reconciled state must be discarded by the caller.

use graft_model::{TypeKey, Value};

/// Result alias for traversal operations
pub type Result<T> = std::result::Result<T, ReconcileError>;

/// Main traversal error type
#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    /// A detached object without identifier was applied by lookup
    #[error("cannot look up unsaved transient instance of {type_key}")]
    UnsavedTransientInstance {
        /// Type of the detached object
        type_key: TypeKey,
    },

    /// The authoritative side of a reconciliation has no identifier
    #[error("authoritative {type_key} has a null identifier")]
    NullIdentifier {
        /// Type of the authoritative object
        type_key: TypeKey,
    },

    /// The store holds no entity with the given identifier
    #[error("no {type_key} with identifier {id}")]
    EntityNotFound {
        /// Looked-up type
        type_key: TypeKey,
        /// Looked-up identifier
        id: Value,
    },

    /// An uninitialized placeholder was used where loaded data is required
    #[error("{type_key} is an uninitialized placeholder: {reason}")]
    LazyInitialization {
        /// Type of the placeholder
        type_key: TypeKey,
        /// What was attempted
        reason: String,
    },

    /// Detached and authoritative versions differ
    #[error("version mismatch on {type_key}.{property}: detached {detached}, authoritative {authoritative}")]
    OptimisticLock {
        /// Type of the entity
        type_key: TypeKey,
        /// Version property name
        property: String,
        /// Version carried by the detached copy
        detached: Value,
        /// Version held by the authoritative object
        authoritative: Value,
    },

    /// A declared property could not be read or written
    #[error(transparent)]
    PropertyAccess(#[from] PropertyAccessError),

    /// The store collaborator failed
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl ReconcileError {
    /// Check if the error is a version conflict
    #[inline]
    #[must_use]
    pub fn is_optimistic_lock(&self) -> bool {
        matches!(self, Self::OptimisticLock { .. })
    }

    /// Check if the error comes from touching an unloaded placeholder
    #[inline]
    #[must_use]
    pub fn is_lazy_initialization(&self) -> bool {
        matches!(self, Self::LazyInitialization { .. })
    }
}

/// Property read/write failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PropertyAccessError {
    /// The property is not declared for the type
    #[error("{type_key} has no property `{property}`")]
    UnknownProperty {
        /// Owning type
        type_key: TypeKey,
        /// Property name
        property: String,
    },

    /// The property has no read access
    #[error("property `{property}` of {type_key} is write-only")]
    NotReadable {
        /// Owning type
        type_key: TypeKey,
        /// Property name
        property: String,
    },

    /// The property has no write access
    #[error("property `{property}` of {type_key} is read-only")]
    NotWritable {
        /// Owning type
        type_key: TypeKey,
        /// Property name
        property: String,
    },

    /// A setter refused the value
    #[error("property `{property}` of {type_key} rejected value: {reason}")]
    Rejected {
        /// Owning type
        type_key: TypeKey,
        /// Property name
        property: String,
        /// Setter message
        reason: String,
    },

    /// The target is not a bean
    #[error("cannot access property `{property}` on non-bean {type_key}")]
    NotABean {
        /// Type of the target
        type_key: TypeKey,
        /// Property name
        property: String,
    },
}

/// Store collaborator failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The type is not a managed entity
    #[error("{0} is not a managed entity type")]
    UnmanagedType(TypeKey),

    /// The value is not an object
    #[error("expected an entity, found {0}")]
    NotAnEntity(String),

    /// An entity was persisted without identifier
    #[error("cannot persist {0} without identifier")]
    MissingIdentifier(TypeKey),

    /// Backend-specific failure
    #[error("backend failure: {0}")]
    Backend(String),
}

/// Schema build failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    /// A type was declared twice
    #[error("type {0} is declared more than once")]
    DuplicateType(TypeKey),

    /// A type names a parent that is never declared
    #[error("type {type_key} extends unknown type {parent}")]
    UnknownParent {
        /// Declaring type
        type_key: TypeKey,
        /// Missing parent
        parent: TypeKey,
    },

    /// A type is its own ancestor
    #[error("inheritance cycle through {0}")]
    InheritanceCycle(TypeKey),
}

/// Configuration failures
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration text could not be parsed
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),
}
