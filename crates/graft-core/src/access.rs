//! Uniform property access over [`ObjectMetadata`]

use crate::error::PropertyAccessError;
use crate::metadata::{AccessKind, ObjectMetadata};
use graft_model::{ObjectRef, Value};
use tracing::trace;

/// Reads and writes declared properties of one object
///
/// Field properties touch the raw attribute state; accessor properties go
/// through their getter or setter. The node lock is held only for the
/// duration of a single read or write.
#[derive(Debug, Clone, Copy)]
pub struct PropertyAccessor<'a> {
    target: &'a ObjectRef,
    metadata: &'a ObjectMetadata,
}

impl<'a> PropertyAccessor<'a> {
    /// Bind metadata to a target
    #[inline]
    #[must_use]
    pub fn new(target: &'a ObjectRef, metadata: &'a ObjectMetadata) -> Self {
        Self { target, metadata }
    }

    /// Declared property names
    pub fn property_names(&self) -> impl Iterator<Item = &'a str> {
        self.metadata.property_names()
    }

    fn access(&self, name: &str) -> Result<&'a AccessKind, PropertyAccessError> {
        self.metadata
            .access(name)
            .ok_or_else(|| PropertyAccessError::UnknownProperty {
                type_key: self.target.type_key(),
                property: name.to_string(),
            })
    }

    /// Read a property
    ///
    /// # Errors
    /// Fails if the property is undeclared or write-only, or the target is
    /// not a bean.
    pub fn get(&self, name: &str) -> Result<Value, PropertyAccessError> {
        let access = self.access(name)?;
        let node = self.target.read();
        if node.attributes().is_none() {
            return Err(PropertyAccessError::NotABean {
                type_key: node.type_key().clone(),
                property: name.to_string(),
            });
        }

        let value = match access {
            AccessKind::Field => node.attr(name).cloned().unwrap_or_default(),
            AccessKind::Accessor {
                getter: Some(getter),
                ..
            } => getter(&*node),
            AccessKind::Accessor { getter: None, .. } => {
                return Err(PropertyAccessError::NotReadable {
                    type_key: node.type_key().clone(),
                    property: name.to_string(),
                })
            }
        };
        trace!(target_type = %node.type_key(), property = name, "Read property");
        Ok(value)
    }

    /// Write a property
    ///
    /// # Errors
    /// Fails if the property is undeclared or read-only, the target is not a
    /// bean, or the setter rejects the value.
    pub fn set(&self, name: &str, value: Value) -> Result<(), PropertyAccessError> {
        let access = self.access(name)?;
        let mut node = self.target.write();
        if node.attributes().is_none() {
            return Err(PropertyAccessError::NotABean {
                type_key: node.type_key().clone(),
                property: name.to_string(),
            });
        }

        match access {
            AccessKind::Field => {
                node.set_attr(name, value);
            }
            AccessKind::Accessor {
                setter: Some(setter),
                ..
            } => {
                setter(&mut *node, value).map_err(|reason| PropertyAccessError::Rejected {
                    type_key: node.type_key().clone(),
                    property: name.to_string(),
                    reason,
                })?;
            }
            AccessKind::Accessor { setter: None, .. } => {
                return Err(PropertyAccessError::NotWritable {
                    type_key: node.type_key().clone(),
                    property: name.to_string(),
                })
            }
        }
        trace!(target_type = %node.type_key(), property = name, "Wrote property");
        Ok(())
    }
}
