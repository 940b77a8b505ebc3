//! Positional handler for fixed-length arrays

use super::Handler;
use crate::error::Result;
use crate::walker::Traversal;
use graft_model::{NodeData, ObjectRef, TypeKey, Value};

/// Handler for fixed-length arrays
///
/// Registered through a predicate matching every `[]component` type.
/// Elements of scalar component types are copied, not traversed.
/// Reconciling onto an authoritative array pairs elements by position and
/// only touches the overlapping prefix.
#[derive(Debug, Clone, Default)]
pub struct ArrayHandler;

impl ArrayHandler {
    /// Create the handler
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Predicate used for dynamic registration
    #[must_use]
    pub fn supports(type_key: &TypeKey) -> bool {
        type_key.is_array()
    }
}

fn has_scalar_component(obj: &ObjectRef) -> bool {
    matches!(obj.read().data(), NodeData::Array { component, .. } if component.is_scalar())
}

impl Handler for ArrayHandler {
    fn name(&self) -> &'static str {
        "array"
    }

    fn create_empty(&self, template: &Value) -> Value {
        template
            .as_object()
            .map_or_else(|| template.clone(), |obj| Value::object(obj.read().empty_like()))
    }

    fn disconnect(&self, cx: &mut Traversal<'_>, source: &Value) -> Result<Value> {
        let Some(obj) = source.as_object() else {
            return Ok(source.clone());
        };
        let copy = ObjectRef::new(obj.read().empty_like());
        cx.record(obj, Value::from(copy.clone()));

        let items = obj.items();
        if has_scalar_component(obj) {
            copy.write().set_items(items);
            return Ok(Value::from(copy));
        }
        for (index, element) in items.iter().enumerate() {
            let detached = cx.disconnect(element)?;
            copy.write().set_item(index, detached);
        }
        Ok(Value::from(copy))
    }

    fn apply(&self, cx: &mut Traversal<'_>, detached: &Value) -> Result<Value> {
        let Some(obj) = detached.as_object() else {
            return Ok(detached.clone());
        };
        let container = ObjectRef::new(obj.read().empty_like());
        cx.record(obj, Value::from(container.clone()));

        let items = obj.items();
        if has_scalar_component(obj) {
            container.write().set_items(items);
            return Ok(Value::from(container));
        }
        for (index, element) in items.iter().enumerate() {
            let applied = cx.apply(element)?;
            container.write().set_item(index, applied);
        }
        Ok(Value::from(container))
    }

    fn apply_to(
        &self,
        cx: &mut Traversal<'_>,
        detached: &Value,
        authoritative: &Value,
    ) -> Result<Value> {
        let (Some(tr), Some(db)) = (detached.as_object(), authoritative.as_object()) else {
            return Ok(authoritative.clone());
        };

        let scalar = has_scalar_component(tr);
        let tr_items = tr.items();
        let db_items = db.items();
        for (index, (element, current)) in tr_items.iter().zip(&db_items).enumerate() {
            let merged = if element.is_null() || scalar {
                element.clone()
            } else {
                cx.reconcile(element, current)?
            };
            db.write().set_item(index, merged);
        }
        Ok(authoritative.clone())
    }
}
