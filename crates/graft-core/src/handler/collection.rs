//! List and set handler with pendant-based reconciliation

use super::pendant::{find_pendant, remove_unmatched};
use super::Handler;
use crate::error::{ReconcileError, Result};
use crate::walker::Traversal;
use graft_model::{ObjectRef, TypeKey, Value};
use tracing::trace;

/// Handler for lists and sets
///
/// Reconciling onto an authoritative collection matches every detached
/// element to its pendant, then clears the authoritative collection and
/// refills it in detached iteration order. The original authoritative order
/// is not preserved.
#[derive(Debug, Clone)]
pub struct CollectionHandler {
    types: Vec<TypeKey>,
}

impl CollectionHandler {
    /// Handler for the built-in list and set types
    #[must_use]
    pub fn new() -> Self {
        Self {
            types: vec![TypeKey::LIST, TypeKey::SET],
        }
    }

    /// With additional collection types
    #[must_use]
    pub fn with_types<I, T>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<TypeKey>,
    {
        self.types.extend(types.into_iter().map(Into::into));
        self
    }
}

impl Default for CollectionHandler {
    fn default() -> Self {
        Self::new()
    }
}

/// Lazy container guard shared by collections and maps
///
/// An unloaded authoritative container may only be "reconciled" with itself
/// or with an empty detached one; anything else would need its content.
pub(super) fn guard_unloaded(
    cx: &Traversal<'_>,
    detached: &ObjectRef,
    authoritative: &Value,
) -> Result<Option<Value>> {
    let store = cx.store();
    if !store.is_managed_placeholder(authoritative) || store.is_initialized(authoritative) {
        return Ok(None);
    }
    let Some(db) = authoritative.as_object() else {
        return Ok(None);
    };
    if !detached.ptr_eq(db) && !detached.is_empty() {
        return Err(ReconcileError::LazyInitialization {
            type_key: db.type_key(),
            reason: "cannot reconcile elements onto an unloaded container".to_string(),
        });
    }
    trace!(container = ?db, "Keeping unloaded container untouched");
    Ok(Some(authoritative.clone()))
}

impl Handler for CollectionHandler {
    fn name(&self) -> &'static str {
        "collection"
    }

    fn supported_types(&self) -> Vec<TypeKey> {
        self.types.clone()
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

        for element in obj.items() {
            let detached = cx.disconnect(&element)?;
            copy.write().push(detached);
        }
        Ok(Value::from(copy))
    }

    fn apply(&self, cx: &mut Traversal<'_>, detached: &Value) -> Result<Value> {
        let Some(obj) = detached.as_object() else {
            return Ok(detached.clone());
        };
        let container = ObjectRef::new(obj.read().empty_like());
        cx.record(obj, Value::from(container.clone()));

        for element in obj.items() {
            let applied = cx.apply(&element)?;
            container.write().push(applied);
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
        if let Some(untouched) = guard_unloaded(cx, tr, authoritative)? {
            return Ok(untouched);
        }

        let mut candidates = db.items();
        let mut rebuilt = Vec::with_capacity(tr.len());
        for element in tr.items() {
            let merged = match find_pendant(cx, &element, &mut candidates)? {
                Some(pendant) => cx.apply_to(&element, &pendant)?,
                None => cx.apply(&element)?,
            };
            rebuilt.push(merged);
        }

        if cx.config().delete_removed {
            remove_unmatched(cx, &candidates, &rebuilt)?;
        }
        db.write().set_items(rebuilt);
        Ok(authoritative.clone())
    }
}
