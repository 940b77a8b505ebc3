//! Matching of detached elements to their authoritative counterparts

use crate::error::Result;
use crate::walker::Traversal;
use graft_model::Value;

/// Find and remove the authoritative counterpart of a detached element
///
/// Candidates are matched by identity (value equality for scalars), then
/// by the domain equality declared for the element type, or, for types
/// without one, by same type and equal identifier. A matched candidate is
/// removed so it cannot be matched twice.
///
/// # Errors
/// Propagates identifier extraction failures of the store.
pub fn find_pendant(
    cx: &Traversal<'_>,
    element: &Value,
    candidates: &mut Vec<Value>,
) -> Result<Option<Value>> {
    if element.is_null() {
        return Ok(None);
    }
    if let Some(pos) = candidates.iter().position(|candidate| candidate == element) {
        return Ok(Some(candidates.remove(pos)));
    }
    let Some(obj) = element.as_object() else {
        return Ok(None);
    };

    let type_key = obj.type_key();
    if let Some(equals) = cx.schema().equality(&type_key) {
        let pos = candidates.iter().position(|candidate| {
            candidate
                .as_object()
                .is_some_and(|other| equals(obj, other))
        });
        return Ok(pos.map(|pos| candidates.remove(pos)));
    }

    let store = cx.store();
    let Some(descriptor) = store.entity(&type_key) else {
        return Ok(None);
    };
    let Some(id) = store.identifier(&descriptor, obj)? else {
        return Ok(None);
    };

    let mut found = None;
    for (pos, candidate) in candidates.iter().enumerate() {
        let Some(other) = candidate.as_object() else {
            continue;
        };
        if other.type_key() == type_key && store.identifier(&descriptor, other)?.as_ref() == Some(&id) {
            found = Some(pos);
            break;
        }
    }
    Ok(found.map(|pos| candidates.remove(pos)))
}

/// Delete unmatched authoritative entities left over after matching
///
/// Only managed entity types are removed, and never one that made it into
/// the rebuilt container.
pub(crate) fn remove_unmatched<'v>(
    cx: &Traversal<'_>,
    leftovers: impl IntoIterator<Item = &'v Value>,
    kept: &[Value],
) -> Result<()> {
    let store = cx.store();
    for leftover in leftovers {
        let Some(obj) = leftover.as_object() else {
            continue;
        };
        if kept.contains(leftover) || store.entity(&obj.type_key()).is_none() {
            continue;
        }
        tracing::debug!(entity = ?obj, "Removing unmatched entity");
        store.remove(obj)?;
    }
    Ok(())
}
