//! Map handler with independent key and value matching

use super::collection::guard_unloaded;
use super::pendant::{find_pendant, remove_unmatched};
use super::Handler;
use crate::error::Result;
use crate::walker::Traversal;
use graft_model::{ObjectRef, TypeKey, Value};

/// Handler for maps
///
/// Keys and values are matched independently. A value only reconciles onto
/// an authoritative value it matches by identity, domain equality or
/// identifier; among several matches the one stored under the matched key
/// wins. Unmatched values are applied on their own.
#[derive(Debug, Clone)]
pub struct MapHandler {
    types: Vec<TypeKey>,
}

impl MapHandler {
    /// Handler for the built-in map type
    #[must_use]
    pub fn new() -> Self {
        Self {
            types: vec![TypeKey::MAP],
        }
    }

    /// With additional map types
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

fn same_container_shape(detached: &Value, authoritative: &Value) -> bool {
    let shape = |value: &Value| value.as_object().and_then(|obj| obj.read().shape_key());
    matches!((shape(detached), shape(authoritative)), (Some(a), Some(b)) if a == b)
}

impl Default for MapHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl Handler for MapHandler {
    fn name(&self) -> &'static str {
        "map"
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

        for (key, value) in obj.entries() {
            let key = cx.disconnect(&key)?;
            let value = cx.disconnect(&value)?;
            copy.write().insert(key, value);
        }
        Ok(Value::from(copy))
    }

    fn apply(&self, cx: &mut Traversal<'_>, detached: &Value) -> Result<Value> {
        let Some(obj) = detached.as_object() else {
            return Ok(detached.clone());
        };
        let container = ObjectRef::new(obj.read().empty_like());
        cx.record(obj, Value::from(container.clone()));

        for (key, value) in obj.entries() {
            let key = cx.apply(&key)?;
            let value = cx.apply(&value)?;
            container.write().insert(key, value);
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

        let db_entries = db.entries();
        let mut key_candidates: Vec<Value> = db_entries.iter().map(|(k, _)| k.clone()).collect();
        let mut value_candidates: Vec<Value> = db_entries.iter().map(|(_, v)| v.clone()).collect();

        let mut rebuilt = Vec::with_capacity(tr.len());
        for (key, value) in tr.entries() {
            let db_key = find_pendant(cx, &key, &mut key_candidates)?;
            let under_key = db_key
                .as_ref()
                .and_then(|k| db_entries.iter().find(|(ek, _)| ek == k))
                .map(|(_, v)| v.clone())
                .filter(|v| !v.is_null());
            let preferred = under_key
                .as_ref()
                .and_then(|under_key| value_candidates.iter().position(|v| v == under_key));
            if let Some(pos) = preferred {
                let under_key = value_candidates.remove(pos);
                value_candidates.insert(0, under_key);
            }
            let mut db_value = find_pendant(cx, &value, &mut value_candidates)?;
            // nested containers have no identity of their own; merge in place
            if db_value.is_none()
                && preferred.is_some()
                && under_key.as_ref().is_some_and(|v| same_container_shape(&value, v))
            {
                db_value = Some(value_candidates.remove(0));
            }

            let key = match db_key {
                Some(db_key) => cx.apply_to(&key, &db_key)?,
                None => cx.apply(&key)?,
            };
            let value = match db_value {
                Some(db_value) => cx.apply_to(&value, &db_value)?,
                None => cx.apply(&value)?,
            };
            rebuilt.push((key, value));
        }

        if cx.config().delete_removed {
            let kept: Vec<Value> = rebuilt
                .iter()
                .flat_map(|(k, v)| [k.clone(), v.clone()])
                .collect();
            remove_unmatched(cx, key_candidates.iter().chain(&value_candidates), &kept)?;
        }
        db.write().set_entries(rebuilt);
        Ok(authoritative.clone())
    }
}
