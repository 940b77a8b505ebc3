//! Terminal handler for lazy handles

use super::Handler;
use crate::error::Result;
use crate::walker::Traversal;
use graft_model::{TypeKey, Value};

/// Terminal handler mapping unresolvable placeholders to null
#[derive(Debug, Clone, Default)]
pub struct NullHandler;

impl NullHandler {
    /// Create the handler
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Handler for NullHandler {
    fn name(&self) -> &'static str {
        "null"
    }

    fn supported_types(&self) -> Vec<TypeKey> {
        vec![TypeKey::LAZY_HANDLE]
    }

    fn create_empty(&self, _template: &Value) -> Value {
        Value::Null
    }

    fn disconnect(&self, _cx: &mut Traversal<'_>, _source: &Value) -> Result<Value> {
        Ok(Value::Null)
    }

    fn apply(&self, _cx: &mut Traversal<'_>, _detached: &Value) -> Result<Value> {
        Ok(Value::Null)
    }

    fn apply_to(
        &self,
        _cx: &mut Traversal<'_>,
        _detached: &Value,
        _authoritative: &Value,
    ) -> Result<Value> {
        Ok(Value::Null)
    }
}
