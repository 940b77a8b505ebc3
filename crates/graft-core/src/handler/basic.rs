//! Pass-through handler for scalar and immutable types

use super::Handler;
use crate::error::Result;
use crate::walker::Traversal;
use graft_model::{TypeKey, Value};

/// Terminal handler for value types
///
/// Every operation returns the input unchanged. Registered for the scalar
/// types by default; further immutable types can be added with
/// [`BasicTypeHandler::with_types`].
#[derive(Debug, Clone)]
pub struct BasicTypeHandler {
    types: Vec<TypeKey>,
}

impl BasicTypeHandler {
    /// Handler for the built-in scalars
    #[must_use]
    pub fn new() -> Self {
        Self {
            types: TypeKey::scalars().to_vec(),
        }
    }

    /// With additional value types
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

impl Default for BasicTypeHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl Handler for BasicTypeHandler {
    fn name(&self) -> &'static str {
        "basic"
    }

    fn supported_types(&self) -> Vec<TypeKey> {
        self.types.clone()
    }

    fn create_empty(&self, template: &Value) -> Value {
        template.clone()
    }

    fn disconnect(&self, _cx: &mut Traversal<'_>, source: &Value) -> Result<Value> {
        Ok(source.clone())
    }

    fn apply(&self, _cx: &mut Traversal<'_>, detached: &Value) -> Result<Value> {
        Ok(detached.clone())
    }

    fn apply_to(
        &self,
        _cx: &mut Traversal<'_>,
        detached: &Value,
        _authoritative: &Value,
    ) -> Result<Value> {
        Ok(detached.clone())
    }
}
