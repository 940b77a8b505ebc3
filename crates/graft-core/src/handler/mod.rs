//! Per-shape traversal handlers
//!
//! Provides the [`Handler`] capability interface and the built-in handlers
//! for every container shape plus the two terminal handlers:
//! - [`ArrayHandler`]: fixed-length arrays, positional reconciliation
//! - [`CollectionHandler`]: lists and sets, pendant matching
//! - [`MapHandler`]: maps, pendant matching for keys and values
//! - [`BasicTypeHandler`]: value types returned unchanged
//! - [`NullHandler`]: unresolvable placeholders mapped to null

mod array;
mod basic;
mod collection;
mod map;
mod null;
mod pendant;

pub use array::ArrayHandler;
pub use basic::BasicTypeHandler;
pub use collection::CollectionHandler;
pub use map::MapHandler;
pub use null::NullHandler;
pub use pendant::find_pendant;

use crate::error::Result;
use crate::walker::Traversal;
use graft_model::{TypeKey, Value};
use std::fmt::Debug;

/// Disconnect/apply strategy for one category of runtime shapes
///
/// The walker calls a handler with a non-null value it has not visited yet.
/// For the two-argument form the walker has already recorded
/// `detached -> authoritative`; for the other operations a handler that
/// builds a new container must record `source -> container` through
/// [`Traversal::record`] before recursing into elements.
///
/// Errors raised by nested traversal must be propagated unchanged.
pub trait Handler: Send + Sync + Debug {
    /// Handler name (for logging)
    fn name(&self) -> &'static str;

    /// Types to register this handler for by default
    fn supported_types(&self) -> Vec<TypeKey> {
        Vec::new()
    }

    /// Empty value of the same concrete shape as `template`
    fn create_empty(&self, template: &Value) -> Value;

    /// Produce a detached counterpart of `source`
    ///
    /// # Errors
    /// Propagates traversal errors of nested values.
    fn disconnect(&self, cx: &mut Traversal<'_>, source: &Value) -> Result<Value>;

    /// Reconcile `detached` without a known authoritative counterpart
    ///
    /// # Errors
    /// Propagates traversal errors of nested values.
    fn apply(&self, cx: &mut Traversal<'_>, detached: &Value) -> Result<Value>;

    /// Reconcile `detached` onto `authoritative`
    ///
    /// # Errors
    /// Propagates traversal errors of nested values.
    fn apply_to(
        &self,
        cx: &mut Traversal<'_>,
        detached: &Value,
        authoritative: &Value,
    ) -> Result<Value>;
}
