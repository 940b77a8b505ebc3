//! Handler registry
//!
//! Provides [`HandlerRegistry`] for resolving the [`Handler`] of a runtime
//! type. Resolution order:
//! 1. exact registered type
//! 2. nearest registered supertype (most specific first)
//! 3. dynamic handlers, first matching predicate in registration order
//! 4. none, the walker falls back to generic traversal
//!
//! Results, misses included, are memoised per type. Registration bumps a
//! generation counter and clears the memo; a lookup that raced a
//! registration is retried a bounded number of times.

use crate::handler::{ArrayHandler, BasicTypeHandler, CollectionHandler, Handler, MapHandler, NullHandler};
use crate::schema::TypeHierarchy;
use dashmap::DashMap;
use graft_model::TypeKey;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt::{self, Debug, Formatter};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{info, trace};

/// Resolution attempts before a lookup is returned unmemoised
const MAX_RESOLVE_ATTEMPTS: usize = 3;

/// Type predicate of a dynamic handler
pub type TypePredicate = Arc<dyn Fn(&TypeKey) -> bool + Send + Sync>;

struct DynamicEntry {
    handler: Arc<dyn Handler>,
    predicate: TypePredicate,
}

impl Debug for DynamicEntry {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynamicEntry")
            .field("handler", &self.handler.name())
            .finish_non_exhaustive()
    }
}

/// Type to handler resolution
#[derive(Debug)]
pub struct HandlerRegistry {
    hierarchy: Arc<dyn TypeHierarchy>,
    handlers: RwLock<HashMap<TypeKey, Arc<dyn Handler>>>,
    dynamic: RwLock<Vec<DynamicEntry>>,
    resolved: DashMap<TypeKey, Option<Arc<dyn Handler>>>,
    generation: AtomicU64,
}

impl HandlerRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new(hierarchy: Arc<dyn TypeHierarchy>) -> Self {
        Self {
            hierarchy,
            handlers: RwLock::new(HashMap::new()),
            dynamic: RwLock::new(Vec::new()),
            resolved: DashMap::new(),
            generation: AtomicU64::new(0),
        }
    }

    /// Create a registry with the built-in handlers
    ///
    /// Scalars resolve to [`BasicTypeHandler`], lists and sets to
    /// [`CollectionHandler`], maps to [`MapHandler`], lazy handles to
    /// [`NullHandler`] and any array type to [`ArrayHandler`].
    #[must_use]
    pub fn with_defaults(hierarchy: Arc<dyn TypeHierarchy>) -> Self {
        let registry = Self::new(hierarchy);
        registry.register(Arc::new(BasicTypeHandler::new()));
        registry.register(Arc::new(CollectionHandler::new()));
        registry.register(Arc::new(MapHandler::new()));
        registry.register(Arc::new(NullHandler::new()));
        registry.add_dynamic_handler(Arc::new(ArrayHandler::new()), ArrayHandler::supports);
        registry
    }

    /// Register a handler for its [`Handler::supported_types`]
    pub fn register(&self, handler: Arc<dyn Handler>) {
        let types = handler.supported_types();
        self.add_handler(handler, types);
    }

    /// Register a handler for explicit types
    ///
    /// A later registration for the same type replaces the earlier one.
    pub fn add_handler<I>(&self, handler: Arc<dyn Handler>, types: I)
    where
        I: IntoIterator<Item = TypeKey>,
    {
        let mut handlers = self.handlers.write();
        for type_key in types {
            info!(handler = handler.name(), type_key = %type_key, "Registered handler");
            handlers.insert(type_key, Arc::clone(&handler));
        }
        drop(handlers);
        self.invalidate();
    }

    /// Register a handler for every type matching `predicate`
    ///
    /// Dynamic handlers are consulted only when no static registration
    /// matches, in registration order.
    pub fn add_dynamic_handler<F>(&self, handler: Arc<dyn Handler>, predicate: F)
    where
        F: Fn(&TypeKey) -> bool + Send + Sync + 'static,
    {
        info!(handler = handler.name(), "Registered dynamic handler");
        self.dynamic.write().push(DynamicEntry {
            handler,
            predicate: Arc::new(predicate),
        });
        self.invalidate();
    }

    fn invalidate(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
        self.resolved.clear();
    }

    /// Handler of a type, `None` for generic traversal
    #[must_use]
    pub fn get_handler(&self, type_key: &TypeKey) -> Option<Arc<dyn Handler>> {
        if let Some(hit) = self.resolved.get(type_key) {
            return hit.value().clone();
        }

        for attempt in 1..=MAX_RESOLVE_ATTEMPTS {
            let generation = self.generation.load(Ordering::Acquire);
            let resolved = self.resolve(type_key);
            if self.generation.load(Ordering::Acquire) == generation {
                self.resolved.insert(type_key.clone(), resolved.clone());
                // A registration between the check and the insert must not
                // leave a stale entry behind.
                if self.generation.load(Ordering::Acquire) == generation {
                    return resolved;
                }
                self.resolved.remove(type_key);
            }
            trace!(type_key = %type_key, attempt, "Handler registry changed during lookup");
        }
        self.resolve(type_key)
    }

    fn resolve(&self, type_key: &TypeKey) -> Option<Arc<dyn Handler>> {
        {
            let handlers = self.handlers.read();
            if let Some(handler) = handlers.get(type_key) {
                return Some(Arc::clone(handler));
            }
            for supertype in self.hierarchy.supertypes(type_key) {
                if let Some(handler) = handlers.get(&supertype) {
                    return Some(Arc::clone(handler));
                }
            }
        }

        self.dynamic
            .read()
            .iter()
            .find(|entry| (entry.predicate)(type_key))
            .map(|entry| Arc::clone(&entry.handler))
    }

    /// Check whether a type has an exact registration
    #[must_use]
    pub fn contains(&self, type_key: &TypeKey) -> bool {
        self.handlers.read().contains_key(type_key)
    }

    /// Number of exact registrations
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.read().len()
    }

    /// Check for a registry without exact registrations
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.read().is_empty()
    }

    /// Number of memoised lookups
    #[must_use]
    pub fn memoized(&self) -> usize {
        self.resolved.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{SchemaBuilder, SchemaRegistry};

    fn hierarchy() -> Arc<SchemaRegistry> {
        let mut builder = SchemaBuilder::new();
        builder.add_type("Money").done().unwrap();
        builder.add_type("Euro").extends("Money").done().unwrap();
        builder.add_type("Bag").extends("list").done().unwrap();
        Arc::new(builder.build().unwrap())
    }

    #[test]
    fn defaults_cover_every_shape() {
        let registry = HandlerRegistry::with_defaults(hierarchy());

        let name = |ty: TypeKey| registry.get_handler(&ty).map(|h| h.name());
        assert_eq!(name(TypeKey::INT), Some("basic"));
        assert_eq!(name(TypeKey::LIST), Some("collection"));
        assert_eq!(name(TypeKey::SET), Some("collection"));
        assert_eq!(name(TypeKey::MAP), Some("map"));
        assert_eq!(name(TypeKey::LAZY_HANDLE), Some("null"));
        assert_eq!(name(TypeKey::array_of(&"Money".into())), Some("array"));
        assert_eq!(name("Money".into()), None);
    }

    #[test]
    fn supertype_registration_applies_to_subtypes() {
        let registry = HandlerRegistry::with_defaults(hierarchy());
        registry.add_handler(Arc::new(BasicTypeHandler::new()), [TypeKey::new("Money")]);

        assert_eq!(
            registry.get_handler(&"Euro".into()).map(|h| h.name()),
            Some("basic")
        );
        assert_eq!(
            registry.get_handler(&"Bag".into()).map(|h| h.name()),
            Some("collection")
        );
    }

    #[test]
    fn misses_are_memoised_and_invalidated() {
        let registry = HandlerRegistry::with_defaults(hierarchy());
        assert!(registry.get_handler(&"Money".into()).is_none());
        assert_eq!(registry.memoized(), 1);

        registry.add_handler(Arc::new(BasicTypeHandler::new()), [TypeKey::new("Money")]);
        assert_eq!(registry.memoized(), 0);
        assert!(registry.get_handler(&"Money".into()).is_some());
    }

    #[test]
    fn static_registration_beats_dynamic() {
        let registry = HandlerRegistry::new(hierarchy());
        registry.add_dynamic_handler(Arc::new(NullHandler::new()), |_| true);
        registry.add_handler(Arc::new(MapHandler::new()), [TypeKey::MAP]);

        assert_eq!(registry.get_handler(&TypeKey::MAP).map(|h| h.name()), Some("map"));
        assert_eq!(registry.get_handler(&TypeKey::INT).map(|h| h.name()), Some("null"));
    }

    #[test]
    fn dynamic_handlers_in_registration_order() {
        let registry = HandlerRegistry::new(hierarchy());
        registry.add_dynamic_handler(Arc::new(ArrayHandler::new()), ArrayHandler::supports);
        registry.add_dynamic_handler(Arc::new(NullHandler::new()), |_| true);

        let array = TypeKey::array_of(&TypeKey::INT);
        assert_eq!(registry.get_handler(&array).map(|h| h.name()), Some("array"));
    }

    #[test]
    fn concurrent_lookups_agree() {
        let registry = Arc::new(HandlerRegistry::with_defaults(hierarchy()));
        let threads: Vec<_> = (0..4)
            .map(|_| {
                let registry = Arc::clone(&registry);
                std::thread::spawn(move || {
                    (0..100).all(|_| {
                        registry.get_handler(&TypeKey::LIST).map(|h| h.name()) == Some("collection")
                    })
                })
            })
            .collect();

        for thread in threads {
            assert!(thread.join().unwrap());
        }
    }
}
