//! Schema registration
//!
//! Provides explicit per-type schemas in place of runtime reflection:
//! - [`SchemaBuilder`] / [`TypeBuilder`]: declare types, parents, properties
//! - [`SchemaRegistry`]: immutable result, shared via `Arc`
//! - [`TypeHierarchy`]: supertype linearisation used for handler lookup
//!
//! The registry is also the default [`MetadataResolver`]: inherited
//! properties come first, own properties override inherited ones.

use crate::error::SchemaError;
use crate::metadata::{AccessKind, Getter, MetadataResolver, ObjectMetadata, Setter};
use graft_model::{Node, ObjectRef, TypeKey, Value};
use indexmap::IndexMap;
use std::collections::{HashSet, VecDeque};
use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;

/// Domain equality between two objects of a type
pub type EqualityFn = Arc<dyn Fn(&ObjectRef, &ObjectRef) -> bool + Send + Sync>;

/// Supertype lookup
pub trait TypeHierarchy: Send + Sync + Debug {
    /// Transitive supertypes, most specific first
    fn supertypes(&self, type_key: &TypeKey) -> Vec<TypeKey>;
}

/// Parents of the built-in container types
fn builtin_parents(type_key: &TypeKey) -> &'static [TypeKey] {
    static COLLECTION_PARENTS: [TypeKey; 1] = [TypeKey::COLLECTION];
    if *type_key == TypeKey::LIST || *type_key == TypeKey::SET {
        &COLLECTION_PARENTS
    } else {
        &[]
    }
}

fn is_builtin(type_key: &TypeKey) -> bool {
    [
        TypeKey::COLLECTION,
        TypeKey::LIST,
        TypeKey::SET,
        TypeKey::MAP,
        TypeKey::LAZY_HANDLE,
    ]
    .contains(type_key)
        || type_key.is_scalar()
}

#[derive(Clone, Default)]
struct TypeDef {
    parents: Vec<TypeKey>,
    properties: IndexMap<String, AccessKind>,
    equality: Option<EqualityFn>,
}

impl Debug for TypeDef {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDef")
            .field("parents", &self.parents)
            .field("properties", &self.properties)
            .field("equality", &self.equality.is_some())
            .finish()
    }
}

/// Builder for an immutable [`SchemaRegistry`]
///
/// # Example
/// ```
/// use graft_core::SchemaBuilder;
///
/// let mut builder = SchemaBuilder::new();
/// builder.add_type("Person").field("id").field("name").done()?;
/// builder.add_type("Employee").extends("Person").field("salary").done()?;
/// let schema = builder.build()?;
///
/// assert_eq!(schema.supertypes(&"Employee".into()), vec!["Person".into()]);
/// # Ok::<(), graft_core::SchemaError>(())
/// ```
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    types: IndexMap<TypeKey, TypeDef>,
}

impl SchemaBuilder {
    /// Create an empty builder
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start declaring a type
    pub fn add_type(&mut self, type_key: impl Into<TypeKey>) -> TypeBuilder<'_> {
        TypeBuilder {
            builder: self,
            type_key: type_key.into(),
            def: TypeDef::default(),
        }
    }

    /// Validate parents and build the registry
    ///
    /// # Errors
    /// Returns [`SchemaError::UnknownParent`] when a parent is neither
    /// declared nor built-in, and [`SchemaError::InheritanceCycle`] when a
    /// type is its own ancestor.
    pub fn build(self) -> Result<SchemaRegistry, SchemaError> {
        for (type_key, def) in &self.types {
            for parent in &def.parents {
                if !self.types.contains_key(parent) && !is_builtin(parent) {
                    return Err(SchemaError::UnknownParent {
                        type_key: type_key.clone(),
                        parent: parent.clone(),
                    });
                }
            }
        }

        for type_key in self.types.keys() {
            let mut stack: Vec<&TypeKey> = self.types[type_key].parents.iter().collect();
            let mut seen = HashSet::new();
            while let Some(current) = stack.pop() {
                if current == type_key {
                    return Err(SchemaError::InheritanceCycle(type_key.clone()));
                }
                if !seen.insert(current) {
                    continue;
                }
                if let Some(def) = self.types.get(current) {
                    stack.extend(def.parents.iter());
                }
            }
        }

        Ok(SchemaRegistry { types: self.types })
    }
}

/// Builder for one type declaration
pub struct TypeBuilder<'a> {
    builder: &'a mut SchemaBuilder,
    type_key: TypeKey,
    def: TypeDef,
}

impl TypeBuilder<'_> {
    /// Add a parent type
    #[must_use]
    pub fn extends(mut self, parent: impl Into<TypeKey>) -> Self {
        self.def.parents.push(parent.into());
        self
    }

    /// Add a raw field property
    #[must_use]
    pub fn field(self, name: impl Into<String>) -> Self {
        self.property(name, AccessKind::Field)
    }

    /// Add several raw field properties
    #[must_use]
    pub fn fields<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for name in names {
            self.def.properties.insert(name.into(), AccessKind::Field);
        }
        self
    }

    /// Add a property backed by a getter and a setter
    #[must_use]
    pub fn accessor(
        self,
        name: impl Into<String>,
        getter: Option<Getter>,
        setter: Option<Setter>,
    ) -> Self {
        self.property(name, AccessKind::Accessor { getter, setter })
    }

    /// Add a property with an explicit access kind
    #[must_use]
    pub fn property(mut self, name: impl Into<String>, kind: AccessKind) -> Self {
        self.def.properties.insert(name.into(), kind);
        self
    }

    /// Domain equality used when matching container elements
    #[must_use]
    pub fn equality<F>(mut self, eq: F) -> Self
    where
        F: Fn(&ObjectRef, &ObjectRef) -> bool + Send + Sync + 'static,
    {
        self.def.equality = Some(Arc::new(eq));
        self
    }

    /// Finish the declaration
    ///
    /// # Errors
    /// Returns [`SchemaError::DuplicateType`] if the type was already
    /// declared or is built-in.
    pub fn done(self) -> Result<TypeKey, SchemaError> {
        if self.builder.types.contains_key(&self.type_key) || is_builtin(&self.type_key) {
            return Err(SchemaError::DuplicateType(self.type_key));
        }
        self.builder.types.insert(self.type_key.clone(), self.def);
        Ok(self.type_key)
    }
}

/// Immutable type schemas
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    types: IndexMap<TypeKey, TypeDef>,
}

impl SchemaRegistry {
    /// Registry without declared types (built-in hierarchy only)
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Check whether a type is declared
    #[must_use]
    pub fn contains(&self, type_key: &TypeKey) -> bool {
        self.types.contains_key(type_key)
    }

    /// Number of declared types
    #[must_use]
    pub fn type_count(&self) -> usize {
        self.types.len()
    }

    /// Direct parents of a type
    #[must_use]
    pub fn parents(&self, type_key: &TypeKey) -> &[TypeKey] {
        self.types
            .get(type_key)
            .map_or_else(|| builtin_parents(type_key), |def| def.parents.as_slice())
    }

    /// Transitive supertypes, breadth-first in declaration order
    #[must_use]
    pub fn supertypes(&self, type_key: &TypeKey) -> Vec<TypeKey> {
        let mut result = Vec::new();
        let mut seen = HashSet::new();
        let mut queue: VecDeque<&TypeKey> = self.parents(type_key).iter().collect();

        while let Some(current) = queue.pop_front() {
            if !seen.insert(current.clone()) {
                continue;
            }
            result.push(current.clone());
            queue.extend(self.parents(current));
        }
        result
    }

    /// Check whether `sub` is `sup` or one of its descendants
    #[must_use]
    pub fn is_subtype(&self, sub: &TypeKey, sup: &TypeKey) -> bool {
        sub == sup || self.supertypes(sub).contains(sup)
    }

    /// Domain equality declared on a type or its nearest ancestor
    #[must_use]
    pub fn equality(&self, type_key: &TypeKey) -> Option<EqualityFn> {
        std::iter::once(type_key.clone())
            .chain(self.supertypes(type_key))
            .find_map(|ty| self.types.get(&ty).and_then(|def| def.equality.clone()))
    }

    /// Properties of a type including inherited ones
    ///
    /// Inherited properties come first; a redeclared property keeps its
    /// inherited position but takes the own access kind.
    fn collect_properties(
        &self,
        type_key: &TypeKey,
        visited: &mut HashSet<TypeKey>,
        out: &mut IndexMap<String, AccessKind>,
    ) {
        if !visited.insert(type_key.clone()) {
            return;
        }
        let Some(def) = self.types.get(type_key) else {
            return;
        };
        for parent in &def.parents {
            self.collect_properties(parent, visited, out);
        }
        for (name, kind) in &def.properties {
            out.insert(name.clone(), kind.clone());
        }
    }
}

impl TypeHierarchy for SchemaRegistry {
    fn supertypes(&self, type_key: &TypeKey) -> Vec<TypeKey> {
        SchemaRegistry::supertypes(self, type_key)
    }
}

impl MetadataResolver for SchemaRegistry {
    fn resolve(&self, type_key: &TypeKey) -> Option<ObjectMetadata> {
        if !self.types.contains_key(type_key) {
            return None;
        }
        let mut properties = IndexMap::new();
        self.collect_properties(type_key, &mut HashSet::new(), &mut properties);

        let metadata = properties
            .into_iter()
            .fold(ObjectMetadata::new(type_key.clone()), |metadata, (name, kind)| {
                metadata.with_property(name, kind)
            });
        Some(metadata)
    }
}

/// Field getter reading another attribute through a transform
///
/// Convenience for derived properties in schemas.
pub fn derived<F>(source: &'static str, transform: F) -> Getter
where
    F: Fn(&Value) -> Value + Send + Sync + 'static,
{
    Arc::new(move |node: &Node| transform(node.attr(source).unwrap_or(&Value::Null)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn people() -> SchemaRegistry {
        let mut builder = SchemaBuilder::new();
        builder.add_type("Named").field("name").done().unwrap();
        builder.add_type("Audited").field("created").done().unwrap();
        builder
            .add_type("Person")
            .extends("Named")
            .extends("Audited")
            .field("id")
            .done()
            .unwrap();
        builder
            .add_type("Employee")
            .extends("Person")
            .fields(["salary", "name"])
            .done()
            .unwrap();
        builder.build().unwrap()
    }

    #[test]
    fn supertypes_are_most_specific_first() {
        let schema = people();
        assert_eq!(
            schema.supertypes(&"Employee".into()),
            vec![TypeKey::new("Person"), "Named".into(), "Audited".into()]
        );
        assert_eq!(schema.supertypes(&TypeKey::SET), vec![TypeKey::COLLECTION]);
        assert!(schema.supertypes(&"Unknown".into()).is_empty());
    }

    #[test]
    fn inherited_properties_come_first() {
        let metadata = people().resolve(&"Employee".into()).unwrap();
        assert_eq!(
            metadata.property_names().collect::<Vec<_>>(),
            ["name", "created", "id", "salary"]
        );
    }

    #[test]
    fn duplicate_and_builtin_types_are_rejected() {
        let mut builder = SchemaBuilder::new();
        builder.add_type("A").done().unwrap();
        assert_eq!(
            builder.add_type("A").done(),
            Err(SchemaError::DuplicateType("A".into()))
        );
        assert_eq!(
            builder.add_type("list").done(),
            Err(SchemaError::DuplicateType(TypeKey::LIST))
        );
    }

    #[test]
    fn unknown_parent_is_rejected() {
        let mut builder = SchemaBuilder::new();
        builder.add_type("A").extends("Ghost").done().unwrap();
        assert!(matches!(
            builder.build(),
            Err(SchemaError::UnknownParent { .. })
        ));
    }

    #[test]
    fn inheritance_cycle_is_rejected() {
        let mut builder = SchemaBuilder::new();
        builder.add_type("A").extends("B").done().unwrap();
        builder.add_type("B").extends("A").done().unwrap();
        assert!(matches!(
            builder.build(),
            Err(SchemaError::InheritanceCycle(_))
        ));
    }

    #[test]
    fn custom_collections_extend_builtins() {
        let mut builder = SchemaBuilder::new();
        builder.add_type("Bag").extends("list").done().unwrap();
        let schema = builder.build().unwrap();

        assert_eq!(
            schema.supertypes(&"Bag".into()),
            vec![TypeKey::LIST, TypeKey::COLLECTION]
        );
        assert!(schema.is_subtype(&"Bag".into(), &TypeKey::COLLECTION));
    }

    #[test]
    fn equality_is_inherited() {
        let mut builder = SchemaBuilder::new();
        builder
            .add_type("Base")
            .field("code")
            .equality(|a, b| a.attr("code") == b.attr("code"))
            .done()
            .unwrap();
        builder.add_type("Derived").extends("Base").done().unwrap();
        let schema = builder.build().unwrap();

        let eq = schema.equality(&"Derived".into()).unwrap();
        let a = ObjectRef::new(Node::bean("Derived").with_attr("code", 1));
        let b = ObjectRef::new(Node::bean("Derived").with_attr("code", 1));
        assert!(eq(&a, &b));
    }
}
