//! Type keys for graph nodes
//!
//! Provides [`TypeKey`], the runtime type name used for handler dispatch,
//! metadata lookup and entity resolution.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt::{self, Display, Formatter};

/// Prefix marking an array type (`[]component`)
const ARRAY_PREFIX: &str = "[]";

/// Runtime type name of a value
///
/// Cheap to clone for the built-in keys (borrowed statics). Equality and
/// hashing are by name, so two keys built from the same string are the
/// same type.
///
/// # Example
/// ```
/// use graft_model::TypeKey;
///
/// let employee = TypeKey::new("Employee");
/// let roster = TypeKey::array_of(&employee);
/// assert!(roster.is_array());
/// assert_eq!(roster.component(), Some(employee));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeKey(Cow<'static, str>);

impl TypeKey {
    /// Boolean scalar
    pub const BOOL: TypeKey = TypeKey(Cow::Borrowed("bool"));
    /// Integer scalar
    pub const INT: TypeKey = TypeKey(Cow::Borrowed("int"));
    /// Floating point scalar
    pub const FLOAT: TypeKey = TypeKey(Cow::Borrowed("float"));
    /// Text scalar
    pub const TEXT: TypeKey = TypeKey(Cow::Borrowed("text"));
    /// Abstract supertype of [`TypeKey::LIST`] and [`TypeKey::SET`]
    pub const COLLECTION: TypeKey = TypeKey(Cow::Borrowed("collection"));
    /// Ordered collection allowing duplicates
    pub const LIST: TypeKey = TypeKey(Cow::Borrowed("list"));
    /// Collection rejecting duplicates
    pub const SET: TypeKey = TypeKey(Cow::Borrowed("set"));
    /// Key/value container
    pub const MAP: TypeKey = TypeKey(Cow::Borrowed("map"));
    /// Backend handle for a value that can no longer be resolved
    pub const LAZY_HANDLE: TypeKey = TypeKey(Cow::Borrowed("lazy-handle"));

    /// Create a named type key
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    /// Array type with the given component type
    #[must_use]
    pub fn array_of(component: &TypeKey) -> Self {
        Self(Cow::Owned(format!("{ARRAY_PREFIX}{}", component.0)))
    }

    /// Type name
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check if this is an array type
    #[inline]
    #[must_use]
    pub fn is_array(&self) -> bool {
        self.0.starts_with(ARRAY_PREFIX)
    }

    /// Component type of an array type
    #[must_use]
    pub fn component(&self) -> Option<TypeKey> {
        self.0
            .strip_prefix(ARRAY_PREFIX)
            .map(|name| TypeKey(Cow::Owned(name.to_string())))
    }

    /// Check if this is one of the built-in scalar value types
    #[must_use]
    pub fn is_scalar(&self) -> bool {
        [Self::BOOL, Self::INT, Self::FLOAT, Self::TEXT].contains(self)
    }

    /// Built-in scalar value types
    #[must_use]
    pub fn scalars() -> [TypeKey; 4] {
        [Self::BOOL, Self::INT, Self::FLOAT, Self::TEXT]
    }
}

impl Display for TypeKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&'static str> for TypeKey {
    fn from(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }
}

impl From<String> for TypeKey {
    fn from(name: String) -> Self {
        Self(Cow::Owned(name))
    }
}
