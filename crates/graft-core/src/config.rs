//! Walker configuration

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

/// Behaviour switches of a [`Walker`](crate::Walker)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WalkerConfig {
    /// Compare version properties before applying
    pub check_version: bool,
    /// Flush the store before reading entity properties on disconnect
    pub flush_automatically: bool,
    /// Build fresh instances on disconnect instead of reusing the source
    pub clone_objects: bool,
    /// Substitute unloaded collections and maps with empty ones on disconnect
    pub create_empty_collections: bool,
    /// Remove unmatched authoritative entities when reconciling containers
    pub delete_removed: bool,
}

impl WalkerConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from TOML; missing keys keep their defaults
    ///
    /// # Errors
    /// Returns [`ConfigError::Parse`] on malformed input or unknown value types.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// With version checking
    #[inline]
    #[must_use]
    pub fn with_check_version(mut self, enabled: bool) -> Self {
        self.check_version = enabled;
        self
    }

    /// With automatic flush
    #[inline]
    #[must_use]
    pub fn with_flush_automatically(mut self, enabled: bool) -> Self {
        self.flush_automatically = enabled;
        self
    }

    /// With clone mode
    #[inline]
    #[must_use]
    pub fn with_clone_objects(mut self, enabled: bool) -> Self {
        self.clone_objects = enabled;
        self
    }

    /// With empty-container substitution
    #[inline]
    #[must_use]
    pub fn with_create_empty_collections(mut self, enabled: bool) -> Self {
        self.create_empty_collections = enabled;
        self
    }

    /// With delete-on-remove
    #[inline]
    #[must_use]
    pub fn with_delete_removed(mut self, enabled: bool) -> Self {
        self.delete_removed = enabled;
        self
    }
}

impl Default for WalkerConfig {
    fn default() -> Self {
        Self {
            check_version: true,
            flush_automatically: false,
            clone_objects: false,
            create_empty_collections: true,
            delete_removed: false,
        }
    }
}
