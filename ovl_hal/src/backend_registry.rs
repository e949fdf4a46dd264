//! Backend registry.
//!
//! Maps backend names to factories. Names are the values of
//! [`BackendKind::name`](ovl_common::hal::config::BackendKind::name), so a
//! `[backend] kind` entry or an `OVL_BACKEND` value resolves straight to a
//! factory. Every factory receives the whole [`BackendConfig`] and picks the
//! sections it needs; the devmem factory reads `[backend.devmem]`, the
//! simulation factory reads nothing.
//!
//! The registry is consulted once, when a [`Session`](crate::Session) is
//! built. Tests and embedders that want a fake backend either register it
//! under a new name or skip the registry and call
//! [`Session::with_backend`](crate::Session::with_backend). There is no
//! process-wide registry.

use crate::error::HostError;
use ovl_common::hal::backend::{Backend, BackendFactory};
use ovl_common::hal::config::BackendConfig;
use std::collections::HashMap;
use tracing::info;

/// Registry of available backends.
pub struct BackendRegistry {
    factories: HashMap<&'static str, BackendFactory>,
}

impl BackendRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Create a registry holding the built-in simulation and devmem backends.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        crate::backends::register_builtin_backends(&mut registry);
        registry
    }

    /// Register a backend factory under `name`.
    ///
    /// The factory must not touch hardware; mapping and programming happen
    /// in `Backend::load_overlay` and `Backend::map_window`.
    ///
    /// # Panics
    /// Panics if a backend with the same name is already registered.
    pub fn register(&mut self, name: &'static str, factory: BackendFactory) {
        if self.factories.contains_key(name) {
            panic!("Backend '{name}' is already registered");
        }
        self.factories.insert(name, factory);
    }

    /// Get a backend factory by name.
    pub fn get_factory(&self, name: &str) -> Option<BackendFactory> {
        self.factories.get(name).copied()
    }

    /// Create the backend registered as `name`, configured from `config`.
    ///
    /// # Errors
    /// Returns `HostError::BackendNotFound` if no backend with the given name is registered.
    pub fn create_backend(
        &self,
        name: &str,
        config: &BackendConfig,
    ) -> Result<Box<dyn Backend>, HostError> {
        let factory = self
            .get_factory(name)
            .ok_or_else(|| HostError::BackendNotFound(name.to_string()))?;
        let backend = factory(config);
        info!("Created backend '{}' v{}", backend.name(), backend.version());
        Ok(backend)
    }

    /// List all registered backend names, sorted.
    pub fn list_backends(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.factories.keys().copied().collect();
        names.sort_unstable();
        names
    }
}

impl Default for BackendRegistry {
    fn default() -> Self {
        Self::new()
    }
}
