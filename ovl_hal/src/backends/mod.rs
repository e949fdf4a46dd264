//! Backend implementations.
//!
//! - [`simulation`] - In-memory simulation for development and testing
//! - [`devmem`] - Physical registers through `/dev/mem`
//!
//! # Adding New Backends
//!
//! 1. Create a new submodule under `backends/`
//! 2. Implement the `Backend` trait from `ovl_common::hal::backend`
//! 3. Register its factory in [`register_builtin_backends`]

pub mod devmem;
pub mod simulation;

use crate::backend_registry::BackendRegistry;
use ovl_common::hal::consts::{DEVMEM_BACKEND, SIMULATION_BACKEND};

/// Register all built-in backends.
pub fn register_builtin_backends(registry: &mut BackendRegistry) {
    registry.register(SIMULATION_BACKEND, simulation::create_backend);
    registry.register(DEVMEM_BACKEND, devmem::create_backend);
}
