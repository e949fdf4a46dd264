//! Simulation backend module.
//!
//! In-memory stand-ins for the hardware overlay and register windows. Client
//! code written against the backend traits runs unmodified on top of it.

mod backend;
mod mmio;
mod overlay;

pub use backend::SimulationBackend;
pub use mmio::SimMmio;
pub use overlay::SimOverlay;

use ovl_common::hal::backend::Backend;
use ovl_common::hal::config::BackendConfig;

/// Factory function to create a simulation backend instance.
pub fn create_backend(_config: &BackendConfig) -> Box<dyn Backend> {
    Box::new(SimulationBackend::new())
}
