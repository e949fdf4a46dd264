//! Simulation backend implementation.

use super::mmio::SimMmio;
use super::overlay::SimOverlay;
use ovl_common::hal::backend::{Backend, Overlay, OverlayError, RegisterWindow};
use ovl_common::hal::config::OverlayManifest;
use ovl_common::hal::consts::SIMULATION_BACKEND;
use tracing::debug;

/// Simulation backend implementing the `Backend` trait.
#[derive(Debug, Default)]
pub struct SimulationBackend;

impl SimulationBackend {
    /// Create a new simulation backend.
    pub fn new() -> Self {
        Self
    }
}

impl Backend for SimulationBackend {
    fn name(&self) -> &'static str {
        SIMULATION_BACKEND
    }

    fn version(&self) -> &'static str {
        env!("CARGO_PKG_VERSION")
    }

    fn load_overlay(&self, manifest: &OverlayManifest) -> Result<Box<dyn Overlay>, OverlayError> {
        Ok(Box::new(SimOverlay::from_manifest(manifest)?))
    }

    fn map_window(
        &self,
        base: u64,
        length: usize,
    ) -> Result<Box<dyn RegisterWindow>, OverlayError> {
        let mmio = SimMmio::new(base, length)?;
        debug!("Standalone simulated window at {:#x}, {} bytes", base, length);
        Ok(Box::new(mmio))
    }
}
