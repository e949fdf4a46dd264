//! Devmem backend implementation.

use super::mmio::DevmemMmio;
use super::overlay::DevmemOverlay;
use ovl_common::hal::backend::{Backend, Overlay, OverlayError, RegisterWindow};
use ovl_common::hal::config::{DevmemConfig, OverlayManifest};
use ovl_common::hal::consts::DEVMEM_BACKEND;

/// Hardware backend implementing the `Backend` trait.
#[derive(Debug, Clone)]
pub struct DevmemBackend {
    config: DevmemConfig,
}

impl DevmemBackend {
    /// Create a backend using the given device paths.
    pub fn new(config: DevmemConfig) -> Self {
        Self { config }
    }
}

impl Backend for DevmemBackend {
    fn name(&self) -> &'static str {
        DEVMEM_BACKEND
    }

    fn version(&self) -> &'static str {
        env!("CARGO_PKG_VERSION")
    }

    fn load_overlay(&self, manifest: &OverlayManifest) -> Result<Box<dyn Overlay>, OverlayError> {
        Ok(Box::new(DevmemOverlay::load(manifest, &self.config)?))
    }

    fn map_window(
        &self,
        base: u64,
        length: usize,
    ) -> Result<Box<dyn RegisterWindow>, OverlayError> {
        Ok(Box::new(DevmemMmio::map(&self.config.path, base, length)?))
    }
}
