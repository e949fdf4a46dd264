//! Simulated overlay.
//!
//! Loading never touches hardware. Each declared region gets one `SimMmio`
//! allocated at load time; `get_region` hands out clones of it, so every
//! handle to a region observes the same registers.

use super::mmio::SimMmio;
use ovl_common::hal::backend::{Overlay, OverlayError, RegisterWindow};
use ovl_common::hal::config::OverlayManifest;
use ovl_common::hal::types::RegionDescriptor;
use std::collections::BTreeMap;
use tracing::{debug, info};

/// In-memory overlay.
#[derive(Debug)]
pub struct SimOverlay {
    /// Image identifier (opaque to the simulation)
    image: String,
    /// Region windows, allocated once at load
    regions: BTreeMap<String, SimMmio>,
    /// Load-state flag
    loaded: bool,
}

impl SimOverlay {
    /// Load an overlay that declares no regions.
    ///
    /// # Errors
    /// Returns `OverlayError::InvalidImage` if `image` is empty.
    pub fn load(image: &str) -> Result<Self, OverlayError> {
        Self::from_manifest(&OverlayManifest::new(image))
    }

    /// Load an overlay with the regions declared in `manifest`.
    ///
    /// # Errors
    /// `InvalidImage` for an empty image identifier, `InvalidLength` for a
    /// zero-length region.
    pub fn from_manifest(manifest: &OverlayManifest) -> Result<Self, OverlayError> {
        manifest.validate()?;

        let regions = manifest
            .regions
            .iter()
            .map(|(name, desc)| {
                SimMmio::new(desc.base, desc.length).map(|mmio| (name.clone(), mmio))
            })
            .collect::<Result<BTreeMap<_, _>, OverlayError>>()?;

        info!(
            "Simulated overlay '{}' loaded with {} regions",
            manifest.image,
            regions.len()
        );

        Ok(Self {
            image: manifest.image.clone(),
            regions,
            loaded: true,
        })
    }

    /// Concrete handle to a named region.
    ///
    /// # Errors
    /// `OverlayUnloaded` after unload, `UnknownRegion` for undeclared names.
    pub fn window(&self, name: &str) -> Result<SimMmio, OverlayError> {
        if !self.loaded {
            return Err(OverlayError::OverlayUnloaded(self.image.clone()));
        }
        let mmio = self
            .regions
            .get(name)
            .ok_or_else(|| OverlayError::UnknownRegion(name.to_string()))?;
        debug!("Region '{}' resolved at {:#x}", name, mmio.base_addr());
        Ok(mmio.clone())
    }
}

impl Overlay for SimOverlay {
    fn image(&self) -> &str {
        &self.image
    }

    fn is_loaded(&self) -> bool {
        self.loaded
    }

    fn regions(&self) -> Vec<(String, RegionDescriptor)> {
        self.regions
            .iter()
            .map(|(name, mmio)| {
                (
                    name.clone(),
                    RegionDescriptor::new(mmio.base_addr(), mmio.length()),
                )
            })
            .collect()
    }

    fn get_region(&self, name: &str) -> Result<Box<dyn RegisterWindow>, OverlayError> {
        Ok(Box::new(self.window(name)?))
    }

    fn unload(&mut self) {
        if self.loaded {
            info!("Simulated overlay '{}' unloaded", self.image);
        }
        self.loaded = false;
    }
}
