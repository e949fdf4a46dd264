//! `/dev/mem` overlay.
//!
//! Loading validates that the image is a readable file and, when an FPGA
//! manager is configured, programs the fabric through its sysfs interface.
//! Regions are mapped lazily on first lookup; later lookups reuse the mapping
//! so handles to one region alias.

use super::mmio::DevmemMmio;
use ovl_common::hal::backend::{Overlay, OverlayError, RegisterWindow};
use ovl_common::hal::config::{DevmemConfig, OverlayManifest};
use ovl_common::hal::types::RegionDescriptor;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// FPGA manager state reported after a successful load.
const FPGA_STATE_OPERATING: &str = "operating";

/// Hardware overlay mapped through a memory device.
#[derive(Debug)]
pub struct DevmemOverlay {
    /// Bitstream path
    image: String,
    /// Memory device node
    device: PathBuf,
    /// Declared regions
    regions: BTreeMap<String, RegionDescriptor>,
    /// Regions mapped so far
    windows: Mutex<HashMap<String, DevmemMmio>>,
    /// Load-state flag
    loaded: bool,
}

impl DevmemOverlay {
    /// Load the overlay described by `manifest`.
    ///
    /// # Errors
    /// - `InvalidImage` if the image is empty or not a file
    /// - `InvalidLength` for a zero-length region
    /// - `Hardware` if programming the fabric fails
    pub fn load(manifest: &OverlayManifest, config: &DevmemConfig) -> Result<Self, OverlayError> {
        manifest.validate()?;

        let image = Path::new(&manifest.image);
        if !image.is_file() {
            return Err(OverlayError::InvalidImage(manifest.image.clone()));
        }

        match &config.fpga_manager {
            Some(manager) => program_fabric(image, manager, &config.firmware_dir)?,
            None => debug!("No FPGA manager configured, assuming fabric is already programmed"),
        }

        info!(
            "Overlay '{}' loaded with {} regions via {}",
            manifest.image,
            manifest.regions.len(),
            config.path.display()
        );

        Ok(Self {
            image: manifest.image.clone(),
            device: config.path.clone(),
            regions: manifest.regions.clone(),
            windows: Mutex::new(HashMap::new()),
            loaded: true,
        })
    }

    /// Concrete handle to a named region, mapping it on first use.
    pub fn window(&self, name: &str) -> Result<DevmemMmio, OverlayError> {
        if !self.loaded {
            return Err(OverlayError::OverlayUnloaded(self.image.clone()));
        }
        let desc = self
            .regions
            .get(name)
            .ok_or_else(|| OverlayError::UnknownRegion(name.to_string()))?;

        let mut windows = self.windows.lock();
        if let Some(mmio) = windows.get(name) {
            return Ok(mmio.clone());
        }
        let mmio = DevmemMmio::map(&self.device, desc.base, desc.length)?;
        windows.insert(name.to_string(), mmio.clone());
        Ok(mmio)
    }
}

impl Overlay for DevmemOverlay {
    fn image(&self) -> &str {
        &self.image
    }

    fn is_loaded(&self) -> bool {
        self.loaded
    }

    fn regions(&self) -> Vec<(String, RegionDescriptor)> {
        self.regions
            .iter()
            .map(|(name, desc)| (name.clone(), *desc))
            .collect()
    }

    fn get_region(&self, name: &str) -> Result<Box<dyn RegisterWindow>, OverlayError> {
        Ok(Box::new(self.window(name)?))
    }

    fn unload(&mut self) {
        if self.loaded {
            info!("Overlay '{}' unloaded", self.image);
        }
        self.loaded = false;
        self.windows.lock().clear();
    }
}

/// Hand `image` to the FPGA manager at `manager`.
///
/// The image is copied into `firmware_dir` unless it already lives there,
/// then its file name is written to the manager's `firmware` attribute.
fn program_fabric(image: &Path, manager: &Path, firmware_dir: &Path) -> Result<(), OverlayError> {
    let file_name = image
        .file_name()
        .ok_or_else(|| OverlayError::InvalidImage(image.display().to_string()))?;

    let staged = firmware_dir.join(file_name);
    if is_same_file(image, &staged) {
        debug!("{} already staged in {}", image.display(), firmware_dir.display());
    } else {
        fs::copy(image, &staged).map_err(|e| {
            OverlayError::Hardware(format!(
                "stage {} to {}: {e}",
                image.display(),
                staged.display()
            ))
        })?;
    }

    fs::write(manager.join("firmware"), file_name.as_encoded_bytes()).map_err(|e| {
        OverlayError::Hardware(format!("program {}: {e}", manager.display()))
    })?;

    match fs::read_to_string(manager.join("state")) {
        Ok(state) if state.trim() == FPGA_STATE_OPERATING => {
            info!("Fabric programmed with {}", staged.display());
        }
        Ok(state) => warn!("FPGA manager reports state '{}' after programming", state.trim()),
        Err(e) => warn!("Cannot read FPGA manager state: {}", e),
    }
    Ok(())
}

/// Copying a file onto itself truncates it.
fn is_same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
