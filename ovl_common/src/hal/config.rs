//! Backend and overlay configuration types.
//!
//! - `OverlayManifest` - Image identifier plus declared regions (`[overlay]`)
//! - `BackendKind` - Which backend implementation to construct
//! - `BackendConfig` / `DevmemConfig` - Backend selection and hardware paths (`[backend]`)

use crate::config::ConfigError;
use crate::consts::{DEFAULT_DEVMEM_PATH, DEFAULT_FIRMWARE_DIR};
use crate::hal::backend::OverlayError;
use crate::hal::consts::{DEVMEM_BACKEND, SIMULATION_BACKEND};
use crate::hal::types::RegionDescriptor;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Default function for the memory device path
fn default_devmem_path() -> PathBuf {
    PathBuf::from(DEFAULT_DEVMEM_PATH)
}

/// Default function for the firmware directory
fn default_firmware_dir() -> PathBuf {
    PathBuf::from(DEFAULT_FIRMWARE_DIR)
}

/// Description of an overlay: the image to load and the regions it exposes.
///
/// # TOML Example
///
/// ```toml
/// [overlay]
/// image = "qick_top.bit"
///
/// [overlay.regions.axi_gpio]
/// base = 0x4120_0000
/// length = 0x1000
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverlayManifest {
    /// Image identifier (a bitstream path for the hardware backend).
    pub image: String,

    /// Declared regions keyed by name.
    #[serde(default)]
    pub regions: BTreeMap<String, RegionDescriptor>,
}

impl OverlayManifest {
    /// Create a manifest with no regions.
    pub fn new(image: impl Into<String>) -> Self {
        Self {
            image: image.into(),
            regions: BTreeMap::new(),
        }
    }

    /// Declare a region.
    ///
    /// # Errors
    /// - `DuplicateRegion` if `name` is already declared
    /// - `InvalidLength` if `length` is zero
    pub fn with_region(
        mut self,
        name: impl Into<String>,
        base: u64,
        length: usize,
    ) -> Result<Self, OverlayError> {
        let name = name.into();
        if length == 0 {
            return Err(OverlayError::InvalidLength(length));
        }
        if self.regions.contains_key(&name) {
            return Err(OverlayError::DuplicateRegion(name));
        }
        self.regions.insert(name, RegionDescriptor::new(base, length));
        Ok(self)
    }

    /// Validate image identifier and region lengths.
    ///
    /// # Errors
    /// - `InvalidImage` if the image identifier is empty or whitespace
    /// - `InvalidLength` if any region has zero length
    pub fn validate(&self) -> Result<(), OverlayError> {
        if self.image.trim().is_empty() {
            return Err(OverlayError::InvalidImage(self.image.clone()));
        }
        if let Some(region) = self.regions.values().find(|r| r.length == 0) {
            return Err(OverlayError::InvalidLength(region.length));
        }
        Ok(())
    }
}

/// Backend implementation to construct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// In-memory software simulation.
    #[default]
    Simulation,
    /// Physical registers through `/dev/mem`.
    Devmem,
}

impl BackendKind {
    /// Registry name of this backend.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Simulation => SIMULATION_BACKEND,
            Self::Devmem => DEVMEM_BACKEND,
        }
    }

    /// Interpret the value of the backend environment switch.
    ///
    /// `None` and empty values mean "not set".
    ///
    /// # Errors
    /// Returns `ConfigError::ValidationError` for unrecognized values.
    pub fn from_env_value(value: Option<&str>) -> Result<Option<Self>, ConfigError> {
        match value.map(str::trim) {
            None | Some("") => Ok(None),
            Some(v) => v.parse().map(Some),
        }
    }

    /// Pick the backend: explicit `flag`, then the environment `env` value,
    /// then `configured`. `env` is only parsed when no flag is given.
    ///
    /// # Errors
    /// `ValidationError` if `env` is consulted and names no known backend.
    pub fn resolve(
        flag: Option<Self>,
        env: Option<&str>,
        configured: Self,
    ) -> Result<Self, ConfigError> {
        if let Some(kind) = flag {
            return Ok(kind);
        }
        Ok(Self::from_env_value(env)?.unwrap_or(configured))
    }
}

impl FromStr for BackendKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sim" | "simulation" => Ok(Self::Simulation),
            "hw" | "hardware" | "devmem" => Ok(Self::Devmem),
            other => Err(ConfigError::ValidationError(format!(
                "unknown backend '{other}' (expected sim or devmem)"
            ))),
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Paths used by the `/dev/mem` backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DevmemConfig {
    /// Physical memory device.
    #[serde(default = "default_devmem_path")]
    pub path: PathBuf,

    /// FPGA manager sysfs directory. When set, loading an overlay programs
    /// the fabric through it.
    #[serde(default)]
    pub fpga_manager: Option<PathBuf>,

    /// Directory the FPGA manager resolves firmware names against.
    #[serde(default = "default_firmware_dir")]
    pub firmware_dir: PathBuf,
}

impl Default for DevmemConfig {
    fn default() -> Self {
        Self {
            path: default_devmem_path(),
            fpga_manager: None,
            firmware_dir: default_firmware_dir(),
        }
    }
}

/// Backend selection (`[backend]` table).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Which backend to construct.
    #[serde(default)]
    pub kind: BackendKind,

    /// Hardware backend settings.
    #[serde(default)]
    pub devmem: DevmemConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manifest_builder_rejects_duplicates() {
        let result = OverlayManifest::new("top.bit")
            .with_region("gpio", 0x4000_0000, 0x100)
            .and_then(|m| m.with_region("gpio", 0x4001_0000, 0x100));
        assert_eq!(result, Err(OverlayError::DuplicateRegion("gpio".into())));
    }

    #[test]
    fn manifest_builder_rejects_zero_length() {
        let result = OverlayManifest::new("top.bit").with_region("gpio", 0, 0);
        assert_eq!(result, Err(OverlayError::InvalidLength(0)));
    }

    #[test]
    fn manifest_validate_image() {
        assert!(OverlayManifest::new("top.bit").validate().is_ok());
        assert!(matches!(
            OverlayManifest::new("").validate(),
            Err(OverlayError::InvalidImage(_))
        ));
        assert!(matches!(
            OverlayManifest::new("   ").validate(),
            Err(OverlayError::InvalidImage(_))
        ));
    }

    #[test]
    fn manifest_from_toml() {
        let manifest: OverlayManifest = toml::from_str(
            r#"
image = "qick_top.bit"

[regions.axi_gpio]
base = 0x4120_0000
length = 0x1000

[regions.tproc]
base = 0x4000_0000
length = 64
"#,
        )
        .unwrap();

        assert_eq!(manifest.image, "qick_top.bit");
        assert_eq!(
            manifest.regions.get("axi_gpio"),
            Some(&RegionDescriptor::new(0x4120_0000, 0x1000))
        );
        let names: Vec<_> = manifest.regions.keys().cloned().collect();
        assert_eq!(names, vec!["axi_gpio", "tproc"]);
    }

    #[test]
    fn backend_kind_parsing() {
        assert_eq!("sim".parse::<BackendKind>().unwrap(), BackendKind::Simulation);
        assert_eq!("SIM".parse::<BackendKind>().unwrap(), BackendKind::Simulation);
        assert_eq!("Devmem".parse::<BackendKind>().unwrap(), BackendKind::Devmem);
        assert_eq!("hw".parse::<BackendKind>().unwrap(), BackendKind::Devmem);
        assert!("fpga".parse::<BackendKind>().is_err());
    }

    #[test]
    fn backend_kind_from_env_value() {
        assert_eq!(BackendKind::from_env_value(None).unwrap(), None);
        assert_eq!(BackendKind::from_env_value(Some("")).unwrap(), None);
        assert_eq!(
            BackendKind::from_env_value(Some("Sim")).unwrap(),
            Some(BackendKind::Simulation)
        );
        assert!(BackendKind::from_env_value(Some("quantum")).is_err());
    }

    #[test]
    fn backend_kind_precedence() {
        use BackendKind::{Devmem, Simulation};

        assert_eq!(BackendKind::resolve(None, None, Devmem).unwrap(), Devmem);
        assert_eq!(BackendKind::resolve(None, Some(" "), Devmem).unwrap(), Devmem);
        assert_eq!(BackendKind::resolve(None, Some("sim"), Devmem).unwrap(), Simulation);
        assert_eq!(
            BackendKind::resolve(Some(Devmem), Some("sim"), Simulation).unwrap(),
            Devmem
        );
        // A flag shadows a malformed environment value.
        assert_eq!(
            BackendKind::resolve(Some(Simulation), Some("quantum"), Devmem).unwrap(),
            Simulation
        );
        assert!(matches!(
            BackendKind::resolve(None, Some("quantum"), Simulation),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn backend_config_defaults() {
        let config: BackendConfig = toml::from_str("").unwrap();
        assert_eq!(config.kind, BackendKind::Simulation);
        assert_eq!(config.devmem.path, PathBuf::from("/dev/mem"));
        assert!(config.devmem.fpga_manager.is_none());

        let config: BackendConfig = toml::from_str("kind = \"devmem\"").unwrap();
        assert_eq!(config.kind, BackendKind::Devmem);
        assert_eq!(config.kind.name(), "devmem");
    }
}
