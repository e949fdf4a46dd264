//! System-wide constants for the OVL workspace.
//!
//! Single source of truth for default paths and register access limits.

/// Environment variable consulted once at startup to override the backend.
pub const BACKEND_ENV_VAR: &str = "OVL_BACKEND";

/// Default host configuration file.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/ovl/host.toml";

/// Default physical memory device used by the hardware backend.
pub const DEFAULT_DEVMEM_PATH: &str = "/dev/mem";

/// Default directory the FPGA manager loads firmware images from.
pub const DEFAULT_FIRMWARE_DIR: &str = "/lib/firmware";

/// Register width used by the word-sized convenience accessors.
pub const DEFAULT_ACCESS_WIDTH: usize = 4;

/// Widest single register access, in bytes.
pub const MAX_ACCESS_WIDTH: usize = 8;
