//! Prelude module for common re-exports.
//!
//! ```rust
//! use ovl_common::prelude::*;
//! ```

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{ConfigError, ConfigLoader, HostConfig, LogLevel, SharedConfig};
pub use crate::hal::config::{BackendConfig, BackendKind, DevmemConfig, OverlayManifest};

// ─── Backend Traits ─────────────────────────────────────────────────
pub use crate::hal::backend::{Backend, BackendFactory, Overlay, OverlayError, RegisterWindow};

// ─── Access Types ───────────────────────────────────────────────────
pub use crate::hal::types::{AccessWidth, RegionDescriptor, check_access};

// ─── Constants ──────────────────────────────────────────────────────
pub use crate::consts::{BACKEND_ENV_VAR, DEFAULT_ACCESS_WIDTH, DEFAULT_CONFIG_PATH};
