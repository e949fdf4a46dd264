//! OVL Common Library
//!
//! Shared types for the overlay / register-window backends: the backend
//! traits every implementation satisfies, access-width and region types,
//! error kinds, and TOML configuration loading.
//!
//! # Module Structure
//!
//! - [`hal`] - Backend traits, access types, overlay manifests
//! - [`config`] - Configuration loading traits and the host configuration
//! - [`consts`] - Workspace-wide constants
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! ```rust
//! use ovl_common::prelude::*;
//!
//! let manifest = OverlayManifest::new("qick_top.bit")
//!     .with_region("axi_gpio", 0x4120_0000, 0x1000)
//!     .unwrap();
//! assert_eq!(manifest.regions.len(), 1);
//! ```

pub mod config;
pub mod consts;
pub mod hal;
pub mod prelude;
