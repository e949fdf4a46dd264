//! # OVL HAL Library
//!
//! Overlay / register-window backends with a pluggable backend architecture.
//!
//! Client code is written against the traits in `ovl_common::hal::backend`
//! (`Backend`, `Overlay`, `RegisterWindow`). Whether those are served by the
//! in-memory simulation or by physical registers is decided once, when a
//! [`Session`] is built from a [`BackendRegistry`].
//!
//! # Module Structure
//!
//! - [`backend_registry`] - Backend factory registration
//! - [`backends`] - Simulation and `/dev/mem` implementations
//! - [`session`] - Session owning the backend and the loaded overlay
//! - [`script`] - Register-access script parsing
//! - [`error`] - Host-level error type
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                     ovl_hal (single crate)                    │
//! │  ┌─────────────┐    ┌──────────────┐    ┌──────────────────┐  │
//! │  │   Script    │───►│   Session    │◄───│ BackendRegistry  │  │
//! │  │  (AccessOp) │    │              │    │                  │  │
//! │  └─────────────┘    └──────┬───────┘    └──────────────────┘  │
//! │                            │                                  │
//! │                            ▼                                  │
//! │              ┌──────────────────────────┐                     │
//! │              │ Backend → Overlay →      │ (trait objects)     │
//! │              │           RegisterWindow │                     │
//! │              └──────────────────────────┘                     │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust
//! use ovl_common::prelude::*;
//! use ovl_hal::backends::simulation::SimulationBackend;
//!
//! let backend = SimulationBackend::new();
//! let manifest = OverlayManifest::new("qick_top.bit")
//!     .with_region("tproc", 0x4000_0000, 16)
//!     .unwrap();
//! let overlay = backend.load_overlay(&manifest).unwrap();
//!
//! let tproc = overlay.get_region("tproc").unwrap();
//! tproc.write(4, 4, 0xDEAD_BEEF).unwrap();
//! assert_eq!(tproc.read(4, 4).unwrap(), 0xDEAD_BEEF);
//! ```

#![deny(missing_docs)]

pub mod backend_registry;
pub mod backends;
pub mod error;
pub mod script;
pub mod session;

// Re-export key types for convenience
pub use crate::backend_registry::BackendRegistry;
pub use crate::error::HostError;
pub use crate::script::{AccessOp, ScriptError, parse_script};
pub use crate::session::{AccessOutcome, Session};
