//! Backend traits and error types.
//!
//! This module defines:
//! - `OverlayError` enum - Error kinds for overlay and register access
//! - `RegisterWindow` trait - A contiguous register-mapped I/O window
//! - `Overlay` trait - A loaded configuration image exposing named regions
//! - `Backend` trait - Factory for overlays and standalone windows
//! - `BackendFactory` type alias - Factory function type
//!
//! Client code is written against these traits only; whether the hardware or
//! the simulation backs them is decided once, at startup, by whoever
//! constructs the `Backend`.

use crate::hal::config::{BackendConfig, OverlayManifest};
use crate::hal::types::{AccessWidth, RegionDescriptor, check_access};
use std::fmt;
use thiserror::Error;

/// Error kinds for overlay and register-window operations.
///
/// Every variant is a programming or configuration error; none are transient
/// and none are retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OverlayError {
    /// Image identifier is empty or does not name a usable image
    #[error("Invalid overlay image: {0:?}")]
    InvalidImage(String),

    /// Region was not declared by the overlay
    #[error("Unknown region: {0}")]
    UnknownRegion(String),

    /// Overlay was unloaded (or never loaded)
    #[error("Overlay unloaded: {0}")]
    OverlayUnloaded(String),

    /// Window length must be non-zero
    #[error("Invalid window length: {0} bytes")]
    InvalidLength(usize),

    /// Access falls outside the window
    #[error("Access out of bounds: offset {offset:#x} + {size} bytes exceeds window length {length:#x}")]
    OutOfBounds {
        /// Offset of the first byte accessed
        offset: usize,
        /// Number of bytes accessed
        size: usize,
        /// Window length
        length: usize,
    },

    /// Width is not one of 1, 2, 4 or 8 bytes
    #[error("Unsupported access width: {0} bytes (expected 1, 2, 4 or 8)")]
    UnsupportedWidth(usize),

    /// Region name declared twice
    #[error("Duplicate region: {0}")]
    DuplicateRegion(String),

    /// Access not naturally aligned (hardware backend)
    #[error("Misaligned access: offset {offset:#x} is not aligned to {width} bytes")]
    Misaligned {
        /// Offset of the access
        offset: usize,
        /// Access width in bytes
        width: usize,
    },

    /// Hardware communication error
    #[error("Hardware access failed: {0}")]
    Hardware(String),
}

/// A contiguous register-mapped I/O window.
///
/// Offsets are relative to [`base_addr`](RegisterWindow::base_addr). Values are
/// unsigned and little-endian; writes are truncated to the access width.
///
/// Handles are cheap to clone and may alias: two handles to the same region
/// share storage, and a write through one is visible through the other.
/// Accesses to one window are serialized, so a single register access is
/// never torn.
pub trait RegisterWindow: Send + Sync + fmt::Debug {
    /// Base address of the window.
    fn base_addr(&self) -> u64;

    /// Window length in bytes.
    fn length(&self) -> usize;

    /// Read `width` bytes at `offset`.
    ///
    /// # Errors
    /// - `UnsupportedWidth` if `width` is not 1, 2, 4 or 8
    /// - `OutOfBounds` if `offset + width > length`
    fn read(&self, offset: usize, width: usize) -> Result<u64, OverlayError>;

    /// Write `value`, truncated to `width` bytes, at `offset`.
    ///
    /// # Errors
    /// Same as [`read`](RegisterWindow::read).
    fn write(&self, offset: usize, width: usize, value: u64) -> Result<(), OverlayError>;

    /// Read one 32-bit register.
    fn read_word(&self, offset: usize) -> Result<u32, OverlayError> {
        // Word reads are masked to 32 bits by the backend.
        self.read(offset, AccessWidth::Word.bytes()).map(|v| v as u32)
    }

    /// Write one 32-bit register.
    fn write_word(&self, offset: usize, value: u32) -> Result<(), OverlayError> {
        self.write(offset, AccessWidth::Word.bytes(), u64::from(value))
    }

    /// Read `count` consecutive registers of `width` bytes starting at `offset`.
    ///
    /// The whole run is validated before the first access.
    fn read_array(
        &self,
        offset: usize,
        width: usize,
        count: usize,
    ) -> Result<Vec<u64>, OverlayError> {
        let access = AccessWidth::from_bytes(width)?;
        check_access(offset, access, count, self.length())?;
        (0..count)
            .map(|i| self.read(offset + i * width, width))
            .collect()
    }

    /// Write `values` to consecutive registers of `width` bytes starting at `offset`.
    ///
    /// Fails without touching the window if any element would be out of
    /// bounds or the width is unsupported.
    fn write_array(&self, offset: usize, width: usize, values: &[u64]) -> Result<(), OverlayError> {
        let access = AccessWidth::from_bytes(width)?;
        check_access(offset, access, values.len(), self.length())?;
        for (i, value) in values.iter().enumerate() {
            self.write(offset + i * width, width, *value)?;
        }
        Ok(())
    }
}

/// A loaded configuration image exposing named register regions.
///
/// # Lifecycle
///
/// 1. Created by a backend's `load_overlay()` (the "bitstream load")
/// 2. `get_region()` hands out aliasing window handles
/// 3. `unload()` makes every later `get_region()` fail
///
/// The region map is fixed at load time.
pub trait Overlay: Send + Sync + fmt::Debug {
    /// Identifier of the loaded image.
    fn image(&self) -> &str;

    /// Whether the overlay is still usable.
    fn is_loaded(&self) -> bool;

    /// Declared regions, ordered by name.
    fn regions(&self) -> Vec<(String, RegionDescriptor)>;

    /// Get a handle to a named region.
    ///
    /// Repeated calls with the same name alias the same storage.
    ///
    /// # Errors
    /// - `OverlayUnloaded` after [`unload`](Overlay::unload), for any name
    /// - `UnknownRegion` if `name` was not declared
    fn get_region(&self, name: &str) -> Result<Box<dyn RegisterWindow>, OverlayError>;

    /// Mark the overlay unusable. Idempotent.
    fn unload(&mut self);
}

/// Factory function type for creating backend instances.
pub type BackendFactory = fn(&BackendConfig) -> Box<dyn Backend>;

/// Trait implemented by every overlay backend (simulation, `/dev/mem`, ...).
pub trait Backend: Send + Sync {
    /// Returns the backend's unique identifier (e.g., "simulation").
    fn name(&self) -> &'static str;

    /// Returns the backend's semantic version.
    fn version(&self) -> &'static str;

    /// Load an overlay described by `manifest`.
    ///
    /// # Errors
    /// `InvalidImage` for an empty or unusable image identifier, plus any
    /// region validation error (`InvalidLength`).
    fn load_overlay(&self, manifest: &OverlayManifest) -> Result<Box<dyn Overlay>, OverlayError>;

    /// Create a standalone window not owned by any overlay.
    ///
    /// # Errors
    /// `InvalidLength` if `length` is zero.
    fn map_window(&self, base: u64, length: usize)
    -> Result<Box<dyn RegisterWindow>, OverlayError>;
}
