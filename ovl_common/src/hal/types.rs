//! Register access types.
//!
//! - `AccessWidth` - The register widths a window supports (1/2/4/8 bytes)
//! - `RegionDescriptor` - Base address and length of a named sub-device
//! - `check_access` - Bounds validation shared by every backend
//!
//! # Byte Order
//!
//! Every multi-byte register value is encoded **little-endian**, matching the
//! AXI bus convention of the hardware driver. This is part of the compatibility
//! contract: a value written through the simulation lands in the backing
//! buffer exactly as the hardware would store it.

use crate::consts::MAX_ACCESS_WIDTH;
use crate::hal::backend::OverlayError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Width of a single register access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AccessWidth {
    /// 8-bit access
    Byte = 1,
    /// 16-bit access
    Half = 2,
    /// 32-bit access (the native register width)
    Word = 4,
    /// 64-bit access
    Double = 8,
}

impl AccessWidth {
    /// All supported widths, narrowest first.
    pub const ALL: [AccessWidth; 4] = [
        AccessWidth::Byte,
        AccessWidth::Half,
        AccessWidth::Word,
        AccessWidth::Double,
    ];

    /// Validate a width given in bytes.
    ///
    /// # Errors
    /// Returns `OverlayError::UnsupportedWidth` unless `width` is 1, 2, 4 or 8.
    pub fn from_bytes(width: usize) -> Result<Self, OverlayError> {
        match width {
            1 => Ok(Self::Byte),
            2 => Ok(Self::Half),
            4 => Ok(Self::Word),
            8 => Ok(Self::Double),
            other => Err(OverlayError::UnsupportedWidth(other)),
        }
    }

    /// Width in bytes.
    pub const fn bytes(self) -> usize {
        self as usize
    }

    /// Mask selecting the bits a register of this width can hold.
    pub const fn mask(self) -> u64 {
        match self {
            Self::Double => u64::MAX,
            other => (1u64 << (other.bytes() * 8)) - 1,
        }
    }

    /// Encode `value`, truncated to this width, into `dst` (little-endian).
    ///
    /// `dst` must be exactly `self.bytes()` long.
    pub fn encode(self, value: u64, dst: &mut [u8]) {
        dst.copy_from_slice(&value.to_le_bytes()[..self.bytes()]);
    }

    /// Decode an unsigned little-endian value from `src`.
    ///
    /// `src` must be exactly `self.bytes()` long.
    pub fn decode(self, src: &[u8]) -> u64 {
        let mut raw = [0u8; MAX_ACCESS_WIDTH];
        raw[..self.bytes()].copy_from_slice(src);
        u64::from_le_bytes(raw)
    }
}

impl fmt::Display for AccessWidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.bytes())
    }
}

/// Address range of a named sub-device inside an overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionDescriptor {
    /// Base address of the register window.
    pub base: u64,
    /// Window length in bytes.
    pub length: usize,
}

impl RegionDescriptor {
    /// Create a region descriptor.
    pub const fn new(base: u64, length: usize) -> Self {
        Self { base, length }
    }
}

/// Validate a run of `count` accesses of `width` starting at `offset`
/// against a window of `length` bytes.
///
/// The span is computed with checked arithmetic, so offsets near
/// `usize::MAX` are rejected instead of wrapping.
///
/// # Errors
/// Returns `OverlayError::OutOfBounds` if `offset + width * count > length`.
pub fn check_access(
    offset: usize,
    width: AccessWidth,
    count: usize,
    length: usize,
) -> Result<(), OverlayError> {
    let size = count.saturating_mul(width.bytes());
    match offset.checked_add(size) {
        Some(end) if end <= length => Ok(()),
        _ => Err(OverlayError::OutOfBounds {
            offset,
            size,
            length,
        }),
    }
}
