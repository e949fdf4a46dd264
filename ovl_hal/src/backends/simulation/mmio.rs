//! Simulated register window.
//!
//! `SimMmio` backs a window with a zero-initialized byte buffer behind a
//! mutex. Cloning a `SimMmio` yields an aliasing handle: both clones share the
//! buffer, exactly like two mappings of the same physical register block.

use ovl_common::hal::backend::{OverlayError, RegisterWindow};
use ovl_common::hal::types::{AccessWidth, check_access};
use parking_lot::Mutex;
use static_assertions::assert_impl_all;
use std::sync::Arc;
use tracing::trace;

/// In-memory register window.
#[derive(Debug, Clone)]
pub struct SimMmio {
    /// Logical base address (a key, not a physical address)
    base: u64,
    /// Window length in bytes (fixed at construction)
    length: usize,
    /// Backing storage shared by all aliasing handles
    storage: Arc<Mutex<Vec<u8>>>,
}

assert_impl_all!(SimMmio: Send, Sync, Clone);

impl SimMmio {
    /// Create a standalone window of `length` zeroed bytes.
    ///
    /// # Errors
    /// Returns `OverlayError::InvalidLength` if `length` is zero.
    pub fn new(base: u64, length: usize) -> Result<Self, OverlayError> {
        if length == 0 {
            return Err(OverlayError::InvalidLength(length));
        }
        Ok(Self {
            base,
            length,
            storage: Arc::new(Mutex::new(vec![0u8; length])),
        })
    }

    /// Whether `self` and `other` share backing storage.
    pub fn aliases(&self, other: &SimMmio) -> bool {
        Arc::ptr_eq(&self.storage, &other.storage)
    }

    /// Copy of the whole backing buffer.
    pub fn snapshot(&self) -> Vec<u8> {
        self.storage.lock().clone()
    }

    fn checked(&self, offset: usize, width: usize, count: usize) -> Result<AccessWidth, OverlayError> {
        let access = AccessWidth::from_bytes(width)?;
        check_access(offset, access, count, self.length)?;
        Ok(access)
    }
}

impl RegisterWindow for SimMmio {
    fn base_addr(&self) -> u64 {
        self.base
    }

    fn length(&self) -> usize {
        self.length
    }

    fn read(&self, offset: usize, width: usize) -> Result<u64, OverlayError> {
        let access = self.checked(offset, width, 1)?;
        let value = access.decode(&self.storage.lock()[offset..offset + width]);
        trace!(base = self.base, offset, width, value, "sim read");
        Ok(value)
    }

    fn write(&self, offset: usize, width: usize, value: u64) -> Result<(), OverlayError> {
        let access = self.checked(offset, width, 1)?;
        access.encode(value, &mut self.storage.lock()[offset..offset + width]);
        trace!(base = self.base, offset, width, value, "sim write");
        Ok(())
    }

    fn read_array(
        &self,
        offset: usize,
        width: usize,
        count: usize,
    ) -> Result<Vec<u64>, OverlayError> {
        let access = self.checked(offset, width, count)?;
        let end = offset + width * count;
        let storage = self.storage.lock();
        Ok(storage[offset..end]
            .chunks_exact(width)
            .map(|chunk| access.decode(chunk))
            .collect())
    }

    fn write_array(&self, offset: usize, width: usize, values: &[u64]) -> Result<(), OverlayError> {
        let access = self.checked(offset, width, values.len())?;
        let end = offset + width * values.len();
        let mut storage = self.storage.lock();
        for (chunk, value) in storage[offset..end].chunks_exact_mut(width).zip(values) {
            access.encode(*value, chunk);
        }
        trace!(base = self.base, offset, width, count = values.len(), "sim write_array");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn zero_length_is_rejected() {
        assert_eq!(SimMmio::new(0x4000_0000, 0).unwrap_err(), OverlayError::InvalidLength(0));
    }

    #[test]
    fn fresh_window_is_zeroed() {
        let mmio = SimMmio::new(0x4000_0000, 32).unwrap();
        assert_eq!(mmio.snapshot(), vec![0u8; 32]);
        for width in AccessWidth::ALL {
            assert_eq!(mmio.read(32 - width.bytes(), width.bytes()).unwrap(), 0);
        }
    }

    #[test]
    fn deadbeef_scenario() {
        let mmio = SimMmio::new(0x4000_0000, 16).unwrap();
        mmio.write(4, 4, 0xDEAD_BEEF).unwrap();
        assert_eq!(mmio.read(4, 4).unwrap(), 0xDEAD_BEEF);
        assert_eq!(mmio.read(0, 4).unwrap(), 0);
        assert_eq!(
            mmio.write(14, 4, 0x1),
            Err(OverlayError::OutOfBounds {
                offset: 14,
                size: 4,
                length: 16
            })
        );
    }

    #[test]
    fn storage_is_little_endian() {
        let mmio = SimMmio::new(0, 8).unwrap();
        mmio.write(0, 8, 0x0807_0605_0403_0201).unwrap();
        assert_eq!(mmio.snapshot(), vec![1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(mmio.read(2, 2).unwrap(), 0x0403);
    }

    #[test]
    fn write_truncates_to_width() {
        let mmio = SimMmio::new(0, 8).unwrap();
        mmio.write(0, 1, 0x1234).unwrap();
        assert_eq!(mmio.read(0, 8).unwrap(), 0x34);
    }

    #[test]
    fn unaligned_access_is_allowed() {
        let mmio = SimMmio::new(0, 8).unwrap();
        mmio.write(1, 4, 0xAABB_CCDD).unwrap();
        assert_eq!(mmio.read(1, 4).unwrap(), 0xAABB_CCDD);
    }

    #[test]
    fn unsupported_width() {
        let mmio = SimMmio::new(0, 16).unwrap();
        assert_eq!(mmio.read(0, 3), Err(OverlayError::UnsupportedWidth(3)));
        assert_eq!(mmio.write(0, 16, 0), Err(OverlayError::UnsupportedWidth(16)));
    }

    #[test]
    fn clones_alias_storage() {
        let a = SimMmio::new(0x100, 16).unwrap();
        let b = a.clone();
        let c = SimMmio::new(0x100, 16).unwrap();
        assert!(a.aliases(&b));
        assert!(!a.aliases(&c));

        a.write_word(0, 42).unwrap();
        assert_eq!(b.read_word(0).unwrap(), 42);
        assert_eq!(c.read_word(0).unwrap(), 0);
    }

    #[test]
    fn write_array_failure_leaves_buffer_untouched() {
        let mmio = SimMmio::new(0, 16).unwrap();
        mmio.write_array(0, 4, &[1, 2, 3, 4]).unwrap();
        let before = mmio.snapshot();

        assert!(mmio.write_array(8, 4, &[9, 9, 9]).is_err());
        assert!(mmio.write_array(0, 3, &[9]).is_err());
        assert_eq!(mmio.snapshot(), before);
    }

    #[test]
    fn array_round_trip() {
        let mmio = SimMmio::new(0, 32).unwrap();
        mmio.write_array(8, 2, &[0xAAAA, 0xBBBB, 0x1_CCCC]).unwrap();
        assert_eq!(mmio.read_array(8, 2, 3).unwrap(), vec![0xAAAA, 0xBBBB, 0xCCCC]);
        assert_eq!(mmio.read_array(0, 8, 0).unwrap(), Vec::<u64>::new());
    }

    #[test]
    fn concurrent_aliased_writes_are_never_torn() {
        let mmio = SimMmio::new(0, 8).unwrap();
        let patterns = [0x1111_1111_1111_1111u64, 0x2222_2222_2222_2222u64];

        let writers: Vec<_> = patterns
            .iter()
            .map(|&pattern| {
                let handle = mmio.clone();
                thread::spawn(move || {
                    for _ in 0..1000 {
                        handle.write(0, 8, pattern).unwrap();
                    }
                })
            })
            .collect();

        for _ in 0..1000 {
            let value = mmio.read(0, 8).unwrap();
            assert!(value == 0 || patterns.contains(&value), "torn read {value:#x}");
        }
        for writer in writers {
            writer.join().unwrap();
        }
    }
}
