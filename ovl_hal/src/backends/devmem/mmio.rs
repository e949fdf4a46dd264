//! `/dev/mem` register window.
//!
//! Maps the page-aligned span covering `[base, base + length)` and performs
//! volatile, naturally aligned accesses inside it. Clones share the mapping.

use memmap2::{MmapMut, MmapOptions};
use ovl_common::hal::backend::{OverlayError, RegisterWindow};
use ovl_common::hal::types::{AccessWidth, check_access};
use parking_lot::Mutex;
use std::fs::OpenOptions;
use std::os::unix::fs::OpenOptionsExt;
use std::path::Path;
use std::ptr;
use std::sync::Arc;
use tracing::{debug, trace};

/// Fallback when `sysconf` cannot report the page size.
const FALLBACK_PAGE_SIZE: u64 = 4096;

fn page_size() -> u64 {
    // SAFETY: sysconf has no preconditions.
    let size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    if size > 0 {
        size as u64
    } else {
        FALLBACK_PAGE_SIZE
    }
}

/// Register window backed by a memory mapping of a device node.
#[derive(Debug, Clone)]
pub struct DevmemMmio {
    /// Physical base address of the window
    base: u64,
    /// Window length in bytes
    length: usize,
    /// Distance from the start of the mapping to `base`
    page_offset: usize,
    /// Mapping shared by all aliasing handles
    map: Arc<Mutex<MmapMut>>,
}

impl DevmemMmio {
    /// Map `length` bytes at physical address `base` from `device`.
    ///
    /// # Errors
    /// - `InvalidLength` if `length` is zero
    /// - `Hardware` if the device cannot be opened or mapped
    pub fn map(device: &Path, base: u64, length: usize) -> Result<Self, OverlayError> {
        if length == 0 {
            return Err(OverlayError::InvalidLength(length));
        }

        let aligned = base & !(page_size() - 1);
        let page_offset = (base - aligned) as usize;

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(libc::O_SYNC)
            .open(device)
            .map_err(|e| OverlayError::Hardware(format!("open {}: {e}", device.display())))?;

        // SAFETY: the mapping is only touched through bounds-checked volatile
        // accesses below; other processes mapping the same registers is the
        // expected hardware situation.
        let map = unsafe {
            MmapOptions::new()
                .offset(aligned)
                .len(page_offset + length)
                .map_mut(&file)
        }
        .map_err(|e| {
            OverlayError::Hardware(format!("mmap {} at {base:#x}: {e}", device.display()))
        })?;

        debug!(
            "Mapped {} bytes at {:#x} from {}",
            length,
            base,
            device.display()
        );

        Ok(Self {
            base,
            length,
            page_offset,
            map: Arc::new(Mutex::new(map)),
        })
    }

    /// Whether `self` and `other` share the same mapping.
    pub fn aliases(&self, other: &DevmemMmio) -> bool {
        Arc::ptr_eq(&self.map, &other.map)
    }

    fn checked(&self, offset: usize, width: usize, count: usize) -> Result<AccessWidth, OverlayError> {
        let access = AccessWidth::from_bytes(width)?;
        check_access(offset, access, count, self.length)?;
        if (self.page_offset + offset) % width != 0 {
            return Err(OverlayError::Misaligned { offset, width });
        }
        Ok(access)
    }

    /// Volatile load; caller holds the lock and has validated the access.
    fn load(map: &MmapMut, at: usize, access: AccessWidth) -> u64 {
        // SAFETY: `at` is in bounds and naturally aligned (checked), and the
        // mapping itself is page-aligned.
        unsafe {
            let src = map.as_ptr().add(at);
            match access {
                AccessWidth::Byte => u64::from(ptr::read_volatile(src)),
                AccessWidth::Half => u64::from(u16::from_le(ptr::read_volatile(src.cast::<u16>()))),
                AccessWidth::Word => u64::from(u32::from_le(ptr::read_volatile(src.cast::<u32>()))),
                AccessWidth::Double => u64::from_le(ptr::read_volatile(src.cast::<u64>())),
            }
        }
    }

    /// Volatile store; caller holds the lock and has validated the access.
    fn store(map: &mut MmapMut, at: usize, access: AccessWidth, value: u64) {
        // SAFETY: see `load`.
        unsafe {
            let dst = map.as_mut_ptr().add(at);
            match access {
                AccessWidth::Byte => ptr::write_volatile(dst, value as u8),
                AccessWidth::Half => ptr::write_volatile(dst.cast::<u16>(), (value as u16).to_le()),
                AccessWidth::Word => ptr::write_volatile(dst.cast::<u32>(), (value as u32).to_le()),
                AccessWidth::Double => ptr::write_volatile(dst.cast::<u64>(), value.to_le()),
            }
        }
    }
}

impl RegisterWindow for DevmemMmio {
    fn base_addr(&self) -> u64 {
        self.base
    }

    fn length(&self) -> usize {
        self.length
    }

    fn read(&self, offset: usize, width: usize) -> Result<u64, OverlayError> {
        let access = self.checked(offset, width, 1)?;
        let value = Self::load(&self.map.lock(), self.page_offset + offset, access);
        trace!(base = self.base, offset, width, value, "devmem read");
        Ok(value)
    }

    fn write(&self, offset: usize, width: usize, value: u64) -> Result<(), OverlayError> {
        let access = self.checked(offset, width, 1)?;
        Self::store(&mut self.map.lock(), self.page_offset + offset, access, value);
        trace!(base = self.base, offset, width, value, "devmem write");
        Ok(())
    }

    fn read_array(
        &self,
        offset: usize,
        width: usize,
        count: usize,
    ) -> Result<Vec<u64>, OverlayError> {
        let access = self.checked(offset, width, count)?;
        let map = self.map.lock();
        Ok((0..count)
            .map(|i| Self::load(&map, self.page_offset + offset + i * width, access))
            .collect())
    }

    fn write_array(&self, offset: usize, width: usize, values: &[u64]) -> Result<(), OverlayError> {
        let access = self.checked(offset, width, values.len())?;
        let mut map = self.map.lock();
        for (i, value) in values.iter().enumerate() {
            Self::store(&mut map, self.page_offset + offset + i * width, access, *value);
        }
        Ok(())
    }
}
