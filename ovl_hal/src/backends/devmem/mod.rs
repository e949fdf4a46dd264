//! `/dev/mem` hardware backend module.
//!
//! Talks to physical registers through a memory mapping of the configured
//! memory device. Requires root (or a suitably permissioned device node).

mod backend;
mod mmio;
mod overlay;

pub use backend::DevmemBackend;
pub use mmio::DevmemMmio;
pub use overlay::DevmemOverlay;

use ovl_common::hal::backend::Backend;
use ovl_common::hal::config::BackendConfig;

/// Factory function to create a devmem backend instance.
pub fn create_backend(config: &BackendConfig) -> Box<dyn Backend> {
    Box::new(DevmemBackend::new(config.devmem.clone()))
}
