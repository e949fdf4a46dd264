//! Session: a backend, the overlay it loaded, and register operations on it.
//!
//! The session receives its backend at construction, either from a
//! [`BackendRegistry`] or injected directly, and owns it for its lifetime.
//! Client code goes through [`Session::region`] and never learns which
//! backend is active.

use crate::backend_registry::BackendRegistry;
use crate::error::HostError;
use crate::script::AccessOp;
use ovl_common::config::HostConfig;
use ovl_common::hal::backend::{Backend, Overlay, OverlayError, RegisterWindow};
use ovl_common::hal::types::AccessWidth;
use serde::Serialize;
use std::fmt;
use std::path::Path;
use tracing::{debug, info};

/// Result of one executed [`AccessOp`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum AccessOutcome {
    /// Value read from one register.
    Read {
        /// Region name
        region: String,
        /// Byte offset
        offset: usize,
        /// Width in bytes
        width: usize,
        /// Value read
        value: u64,
    },
    /// Register written.
    Written {
        /// Region name
        region: String,
        /// Byte offset
        offset: usize,
        /// Width in bytes
        width: usize,
        /// Value written, truncated to width
        value: u64,
    },
    /// Values read from consecutive registers.
    Array {
        /// Region name
        region: String,
        /// Byte offset of the first register
        offset: usize,
        /// Width in bytes
        width: usize,
        /// Values read
        values: Vec<u64>,
    },
    /// Raw bytes of a whole region.
    Dump {
        /// Region name
        region: String,
        /// Base address of the region
        base: u64,
        /// Region contents
        bytes: Vec<u8>,
    },
}

fn hex_digits(width: usize) -> usize {
    width * 2
}

impl fmt::Display for AccessOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read {
                region,
                offset,
                width,
                value,
            } => write!(
                f,
                "{region}[{offset:#06x}] = {value:#0w$x}",
                w = hex_digits(*width) + 2
            ),
            Self::Written {
                region,
                offset,
                width,
                value,
            } => write!(
                f,
                "{region}[{offset:#06x}] <- {value:#0w$x}",
                w = hex_digits(*width) + 2
            ),
            Self::Array {
                region,
                offset,
                width,
                values,
            } => {
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                    }
                    write!(
                        f,
                        "{region}[{:#06x}] = {value:#0w$x}",
                        offset + i * width,
                        w = hex_digits(*width) + 2
                    )?;
                }
                Ok(())
            }
            Self::Dump {
                region,
                base,
                bytes,
            } => {
                write!(f, "{region} @ {base:#010x}")?;
                for (row, chunk) in bytes.chunks(16).enumerate() {
                    write!(f, "\n  {:06x}:", row * 16)?;
                    for byte in chunk {
                        write!(f, " {byte:02x}")?;
                    }
                }
                Ok(())
            }
        }
    }
}

/// An active backend plus the overlay loaded through it.
pub struct Session {
    /// Host configuration (overlay manifest, backend selection)
    config: HostConfig,
    /// Backend chosen at construction
    backend: Box<dyn Backend>,
    /// Loaded overlay, if any
    overlay: Option<Box<dyn Overlay>>,
}

impl Session {
    /// Load and validate a host configuration file.
    pub fn load_config(path: &Path) -> Result<HostConfig, HostError> {
        info!("Loading configuration from {:?}", path);
        Ok(HostConfig::load_validated(path)?)
    }

    /// Create a session using the backend named by `config.backend.kind`.
    ///
    /// # Errors
    /// Configuration validation errors, or `BackendNotFound`.
    pub fn new(config: HostConfig, registry: &BackendRegistry) -> Result<Self, HostError> {
        config.validate()?;
        let backend = registry.create_backend(config.backend.kind.name(), &config.backend)?;
        Self::with_backend(config, backend)
    }

    /// Create a session with an explicitly provided backend.
    pub fn with_backend(config: HostConfig, backend: Box<dyn Backend>) -> Result<Self, HostError> {
        config.validate()?;
        info!(
            "Session '{}' using backend '{}'",
            config.shared.service_name,
            backend.name()
        );
        Ok(Self {
            config,
            backend,
            overlay: None,
        })
    }

    /// Name of the active backend.
    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Configuration the session was built from.
    pub fn config(&self) -> &HostConfig {
        &self.config
    }

    /// Load the configured overlay, replacing any previously loaded one.
    ///
    /// The previous overlay stays in place if the new load fails.
    pub fn load_overlay(&mut self) -> Result<&dyn Overlay, HostError> {
        let overlay = self.backend.load_overlay(&self.config.overlay)?;
        if let Some(mut previous) = self.overlay.replace(overlay) {
            previous.unload();
        }
        match self.overlay.as_deref() {
            Some(overlay) => Ok(overlay),
            None => Err(OverlayError::OverlayUnloaded(self.config.overlay.image.clone()).into()),
        }
    }

    /// Currently loaded overlay.
    pub fn overlay(&self) -> Option<&dyn Overlay> {
        self.overlay.as_deref()
    }

    /// Create a window not owned by the overlay.
    pub fn map_window(
        &self,
        base: u64,
        length: usize,
    ) -> Result<Box<dyn RegisterWindow>, OverlayError> {
        self.backend.map_window(base, length)
    }

    /// Handle to a named region of the loaded overlay.
    ///
    /// # Errors
    /// `OverlayUnloaded` if no overlay is loaded or it was unloaded;
    /// `UnknownRegion` for undeclared names.
    pub fn region(&self, name: &str) -> Result<Box<dyn RegisterWindow>, OverlayError> {
        match &self.overlay {
            Some(overlay) => overlay.get_region(name),
            None => Err(OverlayError::OverlayUnloaded(self.config.overlay.image.clone())),
        }
    }

    /// Execute one register operation.
    pub fn execute(&self, op: &AccessOp) -> Result<AccessOutcome, OverlayError> {
        let window = self.region(op.region())?;
        debug!("Executing {:?}", op);
        let outcome = match op {
            AccessOp::Read {
                region,
                offset,
                width,
            } => AccessOutcome::Read {
                region: region.clone(),
                offset: *offset,
                width: *width,
                value: window.read(*offset, *width)?,
            },
            AccessOp::Write {
                region,
                offset,
                width,
                value,
            } => {
                window.write(*offset, *width, *value)?;
                let mask = AccessWidth::from_bytes(*width)?.mask();
                AccessOutcome::Written {
                    region: region.clone(),
                    offset: *offset,
                    width: *width,
                    value: value & mask,
                }
            }
            AccessOp::ReadArray {
                region,
                offset,
                count,
                width,
            } => AccessOutcome::Array {
                region: region.clone(),
                offset: *offset,
                width: *width,
                values: window.read_array(*offset, *width, *count)?,
            },
            AccessOp::Dump { region } => AccessOutcome::Dump {
                region: region.clone(),
                base: window.base_addr(),
                bytes: window
                    .read_array(0, 1, window.length())?
                    .into_iter()
                    .map(|b| b as u8)
                    .collect(),
            },
        };
        Ok(outcome)
    }

    /// Write `values` to consecutive registers of `region` as one batch.
    ///
    /// Nothing is written unless the whole run fits the region.
    pub fn write_values(
        &self,
        region: &str,
        offset: usize,
        width: usize,
        values: &[u64],
    ) -> Result<Vec<AccessOutcome>, OverlayError> {
        let mask = AccessWidth::from_bytes(width)?.mask();
        self.region(region)?.write_array(offset, width, values)?;
        Ok(values
            .iter()
            .enumerate()
            .map(|(i, value)| AccessOutcome::Written {
                region: region.to_string(),
                offset: offset + i * width,
                width,
                value: value & mask,
            })
            .collect())
    }

    /// Execute operations in order, stopping at the first failure.
    pub fn run_script(&self, ops: &[AccessOp]) -> Result<Vec<AccessOutcome>, HostError> {
        let mut outcomes = Vec::with_capacity(ops.len());
        for op in ops {
            outcomes.push(self.execute(op)?);
        }
        Ok(outcomes)
    }

    /// Unload the overlay. Later region lookups fail with `OverlayUnloaded`.
    pub fn unload(&mut self) {
        if let Some(overlay) = self.overlay.as_mut() {
            overlay.unload();
        }
    }
}
