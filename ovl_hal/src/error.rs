//! Error type for host-level operations.

use crate::script::ScriptError;
use ovl_common::config::ConfigError;
use ovl_common::hal::backend::OverlayError;
use thiserror::Error;

/// Errors surfaced by the registry, the session and the binary.
#[derive(Error, Debug)]
pub enum HostError {
    /// Overlay or register access error
    #[error(transparent)]
    Overlay(#[from] OverlayError),

    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Register-access script error
    #[error(transparent)]
    Script(#[from] ScriptError),

    /// No backend registered under this name
    #[error("Backend not found: {0}")]
    BackendNotFound(String),

    /// IO error
    #[error("IO error: {source}")]
    Io {
        /// Source IO error
        #[from]
        source: std::io::Error,
    },
}
