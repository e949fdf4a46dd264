//! Overlay and register-window abstraction.
//!
//! This module contains the backend traits and the types shared by every
//! backend implementation (simulation and hardware).

pub mod backend;
pub mod config;
pub mod consts;
pub mod types;
