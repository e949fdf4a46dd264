//! Backend identifiers.

/// Registry name of the software simulation backend.
pub const SIMULATION_BACKEND: &str = "simulation";

/// Registry name of the `/dev/mem` hardware backend.
pub const DEVMEM_BACKEND: &str = "devmem";

/// Canonical service name used for logging.
pub const HOST_SERVICE_NAME: &str = "ovl-host";
