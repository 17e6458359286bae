//! Platform-specific route table implementations

#[cfg(target_os = "macos")]
pub mod mac;

#[cfg(target_os = "linux")]
pub mod linux;

use ipnet::Ipv4Net;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PlatformError {
    #[error("Failed to add route: {0}")]
    AddRouteError(String),
    #[error("Failed to delete route: {0}")]
    DeleteRouteError(String),
    #[error("Unsupported platform")]
    UnsupportedPlatform,
}

/// Narrow interface over the OS routing table.
///
/// Real implementations shell out to the platform's route facility; tests
/// substitute an in-memory recording table.
pub trait RouteTable {
    fn add(&self, dest: &Ipv4Net, gateway: &str) -> Result<(), PlatformError>;
    fn delete(&self, dest: &Ipv4Net, gateway: &str) -> Result<(), PlatformError>;
}

/// Get the appropriate route table for the current platform
pub fn get_route_table() -> Result<Box<dyn RouteTable>, PlatformError> {
    #[cfg(target_os = "macos")]
    {
        Ok(Box::new(mac::MacRouteTable::new()))
    }

    #[cfg(target_os = "linux")]
    {
        Ok(Box::new(linux::LinuxRouteTable::new()))
    }

    #[cfg(not(any(target_os = "macos", target_os = "linux")))]
    {
        Err(PlatformError::UnsupportedPlatform)
    }
}
