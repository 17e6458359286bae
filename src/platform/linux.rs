//! Linux-specific route table implementation

use super::{PlatformError, RouteTable};
use ipnet::Ipv4Net;
use std::process::Command;
use tracing::debug;

pub struct LinuxRouteTable;

impl LinuxRouteTable {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LinuxRouteTable {
    fn default() -> Self {
        Self::new()
    }
}

impl RouteTable for LinuxRouteTable {
    fn add(&self, dest: &Ipv4Net, gateway: &str) -> Result<(), PlatformError> {
        let output = Command::new("ip")
            .args(["route", "add", &dest.to_string(), "via", gateway])
            .output()
            .map_err(|e| PlatformError::AddRouteError(e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(PlatformError::AddRouteError(stderr.to_string()));
        }

        debug!(
            "Adding route: {}",
            String::from_utf8_lossy(&output.stdout).trim()
        );
        Ok(())
    }

    fn delete(&self, dest: &Ipv4Net, gateway: &str) -> Result<(), PlatformError> {
        let output = Command::new("ip")
            .args(["route", "delete", &dest.to_string(), "via", gateway])
            .output()
            .map_err(|e| PlatformError::DeleteRouteError(e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(PlatformError::DeleteRouteError(stderr.to_string()));
        }

        debug!(
            "Deleting route: {}",
            String::from_utf8_lossy(&output.stdout).trim()
        );
        Ok(())
    }
}
