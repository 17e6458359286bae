//! VPN client hook integration.
//!
//! The VPN client invokes this binary around connection lifecycle events
//! and exports the tunnel gateway address in an environment variable.
//!
//! # Lifecycle
//!
//! - `up`: tunnel established, install the extra routes
//! - `down`: tunnel shutting down, remove the routes added earlier

pub mod env;
pub mod session;

pub use session::{run_down, run_up, HookError, Mode};
