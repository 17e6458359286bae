//! Extra-routes - VPN hook that keeps published service IP ranges routed
//! through the tunnel gateway.
//!
//! When the VPN comes up, this tool fetches current IP ranges from the
//! configured sources (line-delimited documents, JSON documents, static
//! lists), merges them, persists the merged set if it changed, and installs
//! a route per IPv4 range through the tunnel gateway. When the VPN goes
//! down, it removes the routes again using the persisted set as the source
//! of truth. If any source is unreachable the whole run falls back to the
//! persisted set, so the routing table always reflects a known-good state.
//!
//! # Architecture
//!
//! - `config`: source list and hook settings (TOML)
//! - `sources`: fetching and aggregation of CIDR range sources
//! - `backup`: persisted last-known-good CIDR snapshot
//! - `routes`: route-set application with address-family filtering
//! - `platform`: OS routing table access (macOS, Linux)
//! - `hook`: gateway environment parsing and the up/down session controller
//!
//! # Usage
//!
//! As a VPN client hook (the client exports the tunnel gateway address):
//! ```bash
//! route_net_gateway=10.8.0.1 extra-routes up
//! route_net_gateway=10.8.0.1 extra-routes down
//! ```

pub mod backup;
pub mod config;
pub mod hook;
pub mod platform;
pub mod routes;
pub mod sources;

#[cfg(test)]
pub(crate) mod testutil;

pub use config::Config;
pub use hook::session::{run_down, run_up, HookError, Mode};
