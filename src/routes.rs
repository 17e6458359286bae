//! Route set application with address-family filtering.
//!
//! Candidates are classified by parsing as a network literal. IPv6 entries
//! are present in the data model but never installed; they are skipped
//! without an error. Each IPv4 entry is attempted independently, so a
//! failing route command never aborts the rest of the batch.

use crate::platform::{PlatformError, RouteTable};
use ipnet::{IpNet, Ipv4Net};
use std::fmt;
use std::net::IpAddr;
use tracing::{debug, error, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouteOp {
    Add,
    Delete,
}

impl fmt::Display for RouteOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteOp::Add => write!(f, "add"),
            RouteOp::Delete => write!(f, "delete"),
        }
    }
}

/// Outcome counters for one batch of route operations
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ApplySummary {
    pub applied: usize,
    pub skipped_v6: usize,
    pub invalid: usize,
    pub failed: usize,
}

/// Classify a candidate string as a network.
///
/// Accepts prefix notation and bare addresses (treated as host networks).
fn classify(cidr: &str) -> Option<IpNet> {
    if let Ok(net) = cidr.parse::<IpNet>() {
        return Some(net);
    }
    cidr.parse::<IpAddr>().ok().map(IpNet::from)
}

/// Apply one route operation per IPv4 candidate in the batch.
///
/// Unparsable candidates are logged and skipped rather than aborting the
/// remaining batch; route command failures likewise only affect their own
/// entry.
pub fn apply(
    table: &dyn RouteTable,
    cidrs: &[String],
    gateway: &str,
    op: RouteOp,
) -> ApplySummary {
    let mut summary = ApplySummary::default();

    for cidr in cidrs {
        let net = match classify(cidr) {
            Some(net) => net,
            None => {
                error!("Skipping unparsable CIDR '{}'", cidr);
                summary.invalid += 1;
                continue;
            }
        };

        let v4 = match net {
            IpNet::V4(v4) => v4,
            IpNet::V6(_) => {
                debug!("Skipping IPv6 entry {}", cidr);
                summary.skipped_v6 += 1;
                continue;
            }
        };

        match run_op(table, &v4, gateway, op) {
            Ok(()) => summary.applied += 1,
            Err(e) => {
                warn!("Route {} for {} failed: {} (continuing)", op, cidr, e);
                summary.failed += 1;
            }
        }
    }

    summary
}

fn run_op(
    table: &dyn RouteTable,
    dest: &Ipv4Net,
    gateway: &str,
    op: RouteOp,
) -> Result<(), PlatformError> {
    match op {
        RouteOp::Add => table.add(dest, gateway),
        RouteOp::Delete => table.delete(dest, gateway),
    }
}
