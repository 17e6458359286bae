//! Session controller for the up/down hook lifecycle.
//!
//! "up" refreshes the route set from the configured sources, persisting the
//! merged list when it changed and falling back to the persisted snapshot
//! when any source is unreachable. "down" tears down whatever the snapshot
//! says was installed; the snapshot itself is left untouched.

use crate::backup::{differs, BackupStore, StoreError};
use crate::config::{Config, ConfigError};
use crate::hook::env::EnvError;
use crate::platform::{PlatformError, RouteTable};
use crate::routes::{apply, RouteOp};
use crate::sources::{aggregate, FetchError, Fetcher};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum HookError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    #[error("Environment error: {0}")]
    Env(#[from] EnvError),
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),
    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),
}

/// Hook invocation mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Up,
    Down,
}

/// Handle the VPN connect event.
///
/// Ensure the backup store exists, aggregate the configured sources, then
/// either install the freshly aggregated IPv4 entries (persisting them
/// first when they differ from the snapshot) or, when aggregation fell
/// back, install the snapshot's entries. Routes are re-applied on every
/// "up" even when nothing changed.
pub async fn run_up(
    config: &Config,
    fetcher: &Fetcher,
    table: &dyn RouteTable,
    gateway: &str,
) -> Result<(), HookError> {
    let store = BackupStore::new(&config.backup_file);
    store.ensure_exists()?;

    let aggregation = aggregate(fetcher, &config.sources).await;

    let cidrs = if aggregation.fell_back {
        info!("Adding routes from backup");
        store.read()?
    } else {
        let cached = store.read()?;
        if differs(&cached, &aggregation.cidrs) {
            info!("We have a newer CIDR list, overwriting backup");
            store.write(&aggregation.cidrs)?;
        } else {
            debug!("CIDR list unchanged since last run");
        }
        info!("Adding extra routes");
        aggregation.cidrs
    };

    let summary = apply(table, &cidrs, gateway, RouteOp::Add);
    info!(
        "Added {} routes ({} IPv6 skipped, {} invalid, {} failed)",
        summary.applied, summary.skipped_v6, summary.invalid, summary.failed
    );
    Ok(())
}

/// Handle the VPN disconnect event.
///
/// The snapshot is the authoritative record of what was installed; each of
/// its IPv4 entries is deleted. The snapshot is not modified.
pub fn run_down(
    config: &Config,
    table: &dyn RouteTable,
    gateway: &str,
) -> Result<(), HookError> {
    let store = BackupStore::new(&config.backup_file);
    store.ensure_exists()?;

    let cidrs = store.read()?;
    info!("Removing extra routes");
    let summary = apply(table, &cidrs, gateway, RouteOp::Delete);
    info!(
        "Removed {} routes ({} IPv6 skipped, {} invalid, {} failed)",
        summary.applied, summary.skipped_v6, summary.invalid, summary.failed
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SourceSpec;
    use crate::testutil::{self, FakeRouteTable};
    use std::fs;
    use tempfile::TempDir;

    fn config_with(backup_file: std::path::PathBuf, sources: Vec<SourceSpec>) -> Config {
        Config {
            gateway_var: "route_net_gateway".to_string(),
            backup_file,
            sources,
        }
    }

    fn static_source(cidrs: &[&str]) -> SourceSpec {
        SourceSpec::Static {
            cidrs: cidrs.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[tokio::test]
    async fn test_up_all_sources_succeed() {
        let temp_dir = TempDir::new().unwrap();
        let backup = temp_dir.path().join("backup");

        let lines_url = testutil::spawn_http("1.2.3.0/24\n");
        let field_url = testutil::spawn_http(r#"{"git":["5.6.7.0/24","5.6.8.0/24"]}"#);
        let config = config_with(
            backup.clone(),
            vec![
                SourceSpec::Lines { url: lines_url },
                SourceSpec::Field {
                    url: field_url,
                    field: "git".to_string(),
                },
                static_source(&["192.168.0.0/24", "192.168.1.0/24"]),
            ],
        );

        let fetcher = Fetcher::new().unwrap();
        let table = FakeRouteTable::new();
        run_up(&config, &fetcher, &table, "10.8.0.1").await.unwrap();

        let expected = [
            "1.2.3.0/24",
            "5.6.7.0/24",
            "5.6.8.0/24",
            "192.168.0.0/24",
            "192.168.1.0/24",
        ];

        // Snapshot overwritten with the aggregated sequence, order preserved
        let stored = fs::read_to_string(&backup).unwrap();
        assert_eq!(stored.lines().collect::<Vec<_>>(), expected);

        // One add per entry, in order, with the supplied gateway
        let ops = table.ops.borrow();
        assert_eq!(ops.len(), 5);
        for (i, (op, dest, gateway)) in ops.iter().enumerate() {
            assert_eq!(*op, RouteOp::Add);
            assert_eq!(dest.to_string(), expected[i]);
            assert_eq!(gateway, "10.8.0.1");
        }
    }

    #[tokio::test]
    async fn test_up_unchanged_list_still_reapplies_routes() {
        let temp_dir = TempDir::new().unwrap();
        let backup = temp_dir.path().join("backup");
        let config = config_with(backup.clone(), vec![static_source(&["192.168.0.0/24"])]);

        let fetcher = Fetcher::new().unwrap();
        let table = FakeRouteTable::new();
        run_up(&config, &fetcher, &table, "10.8.0.1").await.unwrap();
        run_up(&config, &fetcher, &table, "10.8.0.1").await.unwrap();

        // Routes are added on every "up", changed list or not
        assert_eq!(table.ops.borrow().len(), 2);
        assert_eq!(
            fs::read_to_string(&backup).unwrap(),
            "192.168.0.0/24\n"
        );
    }

    #[tokio::test]
    async fn test_up_fallback_installs_snapshot() {
        let temp_dir = TempDir::new().unwrap();
        let backup = temp_dir.path().join("backup");
        fs::write(&backup, "10.1.0.0/16\n2001:db8::/32\n").unwrap();

        // The static source succeeds before the failing one; its partial
        // result must be discarded.
        let config = config_with(
            backup.clone(),
            vec![
                static_source(&["9.9.9.0/24"]),
                SourceSpec::Lines {
                    url: testutil::refused_url(),
                },
            ],
        );

        let fetcher = Fetcher::new().unwrap();
        let table = FakeRouteTable::new();
        run_up(&config, &fetcher, &table, "10.8.0.1").await.unwrap();

        let ops = table.ops.borrow();
        assert_eq!(ops.len(), 1);
        assert_eq!(ops[0].1.to_string(), "10.1.0.0/16");

        let installed = table.installed.borrow();
        assert!(!installed.contains(&("9.9.9.0/24".parse().unwrap(), "10.8.0.1".to_string())));

        // Fallback never rewrites the snapshot
        assert_eq!(
            fs::read_to_string(&backup).unwrap(),
            "10.1.0.0/16\n2001:db8::/32\n"
        );
    }

    #[tokio::test]
    async fn test_up_fallback_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let backup = temp_dir.path().join("backup");
        fs::write(&backup, "10.1.0.0/16\n10.2.0.0/16\n").unwrap();

        let config = config_with(
            backup.clone(),
            vec![SourceSpec::Lines {
                url: testutil::refused_url(),
            }],
        );

        let fetcher = Fetcher::new().unwrap();
        let table = FakeRouteTable::new();
        run_up(&config, &fetcher, &table, "10.8.0.1").await.unwrap();
        let after_first = table.installed.borrow().clone();
        run_up(&config, &fetcher, &table, "10.8.0.1").await.unwrap();

        // Same routing table state as after a single run
        assert_eq!(*table.installed.borrow(), after_first);
        assert_eq!(after_first.len(), 2);
        assert_eq!(
            fs::read_to_string(&backup).unwrap(),
            "10.1.0.0/16\n10.2.0.0/16\n"
        );
    }

    #[tokio::test]
    async fn test_up_first_run_with_unreachable_sources() {
        let temp_dir = TempDir::new().unwrap();
        let backup = temp_dir.path().join("backup");
        let config = config_with(
            backup.clone(),
            vec![SourceSpec::Lines {
                url: testutil::refused_url(),
            }],
        );

        let fetcher = Fetcher::new().unwrap();
        let table = FakeRouteTable::new();
        run_up(&config, &fetcher, &table, "10.8.0.1").await.unwrap();

        // Store created empty, nothing to install
        assert!(backup.exists());
        assert!(table.ops.borrow().is_empty());
    }

    #[test]
    fn test_down_deletes_ipv4_only_and_keeps_snapshot() {
        let temp_dir = TempDir::new().unwrap();
        let backup = temp_dir.path().join("backup");
        fs::write(&backup, "1.2.3.0/24\n2001:db8::/32\n").unwrap();

        let config = config_with(backup.clone(), vec![]);
        let table = FakeRouteTable::new();
        run_down(&config, &table, "10.8.0.1").unwrap();

        let ops = table.ops.borrow();
        assert_eq!(ops.len(), 1);
        assert_eq!(ops[0].0, RouteOp::Delete);
        assert_eq!(ops[0].1.to_string(), "1.2.3.0/24");
        assert_eq!(ops[0].2, "10.8.0.1");

        assert_eq!(
            fs::read_to_string(&backup).unwrap(),
            "1.2.3.0/24\n2001:db8::/32\n"
        );
    }

    #[test]
    fn test_down_before_any_up() {
        let temp_dir = TempDir::new().unwrap();
        let backup = temp_dir.path().join("backup");

        let config = config_with(backup.clone(), vec![]);
        let table = FakeRouteTable::new();
        run_down(&config, &table, "10.8.0.1").unwrap();

        assert!(backup.exists());
        assert!(table.ops.borrow().is_empty());
    }

    #[tokio::test]
    async fn test_up_then_down_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let backup = temp_dir.path().join("backup");
        let config = config_with(
            backup.clone(),
            vec![static_source(&["10.0.0.0/8", "172.16.0.0/12"])],
        );

        let fetcher = Fetcher::new().unwrap();
        let table = FakeRouteTable::new();
        run_up(&config, &fetcher, &table, "10.8.0.1").await.unwrap();
        assert_eq!(table.installed.borrow().len(), 2);

        run_down(&config, &table, "10.8.0.1").unwrap();
        assert!(table.installed.borrow().is_empty());
    }
}
