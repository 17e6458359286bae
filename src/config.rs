//! Configuration handling for the extra-routes hook

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),
}

/// One route source, fetched in declaration order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SourceSpec {
    /// Line-delimited plaintext document, one CIDR per line
    Lines { url: String },
    /// JSON document with a top-level array field of CIDR strings
    Field { url: String, field: String },
    /// Operator-defined literal CIDRs, no network access
    Static { cidrs: Vec<String> },
}

impl fmt::Display for SourceSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceSpec::Lines { url } => write!(f, "{}", url),
            SourceSpec::Field { url, field } => write!(f, "{} (field '{}')", url, field),
            SourceSpec::Static { cidrs } => write!(f, "static list ({} entries)", cidrs.len()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Environment variable the VPN client uses to export the tunnel gateway
    #[serde(default = "default_gateway_var")]
    pub gateway_var: String,
    /// Persisted last-known-good CIDR list
    #[serde(default = "default_backup_file")]
    pub backup_file: PathBuf,
    /// Route sources, fetched in order
    #[serde(default = "default_sources")]
    pub sources: Vec<SourceSpec>,
}

fn default_gateway_var() -> String {
    "route_net_gateway".to_string()
}

fn default_backup_file() -> PathBuf {
    if cfg!(target_os = "macos") {
        PathBuf::from("/Library/Application Support/extra-routes/backup")
    } else {
        PathBuf::from("/var/lib/extra-routes/backup")
    }
}

fn default_sources() -> Vec<SourceSpec> {
    vec![
        SourceSpec::Lines {
            url: "https://assets.zoom.us/docs/ipranges/Zoom.txt".to_string(),
        },
        SourceSpec::Field {
            url: "https://api.github.com/meta".to_string(),
            field: "git".to_string(),
        },
        SourceSpec::Static {
            cidrs: vec!["192.168.0.0/24".to_string(), "192.168.1.0/24".to_string()],
        },
    ]
}

impl Default for Config {
    fn default() -> Self {
        Self {
            gateway_var: default_gateway_var(),
            backup_file: default_backup_file(),
            sources: default_sources(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self).expect("Failed to serialize config");
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Load config from an explicit path, the home directory, or defaults
    pub fn resolve(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::load(path);
        }

        if let Ok(home) = std::env::var("HOME") {
            let home_config = PathBuf::from(home)
                .join(".extra-routes")
                .join("config.toml");
            if home_config.exists() {
                return Self::load(&home_config);
            }
        }

        info!("No config file found, using defaults");
        Ok(Self::default())
    }
}
