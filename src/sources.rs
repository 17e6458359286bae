//! Route source fetching and aggregation.
//!
//! Each configured source normalizes into a flat list of CIDR candidate
//! strings. Sources are fetched strictly in declaration order, one at a
//! time, with no retries: the first failure aborts the whole aggregation
//! and signals the caller to fall back to the persisted snapshot. A
//! partially aggregated set is never applied.

use crate::config::SourceSpec;
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, info};

const TIMEOUT_SECS: u64 = 30;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Failed to build HTTP client: {0}")]
    Client(reqwest::Error),
    #[error("Request to {url} failed: {source}")]
    Request {
        url: String,
        source: reqwest::Error,
    },
    #[error("Request to {url} returned HTTP {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },
    #[error("Failed to parse JSON from {url}: {source}")]
    Json {
        url: String,
        source: serde_json::Error,
    },
    #[error("Field '{field}' missing in document from {url}")]
    MissingField { url: String, field: String },
    #[error("Field '{field}' in document from {url} is not an array of strings")]
    NotStringArray { url: String, field: String },
}

/// Result of one aggregation run
#[derive(Debug)]
pub struct Aggregation {
    /// Concatenated candidates in source order, duplicates preserved
    pub cidrs: Vec<String>,
    /// True when a source failed and the persisted snapshot must be used
    pub fell_back: bool,
}

/// HTTP client for fetching range sources
pub struct Fetcher {
    client: Client,
}

impl Fetcher {
    pub fn new() -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(TIMEOUT_SECS))
            .user_agent(format!("extra-routes/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(FetchError::Client)?;
        Ok(Self { client })
    }

    /// Normalize one source into a list of CIDR candidate strings.
    ///
    /// No CIDR validation happens at this stage; candidates are classified
    /// when routes are applied.
    pub async fn fetch(&self, source: &SourceSpec) -> Result<Vec<String>, FetchError> {
        match source {
            SourceSpec::Lines { url } => Ok(parse_lines(&self.get(url).await?)),
            SourceSpec::Field { url, field } => {
                let body = self.get(url).await?;
                extract_field(&body, url, field)
            }
            SourceSpec::Static { cidrs } => Ok(cidrs.clone()),
        }
    }

    async fn get(&self, url: &str) -> Result<String, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| FetchError::Request {
                url: url.to_string(),
                source,
            })?;

        if !response.status().is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: response.status(),
            });
        }

        response.text().await.map_err(|source| FetchError::Request {
            url: url.to_string(),
            source,
        })
    }
}

// Note: Default is intentionally not implemented for Fetcher
// because new() can fail and we want explicit error handling.

/// Split a document into non-empty lines, trailing whitespace stripped
fn parse_lines(body: &str) -> Vec<String> {
    body.lines()
        .map(str::trim_end)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Extract a top-level array of strings from a JSON document
fn extract_field(body: &str, url: &str, field: &str) -> Result<Vec<String>, FetchError> {
    let document: serde_json::Value =
        serde_json::from_str(body).map_err(|source| FetchError::Json {
            url: url.to_string(),
            source,
        })?;

    let value = document.get(field).ok_or_else(|| FetchError::MissingField {
        url: url.to_string(),
        field: field.to_string(),
    })?;

    let entries = value.as_array().ok_or_else(|| FetchError::NotStringArray {
        url: url.to_string(),
        field: field.to_string(),
    })?;

    entries
        .iter()
        .map(|entry| {
            entry
                .as_str()
                .map(str::to_string)
                .ok_or_else(|| FetchError::NotStringArray {
                    url: url.to_string(),
                    field: field.to_string(),
                })
        })
        .collect()
}

/// Fetch all sources in order and concatenate their candidates.
///
/// All-or-nothing: the first failing source ends the run, partial results
/// are discarded, and `fell_back` is set so the caller applies the
/// persisted snapshot instead.
pub async fn aggregate(fetcher: &Fetcher, sources: &[SourceSpec]) -> Aggregation {
    let mut cidrs = Vec::new();

    for source in sources {
        info!("Populating CIDRs from {}", source);
        match fetcher.fetch(source).await {
            Ok(batch) => {
                debug!("Fetched {} candidates from {}", batch.len(), source);
                cidrs.extend(batch);
            }
            Err(e) => {
                error!("Source fetch failed, falling back to backup: {}", e);
                return Aggregation {
                    cidrs: Vec::new(),
                    fell_back: true,
                };
            }
        }
    }

    debug!("Aggregated {} CIDR candidates", cidrs.len());
    Aggregation {
        cidrs,
        fell_back: false,
    }
}
