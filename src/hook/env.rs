//! Hook environment parsing.
//!
//! The VPN client exports the tunnel gateway address in an environment
//! variable at hook time (`route_net_gateway` by default). A missing or
//! empty gateway is a fatal startup error, reported before any network or
//! route activity.

use std::env;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EnvError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(String),
    #[error("Environment variable {0} is empty")]
    EmptyVar(String),
}

/// Read the tunnel gateway address from the process environment
pub fn gateway_from_env(var: &str) -> Result<String, EnvError> {
    gateway_from_env_fn(var, |key| env::var(key))
}

/// Read the gateway using a custom getter (for testing)
pub fn gateway_from_env_fn<F>(var: &str, get_var: F) -> Result<String, EnvError>
where
    F: Fn(&str) -> Result<String, env::VarError>,
{
    let value = get_var(var).map_err(|_| EnvError::MissingVar(var.to_string()))?;
    let value = value.trim();
    if value.is_empty() {
        return Err(EnvError::EmptyVar(var.to_string()));
    }
    Ok(value.to_string())
}
