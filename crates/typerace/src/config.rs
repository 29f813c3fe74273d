//! Server configuration.
//!
//! Loaded from environment variables, with defaults for everything.

use std::collections::HashMap;
use std::env;
use std::time::Duration;

use thiserror::Error;

/// Default WebSocket bind address.
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:4000";

/// Default interval between keepalive pings, in seconds.
pub const DEFAULT_KEEPALIVE_SECS: u64 = 30;

/// Default time a new peer gets to finish the WebSocket upgrade, in seconds.
pub const DEFAULT_HANDSHAKE_TIMEOUT_SECS: u64 = 10;

/// Default coordinator command channel size.
pub const DEFAULT_COMMAND_BUFFER: usize = 256;

/// Typerace server configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Address the WebSocket listener binds to (default: "0.0.0.0:4000").
    pub bind_address: String,

    /// How often each connection is pinged. Only a failed ping drops a
    /// connection; a silent but live client stays.
    pub keepalive_interval: Duration,

    /// A peer that hasn't completed the WebSocket upgrade within this
    /// window is dropped.
    pub handshake_timeout: Duration,

    /// Capacity of the coordinator's command queue.
    pub command_buffer: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: DEFAULT_BIND_ADDRESS.to_string(),
            keepalive_interval: Duration::from_secs(DEFAULT_KEEPALIVE_SECS),
            handshake_timeout: Duration::from_secs(DEFAULT_HANDSHAKE_TIMEOUT_SECS),
            command_buffer: DEFAULT_COMMAND_BUFFER,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid keepalive configuration: {0}")]
    InvalidKeepalive(String),

    #[error("Invalid handshake timeout configuration: {0}")]
    InvalidHandshakeTimeout(String),

    #[error("Invalid command buffer configuration: {0}")]
    InvalidCommandBuffer(String),
}

impl ServerConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a HashMap (for testing).
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let bind_address = vars
            .get("TYPERACE_BIND_ADDRESS")
            .cloned()
            .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string());

        let keepalive_secs = positive(vars, "TYPERACE_KEEPALIVE_SECS", DEFAULT_KEEPALIVE_SECS)
            .map_err(ConfigError::InvalidKeepalive)?;

        let handshake_timeout_secs = positive(
            vars,
            "TYPERACE_HANDSHAKE_TIMEOUT_SECS",
            DEFAULT_HANDSHAKE_TIMEOUT_SECS,
        )
        .map_err(ConfigError::InvalidHandshakeTimeout)?;

        let command_buffer = positive(vars, "TYPERACE_COMMAND_BUFFER", DEFAULT_COMMAND_BUFFER)
            .map_err(ConfigError::InvalidCommandBuffer)?;

        Ok(Self {
            bind_address,
            keepalive_interval: Duration::from_secs(keepalive_secs),
            handshake_timeout: Duration::from_secs(handshake_timeout_secs),
            command_buffer,
        })
    }
}

/// Reads a strictly positive integer, falling back to `default` when unset.
fn positive<T>(vars: &HashMap<String, String>, key: &str, default: T) -> Result<T, String>
where
    T: std::str::FromStr + Default + PartialEq,
    T::Err: std::fmt::Display,
{
    let Some(value_str) = vars.get(key) else {
        return Ok(default);
    };

    let value: T = value_str.parse().map_err(|e| {
        format!(
            "{} must be a valid positive integer, got '{}': {}",
            key, value_str, e
        )
    })?;

    if value == T::default() {
        return Err(format!("{} must be greater than 0", key));
    }

    Ok(value)
}
