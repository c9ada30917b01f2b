//! Configuration for mesh-sync
//!
//! CLI arguments and environment variable handling using clap.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use mesh_objects::ClientConfig;

/// mesh-sync - applies mesh configuration objects to the control plane
#[derive(Parser, Debug, Clone)]
#[command(name = "mesh-sync")]
#[command(about = "Idempotently apply configuration objects to the mesh control-plane API")]
pub struct Args {
    /// Control-plane address (the /v1.0 prefix is appended)
    #[arg(long, env = "MESH_API_URL", default_value = "http://localhost:5555")]
    pub api_url: String,

    /// Per-request timeout in seconds
    #[arg(long, env = "MESH_API_TIMEOUT_SECS", default_value = "3")]
    pub timeout_secs: u64,

    /// Readiness ping attempts before giving up
    #[arg(long, env = "MESH_PING_ATTEMPTS", default_value = "5")]
    pub ping_attempts: u32,

    /// Pause between failed readiness pings in milliseconds
    #[arg(long, env = "MESH_PING_INTERVAL_MS", default_value = "1000")]
    pub ping_interval_ms: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Log output format
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Wait for the control plane to become reachable
    Ping,

    /// Create every object in a manifest that does not exist yet
    Apply {
        /// JSON manifest: {"objects": [{"mesh", "kind", "key", "object"}, ...]}
        manifest: PathBuf,
    },

    /// Overwrite top-level fields of an existing object
    Change {
        /// JSON change-set: {"kind", "key", "changes": {field: value, ...}}
        change_set: PathBuf,
    },
}

impl Args {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.api_url.trim().is_empty() {
            return Err("MESH_API_URL must not be empty".to_string());
        }
        if !self.api_url.starts_with("http://") && !self.api_url.starts_with("https://") {
            return Err(format!(
                "MESH_API_URL must be an http(s) URL, got {}",
                self.api_url
            ));
        }
        if self.timeout_secs == 0 {
            return Err("MESH_API_TIMEOUT_SECS must be greater than zero".to_string());
        }
        if self.ping_attempts == 0 {
            return Err("MESH_PING_ATTEMPTS must be greater than zero".to_string());
        }
        Ok(())
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            base_url: self.api_url.clone(),
            timeout: Duration::from_secs(self.timeout_secs),
            ping_attempts: self.ping_attempts,
            ping_interval: Duration::from_millis(self.ping_interval_ms),
            ..ClientConfig::default()
        }
    }
}
