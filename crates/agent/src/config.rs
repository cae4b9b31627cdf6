//! Agent-side configuration (SPEC_FULL.md §B "Configuration"): loaded once
//! at the composition root (`main.rs`), never read from `std::env` below it.
//!
//! Grounded on `original_source/src/aiori_agent/config.py`'s `settings`
//! object, translated from a module-level singleton to an explicit struct.

use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{0} is not a valid value: {1}")]
    Invalid(&'static str, String),
}

/// Everything the agent binary needs, resolved once from the environment
/// (spec §6 "Environment variables").
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// `NATS_URL`; list allowed (comma-separated).
    pub nats_servers: Vec<String>,
    /// `AGENT_ID`; auto-generated if absent.
    pub agent_id: fleet_core::AgentId,
    /// `AGENT_NAME`; defaults to the local hostname.
    pub agent_name: String,
    pub hostname: String,
    /// `FLEET_MODULES_DIR`; directory of per-module TOML manifests.
    pub modules_dir: PathBuf,
    /// `FLEET_STATE_DIR`; crash records land under `<state_dir>/crashes`.
    pub state_dir: PathBuf,
    /// `HEARTBEAT_INTERVAL_SECS`, default 3 (spec §4.3 "default 2-5s").
    pub heartbeat_interval: Duration,
    /// `TZ`; defaults to `"UTC"`.
    pub timezone: String,
}

impl AgentConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let nats_servers = std::env::var("NATS_URL")
            .map_err(|_| ConfigError::Missing("NATS_URL"))?
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>();
        if nats_servers.is_empty() {
            return Err(ConfigError::Missing("NATS_URL"));
        }

        let hostname = hostname_fallback();
        let agent_id = match std::env::var("AGENT_ID") {
            Ok(raw) => fleet_core::AgentId::from_string(raw),
            Err(_) => fleet_core::AgentId::new(),
        };
        let agent_name = std::env::var("AGENT_NAME").unwrap_or_else(|_| hostname.clone());

        let modules_dir = std::env::var("FLEET_MODULES_DIR").map(PathBuf::from).unwrap_or_else(|_| PathBuf::from("./modules"));
        let state_dir = std::env::var("FLEET_STATE_DIR").map(PathBuf::from).unwrap_or_else(|_| PathBuf::from("./state"));

        let heartbeat_interval = std::env::var("HEARTBEAT_INTERVAL_SECS")
            .ok()
            .map(|raw| raw.parse::<u64>().map_err(|_| ConfigError::Invalid("HEARTBEAT_INTERVAL_SECS", raw)))
            .transpose()?
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(3));

        let timezone = std::env::var("TZ").unwrap_or_else(|_| "UTC".to_string());

        Ok(Self { nats_servers, agent_id, agent_name, hostname, modules_dir, state_dir, heartbeat_interval, timezone })
    }

    pub fn crash_dir(&self) -> PathBuf {
        self.state_dir.join("crashes")
    }
}

fn hostname_fallback() -> String {
    std::env::var("HOSTNAME").ok().unwrap_or_else(|| "unknown-host".to_string())
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
