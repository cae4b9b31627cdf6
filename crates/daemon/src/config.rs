//! Daemon-side configuration (SPEC_FULL.md §B "Configuration"): loaded
//! once at the composition root (`main.rs`), never read from `std::env`
//! below it.
//!
//! Grounded on `env.rs`'s `OJ_STATE_DIR > XDG_STATE_HOME/oj >
//! ~/.local/state/oj` resolution order, translated to the `fleet`-prefixed
//! knobs SPEC_FULL.md §B names.

use chrono::Duration as ChronoDuration;
use std::path::PathBuf;

#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{0} is not a valid value: {1}")]
    Invalid(&'static str, String),
    #[error("no home directory to derive a default state directory from")]
    NoStateDir,
}

/// Everything `fleetd` needs, resolved once from the environment.
#[derive(Debug, Clone)]
pub struct DaemonConfig {
    /// `NATS_URL`; list allowed (comma-separated).
    pub nats_servers: Vec<String>,
    /// `FLEET_STATE_DIR`; holds the WAL/snapshot and the control socket.
    pub state_dir: PathBuf,
    /// `FLEET_CONTROL_SOCKET`; defaults to `<state_dir>/control.sock`.
    pub control_socket: PathBuf,
    /// `AGENT_HEARTBEAT_TIMEOUT_SECS`, default 2x the agent's default
    /// heartbeat interval (spec §4.4 "default 2x interval").
    pub heartbeat_timeout: ChronoDuration,
    /// `FLEET_LIVENESS_SWEEP_SECS`, default 1 (spec §4.4 "background
    /// sweeper" gives no fixed cadence; one second keeps the 6s timeout
    /// responsive without busy-looping).
    pub liveness_sweep_interval: std::time::Duration,
}

impl DaemonConfig {
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

        let state_dir = match std::env::var("FLEET_STATE_DIR") {
            Ok(dir) => PathBuf::from(dir),
            Err(_) => default_state_dir()?,
        };

        let control_socket = std::env::var("FLEET_CONTROL_SOCKET")
            .map(PathBuf::from)
            .unwrap_or_else(|_| state_dir.join("control.sock"));

        let heartbeat_timeout = std::env::var("AGENT_HEARTBEAT_TIMEOUT_SECS")
            .ok()
            .map(|raw| raw.parse::<i64>().map_err(|_| ConfigError::Invalid("AGENT_HEARTBEAT_TIMEOUT_SECS", raw)))
            .transpose()?
            .map(ChronoDuration::seconds)
            .unwrap_or(fleet_coordinator::DEFAULT_HEARTBEAT_TIMEOUT);

        let liveness_sweep_interval = std::env::var("FLEET_LIVENESS_SWEEP_SECS")
            .ok()
            .map(|raw| raw.parse::<u64>().map_err(|_| ConfigError::Invalid("FLEET_LIVENESS_SWEEP_SECS", raw)))
            .transpose()?
            .map(std::time::Duration::from_secs)
            .unwrap_or(std::time::Duration::from_secs(1));

        Ok(Self { nats_servers, state_dir, control_socket, heartbeat_timeout, liveness_sweep_interval })
    }

    pub fn wal_path(&self) -> PathBuf {
        self.state_dir.join("fleet.wal")
    }
}

fn default_state_dir() -> Result<PathBuf, ConfigError> {
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return Ok(PathBuf::from(xdg).join("fleet"));
    }
    dirs::home_dir().map(|home| home.join(".local/state/fleet")).ok_or(ConfigError::NoStateDir)
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
