//! Heartbeat document (spec §3 "Heartbeat document", §4.3).
//!
//! Grounded on `original_source/modules/heartbeat/{model.py,utils.py}`:
//! the agent block mirrors the pydantic `Agent`/`User`/`System`/
//! `NetworkInterface` models field-for-field, translated to idiomatic Rust
//! naming. Probes (`user`, `system`, `network`) are defensive: a failing
//! probe contributes an `error` field rather than aborting the whole
//! document (spec §4.3).

use chrono::{DateTime, Utc};
use fleet_core::CapabilityDocument;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The outcome of a best-effort system probe: either the data, or the
/// reason it could not be collected. Untagged so a successful probe
/// serializes as `T`'s own shape and a failed one as `{"error": "..."}`,
/// matching the Python fallback-dict precedent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Probe<T> {
    Available(T),
    Unavailable { error: String },
}

impl<T> Probe<T> {
    pub fn from_result(result: Result<T, String>) -> Self {
        match result {
            Ok(value) => Self::Available(value),
            Err(error) => Self::Unavailable { error },
        }
    }

    pub fn available(&self) -> Option<&T> {
        match self {
            Self::Available(value) => Some(value),
            Self::Unavailable { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Loadavg {
    pub one_min: f64,
    pub five_min: f64,
    pub fifteen_min: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserInfo {
    pub user: String,
    pub working_dir: String,
    pub home_dir: String,
    pub shell: String,
    pub uid: u32,
    pub gid: u32,
    pub groups: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loadavg: Option<Loadavg>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemInfo {
    pub system: String,
    pub node_name: String,
    pub release: String,
    pub version: String,
    pub machine: String,
    pub processor: String,
    pub platform: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NetworkInterfaceInfo {
    pub ipv4: Vec<String>,
    pub ipv6: Vec<String>,
    pub mac: Vec<String>,
}

/// The agent block embedded in every heartbeat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentBlock {
    pub id: String,
    pub name: String,
    pub hostname: String,
    pub pid: u32,
    pub timezone: Vec<String>,
    pub user: Probe<UserInfo>,
    pub system: Probe<SystemInfo>,
    pub network: Probe<BTreeMap<String, NetworkInterfaceInfo>>,
    pub modules: CapabilityDocument,
}

/// A self-describing heartbeat (spec §3): self-sufficient enough that the
/// coordinator can rebuild an agent's record from one document after an
/// empty-state restart (spec §8 S6).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeartbeatDocument {
    pub module: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
    pub agent: AgentBlock,
}
