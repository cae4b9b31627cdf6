//! Agent record and capability document (spec §3).

use crate::id::AgentId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One module a heartbeat advertises: a name, an input schema, and the
/// three subjects it reads/writes on the bus.
///
/// Invariant (spec §3): `input_subject`, `output_subject`, and
/// `error_subject` are pairwise distinct and none is empty. Construction
/// through [`ModuleDescriptor::new`] enforces this; deserialized values are
/// checked by [`CapabilityDocument::validate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleDescriptor {
    pub name: String,
    pub input_schema: serde_json::Value,
    pub input_subject: String,
    pub output_subject: String,
    pub error_subject: String,
}

/// Why a [`ModuleDescriptor`] or [`CapabilityDocument`] failed validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DescriptorError {
    #[error("module {0:?} has an empty subject")]
    EmptySubject(String),
    #[error("module {0:?} has two subjects pointing at the same name")]
    DuplicateSubject(String),
}

impl ModuleDescriptor {
    pub fn new(
        name: impl Into<String>,
        input_schema: serde_json::Value,
        input_subject: impl Into<String>,
        output_subject: impl Into<String>,
        error_subject: impl Into<String>,
    ) -> Result<Self, DescriptorError> {
        let descriptor = Self {
            name: name.into(),
            input_schema,
            input_subject: input_subject.into(),
            output_subject: output_subject.into(),
            error_subject: error_subject.into(),
        };
        descriptor.validate()?;
        Ok(descriptor)
    }

    pub fn validate(&self) -> Result<(), DescriptorError> {
        let subjects = [&self.input_subject, &self.output_subject, &self.error_subject];
        if subjects.iter().any(|s| s.is_empty()) {
            return Err(DescriptorError::EmptySubject(self.name.clone()));
        }
        let mut seen = std::collections::HashSet::with_capacity(3);
        for subject in subjects {
            if !seen.insert(subject.as_str()) {
                return Err(DescriptorError::DuplicateSubject(self.name.clone()));
            }
        }
        Ok(())
    }
}

/// The modules-section of a heartbeat: the authoritative manifest for
/// dispatch and subscription. Keyed by module name (unique within an
/// agent, spec §3).
///
/// `PartialEq`/`Eq` give byte-equivalent value comparison, which is how the
/// registry detects a capability change (spec §4.4 step 3/4) without
/// tracking an explicit version counter.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CapabilityDocument {
    pub modules: BTreeMap<String, ModuleDescriptor>,
}

impl CapabilityDocument {
    pub fn new(modules: impl IntoIterator<Item = ModuleDescriptor>) -> Self {
        Self { modules: modules.into_iter().map(|m| (m.name.clone(), m)).collect() }
    }

    pub fn validate(&self) -> Result<(), DescriptorError> {
        self.modules.values().try_for_each(ModuleDescriptor::validate)
    }

    pub fn get(&self, module_name: &str) -> Option<&ModuleDescriptor> {
        self.modules.get(module_name)
    }

    /// The subject set this document implies the coordinator should
    /// subscribe to, per spec §4.5's formula (not including the per-agent
    /// `agent.<id>.out` catch-all, which the caller owns).
    pub fn output_subjects(&self) -> impl Iterator<Item = &str> {
        self.modules.values().map(|m| m.output_subject.as_str())
    }
}

/// Identity and liveness of a remote agent (spec §3 "Agent record").
///
/// Owned exclusively by the registry (C4); the workflow engine (C6) reads
/// it but never mutates it (spec §3 "Ownership").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentRecord {
    pub id: AgentId,
    pub name: String,
    pub hostname: String,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    pub alive: bool,
    pub heartbeat_count: u64,
    pub capabilities: CapabilityDocument,
}

impl AgentRecord {
    pub fn from_first_heartbeat(
        id: AgentId,
        name: String,
        hostname: String,
        capabilities: CapabilityDocument,
        now: DateTime<Utc>,
    ) -> Self {
        Self { id, name, hostname, first_seen: now, last_seen: now, alive: true, heartbeat_count: 1, capabilities }
    }

    /// Apply an unchanged-capability heartbeat: bump liveness bookkeeping
    /// only (spec §4.4 step 3).
    pub fn record_repeat_heartbeat(&mut self, now: DateTime<Utc>) {
        self.last_seen = now;
        self.alive = true;
        self.heartbeat_count += 1;
    }

    /// Apply a heartbeat whose capability document differs from the stored
    /// one: replace it and bump bookkeeping (spec §4.4 step 4).
    pub fn record_changed_heartbeat(&mut self, capabilities: CapabilityDocument, now: DateTime<Utc>) {
        self.capabilities = capabilities;
        self.record_repeat_heartbeat(now);
    }

    /// True if `last_seen` is at or past `timeout` relative to `now`
    /// (spec §8 "exactly-at-timeout" boundary: `<=` fires the sweep).
    pub fn is_stale(&self, now: DateTime<Utc>, timeout: chrono::Duration) -> bool {
        now.signed_duration_since(self.last_seen) >= timeout
    }
}

#[cfg(any(test, feature = "test-support"))]
pub mod test_support {
    use super::*;

    pub fn sample_descriptor(name: &str) -> ModuleDescriptor {
        ModuleDescriptor {
            name: name.to_string(),
            input_schema: serde_json::json!({"type": "object"}),
            input_subject: format!("agent.a1.{name}.in"),
            output_subject: format!("agent.a1.{name}.out"),
            error_subject: format!("agent.a1.{name}.error"),
        }
    }

    pub fn sample_capabilities(module_names: &[&str]) -> CapabilityDocument {
        CapabilityDocument::new(module_names.iter().map(|n| sample_descriptor(n)))
    }

    pub fn sample_agent(id: AgentId, now: DateTime<Utc>) -> AgentRecord {
        AgentRecord::from_first_heartbeat(
            id,
            "agent-one".to_string(),
            "host-one".to_string(),
            sample_capabilities(&["echo"]),
            now,
        )
    }
}

#[cfg(test)]
#[path = "agent_tests.rs"]
mod tests;
