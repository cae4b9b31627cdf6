//! The Persistence Port (C7): write-through on every mutation, hydrated
//! once at startup by WAL replay (spec §4.7).
//!
//! Per spec §4.7, "failure to persist logs a warning but does not block
//! the in-memory transition" — callers own the in-memory state and call
//! here as a best-effort durability step; [`PersistencePort`] never
//! panics and surfaces failures as `Result` for the caller to log and
//! continue past.

use crate::state::{MaterializedState, PersistenceEvent};
use crate::wal::{Wal, WalError};
use fleet_core::{AgentId, AgentRecord, Workflow, WorkflowId, WorkflowTransition};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("persistence unavailable: {0}")]
    Unavailable(#[from] WalError),
    #[error("persistence unavailable: corrupt snapshot: {0}")]
    Snapshot(#[from] serde_json::Error),
}

impl From<PersistenceError> for fleet_core::FleetError {
    fn from(err: PersistenceError) -> Self {
        fleet_core::FleetError::PersistenceUnavailable(err.to_string())
    }
}

#[derive(serde::Serialize, serde::Deserialize)]
struct Snapshot {
    seq: u64,
    state: MaterializedState,
}

pub struct PersistencePort {
    wal: Wal<PersistenceEvent>,
    state: MaterializedState,
    snapshot_path: PathBuf,
}

impl PersistencePort {
    /// Open (creating if absent) the WAL at `path` and hydrate in-memory
    /// state (spec §4.7 "load-on-startup restores in-memory caches"): load
    /// the last snapshot if one exists, then replay every WAL entry after
    /// it. With no snapshot this replays the whole WAL from the start.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, PersistenceError> {
        let path = path.as_ref();
        let snapshot_path = path.with_extension("snapshot.json");

        let (mut state, snapshot_seq) = if snapshot_path.exists() {
            let raw = std::fs::read(&snapshot_path).map_err(WalError::Io)?;
            let snapshot: Snapshot = serde_json::from_slice(&raw)?;
            (snapshot.state, snapshot.seq)
        } else {
            (MaterializedState::default(), 0)
        };

        let mut wal = Wal::open(path, snapshot_seq)?;
        for entry in wal.entries_after(snapshot_seq)? {
            state.apply(&entry.event);
        }
        wal.mark_processed(wal.write_seq());
        Ok(Self { wal, state, snapshot_path })
    }

    pub fn state(&self) -> &MaterializedState {
        &self.state
    }

    pub fn agent(&self, id: &AgentId) -> Option<&AgentRecord> {
        self.state.agent(id)
    }

    pub fn workflow(&self, id: &WorkflowId) -> Option<&Workflow> {
        self.state.workflow(id)
    }

    fn write_through(&mut self, event: PersistenceEvent) -> Result<(), PersistenceError> {
        self.state.apply(&event);
        self.wal.append(&event)?;
        self.wal.flush()?;
        self.wal.mark_processed(self.wal.write_seq());
        Ok(())
    }

    pub fn upsert_agent(&mut self, record: AgentRecord) -> Result<(), PersistenceError> {
        self.write_through(PersistenceEvent::AgentUpserted(record))
    }

    pub fn create_workflow(&mut self, workflow: Workflow) -> Result<(), PersistenceError> {
        self.write_through(PersistenceEvent::WorkflowCreated(workflow))
    }

    pub fn append_transition(
        &mut self,
        workflow_id: WorkflowId,
        transition: WorkflowTransition,
    ) -> Result<(), PersistenceError> {
        self.write_through(PersistenceEvent::WorkflowTransitioned { workflow_id, transition })
    }

    /// Snapshot the current materialized state to disk, then drop every
    /// WAL entry it now subsumes. Safe to call at any time — the next
    /// [`PersistencePort::open`] loads this snapshot and replays only
    /// what came after it, never changing the state a caller observes.
    pub fn compact(&mut self) -> Result<(), PersistenceError> {
        let seq = self.wal.write_seq();
        let raw = serde_json::to_vec(&Snapshot { seq, state: self.state.clone() })?;
        std::fs::write(&self.snapshot_path, raw).map_err(WalError::Io)?;
        self.wal.truncate_before(seq + 1)?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "port_tests.rs"]
mod tests;
