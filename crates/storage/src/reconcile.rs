//! Periodic reconciler (spec §4.7): merges freshly-loaded agent rows into
//! the in-memory registry for multi-process setups. Conflict rule is
//! *last-writer-wins by timestamp*; ties prefer the higher heartbeat
//! count (spec §4.7, §9 Open Question 3 — treated here as an optional
//! consistency aid, not the primary durability path, which is WAL
//! replay on restart).

use fleet_core::AgentRecord;
use std::collections::HashMap;
use std::cmp::Ordering;

/// Merge `incoming` rows into `local`, keeping whichever record of each
/// pair is more authoritative per the last-writer-wins rule. Returns the
/// set of agent ids that were actually replaced, for logging.
pub fn reconcile(local: &mut HashMap<fleet_core::AgentId, AgentRecord>, incoming: Vec<AgentRecord>) -> Vec<fleet_core::AgentId> {
    let mut replaced = Vec::new();
    for fresh in incoming {
        match local.get(&fresh.id) {
            Some(current) if !should_replace(current, &fresh) => {}
            _ => {
                replaced.push(fresh.id);
                local.insert(fresh.id, fresh);
            }
        }
    }
    replaced
}

fn should_replace(current: &AgentRecord, candidate: &AgentRecord) -> bool {
    match candidate.last_seen.cmp(&current.last_seen) {
        Ordering::Greater => true,
        Ordering::Less => false,
        Ordering::Equal => candidate.heartbeat_count > current.heartbeat_count,
    }
}
