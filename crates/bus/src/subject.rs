//! Fixed subject layout (spec §4.3).
//!
//! ```text
//! agent.heartbeat_module             all agents publish heartbeats here
//! agent.<agent_id>.<module>.in       coordinator -> agent, execute request
//! agent.<agent_id>.<module>.out      agent -> coordinator, module result
//! agent.<agent_id>.<module>.error    agent -> coordinator, module error
//! agent.module.state                 agent -> coordinator, lifecycle state
//! agent.notif                        agent -> coordinator, ad-hoc notices
//! agent.error                        agent -> coordinator, crash reports
//! ```

use fleet_core::AgentId;

pub const HEARTBEAT: &str = "agent.heartbeat_module";
pub const MODULE_STATE: &str = "agent.module.state";
pub const NOTIF: &str = "agent.notif";
pub const ERROR: &str = "agent.error";

pub fn module_in(agent_id: &AgentId, module_name: &str) -> String {
    format!("agent.{agent_id}.{module_name}.in")
}

pub fn module_out(agent_id: &AgentId, module_name: &str) -> String {
    format!("agent.{agent_id}.{module_name}.out")
}

pub fn module_error(agent_id: &AgentId, module_name: &str) -> String {
    format!("agent.{agent_id}.{module_name}.error")
}
