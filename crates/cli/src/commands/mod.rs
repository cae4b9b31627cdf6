//! CLI command implementations, one module per noun (spec §4.8's Public
//! API Port surface: agents, workflows, exec).

pub mod agents;
pub mod exec;
pub mod workflows;
