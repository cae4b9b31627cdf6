#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! fleet-agent: the Module Host (C2, spec §4.2) and Heartbeat Emitter (C3,
//! spec §4.3) that run inside every agent process.

pub mod config;
pub mod heartbeat;
pub mod host;
pub mod manifest;
pub mod module;
pub mod modules;
pub mod probes;
pub mod registry;
pub mod supervisor;
pub mod watcher;

pub use config::AgentConfig;
pub use heartbeat::HeartbeatEmitter;
pub use host::ModuleHost;
pub use manifest::ModuleManifest;
pub use module::{Module, ModuleContext, ModuleError, ReportedState};
pub use registry::ModuleRegistry;
pub use supervisor::{Supervisor, DEFAULT_STOP_TIMEOUT};
pub use watcher::ModuleWatcher;
