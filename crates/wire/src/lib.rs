//! Wire schemas for the bus (heartbeat, module state, result envelope) and
//! for the daemon's control-socket protocol (C8).
//!
//! Bus payloads are plain JSON with no framing (subjects already delimit
//! messages). The control-socket protocol additionally frames each message
//! with a 4-byte big-endian length prefix, since it runs over a byte stream.

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod framing;
mod heartbeat;
mod request;
mod response;
mod result;
mod state;

pub use framing::{read_message, write_message, ProtocolError};
pub use heartbeat::{AgentBlock, HeartbeatDocument, Loadavg, NetworkInterfaceInfo, Probe, SystemInfo, UserInfo};
pub use request::{AgentFilter, ExecMode, Request, MAX_LIST_WORKFLOWS_LIMIT};
pub use response::{AgentSummary, Response, WorkflowSummary};
pub use result::ResultEnvelope;
pub use state::{StateMessage, WireModuleState};
