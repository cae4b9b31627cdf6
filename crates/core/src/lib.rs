// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! fleet-core: domain types shared by the coordinator and the agent runtime.

pub mod agent;
pub mod clock;
pub mod error;
pub mod id;
pub mod time;
pub mod workflow;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use agent::{AgentRecord, CapabilityDocument, ModuleDescriptor};
pub use clock::{Clock, FakeClock, SystemClock};
pub use error::FleetError;
pub use id::{short, AgentId, WorkflowId};
pub use time::promote_to_utc;
pub use workflow::{Workflow, WorkflowState, WorkflowTransition};
