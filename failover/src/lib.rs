#![forbid(unsafe_code)]
#![warn(unused, missing_debug_implementations, rust_2018_idioms)]

//! Region failover, bus heartbeat, chaos monitoring, the system-wide
//! state machine, and the reporters that observe them
//! (`spec.md` §4.11).

pub mod chaos_monitor;
pub mod error;
pub mod heartbeat;
pub mod latency_heatmap;
pub mod recovery_reporter;
pub mod region_failover;
pub mod state_machine;

pub use chaos_monitor::{ChaosMonitor, LoadSheddingDirective};
pub use error::FailoverError;
pub use heartbeat::RedisHeartbeat;
pub use latency_heatmap::{LatencyHeatmap, LatencyHeatmapProducer};
pub use recovery_reporter::{EmergencyRecoveryReporter, RecoveryReport};
pub use region_failover::{HealthSnapshot, RegionFailoverManager};
pub use state_machine::{DegradedCause, SystemState, SystemStateMachine, SystemStateRecord};
