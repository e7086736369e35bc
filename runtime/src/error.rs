use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The error-kind taxonomy every worker surfaces in logs and metrics,
/// per `spec.md` §7.
#[derive(Debug, Clone, Eq, PartialEq, Deserialize, Serialize, Error)]
pub enum RuntimeError {
    #[error("Timeout")]
    Timeout,

    #[error("SimulatedFailure")]
    SimulatedFailure,

    #[error("ChaosTrip")]
    ChaosTrip,

    #[error("Fatal: {0}")]
    Fatal(String),

    #[error("Bus: {0}")]
    Bus(#[from] titan_bus::BusError),
}
