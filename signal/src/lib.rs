#![forbid(unsafe_code)]
#![warn(unused, missing_debug_implementations, rust_2018_idioms)]

//! Signal data model and the ten-stage filtering/routing pipeline
//! (`spec.md` §3, §4.7).

pub mod backlog;
pub mod error;
pub mod model;
pub mod pipeline;

pub use backlog::{DrainedOutcome, SignalBacklog, MAX_RETRIES_PER_SIGNAL};
pub use error::SignalError;
pub use model::{ProvenanceEntry, Side, Signal, SignalFlags, SignalId, Verdict};
