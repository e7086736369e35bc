//! Error kinds surfaced by the execution and post-trade layer
//! (`spec.md` §7).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error(transparent)]
    Bus(#[from] titan_bus::BusError),

    #[error("no matching signal for fill {fill_id} within the lookback window")]
    PhantomFill { fill_id: String },

    #[error("order for signal {signal_id} exhausted retries after {attempts} attempts")]
    RetriesExhausted { signal_id: String, attempts: u32 },
}
