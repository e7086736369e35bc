//! Capital Loop Optimizer: re-runs the allocator over a trailing window
//! on an hourly cadence. Implemented as a tick co-located on the Capital
//! Allocator's owning worker rather than a separate process, since both
//! share single-writer ownership of the Capital Book (`SPEC_FULL.md`
//! §4.8, grounded in `original_source/capital_loop_optimizer.py`).

use crate::book::{CapitalAllocator, CapitalBook, StrategyScore};
use crate::error::CapitalError;
use titan_namespace::TenantId;

pub const DEFAULT_TICK_INTERVAL_MS: i64 = 60 * 60 * 1000;

#[derive(Debug)]
pub struct CapitalLoopOptimizer {
    tick_interval_ms: i64,
}

impl CapitalLoopOptimizer {
    pub fn new(tick_interval_ms: i64) -> Self {
        Self { tick_interval_ms }
    }

    /// Whether the optimizer is due to run again, given the timestamp of
    /// its last run.
    pub fn is_due(&self, last_run_ms: i64, now_ms: i64) -> bool {
        now_ms - last_run_ms >= self.tick_interval_ms
    }

    /// Re-runs `allocator`'s reallocation for `tenant` from the trailing
    /// window's `(profitability, risk)` pairs. The window aggregation
    /// itself is domain-specific strategy math, out of scope per
    /// `spec.md` §1 Non-goals — callers supply the already-aggregated
    /// `inputs`.
    pub async fn run(
        &self,
        allocator: &CapitalAllocator,
        tenant: &TenantId,
        inputs: &[StrategyScore],
    ) -> Result<CapitalBook, CapitalError> {
        allocator.reallocate(tenant, inputs).await
    }
}
