//! Phantom Fill Detector: a `TradeEvent` that references a signal id we
//! never routed is a phantom fill — either a replayed message or a
//! misrouted exchange callback (`spec.md` §4.9).

use std::collections::VecDeque;
use titan_signal::SignalId;

use crate::error::ExecutionError;

/// How many recently-routed signal ids to retain for cross-referencing.
pub const LOOKBACK_WINDOW: usize = 10_000;

/// Tracks recently routed signal ids so fills can be matched against
/// them. One instance owned by whatever worker also owns the Execution
/// Controller's routed-signal subscription.
#[derive(Debug)]
pub struct PhantomFillDetector {
    capacity: usize,
    seen: VecDeque<SignalId>,
}

impl Default for PhantomFillDetector {
    fn default() -> Self {
        Self::new(LOOKBACK_WINDOW)
    }
}

impl PhantomFillDetector {
    pub fn new(capacity: usize) -> Self {
        Self { capacity, seen: VecDeque::with_capacity(capacity.min(1024)) }
    }

    /// Records a signal id as routed, evicting the oldest entry once the
    /// lookback window is full.
    pub fn record_routed(&mut self, signal_id: SignalId) {
        if self.seen.len() >= self.capacity {
            self.seen.pop_front();
        }
        self.seen.push_back(signal_id);
    }

    /// Verifies a fill references a signal we actually routed.
    pub fn verify_fill(&self, signal_id: SignalId) -> Result<(), ExecutionError> {
        if self.seen.contains(&signal_id) {
            Ok(())
        } else {
            Err(ExecutionError::PhantomFill { fill_id: signal_id.to_string() })
        }
    }
}
