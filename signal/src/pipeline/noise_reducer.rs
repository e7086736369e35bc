//! Stage 2 — Noise reducer: debounces identical `(strategy, symbol,
//! side)` within a configurable window (`spec.md` §4.7).

use crate::model::{ProvenanceEntry, Side, Signal, Verdict};
use chrono::Utc;
use parking_lot::Mutex;
use std::collections::HashMap;

pub const STAGE_NAME: &str = "noise_reducer";

type DebounceKey = (String, String, Side);

/// Tracks the last-seen timestamp for each `(strategy, symbol, side)`
/// triple. One instance is owned by the stage's Module Runtime task
/// (single-writer, no need for cross-task locking beyond the internal
/// mutex guarding concurrent ticks).
#[derive(Debug)]
pub struct NoiseReducer {
    window_ms: i64,
    last_seen: Mutex<HashMap<DebounceKey, i64>>,
}

impl NoiseReducer {
    pub fn new(window_ms: i64) -> Self {
        Self { window_ms, last_seen: Mutex::new(HashMap::new()) }
    }

    /// Returns `Ok` (annotated, passed through) if `signal` is novel
    /// within the window, or `Err` (annotated, dropped as `duplicate`)
    /// if an identical triple was seen more recently than `window_ms`.
    pub fn check(&self, signal: Signal) -> Result<Signal, Signal> {
        let key = (signal.strategy.to_string(), signal.symbol.to_string(), signal.side);
        let mut last_seen = self.last_seen.lock();
        let is_duplicate = match last_seen.get(&key) {
            Some(&previous_ts) => signal.timestamp - previous_ts < self.window_ms,
            None => false,
        };
        last_seen.insert(key, signal.timestamp);
        drop(last_seen);

        if is_duplicate {
            Err(signal.with_provenance(ProvenanceEntry::new(
                STAGE_NAME,
                Verdict::Dropped { reason: "duplicate".to_string() },
                Utc::now(),
            )))
        } else {
            Ok(signal.with_provenance(ProvenanceEntry::new(STAGE_NAME, Verdict::Passed, Utc::now())))
        }
    }
}
