//! Stage 3 — Alignment front-loader: aggregates signals across
//! strategies in a sliding window; when `MIN_SIGNALS_ALIGNED` distinct
//! strategies agree on `(symbol, side)`, emits a derived signal with
//! boosted quantity (`spec.md` §4.7, `SPEC_FULL.md` §9).

use crate::model::{ProvenanceEntry, Side, Signal, Verdict};
use chrono::Utc;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashMap;

pub const STAGE_NAME: &str = "alignment_front_loader";

/// Minimum number of distinct strategies that must agree within the
/// window before the front-loader emits a derived signal.
pub const MIN_SIGNALS_ALIGNED: usize = 2;

/// Multiplier applied to the representative signal's quantity when
/// alignment triggers, capped at `2.0x` the original quantity.
pub const CAPITAL_MULTIPLIER: Decimal = dec!(1.25);
const MAX_MULTIPLIER: Decimal = dec!(2.0);

type AlignmentKey = (String, Side);

#[derive(Debug, Clone)]
struct WindowEntry {
    strategy: String,
    signal: Signal,
}

/// Buffers recent signals per `(symbol, side)` and checks for alignment
/// on every new arrival.
#[derive(Debug)]
pub struct AlignmentFrontLoader {
    window_ms: i64,
    buffers: Mutex<HashMap<AlignmentKey, Vec<WindowEntry>>>,
}

impl AlignmentFrontLoader {
    pub fn new(window_ms: i64) -> Self {
        Self { window_ms, buffers: Mutex::new(HashMap::new()) }
    }

    /// Feeds `signal` into the window. Always forwards the original
    /// signal (the front-loader never drops an input); additionally
    /// returns a derived, quantity-boosted signal when this arrival
    /// completes an alignment.
    pub fn observe(&self, signal: Signal) -> (Signal, Option<Signal>) {
        let key = (signal.symbol.to_string(), signal.side);
        let mut buffers = self.buffers.lock();
        let entries = buffers.entry(key).or_default();

        entries.retain(|e| signal.timestamp - e.signal.timestamp <= self.window_ms);
        entries.push(WindowEntry { strategy: signal.strategy.to_string(), signal: signal.clone() });

        let distinct_strategies: std::collections::HashSet<&str> =
            entries.iter().map(|e| e.strategy.as_str()).collect();

        let derived = if distinct_strategies.len() >= MIN_SIGNALS_ALIGNED {
            let boosted_quantity =
                (signal.quantity * CAPITAL_MULTIPLIER).min(signal.quantity * MAX_MULTIPLIER);
            Some(signal.derive(|s| {
                s.quantity = boosted_quantity;
                s.flags.reinjected = true;
            }))
        } else {
            None
        };
        drop(buffers);

        let passed = signal.with_provenance(ProvenanceEntry::new(STAGE_NAME, Verdict::Passed, Utc::now()));
        (passed, derived)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{SignalFlags, SignalId};
    use smol_str::SmolStr;
    use titan_config::MorphicMode;
    use titan_namespace::TenantId;

    fn signal(strategy: &str, ts: i64, quantity: Decimal) -> Signal {
        Signal::new(
            SignalId::new_random(),
            ts,
            SmolStr::new("BTC-USD"),
            Side::Buy,
            quantity,
            None,
            None,
            dec!(0.8),
            SmolStr::new(strategy),
            1_000,
            TenantId::new("acme"),
            SmolStr::new("c"),
            MorphicMode::Default,
            SignalFlags::default(),
            Vec::new(),
            None,
        )
    }

    #[test]
    fn single_strategy_does_not_align() {
        let loader = AlignmentFrontLoader::new(5_000);
        let (_, derived) = loader.observe(signal("momentum", 0, dec!(1)));
        assert!(derived.is_none());
    }

    #[test]
    fn two_distinct_strategies_within_window_align_and_boost_quantity() {
        let loader = AlignmentFrontLoader::new(5_000);
        loader.observe(signal("momentum", 0, dec!(1)));
        let (_, derived) = loader.observe(signal("mean_reversion", 1_000, dec!(1)));
        let derived = derived.expect("second aligned strategy should trigger derivation");
        assert_eq!(derived.quantity, dec!(1.25));
        assert!(derived.flags.reinjected);
    }

    #[test]
    fn boost_is_capped_at_2x_original_quantity() {
        let loader = AlignmentFrontLoader::new(5_000);
        loader.observe(signal("momentum", 0, dec!(10)));
        let (_, derived) = loader.observe(signal("mean_reversion", 100, dec!(10)));
        let derived = derived.unwrap();
        assert!(derived.quantity <= dec!(20));
    }

    #[test]
    fn entries_outside_window_do_not_count_toward_alignment() {
        let loader = AlignmentFrontLoader::new(1_000);
        loader.observe(signal("momentum", 0, dec!(1)));
        let (_, derived) = loader.observe(signal("mean_reversion", 5_000, dec!(1)));
        assert!(derived.is_none());
    }
}
