//! Stage 5 — Collision detector: for the same symbol within a time
//! window, keeps the highest-confidence signal on each side and
//! discards the rest; if both surviving sides still conflict, escalates
//! (`spec.md` §4.7).

use crate::model::{ProvenanceEntry, Side, Signal, Verdict};
use chrono::Utc;

pub const STAGE_NAME: &str = "collision_detector";

/// Outcome of resolving one symbol's in-window batch.
#[derive(Debug, Clone, PartialEq)]
pub struct CollisionResult {
    pub survivors: Vec<Signal>,
    pub dropped: Vec<Signal>,
    /// `Some((buy, sell))` when both sides survived and still conflict —
    /// the Collision Detector publishes this pair to `conflicts` for the
    /// Conflict Escalation Manager (stage 7).
    pub escalate: Option<(Signal, Signal)>,
}

/// `signals` must all share the same symbol and fall within the
/// detector's time window; the caller (the stage's Module Runtime) is
/// responsible for windowing.
pub fn resolve(signals: Vec<Signal>) -> CollisionResult {
    let mut best_buy: Option<Signal> = None;
    let mut best_sell: Option<Signal> = None;
    let mut dropped = Vec::new();

    for signal in signals {
        let slot = match signal.side {
            Side::Buy => &mut best_buy,
            Side::Sell => &mut best_sell,
        };
        match slot {
            None => *slot = Some(signal),
            Some(current) if signal.confidence > current.confidence => {
                let replaced = std::mem::replace(current, signal);
                dropped.push(replaced);
            }
            Some(_) => dropped.push(signal),
        }
    }

    let dropped: Vec<Signal> = dropped
        .into_iter()
        .map(|s| {
            s.with_provenance(ProvenanceEntry::new(
                STAGE_NAME,
                Verdict::Dropped { reason: "lower confidence than same-side survivor".to_string() },
                Utc::now(),
            ))
        })
        .collect();

    match (best_buy, best_sell) {
        (Some(buy), Some(sell)) => CollisionResult { survivors: Vec::new(), dropped, escalate: Some((buy, sell)) },
        (Some(buy), None) => {
            let buy = buy.with_provenance(ProvenanceEntry::new(STAGE_NAME, Verdict::Passed, Utc::now()));
            CollisionResult { survivors: vec![buy], dropped, escalate: None }
        }
        (None, Some(sell)) => {
            let sell = sell.with_provenance(ProvenanceEntry::new(STAGE_NAME, Verdict::Passed, Utc::now()));
            CollisionResult { survivors: vec![sell], dropped, escalate: None }
        }
        (None, None) => CollisionResult { survivors: Vec::new(), dropped, escalate: None },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{SignalFlags, SignalId};
    use rust_decimal_macros::dec;
    use smol_str::SmolStr;
    use titan_config::MorphicMode;
    use titan_namespace::TenantId;

    fn signal(side: Side, confidence: rust_decimal::Decimal) -> Signal {
        Signal::new(
            SignalId::new_random(),
            1,
            SmolStr::new("BTC-USD"),
            side,
            dec!(1),
            None,
            None,
            confidence,
            SmolStr::new("s"),
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
    fn single_side_survives_with_no_escalation() {
        let result = resolve(vec![signal(Side::Buy, dec!(0.5)), signal(Side::Buy, dec!(0.9))]);
        assert_eq!(result.survivors.len(), 1);
        assert_eq!(result.survivors[0].confidence, dec!(0.9));
        assert_eq!(result.dropped.len(), 1);
        assert!(result.escalate.is_none());
    }

    #[test]
    fn opposing_sides_both_surviving_escalate() {
        let result = resolve(vec![signal(Side::Buy, dec!(0.9)), signal(Side::Sell, dec!(0.8))]);
        assert!(result.survivors.is_empty());
        assert!(result.escalate.is_some());
        let (buy, sell) = result.escalate.unwrap();
        assert_eq!(buy.side, Side::Buy);
        assert_eq!(sell.side, Side::Sell);
    }
}
