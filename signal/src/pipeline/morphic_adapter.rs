//! Stage 8 — Morphic adapter: reads the current mode and scales
//! confidence, leverage, and TTL, running last before routing so policy
//! caps stay authoritative (`spec.md` §4.6, §4.7).
//!
//! `spec.md` §8 invariant (e): the adapter's output never exceeds the
//! active mode's `max_leverage` or falls below its `min_confidence` — a
//! scaled signal that would fall below the floor is dropped with
//! `PolicyViolation` rather than published under-confidence (§8 scenario
//! 2: `alpha_push`'s floor 0.7 drops a 0.65-confidence signal).

use crate::model::{ProvenanceEntry, Signal, Verdict};
use chrono::Utc;
use titan_mode::{apply, PolicyTable};

pub const STAGE_NAME: &str = "morphic_adapter";

/// Scales `signal`'s confidence, leverage, and TTL to the policy caps of
/// its `morphic_mode`. Returns `Err` (dropped, `PolicyViolation`) if the
/// scaled confidence falls below the mode's floor; otherwise `Ok` with a
/// new signal referencing `signal` as its parent — scaling changes value
/// fields, and `spec.md` §3 requires those go through [`Signal::derive`]
/// rather than an in-place mutation.
///
/// Idempotent on `signal.id`'s provenance (`spec.md` §8 "applying the
/// Morphic Adapter twice equals applying it once"): the scaling factors
/// are multiplicative, so re-running them against an already-scaled
/// signal would compound rather than repeat. A signal that already
/// carries a [`STAGE_NAME`] provenance entry is passed through unchanged
/// instead.
pub fn adapt(signal: Signal, policy: &PolicyTable) -> Result<Signal, Signal> {
    if signal.provenance.iter().any(|entry| entry.stage == STAGE_NAME) {
        return Ok(signal);
    }

    let caps = policy.caps_for(signal.morphic_mode);
    let effect = titan_mode::effect_from_table(policy, signal.morphic_mode);
    let leverage = signal.leverage.unwrap_or(rust_decimal::Decimal::ONE);
    let scaled = apply(effect, signal.confidence, leverage, signal.ttl_ms);

    let has_leverage = signal.leverage.is_some();
    let mode = signal.morphic_mode;

    if scaled.confidence < caps.min_confidence {
        return Err(signal.with_provenance(ProvenanceEntry::new(
            STAGE_NAME,
            Verdict::Dropped {
                reason: format!(
                    "PolicyViolation: scaled confidence {} below {} floor {}",
                    scaled.confidence, mode, caps.min_confidence
                ),
            },
            Utc::now(),
        )));
    }

    Ok(signal
        .derive(|s| {
            s.confidence = scaled.confidence;
            if has_leverage {
                s.leverage = Some(scaled.leverage);
            }
            s.ttl_ms = scaled.ttl_ms;
        })
        .with_provenance(ProvenanceEntry::new(
            STAGE_NAME,
            Verdict::Modified { reason: format!("scaled for mode {mode}") },
            Utc::now(),
        )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Side, SignalFlags, SignalId};
    use rust_decimal_macros::dec;
    use smol_str::SmolStr;
    use titan_config::MorphicMode;
    use titan_namespace::TenantId;

    fn sample(mode: MorphicMode, confidence: rust_decimal::Decimal) -> Signal {
        Signal::new(
            SignalId::new_random(),
            1,
            SmolStr::new("BTC-USD"),
            Side::Buy,
            dec!(1),
            None,
            Some(dec!(10)),
            confidence,
            SmolStr::new("s"),
            60_000,
            TenantId::new("acme"),
            SmolStr::new("c"),
            mode,
            SignalFlags::default(),
            Vec::new(),
            None,
        )
    }

    #[test]
    fn leverage_is_clamped_to_mode_cap() {
        let adapted = adapt(sample(MorphicMode::Default, dec!(0.8)), &PolicyTable::new()).unwrap();
        assert_eq!(adapted.leverage, Some(dec!(3)));
    }

    #[test]
    fn adapter_records_modified_provenance() {
        let adapted = adapt(sample(MorphicMode::Default, dec!(0.8)), &PolicyTable::new()).unwrap();
        assert!(matches!(adapted.provenance.last().unwrap().verdict, Verdict::Modified { .. }));
    }

    #[test]
    fn adapter_derives_a_new_signal_rather_than_mutating_in_place() {
        let original = sample(MorphicMode::Default, dec!(0.8));
        let original_id = original.id;
        let adapted = adapt(original, &PolicyTable::new()).unwrap();
        assert_ne!(adapted.id, original_id);
        assert_eq!(adapted.parent_id, Some(original_id));
    }

    #[test]
    fn applying_twice_equals_applying_once() {
        let policy = PolicyTable::new();
        let once = adapt(sample(MorphicMode::AlphaPush, dec!(0.9)), &policy).unwrap();
        let twice = adapt(once.clone(), &policy).unwrap();
        assert_eq!(twice.confidence, once.confidence);
        assert_eq!(twice.leverage, once.leverage);
        assert_eq!(twice.ttl_ms, once.ttl_ms);
        assert_eq!(twice.id, once.id, "a no-op re-run must not derive a new signal");
    }

    #[test]
    fn confidence_under_alpha_push_floor_is_dropped() {
        let result = adapt(sample(MorphicMode::AlphaPush, dec!(0.65)), &PolicyTable::new());
        let dropped = result.expect_err("0.65 scaled by 0.9 is 0.585, below the 0.7 floor");
        assert!(matches!(dropped.provenance.last().unwrap().verdict, Verdict::Dropped { .. }));
    }
}
