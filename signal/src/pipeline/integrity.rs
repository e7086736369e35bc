//! Stage 1 — Integrity checker: drops signals missing required fields or
//! with out-of-range numerics (`spec.md` §4.7).

use crate::model::{ProvenanceEntry, Signal, Verdict};
use chrono::Utc;

pub const STAGE_NAME: &str = "integrity_checker";

/// Runs the integrity check, appending a provenance entry either way.
/// Returns `Err` with the signal (annotated) when it fails
/// `Signal::validate`.
pub fn check(signal: Signal) -> Result<Signal, Signal> {
    match signal.validate() {
        Ok(()) => Ok(signal.with_provenance(ProvenanceEntry::new(STAGE_NAME, Verdict::Passed, Utc::now()))),
        Err(e) => Err(signal.with_provenance(ProvenanceEntry::new(
            STAGE_NAME,
            Verdict::Dropped { reason: e.to_string() },
            Utc::now(),
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Side, SignalFlags, SignalId};
    use rust_decimal_macros::dec;
    use smol_str::SmolStr;
    use titan_config::MorphicMode;
    use titan_namespace::TenantId;

    fn sample() -> Signal {
        Signal::new(
            SignalId::new_random(),
            1,
            SmolStr::new("BTC-USD"),
            Side::Buy,
            dec!(1),
            None,
            None,
            dec!(0.8),
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
    fn valid_signal_passes_and_gains_provenance() {
        let result = check(sample()).unwrap();
        assert_eq!(result.provenance.len(), 1);
        assert_eq!(result.provenance[0].verdict, Verdict::Passed);
    }

    #[test]
    fn invalid_signal_is_dropped_with_reason() {
        let mut signal = sample();
        signal.quantity = dec!(0);
        let dropped = check(signal).unwrap_err();
        assert!(matches!(dropped.provenance[0].verdict, Verdict::Dropped { .. }));
    }
}
