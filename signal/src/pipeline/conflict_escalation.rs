//! Stage 7 — Conflict escalation manager: resolves a collision by trust
//! score; if still tied, blocks both and publishes to
//! `commander_override` (`spec.md` §4.7).

use crate::model::{ProvenanceEntry, Signal, Verdict};
use chrono::Utc;
use rust_decimal::Decimal;

pub const STAGE_NAME: &str = "conflict_escalation_manager";

/// Resolution of one escalated `(buy, sell)` pair.
#[derive(Debug, Clone, PartialEq)]
pub enum EscalationOutcome {
    Resolved(Signal),
    BothBlocked(Signal, Signal),
}

/// `trust_a`/`trust_b` are the stage-4 trust scores recomputed (or
/// cached) for each side; escalation resolves by trust rather than
/// confidence since trust already folds in historical performance.
pub fn resolve(a: Signal, trust_a: Decimal, b: Signal, trust_b: Decimal) -> EscalationOutcome {
    use std::cmp::Ordering;
    match trust_a.cmp(&trust_b) {
        Ordering::Greater => EscalationOutcome::Resolved(
            a.with_provenance(ProvenanceEntry::new(STAGE_NAME, Verdict::Passed, Utc::now())),
        ),
        Ordering::Less => EscalationOutcome::Resolved(
            b.with_provenance(ProvenanceEntry::new(STAGE_NAME, Verdict::Passed, Utc::now())),
        ),
        Ordering::Equal => {
            let reason = format!("tied trust score {trust_a}, publishing to commander_override");
            EscalationOutcome::BothBlocked(
                a.with_provenance(ProvenanceEntry::new(
                    STAGE_NAME,
                    Verdict::Blocked { reason: reason.clone() },
                    Utc::now(),
                )),
                b.with_provenance(ProvenanceEntry::new(STAGE_NAME, Verdict::Blocked { reason }, Utc::now())),
            )
        }
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

    fn signal(side: Side) -> Signal {
        Signal::new(
            SignalId::new_random(),
            1,
            SmolStr::new("BTC-USD"),
            side,
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
    fn higher_trust_side_resolves() {
        let outcome = resolve(signal(Side::Buy), dec!(0.8), signal(Side::Sell), dec!(0.5));
        assert!(matches!(outcome, EscalationOutcome::Resolved(s) if s.side == Side::Buy));
    }

    #[test]
    fn tied_trust_blocks_both() {
        let outcome = resolve(signal(Side::Buy), dec!(0.7), signal(Side::Sell), dec!(0.7));
        assert!(matches!(outcome, EscalationOutcome::BothBlocked(_, _)));
    }
}
