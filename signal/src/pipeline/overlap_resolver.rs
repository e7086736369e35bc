//! Stage 6 — Overlap resolver: computes net intended position per
//! `(tenant, symbol)` across in-flight signals; zeroes and blocks a
//! signal that would push the net beyond `MAX_POSITION_SIZE`
//! (`spec.md` §4.7).
//!
//! `MAX_POSITION_SIZE` has no global default (`SPEC_FULL.md` §9): its
//! absence from tenant configuration is a `ConfigDrift`-class startup
//! error, not a silent fallback, so callers must supply it explicitly.

use crate::model::{ProvenanceEntry, Side, Signal, Verdict};
use chrono::Utc;
use rust_decimal::Decimal;

pub const STAGE_NAME: &str = "overlap_resolver";

fn signed_quantity(signal: &Signal) -> Decimal {
    match signal.side {
        Side::Buy => signal.quantity,
        Side::Sell => -signal.quantity,
    }
}

/// Given the net position already committed for `(tenant, symbol)` and
/// `max_position_size`, either passes `signal` through (updating the
/// running net) or zeroes its quantity and marks it blocked.
///
/// Returns `(resulting_signal, new_net_position)`.
pub fn resolve(signal: Signal, net_position: Decimal, max_position_size: Decimal) -> (Signal, Decimal) {
    let candidate_net = net_position + signed_quantity(&signal);

    if candidate_net.abs() > max_position_size {
        let blocked = signal.derive(|s| s.quantity = Decimal::ZERO).with_provenance(ProvenanceEntry::new(
            STAGE_NAME,
            Verdict::Blocked { reason: format!("net position {candidate_net} exceeds cap {max_position_size}") },
            Utc::now(),
        ));
        (blocked, net_position)
    } else {
        let passed = signal.with_provenance(ProvenanceEntry::new(STAGE_NAME, Verdict::Passed, Utc::now()));
        (passed, candidate_net)
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

    fn signal(side: Side, quantity: Decimal) -> Signal {
        Signal::new(
            SignalId::new_random(),
            1,
            SmolStr::new("BTC-USD"),
            side,
            quantity,
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
    fn within_cap_passes_and_updates_net() {
        let (result, net) = resolve(signal(Side::Buy, dec!(1)), dec!(0), dec!(5));
        assert_eq!(result.quantity, dec!(1));
        assert_eq!(net, dec!(1));
    }

    #[test]
    fn exceeding_cap_zeroes_quantity_and_blocks() {
        let (result, net) = resolve(signal(Side::Buy, dec!(10)), dec!(0), dec!(5));
        assert_eq!(result.quantity, dec!(0));
        assert!(matches!(result.provenance.last().unwrap().verdict, Verdict::Blocked { .. }));
        assert_eq!(net, dec!(0), "blocked signal must not move the running net");
    }

    #[test]
    fn sell_reduces_net_position() {
        let (_, net) = resolve(signal(Side::Sell, dec!(3)), dec!(2), dec!(5));
        assert_eq!(net, dec!(-1));
    }
}
