//! Contextual Leverage Limiter + Volatility Scaler: transforms a signal's
//! quantity and leverage by the current volatility reading, applied
//! pre-Router (`spec.md` §4.8): `quantity *= (1 - volatility * k)`,
//! `leverage = min(leverage, MAX_LEVERAGE * (1 - volatility * k))`.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use titan_signal::{ProvenanceEntry, Signal, Verdict};

pub const STAGE_NAME: &str = "leverage_volatility_scaler";

/// Volatility dampening coefficient. Not pinned by `spec.md`; fixed here
/// per `SPEC_FULL.md` §9 and recorded in `DESIGN.md`.
pub const VOLATILITY_K: Decimal = dec!(1.0);

/// Hard leverage ceiling before any per-mode cap further restricts it
/// (the Morphic Adapter's `leverage_cap` applies afterward, per `spec.md`
/// §4.6 "adapter runs last"). Not pinned by `spec.md`; fixed here per
/// `SPEC_FULL.md` §9.
pub const MAX_LEVERAGE: Decimal = dec!(10);

/// `1 - volatility * k`, floored at zero so extreme volatility readings
/// never invert the scaling direction.
fn dampening_factor(volatility: Decimal, k: Decimal) -> Decimal {
    (Decimal::ONE - volatility * k).max(Decimal::ZERO)
}

/// Scales `signal`'s quantity and leverage down as `volatility` rises,
/// returning a new signal referencing `signal` as its parent (`spec.md`
/// §3, `Signal::derive`).
pub fn scale(signal: Signal, volatility: Decimal) -> Signal {
    let factor = dampening_factor(volatility, VOLATILITY_K);
    let scaled_leverage = signal.leverage.map(|leverage| leverage.min(MAX_LEVERAGE * factor));

    signal
        .derive(|s| {
            s.quantity *= factor;
            s.leverage = scaled_leverage;
        })
        .with_provenance(ProvenanceEntry::new(
            STAGE_NAME,
            Verdict::Modified { reason: format!("scaled by volatility {volatility}") },
            chrono::Utc::now(),
        ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use titan_signal::{Side, SignalFlags, SignalId};
    use smol_str::SmolStr;
    use titan_config::MorphicMode;
    use titan_namespace::TenantId;

    fn sample() -> Signal {
        Signal::new(
            SignalId::new_random(),
            1,
            SmolStr::new("BTC-USD"),
            Side::Buy,
            dec!(10),
            None,
            Some(dec!(8)),
            dec!(0.8),
            SmolStr::new("s"),
            60_000,
            TenantId::new("acme"),
            SmolStr::new("c"),
            MorphicMode::Default,
            SignalFlags::default(),
            Vec::new(),
            None,
        )
    }

    #[test]
    fn zero_volatility_leaves_quantity_unscaled() {
        let scaled = scale(sample(), dec!(0));
        assert_eq!(scaled.quantity, dec!(10));
    }

    #[test]
    fn higher_volatility_reduces_quantity_and_leverage_cap() {
        let scaled = scale(sample(), dec!(0.3));
        assert_eq!(scaled.quantity, dec!(7.0));
        assert_eq!(scaled.leverage, Some(dec!(7.0)));
    }

    #[test]
    fn full_volatility_does_not_invert_scaling() {
        let scaled = scale(sample(), dec!(1.5));
        assert_eq!(scaled.quantity, dec!(0));
    }

    #[test]
    fn derives_a_new_signal_rather_than_mutating_in_place() {
        let original = sample();
        let original_id = original.id;
        let scaled = scale(original, dec!(0.1));
        assert_ne!(scaled.id, original_id);
        assert_eq!(scaled.parent_id, Some(original_id));
    }
}
