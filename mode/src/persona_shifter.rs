//! Persona Shifter: observes equity and PnL crossovers and posts
//! mode-change requests to the Morphic Governor (`spec.md` §4.6).
//!
//! Grounded in `original_source/equity_based_persona_shifter.py`: equity
//! drawdown crossing a threshold pushes the tenant toward a defensive
//! mode, and a sustained profitable run relaxes it back toward
//! `alpha_push`, with `default` as the steady state in between.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use titan_config::MorphicMode;

/// A snapshot of tenant performance the shifter evaluates on each tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerformanceSnapshot {
    /// Current equity as a fraction of session-start equity (`1.0` =
    /// unchanged, `0.7` = down 30%).
    pub equity_ratio: Decimal,
    /// Realized + unrealized PnL as a fraction of allocated capital.
    pub pnl_ratio: Decimal,
}

/// Equity ratio below this crosses into defensive territory.
const EQUITY_DEFENSE_THRESHOLD: Decimal = dec!(0.85);
/// Equity ratio below this crosses into capital preservation.
const EQUITY_PRESERVATION_THRESHOLD: Decimal = dec!(0.6);
/// PnL ratio above this crosses into an opportunistic push.
const PNL_PUSH_THRESHOLD: Decimal = dec!(0.1);

/// Pure decision function: given a performance snapshot and the tenant's
/// current mode, returns the mode the shifter would request, or `None`
/// if the current mode is already the right fit (no request needed).
///
/// Deliberately has no hysteresis/debounce here — that lives in the
/// caller's tick cadence, matching `original_source`'s once-per-cycle
/// evaluation rather than a continuous controller.
pub fn evaluate(current_mode: MorphicMode, snapshot: PerformanceSnapshot) -> Option<MorphicMode> {
    let target = if snapshot.equity_ratio < EQUITY_PRESERVATION_THRESHOLD {
        MorphicMode::CapitalPreservation
    } else if snapshot.equity_ratio < EQUITY_DEFENSE_THRESHOLD {
        MorphicMode::Conservative
    } else if snapshot.pnl_ratio > PNL_PUSH_THRESHOLD {
        MorphicMode::AlphaPush
    } else {
        MorphicMode::Default
    };

    if target == current_mode {
        None
    } else {
        Some(target)
    }
}
