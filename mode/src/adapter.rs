//! Morphic Adapter: the pipeline stage that reads the current mode and
//! scales a signal's confidence, leverage, and TTL accordingly, running
//! last before routing so policy caps stay authoritative (`spec.md`
//! §4.6, §4.7 stage 8).
//!
//! TTL scaling is grounded in
//! `original_source/mode_influenced_ttl_controller.py`.

use crate::policy::{PolicyCaps, PolicyTable};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use titan_config::MorphicMode;

/// Confidence and TTL multipliers, and the hard leverage ceiling, for a
/// mode. `leverage_cap` mirrors [`PolicyCaps::max_leverage`] — the
/// adapter is what actually applies the cap the Governor only
/// authorizes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModeEffect {
    pub confidence_multiplier: Decimal,
    pub leverage_cap: Decimal,
    pub ttl_multiplier: Decimal,
}

fn ttl_multiplier_for(mode: MorphicMode) -> Decimal {
    match mode {
        MorphicMode::Default => dec!(1.0),
        MorphicMode::AlphaPush => dec!(0.5),
        MorphicMode::Conservative => dec!(2.0),
        MorphicMode::AggressiveSniper => dec!(0.3),
        MorphicMode::CapitalPreservation => dec!(2.5),
        MorphicMode::HighVolatilityDefense => dec!(0.7),
        MorphicMode::ConservativeBuffer => dec!(1.5),
    }
}

fn confidence_multiplier_for(mode: MorphicMode) -> Decimal {
    match mode {
        MorphicMode::Default => dec!(1.0),
        MorphicMode::AlphaPush => dec!(0.9),
        MorphicMode::Conservative => dec!(1.1),
        MorphicMode::AggressiveSniper => dec!(0.85),
        MorphicMode::CapitalPreservation => dec!(1.2),
        MorphicMode::HighVolatilityDefense => dec!(1.15),
        MorphicMode::ConservativeBuffer => dec!(1.05),
    }
}

/// Computes the [`ModeEffect`] for `mode` given its policy caps.
pub fn effect_for(mode: MorphicMode, caps: PolicyCaps) -> ModeEffect {
    ModeEffect {
        confidence_multiplier: confidence_multiplier_for(mode),
        leverage_cap: caps.max_leverage,
        ttl_multiplier: ttl_multiplier_for(mode),
    }
}

/// The scaled fields the adapter produces. `ttl_ms` uses integer
/// millisecond rounding (truncating), matching the Bus's `TtlMillis`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaledFields {
    pub confidence: Decimal,
    pub leverage: Decimal,
    pub ttl_ms: i64,
}

/// Applies a [`ModeEffect`] to raw signal fields: confidence is
/// multiplied and clamped to `[0, 1]`, leverage is multiplied then
/// capped at the mode's ceiling, and TTL is scaled. The multipliers are
/// not idempotent on their own — calling this twice against its own
/// output compounds rather than repeats the scaling. Callers that might
/// see an already-scaled signal (the pipeline's morphic adapter stage)
/// are responsible for only calling this once per signal; see
/// `titan_signal::pipeline::morphic_adapter::adapt`'s provenance check.
pub fn apply(effect: ModeEffect, confidence: Decimal, leverage: Decimal, ttl_ms: i64) -> ScaledFields {
    let scaled_confidence = (confidence * effect.confidence_multiplier).clamp(dec!(0), dec!(1));
    let scaled_leverage = leverage.min(effect.leverage_cap);
    let scaled_ttl = (Decimal::from(ttl_ms) * effect.ttl_multiplier).round_dp(0);
    ScaledFields {
        confidence: scaled_confidence,
        leverage: scaled_leverage,
        ttl_ms: scaled_ttl.to_string().parse().unwrap_or(ttl_ms),
    }
}

/// Convenience: looks up a mode's effect straight from a [`PolicyTable`].
pub fn effect_from_table(table: &PolicyTable, mode: MorphicMode) -> ModeEffect {
    effect_for(mode, table.caps_for(mode))
}
