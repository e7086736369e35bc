//! Per-mode policy caps enforced by the Morphic Governor, per `spec.md`
//! §4.6: "`alpha_push`: max_leverage=5, min_confidence=0.7; `default`: 3
//! and 0.5". The remaining modes' caps are not pinned by `spec.md` and
//! are fixed here per `SPEC_FULL.md` §9 (recorded in `DESIGN.md`).

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashMap;
use titan_config::MorphicMode;

/// Hard ceilings a mode change or a signal's leverage/confidence must
/// respect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PolicyCaps {
    pub max_leverage: Decimal,
    pub min_confidence: Decimal,
}

impl PolicyCaps {
    pub const fn new(max_leverage: Decimal, min_confidence: Decimal) -> Self {
        Self { max_leverage, min_confidence }
    }
}

fn builtin_caps(mode: MorphicMode) -> PolicyCaps {
    match mode {
        MorphicMode::Default => PolicyCaps::new(dec!(3), dec!(0.5)),
        MorphicMode::AlphaPush => PolicyCaps::new(dec!(5), dec!(0.7)),
        MorphicMode::Conservative => PolicyCaps::new(dec!(2), dec!(0.6)),
        MorphicMode::AggressiveSniper => PolicyCaps::new(dec!(6), dec!(0.75)),
        MorphicMode::CapitalPreservation => PolicyCaps::new(dec!(1), dec!(0.65)),
        MorphicMode::HighVolatilityDefense => PolicyCaps::new(dec!(1.5), dec!(0.7)),
        MorphicMode::ConservativeBuffer => PolicyCaps::new(dec!(2.5), dec!(0.6)),
    }
}

/// Lookup table from mode to its policy caps, overridable per tenant
/// (e.g. a client contract raising/lowering a mode's default ceiling).
#[derive(Debug, Clone)]
pub struct PolicyTable {
    overrides: HashMap<MorphicMode, PolicyCaps>,
}

impl Default for PolicyTable {
    fn default() -> Self {
        Self { overrides: HashMap::new() }
    }
}

impl PolicyTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_override(mut self, mode: MorphicMode, caps: PolicyCaps) -> Self {
        self.overrides.insert(mode, caps);
        self
    }

    pub fn caps_for(&self, mode: MorphicMode) -> PolicyCaps {
        self.overrides.get(&mode).copied().unwrap_or_else(|| builtin_caps(mode))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_caps_match_spec_pinned_values() {
        let table = PolicyTable::new();
        assert_eq!(table.caps_for(MorphicMode::Default), PolicyCaps::new(dec!(3), dec!(0.5)));
        assert_eq!(table.caps_for(MorphicMode::AlphaPush), PolicyCaps::new(dec!(5), dec!(0.7)));
    }

    #[test]
    fn tenant_override_takes_precedence_over_builtin() {
        let table = PolicyTable::new().with_override(MorphicMode::Default, PolicyCaps::new(dec!(4), dec!(0.4)));
        assert_eq!(table.caps_for(MorphicMode::Default), PolicyCaps::new(dec!(4), dec!(0.4)));
    }
}
