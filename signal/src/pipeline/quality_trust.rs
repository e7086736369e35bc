//! Stage 4 — Quality/Trust analyzer: `trust = w_history * historical_success
//! + w_model * ai_score`; drops below `TRUSTWORTHINESS_THRESHOLD`
//! (`spec.md` §4.7, `SPEC_FULL.md` §9).

use crate::model::{ProvenanceEntry, Signal, Verdict};
use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

pub const STAGE_NAME: &str = "quality_trust_analyzer";

pub const W_HISTORY: Decimal = dec!(0.6);
pub const W_MODEL: Decimal = dec!(0.4);
pub const TRUSTWORTHINESS_THRESHOLD: Decimal = dec!(0.55);

/// Per-strategy indicators the analyzer reads from
/// `titan:{tenant}:indicator:{name}:{symbol}` (`spec.md` §6).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrustInputs {
    pub historical_success: Decimal,
    pub ai_score: Decimal,
}

pub fn compute_trust(inputs: TrustInputs) -> Decimal {
    W_HISTORY * inputs.historical_success + W_MODEL * inputs.ai_score
}

pub fn check(signal: Signal, inputs: TrustInputs) -> Result<Signal, Signal> {
    let trust = compute_trust(inputs);
    if trust < TRUSTWORTHINESS_THRESHOLD {
        Err(signal.with_provenance(ProvenanceEntry::new(
            STAGE_NAME,
            Verdict::Dropped { reason: format!("trust {trust} below threshold {TRUSTWORTHINESS_THRESHOLD}") },
            Utc::now(),
        )))
    } else {
        Ok(signal.with_provenance(ProvenanceEntry::new(STAGE_NAME, Verdict::Passed, Utc::now())))
    }
}
