//! Slippage Detector: flags fills whose executed price drifted too far
//! from the signal's expected price (`spec.md` §4.9).

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Fraction of expected price beyond which a fill is flagged.
pub const SLIPPAGE_THRESHOLD: Decimal = dec!(0.003);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlippageReport {
    pub expected_price: Decimal,
    pub executed_price: Decimal,
    pub ratio: Decimal,
    pub flagged: bool,
}

fn slippage_ratio(expected_price: Decimal, executed_price: Decimal) -> Decimal {
    if expected_price.is_zero() {
        return Decimal::ZERO;
    }
    ((executed_price - expected_price) / expected_price).abs()
}

/// Compares a trade's executed price against the signal's expected
/// price and flags it when the drift exceeds `SLIPPAGE_THRESHOLD`.
pub fn check(expected_price: Decimal, executed_price: Decimal) -> SlippageReport {
    let ratio = slippage_ratio(expected_price, executed_price);
    SlippageReport { expected_price, executed_price, ratio, flagged: ratio > SLIPPAGE_THRESHOLD }
}
