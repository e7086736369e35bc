//! Drawdown Redirector: counts consecutive losses per strategy from the
//! journaled trade log and moves capital to the neutral/hedge set after
//! `LOSS_COUNT_THRESHOLD` in a row (`spec.md` §4.8).

use crate::book::{CapitalAllocator, CapitalBook};
use crate::error::CapitalError;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use titan_namespace::TenantId;

pub const LOSS_COUNT_THRESHOLD: u32 = 3;
pub const CAPITAL_REMOVAL_PERCENT: Decimal = dec!(0.70);

/// One journaled trade outcome, ordered oldest-first (`spec.md` §3
/// "Trades are journaled"; the journal itself lives under
/// `titan:{tenant}:trade:{strategy}:outcome:{i}`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeOutcome {
    Win,
    Loss,
}

/// Counts the trailing run of consecutive losses at the end of
/// `outcomes` (oldest-first).
pub fn consecutive_losses(outcomes: &[TradeOutcome]) -> u32 {
    outcomes.iter().rev().take_while(|outcome| matches!(outcome, TradeOutcome::Loss)).count() as u32
}

/// Redirects `CAPITAL_REMOVAL_PERCENT` of `strategy`'s allocation to
/// `destinations` if its trailing loss run has reached
/// `LOSS_COUNT_THRESHOLD`. Returns `None` if the threshold was not met
/// or the strategy has no allocation yet.
pub async fn redirect_if_breached(
    allocator: &CapitalAllocator,
    tenant: &TenantId,
    strategy: &str,
    outcomes: &[TradeOutcome],
    destinations: &[&str],
) -> Result<Option<CapitalBook>, CapitalError> {
    if consecutive_losses(outcomes) < LOSS_COUNT_THRESHOLD {
        return Ok(None);
    }
    allocator.redirect(tenant, strategy, CAPITAL_REMOVAL_PERCENT, destinations).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::book::{CapitalAllocator, StrategyScore};
    use std::sync::Arc;
    use titan_bus::{Bus, InMemoryBus};

    #[test]
    fn three_trailing_losses_meet_the_threshold() {
        let outcomes = vec![TradeOutcome::Win, TradeOutcome::Loss, TradeOutcome::Loss, TradeOutcome::Loss];
        assert_eq!(consecutive_losses(&outcomes), 3);
    }

    #[test]
    fn a_win_breaks_the_streak() {
        let outcomes = vec![TradeOutcome::Loss, TradeOutcome::Loss, TradeOutcome::Win];
        assert_eq!(consecutive_losses(&outcomes), 0);
    }

    #[tokio::test]
    async fn breach_moves_capital_to_destinations() {
        let bus: Arc<dyn Bus> = Arc::new(InMemoryBus::new());
        let allocator = CapitalAllocator::new(bus);
        let tenant = TenantId::new("acme");
        allocator
            .reallocate(&tenant, &[StrategyScore::new("MomentumStrategy", dec!(1), dec!(1))])
            .await
            .unwrap();

        let outcomes = vec![TradeOutcome::Loss; 3];
        let book = redirect_if_breached(
            &allocator,
            &tenant,
            "MomentumStrategy",
            &outcomes,
            &["NeutralStrategy", "HedgeStrategy"],
        )
        .await
        .unwrap()
        .expect("threshold met");

        assert_eq!(book.version, 2);
        assert!(book.allocations["NeutralStrategy"] > Decimal::ZERO);
    }

    #[tokio::test]
    async fn below_threshold_does_not_redirect() {
        let bus: Arc<dyn Bus> = Arc::new(InMemoryBus::new());
        let allocator = CapitalAllocator::new(bus);
        let tenant = TenantId::new("acme");
        allocator
            .reallocate(&tenant, &[StrategyScore::new("MomentumStrategy", dec!(1), dec!(1))])
            .await
            .unwrap();

        let outcomes = vec![TradeOutcome::Loss; 2];
        let result =
            redirect_if_breached(&allocator, &tenant, "MomentumStrategy", &outcomes, &["NeutralStrategy"])
                .await
                .unwrap();
        assert!(result.is_none());
    }
}
