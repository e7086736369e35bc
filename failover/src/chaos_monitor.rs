//! Chaos Monitor: samples a chaos score from simulated volatile-market
//! states and publishes a load-shedding directive when it crosses a
//! threshold, so workers throttle themselves instead of each
//! self-injecting chaos (`spec.md` §4.11, §9's re-architecture note on
//! centralizing ad-hoc chaos hooks).

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use titan_bus::{Bus, Payload};
use titan_namespace::Channel;

use crate::error::FailoverError;

/// Chaos score above which a load-shedding directive is published.
pub const CHAOS_SCORE_THRESHOLD: Decimal = dec!(0.7);

/// Trade-size reduction applied per tenant while a directive is active.
pub const LOAD_SHED_REDUCTION: Decimal = dec!(0.5);

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LoadSheddingDirective {
    pub chaos_score: Decimal,
    pub trade_size_multiplier: Decimal,
}

/// Pure decision: does this chaos score warrant a directive.
pub fn directive_for(chaos_score: Decimal) -> Option<LoadSheddingDirective> {
    if chaos_score > CHAOS_SCORE_THRESHOLD {
        Some(LoadSheddingDirective { chaos_score, trade_size_multiplier: Decimal::ONE - LOAD_SHED_REDUCTION })
    } else {
        None
    }
}

#[derive(Debug)]
pub struct ChaosMonitor {
    bus: Arc<dyn Bus>,
}

impl ChaosMonitor {
    pub fn new(bus: Arc<dyn Bus>) -> Self {
        Self { bus }
    }

    /// Evaluates a sampled chaos score and, if it crosses the threshold,
    /// publishes the load-shedding directive workers consume rather than
    /// self-injecting failures.
    pub async fn evaluate(&self, chaos_score: Decimal) -> Result<Option<LoadSheddingDirective>, FailoverError> {
        let directive = directive_for(chaos_score);
        if let Some(directive) = directive {
            let payload = Payload::from(serde_json::to_vec(&directive).expect("LoadSheddingDirective is Serialize"));
            self.bus.publish(Channel::alert(), payload).await?;
        }
        Ok(directive)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use titan_bus::InMemoryBus;

    #[test]
    fn score_under_threshold_produces_no_directive() {
        assert!(directive_for(dec!(0.5)).is_none());
    }

    #[test]
    fn score_over_threshold_halves_trade_size() {
        let directive = directive_for(dec!(0.9)).unwrap();
        assert_eq!(directive.trade_size_multiplier, dec!(0.5));
    }

    #[tokio::test]
    async fn evaluate_publishes_directive_when_triggered() {
        use futures::StreamExt;

        let bus: Arc<dyn Bus> = Arc::new(InMemoryBus::new());
        let mut alerts = bus.subscribe(Channel::alert()).await.unwrap();
        let monitor = ChaosMonitor::new(bus);

        let directive = monitor.evaluate(dec!(0.95)).await.unwrap();
        assert!(directive.is_some());
        let payload = alerts.next().await.expect("directive published");
        let decoded: LoadSheddingDirective = serde_json::from_slice(&payload).unwrap();
        assert_eq!(decoded.trade_size_multiplier, dec!(0.5));
    }
}
