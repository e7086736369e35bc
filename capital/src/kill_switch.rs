//! Macro News Blocker, Market Crash Trigger, and Panic Session Hibernator:
//! the three kill-switches that escalate beyond dropping individual
//! signals to a system-wide response (`spec.md` §4.8, §7 "only drawdown,
//! news, crash, and panic kill-switches escalate to system-wide
//! hibernation").
//!
//! Severity decides the response: the Macro News Blocker shifts the
//! tenant to conservative mode (throttle, not stop); the Market Crash
//! Trigger and Panic Session Hibernator broadcast a full system-wide
//! `hibernate` — the latter confirmed by `spec.md` §8 scenario 6.

use crate::error::CapitalError;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;
use std::sync::Arc;
use titan_bus::{Bus, Payload};
use titan_config::MorphicMode;
use titan_mode::{MorphicGovernor, RequesterScope};
use titan_namespace::{Channel, TenantId};

pub const NEWS_SEVERITY_THRESHOLD: Decimal = dec!(0.8);
pub const CRASH_PRICE_DROP_THRESHOLD: Decimal = dec!(0.15);
pub const PANIC_VOLATILITY_THRESHOLD: Decimal = dec!(0.10);
pub const PANIC_DRAWDOWN_THRESHOLD: Decimal = dec!(-0.5);

#[derive(Debug, Serialize)]
struct HibernateBroadcast<'a> {
    action: &'a str,
    source: &'a str,
}

async fn broadcast_hibernate(bus: &Arc<dyn Bus>, source: &str) -> Result<(), CapitalError> {
    let broadcast = HibernateBroadcast { action: "hibernate", source };
    let payload = Payload::from(serde_json::to_vec(&broadcast).expect("HibernateBroadcast is Serialize"));
    bus.publish(Channel::system_state(), payload).await?;
    Ok(())
}

/// Shifts the tenant to conservative mode when a macro news event's
/// severity score crosses [`NEWS_SEVERITY_THRESHOLD`].
#[derive(Debug)]
pub struct MacroNewsBlocker {
    governor: Arc<MorphicGovernor>,
}

impl MacroNewsBlocker {
    pub fn new(governor: Arc<MorphicGovernor>) -> Self {
        Self { governor }
    }

    pub fn triggers(&self, news_severity: Decimal) -> bool {
        news_severity >= NEWS_SEVERITY_THRESHOLD
    }

    pub async fn evaluate(&self, tenant: &TenantId, news_severity: Decimal) -> Result<bool, CapitalError> {
        if !self.triggers(news_severity) {
            return Ok(false);
        }
        self.governor
            .request_mode_change(tenant, MorphicMode::Conservative, &RequesterScope::unrestricted(), "macro_news_blocker")
            .await?;
        Ok(true)
    }
}

/// Broadcasts a system-wide hibernate when a sampled price drop crosses
/// [`CRASH_PRICE_DROP_THRESHOLD`].
#[derive(Debug)]
pub struct MarketCrashTrigger {
    bus: Arc<dyn Bus>,
}

impl MarketCrashTrigger {
    pub fn new(bus: Arc<dyn Bus>) -> Self {
        Self { bus }
    }

    pub fn triggers(&self, price_drop_ratio: Decimal) -> bool {
        price_drop_ratio >= CRASH_PRICE_DROP_THRESHOLD
    }

    pub async fn evaluate(&self, price_drop_ratio: Decimal) -> Result<bool, CapitalError> {
        if !self.triggers(price_drop_ratio) {
            return Ok(false);
        }
        broadcast_hibernate(&self.bus, "market_crash_trigger").await?;
        Ok(true)
    }
}

/// Broadcasts a system-wide hibernate when volatility and drawdown both
/// cross their panic thresholds (`spec.md` §8 scenario 6: "volatility=0.12
/// and drawdown=-0.6" triggers hibernate).
#[derive(Debug)]
pub struct PanicSessionHibernator {
    bus: Arc<dyn Bus>,
}

impl PanicSessionHibernator {
    pub fn new(bus: Arc<dyn Bus>) -> Self {
        Self { bus }
    }

    pub fn triggers(&self, volatility: Decimal, drawdown: Decimal) -> bool {
        volatility > PANIC_VOLATILITY_THRESHOLD && drawdown <= PANIC_DRAWDOWN_THRESHOLD
    }

    pub async fn evaluate(&self, volatility: Decimal, drawdown: Decimal) -> Result<bool, CapitalError> {
        if !self.triggers(volatility, drawdown) {
            return Ok(false);
        }
        broadcast_hibernate(&self.bus, "panic_session_hibernator").await?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use titan_bus::InMemoryBus;
    use titan_mode::{ModeCache, PolicyTable};

    #[tokio::test]
    async fn macro_news_blocker_shifts_to_conservative_over_threshold() {
        let bus: Arc<dyn Bus> = Arc::new(InMemoryBus::new());
        let governor = Arc::new(MorphicGovernor::new(bus, PolicyTable::new(), ModeCache::new()));
        let blocker = MacroNewsBlocker::new(governor.clone());
        let tenant = TenantId::new("acme");

        assert!(blocker.evaluate(&tenant, dec!(0.9)).await.unwrap());
        assert_eq!(governor.mode_cache().get("acme"), MorphicMode::Conservative);
    }

    #[tokio::test]
    async fn macro_news_blocker_ignores_mild_severity() {
        let bus: Arc<dyn Bus> = Arc::new(InMemoryBus::new());
        let governor = Arc::new(MorphicGovernor::new(bus, PolicyTable::new(), ModeCache::new()));
        let blocker = MacroNewsBlocker::new(governor);
        let tenant = TenantId::new("acme");
        assert!(!blocker.evaluate(&tenant, dec!(0.2)).await.unwrap());
    }

    #[tokio::test]
    async fn market_crash_trigger_broadcasts_hibernate() {
        let bus: Arc<dyn Bus> = Arc::new(InMemoryBus::new());
        let mut sub = bus.subscribe(Channel::system_state()).await.unwrap();
        let trigger = MarketCrashTrigger::new(bus);
        assert!(trigger.evaluate(dec!(0.20)).await.unwrap());
        let payload = sub.next().await.expect("broadcast published");
        let decoded: serde_json::Value = serde_json::from_slice(&payload).unwrap();
        assert_eq!(decoded["action"], "hibernate");
    }

    #[tokio::test]
    async fn panic_session_hibernator_matches_scenario_six() {
        let bus: Arc<dyn Bus> = Arc::new(InMemoryBus::new());
        let hibernator = PanicSessionHibernator::new(bus);
        assert!(hibernator.evaluate(dec!(0.12), dec!(-0.6)).await.unwrap());
    }

    #[tokio::test]
    async fn panic_session_hibernator_requires_both_conditions() {
        let bus: Arc<dyn Bus> = Arc::new(InMemoryBus::new());
        let hibernator = PanicSessionHibernator::new(bus);
        assert!(!hibernator.evaluate(dec!(0.12), dec!(-0.2)).await.unwrap());
        assert!(!hibernator.evaluate(dec!(0.05), dec!(-0.6)).await.unwrap());
    }
}
