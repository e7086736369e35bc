//! Region Failover Manager: polls primary-bus health and a selected
//! external-API health endpoint; when either is down and the secondary
//! is healthy, flips `titan:infra:failover_active` so the Bus adapter
//! redirects (`spec.md` §4.11).

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use titan_bus::{Bus, Payload};
use titan_namespace::Key;

use crate::error::FailoverError;

const FAILOVER_ACTIVE_TTL_MS: i64 = 10 * 365 * 24 * 60 * 60 * 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthSnapshot {
    pub primary_bus_healthy: bool,
    pub external_api_healthy: bool,
    pub secondary_bus_healthy: bool,
}

/// Pure decision: should the region fail over to the secondary given
/// this health snapshot.
pub fn should_fail_over(snapshot: HealthSnapshot) -> bool {
    let primary_or_api_down = !snapshot.primary_bus_healthy || !snapshot.external_api_healthy;
    primary_or_api_down && snapshot.secondary_bus_healthy
}

#[derive(Debug)]
pub struct RegionFailoverManager {
    bus: Arc<dyn Bus>,
}

impl RegionFailoverManager {
    pub fn new(bus: Arc<dyn Bus>) -> Self {
        Self { bus }
    }

    /// Evaluates `snapshot` and persists the resulting failover-active
    /// flag, returning it. Idempotent: writing the same value twice is
    /// harmless, so pollers can call this on every tick without tracking
    /// the previous result themselves.
    pub async fn evaluate(&self, snapshot: HealthSnapshot) -> Result<bool, FailoverError> {
        let active = should_fail_over(snapshot);
        let payload = Payload::from(active.to_string().into_bytes());
        self.bus.set(Key::failover_active(), payload, FAILOVER_ACTIVE_TTL_MS).await?;
        Ok(active)
    }

    pub async fn is_active(&self) -> Result<bool, FailoverError> {
        let raw = self.bus.get(Key::failover_active()).await?;
        Ok(raw.map(|bytes| bytes.as_ref() == b"true").unwrap_or(false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use titan_bus::InMemoryBus;

    #[test]
    fn healthy_primary_never_fails_over() {
        let snapshot = HealthSnapshot { primary_bus_healthy: true, external_api_healthy: true, secondary_bus_healthy: true };
        assert!(!should_fail_over(snapshot));
    }

    #[test]
    fn down_primary_with_healthy_secondary_fails_over() {
        let snapshot = HealthSnapshot { primary_bus_healthy: false, external_api_healthy: true, secondary_bus_healthy: true };
        assert!(should_fail_over(snapshot));
    }

    #[test]
    fn down_primary_without_secondary_does_not_fail_over() {
        let snapshot = HealthSnapshot { primary_bus_healthy: false, external_api_healthy: true, secondary_bus_healthy: false };
        assert!(!should_fail_over(snapshot));
    }

    #[tokio::test]
    async fn evaluate_persists_the_flag() {
        let bus: Arc<dyn Bus> = Arc::new(InMemoryBus::new());
        let manager = RegionFailoverManager::new(bus);
        let snapshot = HealthSnapshot { primary_bus_healthy: false, external_api_healthy: true, secondary_bus_healthy: true };

        let active = manager.evaluate(snapshot).await.unwrap();
        assert!(active);
        assert!(manager.is_active().await.unwrap());
    }
}
