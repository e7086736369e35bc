//! Drift Guard: compares the in-process config digest against the
//! published digest once an hour and reacts per policy, per `spec.md`
//! §4.5.

use crate::digest;
use crate::error::ConfigError;
use serde::Serialize;
use std::sync::Arc;
use titan_bus::{Bus, Payload};
use titan_namespace::Key;

/// `durable` keys (per `spec.md` §6 keyspace table) carry no natural
/// expiry; the Bus still mandates a TTL on every key, so durable entries
/// use a ten-year TTL instead of a sentinel "no expiry" value.
pub const DURABLE_TTL_MS: i64 = 10 * 365 * 24 * 60 * 60 * 1000;

/// What the guard does when it detects drift (`spec.md` §4.5: "either
/// refuses the next `tick` or continues read-only").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriftPolicy {
    RefuseNextTick,
    ReadOnly,
}

/// The guard's verdict for one comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriftVerdict {
    InSync,
    Drifted { policy: DriftPolicy, stored: String, in_process: String },
}

/// Publishes the in-process config digest and compares it against the
/// stored value under [`Key::config_hash`].
#[derive(Debug)]
pub struct DriftGuard {
    bus: Arc<dyn Bus>,
    policy: DriftPolicy,
}

impl DriftGuard {
    pub fn new(bus: Arc<dyn Bus>, policy: DriftPolicy) -> Self {
        Self { bus, policy }
    }

    /// Publishes `document`'s digest as the canonical one, overwriting
    /// whatever was previously stored. Called once at startup by the
    /// process that owns the canonical configuration.
    pub async fn publish_canonical(&self, document: &impl Serialize) -> Result<String, ConfigError> {
        let computed = digest::compute(document)?;
        self.bus
            .set(Key::config_hash(), Payload::from(computed.clone().into_bytes()), DURABLE_TTL_MS)
            .await?;
        Ok(computed)
    }

    /// Compares `document`'s digest against the stored canonical digest.
    /// Returns `InSync` if no canonical digest has been published yet
    /// (nothing to drift from).
    pub async fn check(&self, document: &impl Serialize) -> Result<DriftVerdict, ConfigError> {
        let in_process = digest::compute(document)?;
        let stored = self.bus.get(Key::config_hash()).await?;

        let stored = match stored {
            Some(payload) => String::from_utf8_lossy(&payload).into_owned(),
            None => return Ok(DriftVerdict::InSync),
        };

        if stored == in_process {
            Ok(DriftVerdict::InSync)
        } else {
            Ok(DriftVerdict::Drifted { policy: self.policy, stored, in_process })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use titan_bus::InMemoryBus;

    #[tokio::test]
    async fn first_check_with_no_canonical_published_is_in_sync() {
        let bus: Arc<dyn Bus> = Arc::new(InMemoryBus::new());
        let guard = DriftGuard::new(bus, DriftPolicy::ReadOnly);
        let verdict = guard.check(&json!({"a": 1})).await.unwrap();
        assert_eq!(verdict, DriftVerdict::InSync);
    }

    #[tokio::test]
    async fn matching_document_is_in_sync() {
        let bus: Arc<dyn Bus> = Arc::new(InMemoryBus::new());
        let guard = DriftGuard::new(bus, DriftPolicy::RefuseNextTick);
        let document = json!({"symbol": "BTC-USD"});
        guard.publish_canonical(&document).await.unwrap();
        let verdict = guard.check(&document).await.unwrap();
        assert_eq!(verdict, DriftVerdict::InSync);
    }

    #[tokio::test]
    async fn changed_document_reports_drift_with_configured_policy() {
        let bus: Arc<dyn Bus> = Arc::new(InMemoryBus::new());
        let guard = DriftGuard::new(bus, DriftPolicy::RefuseNextTick);
        guard.publish_canonical(&json!({"symbol": "BTC-USD"})).await.unwrap();
        let verdict = guard.check(&json!({"symbol": "ETH-USD"})).await.unwrap();
        match verdict {
            DriftVerdict::Drifted { policy, .. } => assert_eq!(policy, DriftPolicy::RefuseNextTick),
            DriftVerdict::InSync => panic!("expected drift"),
        }
    }
}
