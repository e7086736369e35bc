//! The last-mile [`PrefixGuard`] enforcement point: a [`Bus`] decorator that
//! rejects any `set`/`del`/`incr`/`publish` outside the wrapped module's
//! declared prefixes before the call ever reaches the real backend
//! (`spec.md` §4.2 "Used by... the Bus write path as a last-mile guard").
//! Reads (`get`/`scan`/`ttl`/`mget`/`subscribe`/`ping`) pass straight
//! through — the invariant is about where a module *writes*, not what it
//! may observe.

use async_trait::async_trait;
use std::sync::Arc;
use titan_bus::{Bus, BusError, Payload, Subscription, TtlMillis};

use crate::PrefixGuard;

/// Wraps `inner` so every write `module` performs is checked against
/// `guard` first. Construct one per registered module from its
/// [Module Record](https://titan/registry)'s `declared_keys` +
/// `declared_channels` and hand that module the guarded handle instead of
/// the raw bus.
#[derive(Debug)]
pub struct GuardedBus {
    inner: Arc<dyn Bus>,
    guard: PrefixGuard,
    module: String,
}

impl GuardedBus {
    pub fn new(inner: Arc<dyn Bus>, module: impl Into<String>, guard: PrefixGuard) -> Self {
        Self { inner, guard, module: module.into() }
    }

    fn check(&self, target: &str) -> Result<(), BusError> {
        self.guard
            .validate(&self.module, target)
            .map_err(|_| BusError::PrefixViolation(format!("{} may not write {}", self.module, target)))
    }
}

#[async_trait]
impl Bus for GuardedBus {
    async fn set(&self, key: &str, value: Payload, ttl_ms: TtlMillis) -> Result<(), BusError> {
        self.check(key)?;
        self.inner.set(key, value, ttl_ms).await
    }

    async fn get(&self, key: &str) -> Result<Option<Payload>, BusError> {
        self.inner.get(key).await
    }

    async fn del(&self, key: &str) -> Result<(), BusError> {
        self.check(key)?;
        self.inner.del(key).await
    }

    async fn incr(&self, key: &str) -> Result<i64, BusError> {
        self.check(key)?;
        self.inner.incr(key).await
    }

    async fn scan(&self, prefix: &str) -> Result<Vec<String>, BusError> {
        self.inner.scan(prefix).await
    }

    async fn ttl(&self, key: &str) -> Result<Option<TtlMillis>, BusError> {
        self.inner.ttl(key).await
    }

    async fn publish(&self, channel: &str, payload: Payload) -> Result<(), BusError> {
        self.check(channel)?;
        self.inner.publish(channel, payload).await
    }

    async fn subscribe(&self, channel: &str) -> Result<Subscription, BusError> {
        self.inner.subscribe(channel).await
    }

    async fn ping(&self) -> Result<(), BusError> {
        self.inner.ping().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use titan_bus::InMemoryBus;

    #[tokio::test]
    async fn write_outside_declared_prefixes_is_rejected() {
        let inner: Arc<dyn Bus> = Arc::new(InMemoryBus::new());
        let guarded = GuardedBus::new(inner, "integrity_checker", PrefixGuard::new(["titan:acme:signal:"]));

        let err = guarded
            .set("titan:acme:capital:book", Payload::from_static(b"x"), 60_000)
            .await
            .unwrap_err();
        assert_eq!(err, BusError::PrefixViolation("integrity_checker may not write titan:acme:capital:book".into()));
    }

    #[tokio::test]
    async fn write_inside_declared_prefixes_reaches_the_backend() {
        let inner: Arc<dyn Bus> = Arc::new(InMemoryBus::new());
        let guarded = GuardedBus::new(Arc::clone(&inner), "integrity_checker", PrefixGuard::new(["titan:acme:signal:"]));

        guarded
            .set("titan:acme:signal:integrity:BTCUSDT", Payload::from_static(b"x"), 60_000)
            .await
            .unwrap();
        assert!(inner.get("titan:acme:signal:integrity:BTCUSDT").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn reads_bypass_the_guard() {
        let inner: Arc<dyn Bus> = Arc::new(InMemoryBus::new());
        inner.set("titan:acme:capital:book", Payload::from_static(b"x"), 60_000).await.unwrap();
        let guarded = GuardedBus::new(inner, "integrity_checker", PrefixGuard::new(["titan:acme:signal:"]));

        assert!(guarded.get("titan:acme:capital:book").await.unwrap().is_some());
    }
}
