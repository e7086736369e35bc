#![forbid(unsafe_code)]
#![warn(
    unused,
    clippy::cognitive_complexity,
    unused_crate_dependencies,
    unused_extern_crates,
    clippy::unused_self,
    missing_debug_implementations,
    rust_2018_idioms
)]
#![allow(clippy::type_complexity)]

//! # Bus — the uniform key/value + pub/sub + TTL facade
//!
//! Every worker in the coordination core talks to shared state and to its
//! peers through a single [`Bus`] trait. The trait is intentionally small:
//! `set`/`get`/`del`/`incr`/`scan` for the keyspace, `publish`/`subscribe`
//! for channels, and `ping` for liveness. A real deployment backs this with
//! Redis or an equivalent store; [`InMemoryBus`] is the reference backend
//! used by tests and single-process demos.
//!
//! `publish` is fire-and-forget at-most-once. `subscribe` yields a
//! cancellable [`Subscription`] stream; per-channel order is preserved but
//! there is no ordering guarantee across channels.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use fnv::FnvHashMap;
use parking_lot::Mutex;
use std::{
    collections::BTreeMap,
    sync::{
        atomic::{AtomicBool, AtomicI64, Ordering},
        Arc,
    },
    time::Duration,
};
use tokio::sync::broadcast;
use tokio_stream::{wrappers::BroadcastStream, Stream, StreamExt};

pub mod error;
pub use error::BusError;

/// A TTL in milliseconds. Must be strictly positive for [`Bus::set`].
pub type TtlMillis = i64;

/// Raw bytes published on, or stored under, the bus. Messages and values are
/// UTF-8 JSON documents per the wire format, but the bus itself is payload
/// agnostic.
pub type Payload = Bytes;

/// The uniform coordination facade every Module Runtime instance is handed
/// at construction time. Implementors may be backed by a single primary
/// store or by a primary/secondary pair with failover (see
/// [`FailoverBus`]).
#[async_trait]
pub trait Bus: Send + Sync + std::fmt::Debug {
    /// Stores `value` under `key` with the given TTL. `ttl_ms <= 0` is
    /// rejected with [`BusError::InvalidTTL`] — transient data must never be
    /// written without an expiry.
    async fn set(&self, key: &str, value: Payload, ttl_ms: TtlMillis) -> Result<(), BusError>;

    /// Reads the value stored under `key`, if any and unexpired.
    async fn get(&self, key: &str) -> Result<Option<Payload>, BusError>;

    /// Removes `key`, if present.
    async fn del(&self, key: &str) -> Result<(), BusError>;

    /// Atomically increments the integer stored at `key` by 1, creating it
    /// at 0 (then incrementing) if absent, and returns the new value.
    async fn incr(&self, key: &str) -> Result<i64, BusError>;

    /// Lists all non-expired keys with the given prefix.
    async fn scan(&self, prefix: &str) -> Result<Vec<String>, BusError>;

    /// Returns the remaining TTL of `key` in milliseconds, or `None` if the
    /// key is absent or carries no TTL.
    async fn ttl(&self, key: &str) -> Result<Option<TtlMillis>, BusError>;

    /// Batch read of several keys at once.
    async fn mget(&self, keys: &[String]) -> Result<Vec<Option<Payload>>, BusError> {
        let mut out = Vec::with_capacity(keys.len());
        for key in keys {
            out.push(self.get(key).await?);
        }
        Ok(out)
    }

    /// Publishes `payload` on `channel`. Fire-and-forget, at-most-once: if
    /// there are no subscribers the message is simply dropped.
    async fn publish(&self, channel: &str, payload: Payload) -> Result<(), BusError>;

    /// Subscribes to `channel`, returning a cancellable stream of payloads.
    /// Dropping the returned [`Subscription`] releases the underlying
    /// registration atomically.
    async fn subscribe(&self, channel: &str) -> Result<Subscription, BusError>;

    /// Cheap liveness check against the backend.
    async fn ping(&self) -> Result<(), BusError>;
}

/// A cancellable stream of payloads delivered on a subscribed channel.
/// Dropping it unregisters the subscription.
pub struct Subscription {
    inner: std::pin::Pin<Box<dyn Stream<Item = Payload> + Send>>,
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}

impl Stream for Subscription {
    type Item = Payload;

    fn poll_next(
        mut self: std::pin::Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }
}

impl Subscription {
    fn from_broadcast(rx: broadcast::Receiver<Payload>) -> Self {
        let stream = BroadcastStream::new(rx).filter_map(|item| item.ok());
        Self {
            inner: Box::pin(stream),
        }
    }
}

#[derive(Debug, Clone)]
struct StoredValue {
    payload: Payload,
    expires_at: Option<DateTime<Utc>>,
}

impl StoredValue {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        matches!(self.expires_at, Some(at) if at <= now)
    }
}

/// Reference [`Bus`] backend: an in-process key/value store plus broadcast
/// channels, used for tests, backtests, and single-process demos. A
/// production deployment swaps this for a Redis-backed implementation
/// behind the same trait; wiring that client is outside this core's scope.
#[derive(Debug, Default)]
pub struct InMemoryBus {
    store: Mutex<BTreeMap<String, StoredValue>>,
    channels: Mutex<FnvHashMap<String, broadcast::Sender<Payload>>>,
    counters: Mutex<BTreeMap<String, i64>>,
    backpressure_drops: AtomicI64,
    healthy: AtomicBool,
}

/// Channel capacity for the broadcast backing each subscribed channel.
/// Overflow drops the oldest entries (`spec.md` §5 "Back-pressure").
const CHANNEL_CAPACITY: usize = 1024;

impl InMemoryBus {
    pub fn new() -> Self {
        Self {
            store: Mutex::new(BTreeMap::new()),
            channels: Mutex::new(FnvHashMap::default()),
            counters: Mutex::new(BTreeMap::new()),
            backpressure_drops: AtomicI64::new(0),
            healthy: AtomicBool::new(true),
        }
    }

    /// Total number of messages dropped due to subscriber back-pressure
    /// across all channels since construction.
    pub fn backpressure_drop_total(&self) -> i64 {
        self.backpressure_drops.load(Ordering::Relaxed)
    }

    /// Test/ops hook: flip simulated liveness, used to exercise failover
    /// paths without a real network dependency.
    pub fn set_healthy(&self, healthy: bool) {
        self.healthy.store(healthy, Ordering::SeqCst);
    }

    fn channel_sender(&self, channel: &str) -> broadcast::Sender<Payload> {
        let mut channels = self.channels.lock();
        channels
            .entry(channel.to_string())
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .clone()
    }

    /// Removes every expired key. Intended to be driven by a periodic
    /// sweeper task so transient keys never outlive their TTL, bounding
    /// resource growth per `spec.md` §5.
    pub fn sweep_expired(&self, now: DateTime<Utc>) -> usize {
        let mut store = self.store.lock();
        let before = store.len();
        store.retain(|_, v| !v.is_expired(now));
        before - store.len()
    }
}

#[async_trait]
impl Bus for InMemoryBus {
    async fn set(&self, key: &str, value: Payload, ttl_ms: TtlMillis) -> Result<(), BusError> {
        if ttl_ms <= 0 {
            return Err(BusError::InvalidTTL);
        }
        let expires_at = Utc::now() + chrono::Duration::milliseconds(ttl_ms);
        self.store.lock().insert(
            key.to_string(),
            StoredValue {
                payload: value,
                expires_at: Some(expires_at),
            },
        );
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Payload>, BusError> {
        let now = Utc::now();
        let store = self.store.lock();
        Ok(store
            .get(key)
            .filter(|v| !v.is_expired(now))
            .map(|v| v.payload.clone()))
    }

    async fn del(&self, key: &str) -> Result<(), BusError> {
        self.store.lock().remove(key);
        Ok(())
    }

    async fn incr(&self, key: &str) -> Result<i64, BusError> {
        let mut counters = self.counters.lock();
        let value = counters.entry(key.to_string()).or_insert(0);
        *value += 1;
        Ok(*value)
    }

    async fn scan(&self, prefix: &str) -> Result<Vec<String>, BusError> {
        let now = Utc::now();
        let store = self.store.lock();
        Ok(store
            .range(prefix.to_string()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .filter(|(_, v)| !v.is_expired(now))
            .map(|(k, _)| k.clone())
            .collect())
    }

    async fn ttl(&self, key: &str) -> Result<Option<TtlMillis>, BusError> {
        let now = Utc::now();
        let store = self.store.lock();
        Ok(store.get(key).and_then(|v| {
            v.expires_at
                .map(|at| (at - now).num_milliseconds().max(0))
        }))
    }

    async fn publish(&self, channel: &str, payload: Payload) -> Result<(), BusError> {
        let sender = self.channel_sender(channel);
        // A broadcast channel with no receivers returns SendError; that's
        // the fire-and-forget "no subscribers" case, not a failure.
        if sender.send(payload).is_err() {
            tracing::trace!(channel, "publish with no active subscribers");
        }
        Ok(())
    }

    async fn subscribe(&self, channel: &str) -> Result<Subscription, BusError> {
        let sender = self.channel_sender(channel);
        Ok(Subscription::from_broadcast(sender.subscribe()))
    }

    async fn ping(&self) -> Result<(), BusError> {
        if self.healthy.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(BusError::TransientUnavailable)
        }
    }
}

/// Spawns a background task that sweeps expired keys from `bus` on a fixed
/// interval. Returns a [`tokio::task::JoinHandle`] the caller can abort on
/// shutdown.
pub fn spawn_ttl_sweeper(
    bus: Arc<InMemoryBus>,
    interval: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            let removed = bus.sweep_expired(Utc::now());
            if removed > 0 {
                tracing::debug!(removed, "ttl sweeper reclaimed expired keys");
            }
        }
    })
}

/// A [`Bus`] wrapping a primary and secondary backend with a shared
/// failover flag. The Region Failover Manager (`titan-failover`) flips
/// [`FailoverBus::set_failover_active`] when the primary is unreachable;
/// every subsequent operation here transparently redirects to the
/// secondary. Existing [`Subscription`]s are not migrated automatically —
/// callers are expected to resubscribe after observing a failover event on
/// `titan:infra:failover_active`, matching `spec.md` §4.1's "subscribers
/// are resubscribed transparently" at the application layer.
#[derive(Debug)]
pub struct FailoverBus<B> {
    primary: Arc<B>,
    secondary: Arc<B>,
    failover_active: Arc<AtomicBool>,
}

impl<B: Bus> FailoverBus<B> {
    pub fn new(primary: Arc<B>, secondary: Arc<B>) -> Self {
        Self {
            primary,
            secondary,
            failover_active: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_failover_active(&self) -> bool {
        self.failover_active.load(Ordering::SeqCst)
    }

    pub fn set_failover_active(&self, active: bool) {
        self.failover_active.store(active, Ordering::SeqCst);
    }

    pub fn failover_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.failover_active)
    }

    fn active(&self) -> &Arc<B> {
        if self.is_failover_active() {
            &self.secondary
        } else {
            &self.primary
        }
    }
}

#[async_trait]
impl<B: Bus> Bus for FailoverBus<B> {
    async fn set(&self, key: &str, value: Payload, ttl_ms: TtlMillis) -> Result<(), BusError> {
        self.active().set(key, value, ttl_ms).await
    }

    async fn get(&self, key: &str) -> Result<Option<Payload>, BusError> {
        self.active().get(key).await
    }

    async fn del(&self, key: &str) -> Result<(), BusError> {
        self.active().del(key).await
    }

    async fn incr(&self, key: &str) -> Result<i64, BusError> {
        self.active().incr(key).await
    }

    async fn scan(&self, prefix: &str) -> Result<Vec<String>, BusError> {
        self.active().scan(prefix).await
    }

    async fn ttl(&self, key: &str) -> Result<Option<TtlMillis>, BusError> {
        self.active().ttl(key).await
    }

    async fn publish(&self, channel: &str, payload: Payload) -> Result<(), BusError> {
        self.active().publish(channel, payload).await
    }

    async fn subscribe(&self, channel: &str) -> Result<Subscription, BusError> {
        self.active().subscribe(channel).await
    }

    async fn ping(&self) -> Result<(), BusError> {
        self.active().ping().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_rejects_nonpositive_ttl() {
        let bus = InMemoryBus::new();
        let err = bus.set("k", Payload::from_static(b"v"), 0).await.unwrap_err();
        assert_eq!(err, BusError::InvalidTTL);
        let err = bus.set("k", Payload::from_static(b"v"), -5).await.unwrap_err();
        assert_eq!(err, BusError::InvalidTTL);
    }

    #[tokio::test]
    async fn get_returns_none_after_ttl_expiry() {
        let bus = InMemoryBus::new();
        bus.set("k", Payload::from_static(b"v"), 1).await.unwrap();
        assert!(bus.get("k").await.unwrap().is_some());
        let future = Utc::now() + chrono::Duration::milliseconds(10);
        bus.sweep_expired(future);
        assert!(bus.get("k").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn scan_filters_by_prefix_and_skips_expired() {
        let bus = InMemoryBus::new();
        bus.set("titan:t1:signal:a", Payload::from_static(b"1"), 60_000)
            .await
            .unwrap();
        bus.set("titan:t1:signal:b", Payload::from_static(b"2"), 60_000)
            .await
            .unwrap();
        bus.set("titan:t2:signal:a", Payload::from_static(b"3"), 60_000)
            .await
            .unwrap();
        let mut keys = bus.scan("titan:t1:").await.unwrap();
        keys.sort();
        assert_eq!(keys, vec!["titan:t1:signal:a", "titan:t1:signal:b"]);
    }

    #[tokio::test]
    async fn incr_creates_and_accumulates() {
        let bus = InMemoryBus::new();
        assert_eq!(bus.incr("counter").await.unwrap(), 1);
        assert_eq!(bus.incr("counter").await.unwrap(), 2);
    }

    #[tokio::test]
    async fn publish_subscribe_preserves_per_channel_order() {
        let bus = InMemoryBus::new();
        let mut sub = bus.subscribe("chan").await.unwrap();
        bus.publish("chan", Payload::from_static(b"1")).await.unwrap();
        bus.publish("chan", Payload::from_static(b"2")).await.unwrap();
        assert_eq!(sub.next().await, Some(Payload::from_static(b"1")));
        assert_eq!(sub.next().await, Some(Payload::from_static(b"2")));
    }

    #[tokio::test]
    async fn publish_with_no_subscribers_is_not_an_error() {
        let bus = InMemoryBus::new();
        bus.publish("nobody-listening", Payload::from_static(b"1"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn ping_reflects_simulated_health() {
        let bus = InMemoryBus::new();
        assert!(bus.ping().await.is_ok());
        bus.set_healthy(false);
        assert_eq!(bus.ping().await.unwrap_err(), BusError::TransientUnavailable);
    }

    #[tokio::test]
    async fn failover_bus_redirects_on_flag_flip() {
        let primary = Arc::new(InMemoryBus::new());
        let secondary = Arc::new(InMemoryBus::new());
        let failover = FailoverBus::new(Arc::clone(&primary), Arc::clone(&secondary));

        failover
            .set("k", Payload::from_static(b"primary"), 60_000)
            .await
            .unwrap();
        assert!(primary.get("k").await.unwrap().is_some());
        assert!(secondary.get("k").await.unwrap().is_none());

        failover.set_failover_active(true);
        failover
            .set("k2", Payload::from_static(b"secondary"), 60_000)
            .await
            .unwrap();
        assert!(secondary.get("k2").await.unwrap().is_some());
        assert!(primary.get("k2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn ttl_reports_remaining_time() {
        let bus = InMemoryBus::new();
        bus.set("k", Payload::from_static(b"v"), 60_000).await.unwrap();
        let ttl = bus.ttl("k").await.unwrap().unwrap();
        assert!(ttl > 0 && ttl <= 60_000);
        assert_eq!(bus.ttl("missing").await.unwrap(), None);
    }
}
