#![forbid(unsafe_code)]
#![warn(unused, missing_debug_implementations, rust_2018_idioms)]
#![allow(clippy::type_complexity)]

//! # Module Runtime — the shared worker scaffold
//!
//! Every signal generator, filter, router, executor, and monitor in the
//! coordination core is an instance of the same [`ModuleRuntime`]
//! abstraction, driven by [`ModuleHost`]. The host owns the tick loop, the
//! subscription loop, the per-iteration chaos check, the morphic-mode read,
//! counters, and the deadline/backoff/shutdown machinery described in
//! `spec.md` §4.3 and §5 — so individual modules implement only their
//! domain logic.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::stream::{select_all, StreamExt};
use std::{fmt::Debug, pin::Pin, sync::Arc, time::Duration};
use titan_bus::{Bus, Payload};
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

pub mod chaos;
pub mod error;
pub mod metrics;

pub use chaos::ChaosHook;
pub use error::RuntimeError;
pub use metrics::MetricsRegistry;

/// Reads the currently active morphic mode for a tenant. Implemented by
/// `titan-mode`'s mode store; the runtime only depends on this narrow
/// trait so the dependency graph stays leaf-first (`spec.md` §2).
pub trait ModeReader: Send + Sync + Debug {
    fn current_mode(&self, tenant: &str) -> String;
}

/// Default reader used when no mode store is wired in (tests, standalone
/// modules); every tenant is reported as running the `default` mode.
#[derive(Debug, Default, Clone)]
pub struct StaticModeReader;

impl ModeReader for StaticModeReader {
    fn current_mode(&self, _tenant: &str) -> String {
        "default".to_string()
    }
}

/// Lifecycle events a Module Runtime instance reports. `titan-registry`
/// implements this to keep Module Records and heartbeats current without
/// this crate depending on the registry crate.
#[async_trait]
pub trait LifecycleSink: Send + Sync + Debug {
    async fn on_started(&self, module: &str);
    async fn on_stopped(&self, module: &str);
    async fn on_failed(&self, module: &str, error_kind: &str, reason: &str);
}

/// No-op sink used when a module runs outside a full system (tests,
/// examples).
#[derive(Debug, Default, Clone)]
pub struct NoopLifecycleSink;

#[async_trait]
impl LifecycleSink for NoopLifecycleSink {
    async fn on_started(&self, module: &str) {
        info!(module, "started");
    }

    async fn on_stopped(&self, module: &str) {
        info!(module, "stopped");
    }

    async fn on_failed(&self, module: &str, error_kind: &str, reason: &str) {
        warn!(module, error_kind, reason, "failed");
    }
}

/// Everything a running module needs, handed to it on every `tick` and
/// `on_message` call rather than stashed in module-owned globals.
#[derive(Clone)]
pub struct RuntimeContext {
    pub bus: Arc<dyn Bus>,
    pub metrics: Arc<MetricsRegistry>,
    pub chaos: ChaosHook,
    pub mode: Arc<dyn ModeReader>,
}

impl Debug for RuntimeContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuntimeContext").finish_non_exhaustive()
    }
}

impl RuntimeContext {
    pub fn new(bus: Arc<dyn Bus>) -> Self {
        Self {
            bus,
            metrics: MetricsRegistry::new(),
            chaos: ChaosHook::new(),
            mode: Arc::new(StaticModeReader),
        }
    }

    pub fn with_mode_reader(mut self, mode: Arc<dyn ModeReader>) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<MetricsRegistry>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn with_chaos(mut self, chaos: ChaosHook) -> Self {
        self.chaos = chaos;
        self
    }
}

/// Timing and retry knobs for a [`ModuleHost`], defaulting to the values
/// named in `spec.md` §5 and §9.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub tick_interval: Duration,
    pub max_tick_duration: Duration,
    pub shutdown_deadline: Duration,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(1),
            max_tick_duration: Duration::from_secs(10),
            shutdown_deadline: Duration::from_secs(30),
        }
    }
}

/// The behavior every worker implements. `tick` runs on the module's own
/// cadence; `on_message` runs once per payload received on a declared
/// subscription. Both run under [`RuntimeConfig::max_tick_duration`].
#[async_trait]
pub trait ModuleRuntime: Send {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Stable module name, used in logs, metrics, and the Registry.
    fn name(&self) -> &str;

    /// Channels this module subscribes to. Empty by default (tick-only
    /// modules, e.g. periodic monitors).
    fn subscriptions(&self) -> Vec<String> {
        Vec::new()
    }

    /// The module's own tick cadence. Defaults to once per second.
    fn tick_interval(&self) -> Duration {
        Duration::from_secs(1)
    }

    async fn on_start(&mut self, _ctx: &RuntimeContext) -> Result<(), Self::Error> {
        Ok(())
    }

    async fn tick(&mut self, now: DateTime<Utc>, ctx: &RuntimeContext) -> Result<(), Self::Error>;

    async fn on_message(
        &mut self,
        _channel: &str,
        _payload: Payload,
        _ctx: &RuntimeContext,
    ) -> Result<(), Self::Error> {
        Ok(())
    }

    async fn on_shutdown(&mut self, _ctx: &RuntimeContext) -> Result<(), Self::Error> {
        Ok(())
    }
}

enum Event {
    Tick(DateTime<Utc>),
    Message(String, Payload),
    Shutdown,
}

/// Drives a single [`ModuleRuntime`] instance: registers its
/// subscriptions, alternates between its tick cadence and incoming
/// messages, applies the chaos check and tick-duration deadline, and drains
/// cleanly on shutdown.
pub struct ModuleHost<M: ModuleRuntime> {
    module: M,
    ctx: RuntimeContext,
    lifecycle: Arc<dyn LifecycleSink>,
    config: RuntimeConfig,
    tick_total: metrics::CounterHandle,
    error_total: metrics::CounterHandle,
    timeout_total: metrics::CounterHandle,
    tick_latency: metrics::HistogramHandle,
}

impl<M: ModuleRuntime> ModuleHost<M> {
    pub fn new(module: M, ctx: RuntimeContext) -> Self {
        Self::with_lifecycle(module, ctx, Arc::new(NoopLifecycleSink))
    }

    pub fn with_lifecycle(module: M, ctx: RuntimeContext, lifecycle: Arc<dyn LifecycleSink>) -> Self {
        let name = module.name().to_string();
        let tick_total = ctx.metrics.declare_counter(format!("{name}.tick_total"));
        let error_total = ctx.metrics.declare_counter(format!("{name}.error_total"));
        let timeout_total = ctx.metrics.declare_counter(format!("{name}.timeout_total"));
        let tick_latency = ctx
            .metrics
            .declare_histogram(format!("{name}.tick_latency_ms"));
        Self {
            module,
            ctx,
            lifecycle,
            config: RuntimeConfig::default(),
            tick_total,
            error_total,
            timeout_total,
            tick_latency,
        }
    }

    pub fn with_config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    /// Runs the module until `shutdown` signals true. Returns `Ok(())` on a
    /// clean shutdown, or the module's error if a handler returns a fatal
    /// error (the caller — typically the Restart Queue — decides whether to
    /// respawn).
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) -> Result<(), M::Error> {
        let name = self.module.name().to_string();

        self.module.on_start(&self.ctx).await?;
        self.lifecycle.on_started(&name).await;

        let mut subs: Vec<Pin<Box<dyn futures::Stream<Item = (String, Payload)> + Send>>> =
            Vec::new();
        for channel in self.module.subscriptions() {
            match self.ctx.bus.subscribe(&channel).await {
                Ok(sub) => {
                    let tagged = sub.map(move |payload| (channel.clone(), payload));
                    subs.push(Box::pin(tagged));
                }
                Err(err) => {
                    error!(module = %name, %err, "failed to subscribe");
                }
            }
        }
        let mut merged = if subs.is_empty() {
            None
        } else {
            Some(select_all(subs))
        };

        let mut ticker = tokio::time::interval(self.module.tick_interval());

        loop {
            let event = tokio::select! {
                biased;
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        Event::Shutdown
                    } else {
                        continue;
                    }
                }
                _ = ticker.tick() => Event::Tick(Utc::now()),
                maybe = async {
                    match merged.as_mut() {
                        Some(stream) => stream.next().await,
                        None => std::future::pending().await,
                    }
                } => {
                    match maybe {
                        Some((channel, payload)) => Event::Message(channel, payload),
                        None => continue,
                    }
                }
            };

            match event {
                Event::Shutdown => break,
                Event::Tick(now) => {
                    if let Err(err) = self.ctx.chaos.check() {
                        self.record_error(&name, &err.to_string()).await;
                        continue;
                    }
                    self.run_tick(&name, now).await?;
                }
                Event::Message(channel, payload) => {
                    self.run_message(&name, &channel, payload).await?;
                }
            }
        }

        let drained = tokio::time::timeout(
            self.config.shutdown_deadline,
            self.module.on_shutdown(&self.ctx),
        )
        .await;
        match drained {
            Ok(result) => result?,
            Err(_) => warn!(module = %name, "shutdown deadline exceeded while draining"),
        }
        self.lifecycle.on_stopped(&name).await;
        Ok(())
    }

    async fn run_tick(&mut self, name: &str, now: DateTime<Utc>) -> Result<(), M::Error> {
        self.tick_total.incr();
        let started = std::time::Instant::now();
        let result = tokio::time::timeout(
            self.config.max_tick_duration,
            self.module.tick(now, &self.ctx),
        )
        .await;
        self.tick_latency
            .observe(started.elapsed().as_secs_f64() * 1000.0);

        match result {
            Ok(Ok(())) => {
                debug!(module = name, "tick ok");
                Ok(())
            }
            Ok(Err(err)) => {
                self.record_error(name, &err.to_string()).await;
                Err(err)
            }
            Err(_) => {
                self.timeout_total.incr();
                warn!(module = name, "tick timed out");
                Ok(())
            }
        }
    }

    async fn run_message(
        &mut self,
        name: &str,
        channel: &str,
        payload: Payload,
    ) -> Result<(), M::Error> {
        if let Err(err) = self.ctx.chaos.check() {
            self.record_error(name, &err.to_string()).await;
            return Ok(());
        }
        let result = tokio::time::timeout(
            self.config.max_tick_duration,
            self.module.on_message(channel, payload, &self.ctx),
        )
        .await;
        match result {
            Ok(Ok(())) => Ok(()),
            Ok(Err(err)) => {
                self.record_error(name, &err.to_string()).await;
                Err(err)
            }
            Err(_) => {
                self.timeout_total.incr();
                warn!(module = name, channel, "message handler timed out");
                Ok(())
            }
        }
    }

    async fn record_error(&self, name: &str, reason: &str) {
        self.error_total.incr();
        self.lifecycle.on_failed(name, reason, reason).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use titan_bus::InMemoryBus;

    #[derive(Debug)]
    struct CountingModule {
        ticks: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl ModuleRuntime for CountingModule {
        type Error = RuntimeError;

        fn name(&self) -> &str {
            "counting_module"
        }

        async fn tick(&mut self, _now: DateTime<Utc>, _ctx: &RuntimeContext) -> Result<(), Self::Error> {
            self.ticks.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn host_ticks_and_shuts_down_cleanly() {
        let bus: Arc<dyn Bus> = Arc::new(InMemoryBus::new());
        let ctx = RuntimeContext::new(bus);
        let ticks = Arc::new(AtomicUsize::new(0));
        let host = ModuleHost::new(
            CountingModule {
                ticks: Arc::clone(&ticks),
            },
            ctx,
        )
        .with_config(RuntimeConfig {
            tick_interval: Duration::from_millis(10),
            max_tick_duration: Duration::from_secs(1),
            shutdown_deadline: Duration::from_secs(1),
        });

        let (tx, rx) = watch::channel(false);
        let handle = tokio::spawn(host.run(rx));
        tokio::time::advance(Duration::from_millis(35)).await;
        tx.send(true).unwrap();
        handle.await.unwrap().unwrap();
        assert!(ticks.load(Ordering::SeqCst) >= 1);
    }

    #[derive(Debug)]
    struct ChaosModule;

    #[async_trait]
    impl ModuleRuntime for ChaosModule {
        type Error = RuntimeError;

        fn name(&self) -> &str {
            "chaos_module"
        }

        async fn tick(&mut self, _now: DateTime<Utc>, _ctx: &RuntimeContext) -> Result<(), Self::Error> {
            Ok(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn armed_chaos_hook_prevents_tick_from_running() {
        let bus: Arc<dyn Bus> = Arc::new(InMemoryBus::new());
        let mut ctx = RuntimeContext::new(bus);
        ctx.chaos.set_armed(true);
        let error_seen = ctx.metrics.declare_counter("chaos_module.error_total");

        let host = ModuleHost::new(ChaosModule, ctx).with_config(RuntimeConfig {
            tick_interval: Duration::from_millis(10),
            max_tick_duration: Duration::from_secs(1),
            shutdown_deadline: Duration::from_secs(1),
        });

        let (tx, rx) = watch::channel(false);
        let handle = tokio::spawn(host.run(rx));
        tokio::time::advance(Duration::from_millis(25)).await;
        tx.send(true).unwrap();
        handle.await.unwrap().unwrap();
        assert!(error_seen.value() >= 1);
    }
}
