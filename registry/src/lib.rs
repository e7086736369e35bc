#![forbid(unsafe_code)]
#![warn(unused, missing_debug_implementations, rust_2018_idioms)]

//! Module registry, health monitor, restart queue, and dependency
//! resolver: the catalog and liveness layer every Module Runtime instance
//! reports into (`spec.md` §4.4).

pub mod dependency_resolver;
pub mod error;
pub mod health;
pub mod manifest;
pub mod registry;
pub mod restart_queue;
pub mod types;

pub use dependency_resolver::{CriticalPath, DependencyResolver, HaltRecommendation, Violation, ViolationKind};
pub use error::RegistryError;
pub use health::{HealthIndicators, HealthMonitor, HealthVerdict};
pub use manifest::{ManifestEntry, ModuleManifest};
pub use registry::{Registry, RECORD_TTL_MS};
pub use restart_queue::{RestartDecision, RestartQueue, MAX_RETRIES};
pub use types::{ModuleRecord, ModuleStatus, ModuleType};

use async_trait::async_trait;
use std::sync::Arc;
use titan_runtime::LifecycleSink;
use tracing::{error, warn};

/// Bridges [`titan_runtime::ModuleHost`] lifecycle events into the
/// registry: heartbeats on start, and restart-queue enqueueing on
/// failure. The one piece of glue code that lets every Module Runtime
/// instance report into this crate without depending on it directly.
#[derive(Debug)]
pub struct RegistryLifecycleSink {
    registry: Arc<Registry>,
    restart_queue: Arc<RestartQueue>,
}

impl RegistryLifecycleSink {
    pub fn new(registry: Arc<Registry>, restart_queue: Arc<RestartQueue>) -> Self {
        Self { registry, restart_queue }
    }
}

#[async_trait]
impl LifecycleSink for RegistryLifecycleSink {
    async fn on_started(&self, module: &str) {
        if let Err(e) = self.registry.heartbeat(module).await {
            warn!(module, error = %e, "heartbeat on start failed, module may not be registered yet");
        }
    }

    async fn on_stopped(&self, module: &str) {
        if let Err(e) = self.registry.set_status(module, ModuleStatus::Deprecated).await {
            warn!(module, error = %e, "failed to mark stopped module deprecated");
        }
    }

    async fn on_failed(&self, module: &str, error_kind: &str, reason: &str) {
        error!(module, error_kind, reason, "module failed, enqueueing restart");
        match self.restart_queue.request_restart(module).await {
            Ok(RestartDecision::RetryAfter { attempt, delay }) => {
                warn!(module, attempt, delay_ms = delay.as_millis() as u64, "restart scheduled");
            }
            Ok(RestartDecision::Dropped { attempts }) => {
                error!(module, attempts, "restart budget exhausted, module dropped");
                if let Err(e) = self.registry.set_status(module, ModuleStatus::Retired).await {
                    error!(module, error = %e, "failed to mark dropped module retired");
                }
            }
            Err(e) => error!(module, error = %e, "failed to enqueue restart"),
        }
    }
}
