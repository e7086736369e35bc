//! `titan_runtime::ModuleRuntime` adapters for the long-running monitors
//! `titand` drives directly. Most modules in this system are reactive
//! (invoked by other workers through their owning struct's methods, per
//! `spec.md` §5's single-writer pattern) rather than tick-driven; the
//! Redis Heartbeat is the one monitor whose entire job is "run on a
//! cadence", so it is the one wrapped in a `ModuleHost` here.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use titan_failover::RedisHeartbeat;
use titan_runtime::{ModuleRuntime, RuntimeContext};

#[derive(Debug)]
pub struct HeartbeatModule {
    heartbeat: Arc<RedisHeartbeat>,
}

impl HeartbeatModule {
    pub fn new(heartbeat: Arc<RedisHeartbeat>) -> Self {
        Self { heartbeat }
    }
}

#[async_trait]
impl ModuleRuntime for HeartbeatModule {
    type Error = titan_failover::FailoverError;

    fn name(&self) -> &str {
        "redis_heartbeat"
    }

    fn tick_interval(&self) -> Duration {
        titan_failover::heartbeat::HEARTBEAT_INTERVAL
    }

    async fn tick(&mut self, _now: DateTime<Utc>, _ctx: &RuntimeContext) -> Result<(), Self::Error> {
        self.heartbeat.beat().await
    }
}
