//! Redis Heartbeat: writes a timestamp to the bus every
//! `HEARTBEAT_INTERVAL`; a missed ping for longer than the failover
//! window is what the Region Failover Manager treats as primary-down
//! (`spec.md` §4.11, §9).

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use titan_bus::{Bus, Payload};
use titan_namespace::Key;

use crate::error::FailoverError;

pub const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(5);
pub const FAILOVER_WINDOW: Duration = Duration::from_secs(HEARTBEAT_INTERVAL.as_secs() * 2);

const HEARTBEAT_TTL_MS: i64 = (FAILOVER_WINDOW.as_millis() * 2) as i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
struct HeartbeatPayload {
    ts_ms: i64,
}

#[derive(Debug)]
pub struct RedisHeartbeat {
    bus: Arc<dyn Bus>,
}

impl RedisHeartbeat {
    pub fn new(bus: Arc<dyn Bus>) -> Self {
        Self { bus }
    }

    /// Writes the current timestamp under the bus health indicator key.
    /// Callers publish `titan:alert` themselves on `Err` — a ping
    /// failure is exactly the condition the alert channel exists for.
    pub async fn beat(&self) -> Result<(), FailoverError> {
        let payload = HeartbeatPayload { ts_ms: Utc::now().timestamp_millis() };
        let bytes = Payload::from(serde_json::to_vec(&payload).expect("HeartbeatPayload is Serialize"));
        self.bus.set(&Key::health("bus", "heartbeat"), bytes, HEARTBEAT_TTL_MS).await?;
        Ok(())
    }

    /// Returns the age of the last recorded heartbeat, or `None` if none
    /// has ever been written.
    pub async fn last_beat_age(&self, now_ms: i64) -> Result<Option<i64>, FailoverError> {
        let raw = self.bus.get(&Key::health("bus", "heartbeat")).await?;
        Ok(raw
            .and_then(|bytes| serde_json::from_slice::<HeartbeatPayload>(&bytes).ok())
            .map(|payload| now_ms - payload.ts_ms))
    }

    /// True once the last heartbeat is older than the failover window.
    pub async fn is_stale(&self, now_ms: i64) -> Result<bool, FailoverError> {
        Ok(self
            .last_beat_age(now_ms)
            .await?
            .map(|age_ms| age_ms > FAILOVER_WINDOW.as_millis() as i64)
            .unwrap_or(true))
    }
}
