//! System-wide state machine: `Normal -> Degraded -> Hibernating ->
//! Recovered`. Degraded is entered on a health-score violation over K
//! modules, a region failover, or a rate-limit storm; Hibernating is
//! entered by any kill-switch; only an explicit admin command returns
//! the system out of Hibernating (`spec.md` §4.11).
//!
//! This is the single owning worker for `titan:control:state`
//! (`spec.md` §5): every trigger proposes a transition through
//! [`SystemStateMachine`] rather than writing the state directly,
//! mirroring `titan_mode::MorphicGovernor`'s ownership of mode state.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use titan_bus::{Bus, Payload};
use titan_namespace::Channel;

use crate::error::FailoverError;

const SYSTEM_STATE_TTL_MS: i64 = 10 * 365 * 24 * 60 * 60 * 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SystemState {
    Normal,
    Degraded,
    Hibernating,
    Recovered,
}

impl SystemState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SystemState::Normal => "normal",
            SystemState::Degraded => "degraded",
            SystemState::Hibernating => "hibernating",
            SystemState::Recovered => "recovered",
        }
    }
}

/// Why Degraded was entered, so the eventual Recovery Reporter has a
/// cause to cite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DegradedCause {
    HealthScoreViolation,
    RegionFailover,
    RateLimitStorm,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemStateRecord {
    pub state: SystemState,
    pub version: u64,
    pub reason: String,
    pub updated_at: DateTime<Utc>,
}

impl SystemStateRecord {
    fn initial(now: DateTime<Utc>) -> Self {
        Self { state: SystemState::Normal, version: 0, reason: "startup".to_string(), updated_at: now }
    }
}

#[derive(Debug)]
pub struct SystemStateMachine {
    bus: Arc<dyn Bus>,
    record: Mutex<SystemStateRecord>,
}

impl SystemStateMachine {
    pub fn new(bus: Arc<dyn Bus>) -> Self {
        Self { bus, record: Mutex::new(SystemStateRecord::initial(Utc::now())) }
    }

    pub fn current(&self) -> SystemStateRecord {
        self.record.lock().clone()
    }

    /// Normal or Recovered -> Degraded. A no-op (but still re-persisted,
    /// reason updated) if already Degraded or Hibernating, since those
    /// states are already at least as severe.
    pub async fn degrade(&self, cause: DegradedCause) -> Result<SystemStateRecord, FailoverError> {
        let reason = match cause {
            DegradedCause::HealthScoreViolation => "health_score_violation",
            DegradedCause::RegionFailover => "region_failover",
            DegradedCause::RateLimitStorm => "rate_limit_storm",
        };
        self.transition_if(
            |state| matches!(state, SystemState::Normal | SystemState::Recovered),
            SystemState::Degraded,
            reason,
        )
        .await
    }

    /// Any state -> Hibernating. Kill-switches call this unconditionally.
    pub async fn hibernate(&self, reason: &str) -> Result<SystemStateRecord, FailoverError> {
        self.transition_if(|_| true, SystemState::Hibernating, reason).await
    }

    /// Hibernating -> Recovered, the only path out of Hibernating. Not
    /// callable except by an explicit admin command (enforced by the
    /// caller owning access to this method, e.g. `titan-cli`'s admin
    /// surface).
    pub async fn admin_resume(&self) -> Result<SystemStateRecord, FailoverError> {
        self.transition_if(
            |state| matches!(state, SystemState::Hibernating),
            SystemState::Recovered,
            "admin_resume",
        )
        .await
    }

    /// Recovered -> Normal, closing out the recovery once the operator
    /// has reviewed the Emergency Recovery Reporter's output.
    pub async fn acknowledge_recovery(&self) -> Result<SystemStateRecord, FailoverError> {
        self.transition_if(|state| matches!(state, SystemState::Recovered), SystemState::Normal, "admin_ack").await
    }

    async fn transition_if(
        &self,
        allowed_from: impl Fn(SystemState) -> bool,
        to: SystemState,
        reason: &str,
    ) -> Result<SystemStateRecord, FailoverError> {
        let now = Utc::now();
        let next = {
            let mut record = self.record.lock();
            if !allowed_from(record.state) {
                return Ok(record.clone());
            }
            record.state = to;
            record.version += 1;
            record.reason = reason.to_string();
            record.updated_at = now;
            record.clone()
        };
        self.persist_and_broadcast(&next).await?;
        Ok(next)
    }

    async fn persist_and_broadcast(&self, record: &SystemStateRecord) -> Result<(), FailoverError> {
        let payload = Payload::from(serde_json::to_vec(record).expect("SystemStateRecord is Serialize"));
        self.bus.set(titan_namespace::Key::system_state(), payload.clone(), SYSTEM_STATE_TTL_MS).await?;
        self.bus.publish(Channel::system_state(), payload).await?;
        Ok(())
    }
}
