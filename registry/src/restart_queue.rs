//! Restart Queue: per-module retry budget with exponential backoff,
//! dropping and alerting once the budget is exhausted, per `spec.md` §4.4.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use titan_bus::{Bus, BusError, Payload};
use titan_namespace::Channel;

/// Default retry budget per module (`SPEC_FULL.md` §9).
pub const MAX_RETRIES: u32 = 3;

/// Backoff base, doubled on each attempt and capped at 30s
/// (`SPEC_FULL.md` §9).
const BACKOFF_BASE: Duration = Duration::from_secs(1);
const BACKOFF_CAP: Duration = Duration::from_secs(30);

/// What the queue decided for a single restart request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestartDecision {
    /// Retry after the given backoff; `attempt` is the 1-indexed attempt
    /// number this decision corresponds to.
    RetryAfter { attempt: u32, delay: Duration },
    /// The module exceeded `MAX_RETRIES` and was dropped; an alert was
    /// published to [`Channel::alert`].
    Dropped { attempts: u32 },
}

#[derive(Debug, Serialize, Deserialize)]
struct RestartAlert<'a> {
    module: &'a str,
    attempts: u32,
    reason: &'a str,
}

fn backoff_for_attempt(attempt: u32) -> Duration {
    let shift = attempt.saturating_sub(1).min(31);
    let scaled = BACKOFF_BASE.checked_mul(1u32 << shift).unwrap_or(BACKOFF_CAP);
    scaled.min(BACKOFF_CAP)
}

/// Tracks restart attempts per module and decides whether to keep
/// retrying or give up, per the fixed `MAX_RETRIES` budget.
#[derive(Debug)]
pub struct RestartQueue {
    bus: Arc<dyn Bus>,
    max_retries: u32,
    attempts: parking_lot::Mutex<HashMap<String, u32>>,
}

impl RestartQueue {
    pub fn new(bus: Arc<dyn Bus>) -> Self {
        Self::with_max_retries(bus, MAX_RETRIES)
    }

    pub fn with_max_retries(bus: Arc<dyn Bus>, max_retries: u32) -> Self {
        Self {
            bus,
            max_retries,
            attempts: parking_lot::Mutex::new(HashMap::new()),
        }
    }

    /// Records a restart attempt for `module` and returns the resulting
    /// decision. Once a module is dropped its counter stays exhausted
    /// until [`Self::reset`] is called (e.g. after a manual re-registration).
    pub async fn request_restart(&self, module: &str) -> Result<RestartDecision, BusError> {
        let attempt = {
            let mut attempts = self.attempts.lock();
            let counter = attempts.entry(module.to_string()).or_insert(0);
            *counter += 1;
            *counter
        };

        if attempt > self.max_retries {
            let alert = RestartAlert {
                module,
                attempts: attempt - 1,
                reason: "restart budget exhausted",
            };
            let payload = Payload::from(serde_json::to_vec(&alert).expect("RestartAlert is Serialize"));
            self.bus.publish(Channel::alert(), payload).await?;
            return Ok(RestartDecision::Dropped { attempts: attempt - 1 });
        }

        Ok(RestartDecision::RetryAfter {
            attempt,
            delay: backoff_for_attempt(attempt),
        })
    }

    /// Clears the retry counter for `module`, e.g. after an operator
    /// re-registers it following a drop.
    pub fn reset(&self, module: &str) {
        self.attempts.lock().remove(module);
    }
}
