//! Retry Throttle: listens for Failure events and retries each signal up
//! to `MAX_RETRIES_PER_ORDER` with `RETRY_DELAY` exponential backoff
//! before giving up (`spec.md` §4.9).

use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::Duration;

pub const MAX_RETRIES_PER_ORDER: u32 = 3;
pub const RETRY_DELAY: Duration = Duration::from_millis(500);

fn backoff_for_attempt(attempt: u32) -> Duration {
    RETRY_DELAY.saturating_mul(1u32 << attempt.saturating_sub(1).min(16))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    RetryAfter { attempt: u32, delay: Duration },
    GiveUp { attempts: u32 },
}

/// Per-signal attempt counter. One instance per tenant or process, owned
/// by the worker that also owns the Execution Controller's failure
/// subscription (`spec.md` §5 single-writer discipline).
#[derive(Debug)]
pub struct RetryThrottle {
    max_retries: u32,
    attempts: Mutex<HashMap<String, u32>>,
}

impl Default for RetryThrottle {
    fn default() -> Self {
        Self::new(MAX_RETRIES_PER_ORDER)
    }
}

impl RetryThrottle {
    pub fn new(max_retries: u32) -> Self {
        Self { max_retries, attempts: Mutex::new(HashMap::new()) }
    }

    /// Records a failure for `signal_id` and decides whether to retry.
    pub fn record_failure(&self, signal_id: &str) -> RetryDecision {
        let mut attempts = self.attempts.lock();
        let attempt = attempts.entry(signal_id.to_string()).or_insert(0);
        *attempt += 1;

        if *attempt > self.max_retries {
            let attempts_made = *attempt - 1;
            RetryDecision::GiveUp { attempts: attempts_made }
        } else {
            RetryDecision::RetryAfter { attempt: *attempt, delay: backoff_for_attempt(*attempt) }
        }
    }

    /// Clears the attempt counter for `signal_id`, e.g. after a
    /// successful fill.
    pub fn reset(&self, signal_id: &str) {
        self.attempts.lock().remove(signal_id);
    }
}
