//! Missed-signal backlog: signals dropped for `TransientUnavailable`
//! reasons are retried from a bounded backlog before being marked
//! terminal, using the same backoff cadence as the Retry Throttle
//! (`spec.md` §4.9) applied uniformly across the pipeline
//! (`SPEC_FULL.md` §4.7, grounded in
//! `original_source/missed_signal_backlogger.py`).

use crate::model::Signal;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::time::Duration;

/// Mirrors the Retry Throttle's pinned defaults (`SPEC_FULL.md` §9);
/// duplicated here rather than imported since `titan-signal` sits below
/// `titan-execution` in the dependency order.
pub const MAX_RETRIES_PER_SIGNAL: u32 = 3;
const RETRY_DELAY_BASE: Duration = Duration::from_millis(500);

fn backoff_for_attempt(attempt: u32) -> Duration {
    RETRY_DELAY_BASE.saturating_mul(1u32 << attempt.saturating_sub(1).min(16))
}

#[derive(Debug, Clone)]
struct BackloggedSignal {
    signal: Signal,
    attempts: u32,
    retry_at: DateTime<Utc>,
}

/// A bounded FIFO backlog. When full, the oldest entry is dropped to
/// make room (`spec.md` §5 "Back-pressure: on overflow, oldest entries
/// are dropped").
#[derive(Debug)]
pub struct SignalBacklog {
    capacity: usize,
    entries: Mutex<VecDeque<BackloggedSignal>>,
}

/// What happened to a signal popped off the backlog.
#[derive(Debug, Clone, PartialEq)]
pub enum DrainedOutcome {
    Retry(Signal),
    Terminal(Signal),
}

impl SignalBacklog {
    pub fn new(capacity: usize) -> Self {
        Self { capacity, entries: Mutex::new(VecDeque::with_capacity(capacity)) }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Enqueues `signal` for retry after its backoff window. Returns the
    /// signal that was dropped to make room, if the backlog was full.
    pub fn enqueue(&self, signal: Signal, now: DateTime<Utc>) -> Option<Signal> {
        let mut entries = self.entries.lock();
        let dropped = if entries.len() >= self.capacity {
            entries.pop_front().map(|e| e.signal)
        } else {
            None
        };
        let retry_at = now + chrono::Duration::from_std(backoff_for_attempt(1)).expect("bounded duration");
        entries.push_back(BackloggedSignal { signal, attempts: 1, retry_at });
        dropped
    }

    /// Pops every entry whose backoff window has elapsed by `now`.
    /// Entries that have exhausted `MAX_RETRIES_PER_SIGNAL` come back as
    /// [`DrainedOutcome::Terminal`]; everything else is re-enqueued with
    /// the next backoff and returned as [`DrainedOutcome::Retry`].
    pub fn drain_ready(&self, now: DateTime<Utc>) -> Vec<DrainedOutcome> {
        let mut entries = self.entries.lock();
        let mut ready = Vec::new();
        let mut remaining = VecDeque::with_capacity(entries.len());

        for entry in entries.drain(..) {
            if entry.retry_at > now {
                remaining.push_back(entry);
                continue;
            }
            if entry.attempts >= MAX_RETRIES_PER_SIGNAL {
                ready.push(DrainedOutcome::Terminal(entry.signal));
            } else {
                ready.push(DrainedOutcome::Retry(entry.signal.clone()));
                let next_attempt = entry.attempts + 1;
                let retry_at = now
                    + chrono::Duration::from_std(backoff_for_attempt(next_attempt)).expect("bounded duration");
                remaining.push_back(BackloggedSignal { signal: entry.signal, attempts: next_attempt, retry_at });
            }
        }

        *entries = remaining;
        ready
    }
}
