//! Tenant Rate Limiter: tracks per-tenant API-call counts and gates a
//! tenant's outbound traffic for a window on overshoot (`spec.md` §4.8).

use crate::error::CapitalError;
use parking_lot::Mutex;
use std::collections::HashMap;

pub const DEFAULT_MAX_CALLS_PER_WINDOW: u64 = 100;
pub const DEFAULT_WINDOW_MS: i64 = 60_000;

#[derive(Debug, Clone, Copy)]
struct Window {
    started_at_ms: i64,
    count: u64,
}

/// One instance per process; owns every tenant's current window
/// in-process, matching the sliding-window style already used by the
/// signal pipeline's Noise Reducer.
#[derive(Debug)]
pub struct TenantRateLimiter {
    max_calls: u64,
    window_ms: i64,
    windows: Mutex<HashMap<String, Window>>,
}

impl TenantRateLimiter {
    pub fn new(max_calls: u64, window_ms: i64) -> Self {
        Self { max_calls, window_ms, windows: Mutex::new(HashMap::new()) }
    }

    /// Records one API call for `tenant` at `now_ms`, rolling the window
    /// over if it has elapsed. Returns `RateLimited` if this call pushes
    /// the tenant over `max_calls` within the current window.
    pub fn record_call(&self, tenant: &str, now_ms: i64) -> Result<(), CapitalError> {
        let mut windows = self.windows.lock();
        let window = windows.entry(tenant.to_string()).or_insert(Window { started_at_ms: now_ms, count: 0 });

        if now_ms - window.started_at_ms >= self.window_ms {
            window.started_at_ms = now_ms;
            window.count = 0;
        }
        window.count += 1;

        if window.count > self.max_calls {
            return Err(CapitalError::RateLimited { tenant: tenant.to_string(), limit: self.max_calls });
        }
        Ok(())
    }

    /// Whether `tenant` is currently over its limit within the active
    /// window, without recording a new call.
    pub fn is_gated(&self, tenant: &str, now_ms: i64) -> bool {
        let windows = self.windows.lock();
        match windows.get(tenant) {
            Some(window) if now_ms - window.started_at_ms < self.window_ms => window.count > self.max_calls,
            _ => false,
        }
    }
}
