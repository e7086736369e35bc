//! Health Monitor: per-module score from four indicators, escalating to
//! canary/retired status on repeated breaches, per `spec.md` §4.4.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The four indicators the Health Monitor samples for a module, each in
/// `[0, 1]` where `0` is healthy and `1` is maximally unhealthy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct HealthIndicators {
    pub ttl_decay_ratio: f64,
    pub pending_task_leak: f64,
    pub memory_growth: f64,
    pub cpu_overuse: f64,
}

/// Indicator weights fixed in `SPEC_FULL.md` §9 (sum to 1.0).
const WEIGHT_TTL_DECAY: f64 = 0.3;
const WEIGHT_PENDING_TASK_LEAK: f64 = 0.3;
const WEIGHT_MEMORY_GROWTH: f64 = 0.2;
const WEIGHT_CPU_OVERUSE: f64 = 0.2;

/// A score below this threshold triggers a restart (`spec.md` §4.4).
pub const RESTART_THRESHOLD: f64 = 0.5;

/// Three consecutive restart triggers mark the module `canary`.
pub const CANARY_AFTER_CONSECUTIVE: u32 = 3;

/// Five escalations (cumulative triggers) mark the module `retired`.
pub const RETIRED_AFTER_ESCALATIONS: u32 = 5;

/// Computes a module health score as the weighted average of its
/// indicators. Score is in `[0, 1]`; `1` is perfectly healthy.
pub fn score(indicators: &HealthIndicators) -> f64 {
    let unhealth = WEIGHT_TTL_DECAY * indicators.ttl_decay_ratio
        + WEIGHT_PENDING_TASK_LEAK * indicators.pending_task_leak
        + WEIGHT_MEMORY_GROWTH * indicators.memory_growth
        + WEIGHT_CPU_OVERUSE * indicators.cpu_overuse;
    (1.0 - unhealth).clamp(0.0, 1.0)
}

/// What the Health Monitor decided to do after evaluating one module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HealthVerdict {
    Healthy,
    RestartRequested,
    MarkedCanary,
    MarkedRetired,
}

#[derive(Debug, Default, Clone, Copy)]
struct EscalationState {
    consecutive_triggers: u32,
    total_escalations: u32,
}

/// Tracks per-module escalation state across successive health
/// evaluations. One instance is owned by the process-wide Health Monitor
/// worker.
#[derive(Debug, Default)]
pub struct HealthMonitor {
    state: Mutex<HashMap<String, EscalationState>>,
}

impl HealthMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Evaluates `indicators` for `module`, updating escalation state and
    /// returning the resulting verdict.
    pub fn evaluate(&self, module: &str, indicators: &HealthIndicators) -> (f64, HealthVerdict) {
        let module_score = score(indicators);
        let mut state = self.state.lock();
        let entry = state.entry(module.to_string()).or_default();

        if module_score < RESTART_THRESHOLD {
            entry.consecutive_triggers += 1;
            entry.total_escalations += 1;

            let verdict = if entry.total_escalations >= RETIRED_AFTER_ESCALATIONS {
                HealthVerdict::MarkedRetired
            } else if entry.consecutive_triggers >= CANARY_AFTER_CONSECUTIVE {
                HealthVerdict::MarkedCanary
            } else {
                HealthVerdict::RestartRequested
            };
            (module_score, verdict)
        } else {
            entry.consecutive_triggers = 0;
            (module_score, HealthVerdict::Healthy)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn healthy_indicators_score_near_one() {
        let indicators = HealthIndicators::default();
        assert_eq!(score(&indicators), 1.0);
    }

    #[test]
    fn fully_unhealthy_indicators_score_zero() {
        let indicators = HealthIndicators {
            ttl_decay_ratio: 1.0,
            pending_task_leak: 1.0,
            memory_growth: 1.0,
            cpu_overuse: 1.0,
        };
        assert_eq!(score(&indicators), 0.0);
    }

    #[test]
    fn three_consecutive_breaches_mark_canary_then_five_total_mark_retired() {
        let monitor = HealthMonitor::new();
        let unhealthy = HealthIndicators {
            ttl_decay_ratio: 1.0,
            pending_task_leak: 1.0,
            memory_growth: 1.0,
            cpu_overuse: 1.0,
        };

        let (_, v1) = monitor.evaluate("router", &unhealthy);
        let (_, v2) = monitor.evaluate("router", &unhealthy);
        let (_, v3) = monitor.evaluate("router", &unhealthy);
        assert_eq!(v1, HealthVerdict::RestartRequested);
        assert_eq!(v2, HealthVerdict::RestartRequested);
        assert_eq!(v3, HealthVerdict::MarkedCanary);

        let (_, v4) = monitor.evaluate("router", &unhealthy);
        let (_, v5) = monitor.evaluate("router", &unhealthy);
        assert_eq!(v4, HealthVerdict::MarkedCanary);
        assert_eq!(v5, HealthVerdict::MarkedRetired);
    }

    #[test]
    fn recovering_resets_consecutive_counter() {
        let monitor = HealthMonitor::new();
        let unhealthy = HealthIndicators {
            ttl_decay_ratio: 1.0,
            pending_task_leak: 1.0,
            memory_growth: 1.0,
            cpu_overuse: 1.0,
        };
        monitor.evaluate("router", &unhealthy);
        monitor.evaluate("router", &unhealthy);
        let (_, healthy_verdict) = monitor.evaluate("router", &HealthIndicators::default());
        assert_eq!(healthy_verdict, HealthVerdict::Healthy);
        let (_, next) = monitor.evaluate("router", &unhealthy);
        assert_eq!(next, HealthVerdict::RestartRequested);
    }
}
