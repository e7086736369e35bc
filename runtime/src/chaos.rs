//! Centralized chaos hook.
//!
//! `spec.md` §9 flags "ad-hoc chaos hooks scattered throughout" as a source
//! pattern to remove: this crate gives every Module Runtime instance a
//! single [`ChaosHook`] it consults once per tick. The hook itself is armed
//! by directives from the Chaos Monitor (`titan-failover`) rather than each
//! worker self-injecting failures from an environment variable.

use crate::error::RuntimeError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared chaos arming flag. Cloning is cheap (`Arc` internally); every
/// clone observes the same armed/disarmed state.
#[derive(Debug, Clone)]
pub struct ChaosHook {
    armed: Arc<AtomicBool>,
}

impl Default for ChaosHook {
    fn default() -> Self {
        Self::new()
    }
}

impl ChaosHook {
    pub fn new() -> Self {
        Self {
            armed: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Arms or disarms the hook. Called by the Chaos Monitor when it
    /// publishes a load-shedding directive, or by tests.
    pub fn set_armed(&self, armed: bool) {
        self.armed.store(armed, Ordering::SeqCst);
    }

    pub fn is_armed(&self) -> bool {
        self.armed.load(Ordering::SeqCst)
    }

    /// Consulted once per tick / per message handler. If armed, fails
    /// deterministically with [`RuntimeError::SimulatedFailure`] — the hook
    /// never decides stochastically; the Chaos Monitor's own sampling is
    /// where randomness belongs.
    pub fn check(&self) -> Result<(), RuntimeError> {
        if self.is_armed() {
            Err(RuntimeError::SimulatedFailure)
        } else {
            Ok(())
        }
    }
}
