//! Morphic Governor: validates mode-change requests against policy caps
//! and the requester's declared scope, then applies and broadcasts the
//! new mode, or rejects with `PolicyViolation` (`spec.md` §4.6).
//!
//! The Governor is the single owning worker for `titan:mode:{tenant}`
//! (`spec.md` §5): every other component proposes a change through
//! [`Governor::request_mode_change`] rather than writing the key
//! directly.

use crate::cache::ModeCache;
use crate::error::ModeError;
use crate::policy::PolicyTable;
use crate::state::ModeState;
use chrono::Utc;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::collections::HashMap;
use std::sync::Arc;
use titan_bus::{Bus, Payload};
use titan_config::MorphicMode;
use titan_namespace::{Channel, Key, TenantId};

/// The set of modes a requester is permitted to ask for. A persona
/// shifter acting for tenant risk management might be scoped to
/// `{conservative, default, capital_preservation}`, while an operator
/// console might be scoped to every mode.
#[derive(Debug, Clone)]
pub struct RequesterScope {
    pub allowed_modes: Vec<MorphicMode>,
}

impl RequesterScope {
    pub fn unrestricted() -> Self {
        Self {
            allowed_modes: vec![
                MorphicMode::Default,
                MorphicMode::AlphaPush,
                MorphicMode::Conservative,
                MorphicMode::AggressiveSniper,
                MorphicMode::CapitalPreservation,
                MorphicMode::HighVolatilityDefense,
                MorphicMode::ConservativeBuffer,
            ],
        }
    }

    pub fn restricted(allowed_modes: Vec<MorphicMode>) -> Self {
        Self { allowed_modes }
    }

    fn permits(&self, mode: MorphicMode) -> bool {
        self.allowed_modes.contains(&mode)
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct ModeChangeBroadcast<'a> {
    tenant: &'a str,
    mode: &'a str,
    version: u64,
    requested_by: &'a str,
}

const MODE_STATE_TTL_MS: i64 = 10 * 365 * 24 * 60 * 60 * 1000;

#[derive(Debug)]
pub struct MorphicGovernor {
    bus: Arc<dyn Bus>,
    policy: PolicyTable,
    cache: Arc<ModeCache>,
    states: Mutex<HashMap<String, ModeState>>,
}

impl MorphicGovernor {
    pub fn new(bus: Arc<dyn Bus>, policy: PolicyTable, cache: Arc<ModeCache>) -> Self {
        Self { bus, policy, cache, states: Mutex::new(HashMap::new()) }
    }

    pub fn mode_cache(&self) -> Arc<ModeCache> {
        self.cache.clone()
    }

    /// Validates `requested_mode` against `scope` and the policy table,
    /// then applies and broadcasts it, or returns `PolicyViolation`.
    ///
    /// The caps check here is scope, not the leverage/confidence ceiling
    /// itself — mode *selection* always succeeds if the requester is
    /// scoped to ask for it; it's the Morphic Adapter (`spec.md` §4.6,
    /// "adapter runs last ... policy caps are authoritative") that
    /// actually clamps signal fields to the caps of whatever mode is
    /// active.
    pub async fn request_mode_change(
        &self,
        tenant: &TenantId,
        requested_mode: MorphicMode,
        scope: &RequesterScope,
        requested_by: impl Into<SmolStr>,
    ) -> Result<ModeState, ModeError> {
        if !scope.permits(requested_mode) {
            return Err(ModeError::PolicyViolation(format!(
                "requester not scoped to request mode {requested_mode}"
            )));
        }
        // Mode selection itself is always within caps (caps bound signal
        // fields, not which modes exist); this call exists so a future
        // per-tenant mode allowlist (distinct from requester scope) has a
        // natural hook without changing the call signature.
        let _ = self.policy.caps_for(requested_mode);

        let requested_by = requested_by.into();
        let now = Utc::now();
        let mut states = self.states.lock();
        let previous = states
            .get(tenant.0.as_str())
            .cloned()
            .unwrap_or_else(|| ModeState::initial(tenant, now));

        let new_state = ModeState {
            tenant: tenant.0.clone(),
            mode: requested_mode,
            version: previous.version + 1,
            updated_at: now,
            requested_by,
        };
        states.insert(tenant.0.to_string(), new_state.clone());
        drop(states);

        self.persist_and_broadcast(&new_state).await?;
        self.cache.set(tenant.0.as_str(), requested_mode);
        Ok(new_state)
    }

    pub fn caps_for(&self, mode: MorphicMode) -> crate::policy::PolicyCaps {
        self.policy.caps_for(mode)
    }

    async fn persist_and_broadcast(&self, state: &ModeState) -> Result<(), ModeError> {
        let key = Key::mode(&TenantId::new(state.tenant.clone()));
        let payload = Payload::from(serde_json::to_vec(state).expect("ModeState is Serialize"));
        self.bus.set(&key, payload, MODE_STATE_TTL_MS).await?;

        let broadcast = ModeChangeBroadcast {
            tenant: &state.tenant,
            mode: state.mode.as_str(),
            version: state.version,
            requested_by: &state.requested_by,
        };
        let channel = Channel::mode(&TenantId::new(state.tenant.clone()));
        let broadcast_payload =
            Payload::from(serde_json::to_vec(&broadcast).expect("ModeChangeBroadcast is Serialize"));
        self.bus.publish(&channel, broadcast_payload).await?;
        Ok(())
    }
}
