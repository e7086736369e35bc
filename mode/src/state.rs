//! Mode state: the durable, versioned record at `titan:mode:{tenant}`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use titan_config::MorphicMode;

/// `TenantId` re-exported from [`titan_namespace`] for callers that only
/// depend on `titan-mode`.
pub use titan_namespace::TenantId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModeState {
    pub tenant: SmolStr,
    pub mode: MorphicMode,
    pub version: u64,
    pub updated_at: DateTime<Utc>,
    pub requested_by: SmolStr,
}

impl ModeState {
    pub fn initial(tenant: &TenantId, now: DateTime<Utc>) -> Self {
        Self {
            tenant: tenant.0.clone(),
            mode: MorphicMode::Default,
            version: 0,
            updated_at: now,
            requested_by: SmolStr::new("system"),
        }
    }
}
