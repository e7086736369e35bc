use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// The kind of work a module performs, per `spec.md` §3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModuleType {
    Signal,
    Filter,
    Router,
    Executor,
    Monitor,
    Config,
}

/// Lifecycle status of a registered module, per `spec.md` §3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModuleStatus {
    Live,
    Deprecated,
    Canary,
    Retired,
}

/// A module's catalog entry: identity, declared capabilities, and
/// liveness, per `spec.md` §3 "Module Record".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleRecord {
    pub name: SmolStr,
    pub version: SmolStr,
    pub creator: SmolStr,
    pub module_type: ModuleType,
    pub status: ModuleStatus,
    pub declared_keys: Vec<String>,
    pub declared_channels: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub last_heartbeat_at: DateTime<Utc>,
    pub restart_count: u32,
}

impl ModuleRecord {
    pub fn new(
        name: impl Into<SmolStr>,
        version: impl Into<SmolStr>,
        creator: impl Into<SmolStr>,
        module_type: ModuleType,
        declared_keys: Vec<String>,
        declared_channels: Vec<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            creator: creator.into(),
            module_type,
            status: ModuleStatus::Live,
            declared_keys,
            declared_channels,
            created_at: now,
            last_heartbeat_at: now,
            restart_count: 0,
        }
    }

    /// Identity used for idempotent re-registration per `spec.md` §4.4:
    /// `(name, version)`.
    pub fn identity(&self) -> (SmolStr, SmolStr) {
        (self.name.clone(), self.version.clone())
    }
}
