use crate::error::RegistryError;
use crate::types::{ModuleRecord, ModuleStatus};
use chrono::Utc;
use std::sync::Arc;
use titan_bus::{Bus, Payload};
use titan_namespace::Key;

/// Default record TTL, refreshed by heartbeat (`spec.md` §4.4).
pub const RECORD_TTL_MS: i64 = 24 * 60 * 60 * 1000;

/// Process-wide catalog of modules and their declared capabilities,
/// persisted on the [`Bus`] under `titan:registry:{module}:meta` /
/// `titan:registry:status:{module}`.
#[derive(Debug, Clone)]
pub struct Registry {
    bus: Arc<dyn Bus>,
}

impl Registry {
    pub fn new(bus: Arc<dyn Bus>) -> Self {
        Self { bus }
    }

    /// Registers `record`. Idempotent on `(name, version)`: re-registering
    /// refreshes metadata and the heartbeat TTL but never silently retires
    /// an existing record (`spec.md` §4.4).
    pub async fn register(&self, mut record: ModuleRecord) -> Result<ModuleRecord, RegistryError> {
        if let Some(existing) = self.get(&record.name).await? {
            if existing.identity() == record.identity() && existing.status != ModuleStatus::Retired
            {
                record.status = existing.status;
                record.restart_count = existing.restart_count;
                record.created_at = existing.created_at;
            }
        }
        self.persist(&record).await?;
        Ok(record)
    }

    /// Refreshes `last_heartbeat_at` and the record's TTL. Called by every
    /// Module Runtime instance on each successful tick, and by the Health
    /// Monitor.
    pub async fn heartbeat(&self, name: &str) -> Result<(), RegistryError> {
        let mut record = self
            .get(name)
            .await?
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))?;
        record.last_heartbeat_at = Utc::now();
        self.persist(&record).await
    }

    pub async fn get(&self, name: &str) -> Result<Option<ModuleRecord>, RegistryError> {
        let key = Key::registry_meta(name);
        match self.bus.get(&key).await? {
            Some(payload) => {
                let record: ModuleRecord = serde_json::from_slice(&payload)
                    .map_err(|e| RegistryError::NotFound(format!("corrupt record {name}: {e}")))?;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    pub async fn set_status(&self, name: &str, status: ModuleStatus) -> Result<(), RegistryError> {
        let mut record = self
            .get(name)
            .await?
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))?;
        record.status = status;
        self.persist(&record).await
    }

    pub async fn increment_restart_count(&self, name: &str) -> Result<u32, RegistryError> {
        let mut record = self
            .get(name)
            .await?
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))?;
        record.restart_count += 1;
        let count = record.restart_count;
        self.persist(&record).await?;
        Ok(count)
    }

    /// Lists every currently registered module name.
    pub async fn list(&self) -> Result<Vec<ModuleRecord>, RegistryError> {
        let keys = self.bus.scan("titan:registry:").await?;
        let mut records = Vec::new();
        for key in keys {
            if !key.ends_with(":meta") {
                continue;
            }
            if let Some(payload) = self.bus.get(&key).await? {
                if let Ok(record) = serde_json::from_slice::<ModuleRecord>(&payload) {
                    records.push(record);
                }
            }
        }
        Ok(records)
    }

    async fn persist(&self, record: &ModuleRecord) -> Result<(), RegistryError> {
        let payload = Payload::from(serde_json::to_vec(record).expect("ModuleRecord is Serialize"));
        self.bus
            .set(&Key::registry_meta(&record.name), payload.clone(), RECORD_TTL_MS)
            .await?;
        self.bus
            .set(&Key::registry_status(&record.name), Payload::from(record.status_json()), RECORD_TTL_MS)
            .await?;
        Ok(())
    }
}

impl ModuleRecord {
    fn status_json(&self) -> Vec<u8> {
        serde_json::to_vec(&self.status).expect("ModuleStatus is Serialize")
    }
}
