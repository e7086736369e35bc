//! Per-client configuration merge: document-wise merge of a default
//! config and `{client_id}_config`, published with an atomic version
//! counter, per `spec.md` §4.5.

use crate::error::ConfigError;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use titan_bus::{Bus, Payload};
use titan_namespace::Key;

/// A merged client config document plus the version it was published
/// under, matching the "atomic swap by version counter" reload semantics
/// of `spec.md` §4.5.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedClientConfig {
    pub client_id: String,
    pub version: u64,
    pub document: Value,
}

/// Recursively merges `client` onto `base`; on key collision the client
/// value wins. Non-object values (including arrays) are replaced
/// wholesale rather than merged element-wise.
pub fn merge_documents(base: &Value, client: &Value) -> Value {
    match (base, client) {
        (Value::Object(base_map), Value::Object(client_map)) => {
            let mut merged = base_map.clone();
            for (key, client_value) in client_map {
                let entry = merged.entry(key.clone()).or_insert(Value::Null);
                *entry = merge_documents(entry, client_value);
            }
            Value::Object(merged)
        }
        (_, client_value) => client_value.clone(),
    }
}

/// Owns the version counter for each client's merged configuration and
/// publishes reloads to [`Key::prod_config`].
#[derive(Debug)]
pub struct ClientConfigStore {
    bus: Arc<dyn Bus>,
    versions: Mutex<HashMap<String, u64>>,
}

/// `prod:config:{client_id}` TTL: refreshed on every reload, long enough
/// to survive the drift guard's hourly cadence without lapsing between
/// reloads.
const PROD_CONFIG_TTL_MS: i64 = 6 * 60 * 60 * 1000;

impl ClientConfigStore {
    pub fn new(bus: Arc<dyn Bus>) -> Self {
        Self { bus, versions: Mutex::new(HashMap::new()) }
    }

    /// Merges `client_override` onto `base`, bumps the client's version
    /// counter, and publishes the result. Callers pass `client_override`
    /// as `Value::Null` (or an empty object) for clients with no
    /// per-client overrides yet.
    pub async fn reload(
        &self,
        client_id: &str,
        base: &Value,
        client_override: &Value,
    ) -> Result<MergedClientConfig, ConfigError> {
        let document = merge_documents(base, client_override);
        let version = {
            let mut versions = self.versions.lock();
            let counter = versions.entry(client_id.to_string()).or_insert(0);
            *counter += 1;
            *counter
        };

        let envelope = serde_json::json!({ "version": version, "config": document });
        let payload = Payload::from(
            serde_json::to_vec(&envelope).map_err(|e| ConfigError::Malformed(e.to_string()))?,
        );
        self.bus
            .set(&Key::prod_config(client_id), payload, PROD_CONFIG_TTL_MS)
            .await?;

        Ok(MergedClientConfig { client_id: client_id.to_string(), version, document })
    }
}
