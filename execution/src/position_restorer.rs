//! Position Restorer: on startup, reads each tenant's last journaled
//! open positions and re-asserts them to the Execution Controller so a
//! restart doesn't lose track of open exposure (`spec.md` §3 Position
//! model, §4.9).

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::fmt::Debug;
use std::sync::Arc;
use titan_bus::Bus;
use titan_namespace::{Key, TenantId};

use crate::error::ExecutionError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub tenant: SmolStr,
    pub symbol: SmolStr,
    pub quantity: Decimal,
    pub avg_entry_price: Decimal,
}

/// Source of journaled positions. Mirrors `titan_runtime::ModeReader`'s
/// inversion of the storage dependency so this module can be tested
/// against a fixed fixture instead of a live bus.
#[async_trait]
pub trait JournalReader: Send + Sync + Debug {
    async fn read_position(&self, tenant: &TenantId, symbol: &str) -> Result<Option<Position>, ExecutionError>;
}

#[derive(Debug)]
pub struct BusJournalReader {
    bus: Arc<dyn Bus>,
}

impl BusJournalReader {
    pub fn new(bus: Arc<dyn Bus>) -> Self {
        Self { bus }
    }
}

#[async_trait]
impl JournalReader for BusJournalReader {
    async fn read_position(&self, tenant: &TenantId, symbol: &str) -> Result<Option<Position>, ExecutionError> {
        let raw = self.bus.get(&Key::position(tenant, symbol)).await?;
        Ok(raw.and_then(|bytes| serde_json::from_slice(&bytes).ok()))
    }
}

/// Restores the open positions for `symbols` under `tenant`, skipping
/// any that were never journaled. Idempotent: re-running it after a
/// successful restore simply reads the same values back.
pub async fn restore_positions(
    reader: &dyn JournalReader,
    tenant: &TenantId,
    symbols: &[&str],
) -> Result<Vec<Position>, ExecutionError> {
    let mut restored = Vec::with_capacity(symbols.len());
    for symbol in symbols {
        if let Some(position) = reader.read_position(tenant, symbol).await? {
            restored.push(position);
        }
    }
    Ok(restored)
}
