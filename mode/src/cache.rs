//! In-process mode cache, updated synchronously by the Morphic Governor
//! and read synchronously by everything else via
//! [`titan_runtime::ModeReader`].
//!
//! `ModeReader::current_mode` is a synchronous call (module ticks can't
//! await a bus round-trip just to read the mode), so the Governor — the
//! single writer of `titan:mode:{tenant}` — keeps this cache in lockstep
//! with every successful write instead of readers going to the bus.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use titan_config::MorphicMode;
use titan_runtime::ModeReader;

#[derive(Default)]
pub struct ModeCache {
    modes: RwLock<HashMap<String, MorphicMode>>,
}

impl fmt::Debug for ModeCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModeCache").finish_non_exhaustive()
    }
}

impl ModeCache {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn get(&self, tenant: &str) -> MorphicMode {
        self.modes.read().get(tenant).copied().unwrap_or(MorphicMode::Default)
    }

    pub fn set(&self, tenant: &str, mode: MorphicMode) {
        self.modes.write().insert(tenant.to_string(), mode);
    }
}

impl ModeReader for ModeCache {
    fn current_mode(&self, tenant: &str) -> String {
        self.get(tenant).as_str().to_string()
    }
}
