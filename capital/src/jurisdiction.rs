//! Jurisdiction + KYC Filter: blocks `(asset, jurisdiction)` pairs and
//! `(user, restricted_asset)` when the user's KYC tier is below the
//! required level. Checked at Router time, never earlier, so filtered
//! signals still appear in audits (`spec.md` §4.8).
//!
//! The restricted registry itself is configuration-owned (`spec.md`
//! §3 "Registry of Restricted Assets / Jurisdictions"); KYC tiers are
//! read from the durable `titan:kyc:{user_id}:tier` key.

use crate::error::CapitalError;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use titan_bus::Bus;
use titan_namespace::Key;

/// The configuration-owned restricted-asset/jurisdiction registry
/// (`spec.md` §3).
#[derive(Debug, Clone, Default)]
pub struct RestrictedRegistry {
    blocked_in_jurisdiction: HashSet<(String, String)>,
    required_tier: HashMap<String, u8>,
}

impl RestrictedRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn block_asset_in_jurisdiction(mut self, asset: impl Into<String>, jurisdiction: impl Into<String>) -> Self {
        self.blocked_in_jurisdiction.insert((asset.into(), jurisdiction.into()));
        self
    }

    pub fn require_tier_for_asset(mut self, asset: impl Into<String>, tier: u8) -> Self {
        self.required_tier.insert(asset.into(), tier);
        self
    }
}

#[derive(Debug)]
pub struct JurisdictionKycFilter {
    bus: Arc<dyn Bus>,
    registry: RestrictedRegistry,
}

impl JurisdictionKycFilter {
    pub fn new(bus: Arc<dyn Bus>, registry: RestrictedRegistry) -> Self {
        Self { bus, registry }
    }

    /// Checks `(asset, jurisdiction)` against the restricted registry and,
    /// if the asset names a required KYC tier, `user`'s tier against it.
    pub async fn check(&self, user: &str, asset: &str, jurisdiction: &str) -> Result<(), CapitalError> {
        if self.registry.blocked_in_jurisdiction.contains(&(asset.to_string(), jurisdiction.to_string())) {
            return Err(CapitalError::JurisdictionDenied {
                asset: asset.to_string(),
                jurisdiction: jurisdiction.to_string(),
            });
        }

        if let Some(&required) = self.registry.required_tier.get(asset) {
            let tier = self.kyc_tier(user).await?;
            if tier < required {
                return Err(CapitalError::KycDenied { user: user.to_string(), tier, required });
            }
        }
        Ok(())
    }

    async fn kyc_tier(&self, user: &str) -> Result<u8, CapitalError> {
        let key = Key::kyc_tier(user);
        match self.bus.get(&key).await? {
            Some(payload) => Ok(serde_json::from_slice::<u8>(&payload).unwrap_or(0)),
            None => Ok(0),
        }
    }
}
