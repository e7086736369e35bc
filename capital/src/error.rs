//! Error kinds for capital allocation and risk gating (`spec.md` §7).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CapitalError {
    #[error(transparent)]
    Bus(#[from] titan_bus::BusError),

    #[error(transparent)]
    Mode(#[from] titan_mode::ModeError),

    #[error("RateLimited: tenant {tenant} exceeded {limit} calls in the current window")]
    RateLimited { tenant: String, limit: u64 },

    #[error("KycDenied: user {user} tier {tier} below required {required}")]
    KycDenied { user: String, tier: u8, required: u8 },

    #[error("JurisdictionDenied: asset {asset} restricted in jurisdiction {jurisdiction}")]
    JurisdictionDenied { asset: String, jurisdiction: String },
}
