#![forbid(unsafe_code)]
#![warn(unused, missing_debug_implementations, rust_2018_idioms)]

//! # Namespace — hierarchical keyspace policy
//!
//! Every key written to the [`titan_bus::Bus`] lives under
//! `titan:{tenant}:{domain}:{subdomain}:{id}` (or one of the tenant-less
//! variants named in the keyspace table below). This crate is the single
//! place that knows those shapes: [`compose`] builds the general form,
//! [`Key`]/[`Channel`] expose the normative per-domain shortcuts most
//! callers use, and [`PrefixGuard`] enforces that a module only ever writes
//! under the prefixes it declared at registration. [`GuardedBus`] is the
//! last-mile guard the Bus write path and the Dependency Resolver both
//! consult — wrap a module's bus handle in it and every `set`/`del`/
//! `incr`/`publish` is checked before it reaches the backend.

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::fmt;

pub mod error;
pub mod guarded;
pub use error::NamespaceError;
pub use guarded::GuardedBus;

/// A tenant identifier. Newtype over [`SmolStr`], matching the teacher
/// ecosystem's convention for cheap, clonable string identifiers.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TenantId(pub SmolStr);

impl TenantId {
    pub fn new(value: impl Into<SmolStr>) -> Self {
        Self(value.into())
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The top-level domain segment of a key, per `spec.md` §3 "Keyspace
/// Layout".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    Signal,
    Trade,
    Indicator,
    Capital,
    Registry,
    Health,
    Config,
    Performance,
    Report,
    Control,
    Infra,
    Mode,
    Client,
    Kyc,
}

impl Domain {
    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::Signal => "signal",
            Domain::Trade => "trade",
            Domain::Indicator => "indicator",
            Domain::Capital => "capital",
            Domain::Registry => "registry",
            Domain::Health => "health",
            Domain::Config => "config",
            Domain::Performance => "performance",
            Domain::Report => "report",
            Domain::Control => "control",
            Domain::Infra => "infra",
            Domain::Mode => "mode",
            Domain::Client => "client",
            Domain::Kyc => "kyc",
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `titan:{tenant}:{domain}:{subdomain}:{id}`, the one general-purpose
/// composition rule every tenant-scoped key in `spec.md` §3's keyspace
/// table follows. [`Key`]'s per-domain builders below are the
/// Rust-idiomatic, typed surface callers actually use; most delegate to
/// this function so the layout lives in exactly one place, and a caller
/// that needs a shape the named builders don't cover can call it directly.
pub fn compose(tenant: &TenantId, domain: Domain, subdomain: &str, id: &str) -> String {
    format!("titan:{tenant}:{domain}:{subdomain}:{id}")
}

/// Builders for the normative key shapes in `spec.md` §6. Each associated
/// function returns the exact `titan:...` string; callers never hand-build
/// these with `format!` so a layout change happens in one place.
#[derive(Debug, Clone, Copy)]
pub struct Key;

impl Key {
    /// `titan:{tenant}:signal:{stage}:{symbol}`
    pub fn signal_stage(tenant: &TenantId, stage: &str, symbol: &str) -> String {
        compose(tenant, Domain::Signal, stage, symbol)
    }

    /// `titan:{tenant}:trade:{strategy}:outcome:{i}`
    pub fn trade_outcome(tenant: &TenantId, strategy: &str, i: u64) -> String {
        format!("titan:{tenant}:trade:{strategy}:outcome:{i}")
    }

    /// `titan:{tenant}:indicator:{name}:{symbol}`
    pub fn indicator(tenant: &TenantId, name: &str, symbol: &str) -> String {
        compose(tenant, Domain::Indicator, name, symbol)
    }

    /// `titan:{tenant}:capital:book`
    pub fn capital_book(tenant: &TenantId) -> String {
        format!("titan:{tenant}:capital:book")
    }

    /// `titan:{tenant}:capital:profit_pool`
    pub fn capital_profit_pool(tenant: &TenantId) -> String {
        format!("titan:{tenant}:capital:profit_pool")
    }

    /// `titan:{tenant}:performance:{strategy}:{field}`
    pub fn performance(tenant: &TenantId, strategy: &str, field: &str) -> String {
        compose(tenant, Domain::Performance, strategy, field)
    }

    /// `titan:registry:{module}:meta`
    pub fn registry_meta(module: &str) -> String {
        format!("titan:registry:{module}:meta")
    }

    /// `titan:registry:status:{module}`
    pub fn registry_status(module: &str) -> String {
        format!("titan:registry:status:{module}")
    }

    /// `titan:health:{module}:{indicator}`
    pub fn health(module: &str, indicator: &str) -> String {
        format!("titan:health:{module}:{indicator}")
    }

    /// `titan:infra:config_hash`
    pub fn config_hash() -> &'static str {
        "titan:infra:config_hash"
    }

    /// `titan:infra:failover_active`
    pub fn failover_active() -> &'static str {
        "titan:infra:failover_active"
    }

    /// `titan:infra:registry:violations`
    pub fn registry_violations() -> &'static str {
        "titan:infra:registry:violations"
    }

    /// `titan:mode:{tenant}`
    pub fn mode(tenant: &TenantId) -> String {
        format!("titan:mode:{tenant}")
    }

    /// `titan:client:{client_id}:{field}`
    pub fn client(client_id: &str, field: &str) -> String {
        format!("titan:client:{client_id}:{field}")
    }

    /// `titan:kyc:{user_id}:tier`
    pub fn kyc_tier(user_id: &str) -> String {
        format!("titan:kyc:{user_id}:tier")
    }

    /// `titan:report:tax:{YYYY-MM}`
    pub fn report_tax(year_month: &str) -> String {
        format!("titan:report:tax:{year_month}")
    }

    /// `titan:prod:config:{client_id}`
    pub fn prod_config(client_id: &str) -> String {
        format!("titan:prod:config:{client_id}")
    }

    /// `titan:{tenant}:trade:position:{symbol}`. Not in the normative
    /// keyspace table but required by the Position data model (`spec.md`
    /// §3); placed under the `trade` domain alongside `trade_outcome`.
    pub fn position(tenant: &TenantId, symbol: &str) -> String {
        format!("titan:{tenant}:trade:position:{symbol}")
    }

    /// `titan:{tenant}:capital:rate_limit`
    pub fn rate_limit(tenant: &TenantId) -> String {
        format!("titan:{tenant}:capital:rate_limit")
    }

    /// `titan:infra:system_state`
    pub fn system_state() -> &'static str {
        "titan:infra:system_state"
    }
}

/// Builders for the normative channel names in `spec.md` §6.
#[derive(Debug, Clone, Copy)]
pub struct Channel;

impl Channel {
    pub fn core_signal() -> &'static str {
        "titan:core:signal"
    }

    pub fn tenant_signal_raw(tenant: &TenantId) -> String {
        format!("titan:{tenant}:signal:raw")
    }

    pub fn pipeline_stage(stage: &str) -> String {
        format!("titan:signal:pipeline:{stage}")
    }

    pub fn conflicts() -> &'static str {
        "titan:conflicts"
    }

    pub fn commander_override() -> &'static str {
        "titan:commander_override"
    }

    pub fn mode(tenant: &TenantId) -> String {
        format!("titan:mode:{tenant}")
    }

    pub fn control_manual() -> &'static str {
        "titan:control:manual"
    }

    pub fn restart_queue() -> &'static str {
        "titan:restart_queue"
    }

    pub fn alert() -> &'static str {
        "titan:alert"
    }

    pub fn profit(bucket: &str) -> String {
        format!("titan:profit:{bucket}")
    }

    /// Re-injected signals use a distinct channel from the upstream one
    /// they were derived from, so cycles stay visible (`spec.md` §9,
    /// "Re-entrant publish" re-architecture note).
    pub fn reinjected() -> &'static str {
        "titan:signal:reinjected"
    }

    /// System-wide state transitions (`spec.md` §4.11's
    /// `Normal → Degraded → Hibernating → Recovered` machine, and kill
    /// switches' system-wide `hibernate` broadcast). `spec.md` §4.8 names
    /// the target as `titan:prod:*`, which does not match any channel
    /// family in the normative table (`SPEC_FULL.md` §6); this crate
    /// exposes a dedicated channel instead of a wildcard.
    pub fn system_state() -> &'static str {
        "titan:control:state"
    }
}

/// Validates keys a module attempts to write against the prefixes it
/// declared in its [Module Record](https://titan/registry). Rejects
/// anything outside those prefixes with [`NamespaceError::Violation`].
#[derive(Debug, Clone)]
pub struct PrefixGuard {
    declared: Vec<String>,
}

impl PrefixGuard {
    pub fn new(declared_keys: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            declared: declared_keys.into_iter().map(Into::into).collect(),
        }
    }

    /// Checks whether `key` falls under one of the declared prefixes.
    pub fn allows(&self, key: &str) -> bool {
        self.declared.iter().any(|prefix| key.starts_with(prefix))
    }

    /// Validates `key`, returning [`NamespaceError::Violation`] naming both
    /// the offending key and the module's declared prefixes if it falls
    /// outside them.
    pub fn validate(&self, module: &str, key: &str) -> Result<(), NamespaceError> {
        if self.allows(key) {
            Ok(())
        } else {
            Err(NamespaceError::Violation {
                module: module.to_string(),
                key: key.to_string(),
            })
        }
    }
}
