//! The Signal data model: immutable once emitted, mutated only by
//! creating a new signal that references its parent (`spec.md` §3).

use crate::error::SignalError;
use chrono::{DateTime, Utc};
use derive_more::{Constructor, Display, From};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use titan_config::MorphicMode;
use titan_namespace::TenantId;
use uuid::Uuid;

/// Unique signal identifier. Every derived signal gets a fresh id and
/// carries its ancestor's id in [`Signal::parent_id`] — ids are never
/// reused across generations (`spec.md` §3: "mutations are new signals
/// referencing the parent `id`").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, From, Serialize, Deserialize)]
pub struct SignalId(Uuid);

impl SignalId {
    pub fn new_random() -> Self {
        Self(Uuid::new_v4())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Buy,
    Sell,
}

/// Per-signal flags named in `spec.md` §3 as "a bag of booleans".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalFlags {
    pub direct_override: bool,
    pub chaos: bool,
    pub reinjected: bool,
}

/// The disposition a pipeline stage recorded for a signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Verdict {
    Passed,
    Dropped { reason: String },
    Modified { reason: String },
    Blocked { reason: String },
}

/// One entry in a signal's audit trail: which stage ran and what it
/// decided. `spec.md` §4.7: "every stage is idempotent on `signal.id`
/// and records its verdict in `provenance`".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProvenanceEntry {
    pub stage: SmolStr,
    pub verdict: Verdict,
    pub at: DateTime<Utc>,
}

impl ProvenanceEntry {
    pub fn new(stage: impl Into<SmolStr>, verdict: Verdict, at: DateTime<Utc>) -> Self {
        Self { stage: stage.into(), verdict, at }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Constructor)]
pub struct Signal {
    pub id: SignalId,
    pub timestamp: i64,
    pub symbol: SmolStr,
    pub side: Side,
    pub quantity: Decimal,
    pub price: Option<Decimal>,
    pub leverage: Option<Decimal>,
    pub confidence: Decimal,
    pub strategy: SmolStr,
    pub ttl_ms: i64,
    pub tenant_id: TenantId,
    pub client_id: SmolStr,
    pub morphic_mode: MorphicMode,
    pub flags: SignalFlags,
    pub provenance: Vec<ProvenanceEntry>,
    pub parent_id: Option<SignalId>,
}

impl Signal {
    /// Checks the invariants `spec.md` §3 states for every signal:
    /// `0 <= confidence <= 1`, `quantity > 0`, `ttl_ms > 0`.
    pub fn validate(&self) -> Result<(), SignalError> {
        if self.confidence < Decimal::ZERO || self.confidence > Decimal::ONE {
            return Err(SignalError::Invalid(format!(
                "confidence {} out of range [0, 1]",
                self.confidence
            )));
        }
        if self.quantity <= Decimal::ZERO {
            return Err(SignalError::Invalid(format!("quantity {} must be positive", self.quantity)));
        }
        if self.ttl_ms <= 0 {
            return Err(SignalError::Invalid(format!("ttl_ms {} must be positive", self.ttl_ms)));
        }
        if let Some(leverage) = self.leverage {
            if leverage < Decimal::ONE {
                return Err(SignalError::Invalid(format!("leverage {leverage} must be >= 1")));
            }
        }
        Ok(())
    }

    /// Appends a provenance entry without otherwise mutating the signal,
    /// matching "every transformer appends to `provenance` and never
    /// mutates earlier fields" — callers that need to change a value
    /// field must build a new [`Signal`] via [`Signal::derive`].
    pub fn with_provenance(mut self, entry: ProvenanceEntry) -> Self {
        self.provenance.push(entry);
        self
    }

    /// Produces a new signal referencing `self` as its parent, for
    /// stages that need to change a value field (e.g. the Alignment
    /// Front-Loader scaling `quantity`).
    pub fn derive(&self, mutate: impl FnOnce(&mut Signal)) -> Signal {
        let mut next = self.clone();
        next.id = SignalId::new_random();
        next.parent_id = Some(self.id);
        mutate(&mut next);
        next
    }
}
