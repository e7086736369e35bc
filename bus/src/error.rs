//! Errors surfaced by the [`crate::Bus`] facade.
//!
//! Variant names match the error-kind taxonomy from the coordination core
//! specification so they double as stable metric labels.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors a [`crate::Bus`] implementation can return. The `Display` of each
/// variant is the stable `error_kind` label used in structured logs and
/// metrics.
#[derive(Debug, Clone, Eq, PartialEq, Deserialize, Serialize, Error)]
pub enum BusError {
    /// `set` was called with a nonpositive TTL.
    #[error("InvalidTTL")]
    InvalidTTL,

    /// The primary backend is unreachable and failover has not yet
    /// completed; callers should retry with backoff.
    #[error("TransientUnavailable")]
    TransientUnavailable,

    /// A write targeted a key or channel outside the calling module's
    /// declared prefixes, rejected by a last-mile prefix guard in front of
    /// the backend (`titan_namespace::GuardedBus`).
    #[error("PrefixViolation: {0}")]
    PrefixViolation(String),

    /// The backend rejected the operation for a reason outside the
    /// taxonomy above (serialization failure, backend-specific fault).
    #[error("Fatal: {0}")]
    Fatal(String),
}
