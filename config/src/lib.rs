#![forbid(unsafe_code)]
#![warn(unused, missing_debug_implementations, rust_2018_idioms)]

//! Configuration digest, drift guard, and per-client config merge
//! (`spec.md` §4.5).

pub mod client_merge;
pub mod digest;
pub mod document;
pub mod drift_guard;
pub mod error;

pub use client_merge::{merge_documents, ClientConfigStore, MergedClientConfig};
pub use document::{parse_morphic_mode, MorphicMode, ThresholdOverrides, TitanConfig};
pub use drift_guard::{DriftGuard, DriftPolicy, DriftVerdict, DURABLE_TTL_MS};
pub use error::ConfigError;
