use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced while validating or composing namespace keys.
#[derive(Debug, Clone, Eq, PartialEq, Deserialize, Serialize, Error)]
pub enum NamespaceError {
    /// A module attempted to write outside its declared key prefixes.
    #[error("NamespaceViolation: module {module} wrote outside its declared prefixes: {key}")]
    Violation { module: String, key: String },
}
