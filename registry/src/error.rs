use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Eq, PartialEq, Deserialize, Serialize, Error)]
pub enum RegistryError {
    #[error("Bus: {0}")]
    Bus(#[from] titan_bus::BusError),

    #[error("NotFound: {0}")]
    NotFound(String),

    #[error("Namespace: {0}")]
    Namespace(#[from] titan_namespace::NamespaceError),
}
