use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModeError {
    #[error("Bus: {0}")]
    Bus(#[from] titan_bus::BusError),

    #[error("Namespace: {0}")]
    Namespace(#[from] titan_namespace::NamespaceError),

    #[error("PolicyViolation: {0}")]
    PolicyViolation(String),

    #[error("NotFound: {0}")]
    NotFound(String),
}
