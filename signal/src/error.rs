use thiserror::Error;

#[derive(Debug, Error)]
pub enum SignalError {
    #[error("InvalidSignal: {0}")]
    Invalid(String),

    #[error("DuplicateSignal: {0}")]
    Duplicate(String),

    #[error("Bus: {0}")]
    Bus(#[from] titan_bus::BusError),

    #[error("Namespace: {0}")]
    Namespace(#[from] titan_namespace::NamespaceError),

    #[error("Mode: {0}")]
    Mode(#[from] titan_mode::ModeError),
}
