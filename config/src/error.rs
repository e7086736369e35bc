use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Bus: {0}")]
    Bus(#[from] titan_bus::BusError),

    #[error("malformed config: {0}")]
    Malformed(String),

    #[error("missing required field: {0}")]
    MissingField(String),

    #[error("ConfigDrift: in-process digest {in_process} does not match stored digest {stored}")]
    Drift { in_process: String, stored: String },
}
