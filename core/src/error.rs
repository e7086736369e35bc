//! Central error type aggregating every subsystem's error enum, per
//! `spec.md` §7 / `SPEC_FULL.md` §7 — one `#[derive(Error)]` enum with
//! `#[from]` per crate, each variant's `Display` doubling as the stable
//! metric label workers record under `error_total[kind]`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TitanError {
    #[error("Bus: {0}")]
    Bus(#[from] titan_bus::BusError),

    #[error("Namespace: {0}")]
    Namespace(#[from] titan_namespace::NamespaceError),

    #[error("Runtime: {0}")]
    Runtime(#[from] titan_runtime::RuntimeError),

    #[error("Registry: {0}")]
    Registry(#[from] titan_registry::RegistryError),

    #[error("Config: {0}")]
    Config(#[from] titan_config::ConfigError),

    #[error("Mode: {0}")]
    Mode(#[from] titan_mode::ModeError),

    #[error("Signal: {0}")]
    Signal(#[from] titan_signal::SignalError),

    #[error("Capital: {0}")]
    Capital(#[from] titan_capital::CapitalError),

    #[error("Execution: {0}")]
    Execution(#[from] titan_execution::ExecutionError),

    #[error("Failover: {0}")]
    Failover(#[from] titan_failover::FailoverError),

    #[error("ConfigDrift: {0}")]
    ConfigDrift(String),
}
