//! Error kinds surfaced by the failover and observability layer
//! (`spec.md` §7).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FailoverError {
    #[error(transparent)]
    Bus(#[from] titan_bus::BusError),

    #[error("IO error writing report to {path}: {source}")]
    ReportWrite { path: String, #[source] source: std::io::Error },
}
