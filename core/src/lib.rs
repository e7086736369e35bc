#![forbid(unsafe_code)]
#![warn(unused, missing_debug_implementations, rust_2018_idioms)]

//! Wires every Titan SECC crate into one running system: error
//! aggregation, logging init, the shutdown signal, the build-time module
//! manifest, and the system builder that assembles them
//! (`SPEC_FULL.md` §2 item 11, §9).

pub mod error;
pub mod logging;
pub mod manifest;
pub mod shutdown;
pub mod system;

pub use error::TitanError;
pub use logging::{init_json_logging, init_logging};
pub use manifest::default_manifest;
pub use shutdown::{AsyncShutdown, Shutdown, SyncShutdown};
pub use system::{System, SystemConfig};
