//! Logging initialization, matching the teacher ecosystem's
//! `tucano_core::logging` module: human-readable or JSON output,
//! filtered by `RUST_LOG` and defaulting to `INFO`
//! (`SPEC_FULL.md` §7 ambient addition).

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn env_filter() -> tracing_subscriber::filter::EnvFilter {
    tracing_subscriber::filter::EnvFilter::builder()
        .with_default_directive(tracing_subscriber::filter::LevelFilter::INFO.into())
        .from_env_lossy()
}

/// Initializes human-readable logging to stdout.
pub fn init_logging() {
    tracing_subscriber::registry().with(env_filter()).with(tracing_subscriber::fmt::layer()).init()
}

/// Initializes JSON logging for aggregators/observability pipelines.
pub fn init_json_logging() {
    tracing_subscriber::registry()
        .with(env_filter())
        .with(tracing_subscriber::fmt::layer().json().flatten_event(true))
        .init()
}
