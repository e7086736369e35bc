//! `titand`: loads configuration, assembles the system, starts the
//! requested modules, and runs until an operator or the OS asks it to
//! stop (`SPEC_FULL.md` §2 item 12, §6 "Environment / configuration").

mod modules;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use titan_config::TitanConfig;
use titan_core::{System, SystemConfig};
use titan_runtime::ModuleHost;
use tokio::sync::watch;
use tracing::info;

/// The Titan Signal & Execution Coordination Core daemon.
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the TOML configuration document (`spec.md` §6).
    #[arg(long, default_value = "titan.toml")]
    config: PathBuf,

    /// Named modules to start alongside the system's passive workers.
    /// Currently recognized: `heartbeat`.
    #[arg(long = "modules", value_delimiter = ',')]
    modules: Vec<String>,

    /// Where persisted reports (latency heatmap, recovery report) are
    /// written. Falls back to `REPORT_PATH`, then `./reports`.
    #[arg(long)]
    report_dir: Option<PathBuf>,

    /// Emit structured JSON logs instead of human-readable ones.
    #[arg(long)]
    json_logs: bool,
}

fn report_dir(cli: &Cli) -> PathBuf {
    cli.report_dir
        .clone()
        .or_else(|| std::env::var("REPORT_PATH").ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("./reports"))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.json_logs {
        titan_core::init_json_logging();
    } else {
        titan_core::init_logging();
    }

    let report_dir = report_dir(&cli);
    tokio::fs::create_dir_all(&report_dir)
        .await
        .with_context(|| format!("creating report directory {}", report_dir.display()))?;

    let raw_config = tokio::fs::read_to_string(&cli.config)
        .await
        .with_context(|| format!("reading config file {}", cli.config.display()))?;
    let mut config = TitanConfig::from_toml(&raw_config).context("parsing config file")?;
    config.apply_env_overrides(|name| std::env::var(name).ok());

    let system_config = SystemConfig::new(config, report_dir);
    let system = System::build(&system_config).await.context("assembling system")?;
    info!(tenant = %system.tenant, "system assembled");

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let mut handles = Vec::new();
    for module in &cli.modules {
        match module.as_str() {
            "heartbeat" => {
                let host = ModuleHost::with_lifecycle(
                    modules::HeartbeatModule::new(system.heartbeat.clone()),
                    system.runtime_context(),
                    system.lifecycle_sink(),
                );
                handles.push(tokio::spawn(host.run(shutdown_rx.clone())));
            }
            other => {
                info!(module = other, "no standalone runtime loop for this module; it is driven by its owning worker");
            }
        }
    }

    wait_for_shutdown_signal().await?;
    info!("shutdown signal received, draining modules");
    shutdown_tx.send(true).ok();

    for handle in handles {
        if let Err(err) = handle.await {
            tracing::error!(%err, "module task panicked during shutdown");
        }
    }

    Ok(())
}

#[cfg(unix)]
async fn wait_for_shutdown_signal() -> Result<()> {
    use tokio::signal::unix::{signal, SignalKind};
    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    tokio::select! {
        _ = sigint.recv() => {}
        _ = sigterm.recv() => {}
    }
    Ok(())
}

#[cfg(not(unix))]
async fn wait_for_shutdown_signal() -> Result<()> {
    tokio::signal::ctrl_c().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli_with(report_dir: Option<PathBuf>) -> Cli {
        Cli { config: PathBuf::from("titan.toml"), modules: Vec::new(), report_dir, json_logs: false }
    }

    #[test]
    fn explicit_flag_wins_over_env_and_default() {
        let cli = cli_with(Some(PathBuf::from("/tmp/explicit")));
        assert_eq!(report_dir(&cli), PathBuf::from("/tmp/explicit"));
    }

    #[test]
    fn falls_back_to_default_when_nothing_is_set() {
        std::env::remove_var("REPORT_PATH");
        let cli = cli_with(None);
        assert_eq!(report_dir(&cli), PathBuf::from("./reports"));
    }
}
