//! Checkpoint daemon — entry point for running the admission gate.

mod config;
mod error;

use checkpoint_admission::AdmissionGate;
use checkpoint_rpc::RpcServer;
use checkpoint_store::JsonFileStore;
use clap::Parser;
use config::GateConfig;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "checkpoint-daemon", about = "Anti-automation admission gate")]
struct Cli {
    /// Port for the HTTP server.
    #[arg(long, env = "CHECKPOINT_PORT")]
    port: Option<u16>,

    /// Path of the JSON ticket file.
    #[arg(long, env = "CHECKPOINT_DATA_FILE")]
    data_file: Option<PathBuf>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "CHECKPOINT_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format: "human" or "json".
    #[arg(long, env = "CHECKPOINT_LOG_FORMAT")]
    log_format: Option<String>,

    /// Path to a TOML configuration file. If provided, file settings
    /// are used as the base; CLI flags and env vars override them.
    #[arg(long, env = "CHECKPOINT_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load the file config before tracing is up; any warning is deferred
    // until the subscriber exists.
    let mut deferred_warning: Option<String> = None;
    let file_config: Option<GateConfig> = if let Some(ref config_path) = cli.config {
        match std::fs::read_to_string(config_path) {
            Ok(contents) => match toml::from_str::<GateConfig>(&contents) {
                Ok(cfg) => Some(cfg),
                Err(e) => {
                    deferred_warning =
                        Some(format!("Failed to parse config file: {e}, using CLI defaults"));
                    None
                }
            },
            Err(e) => {
                deferred_warning = Some(format!(
                    "Failed to read config file {}: {e}, using CLI defaults",
                    config_path.display()
                ));
                None
            }
        }
    } else {
        None
    };

    let base = file_config.unwrap_or_default();
    let config = GateConfig {
        port: cli.port.unwrap_or(base.port),
        data_file: cli.data_file.unwrap_or(base.data_file),
        log_level: cli.log_level.unwrap_or(base.log_level),
        log_format: cli.log_format.unwrap_or(base.log_format),
        params: base.params,
    };

    checkpoint_utils::init_tracing(&config.log_level, config.log_format == "json");
    if let Some(warning) = deferred_warning {
        tracing::warn!("{warning}");
    } else if let Some(ref path) = cli.config {
        tracing::info!("Loaded config from {}", path.display());
    }

    tracing::info!(
        "Starting checkpoint gate on port {} (tickets: {})",
        config.port,
        config.data_file.display()
    );

    let store = Arc::new(JsonFileStore::open(&config.data_file));
    let gate = AdmissionGate::new(store, config.params);
    let server = RpcServer::new(config.port, gate);

    tokio::select! {
        result = server.start() => result?,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received — stopping gate");
        }
    }

    tracing::info!("Checkpoint daemon exited cleanly");
    Ok(())
}
