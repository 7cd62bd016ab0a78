use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use resilient_probe::{
    host, logging, ClientOptions, EnvConfig, Layered, ManagedService, MapConfig, ResilientClient,
};

/// Call a configured HTTP endpoint once on startup, retrying transient
/// failures, then wait for a shutdown signal.
#[derive(Debug, Parser)]
#[command(name = "resilient-probe", version, about)]
struct Cli {
    /// Base address every request path is resolved against.
    #[arg(long, env = "PROBE_BASE_ADDRESS", default_value = "https://swapi.dev")]
    base_address: String,

    /// Configuration key holding the endpoint path.
    #[arg(long, env = "PROBE_PATH_KEY", default_value = "PROBE_PATH")]
    path_key: String,

    /// Per-request timeout in milliseconds.
    #[arg(long, env = "PROBE_TIMEOUT_MS", default_value_t = 100_000)]
    timeout_ms: u64,

    /// Also append logs to this file (stderr logging stays on).
    #[arg(long, env = "PROBE_LOG_FILE")]
    log_file: Option<PathBuf>,

    /// `key=value` overrides, consulted before environment variables.
    #[arg(value_name = "KEY=VALUE")]
    overrides: Vec<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let logged = match cli.log_file.as_deref() {
        Some(path) => logging::init_logging(path).or_else(|err| {
            eprintln!("resilient-probe: file logging unavailable ({err:#}), using stderr");
            logging::init_logging_stderr()
        }),
        None => logging::init_logging_stderr(),
    };
    if let Err(err) = logged {
        eprintln!("resilient-probe: logging init failed: {err:#}");
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let overrides = MapConfig::from_args(&cli.overrides)?;
    let config = Layered::new(overrides, EnvConfig::new());

    let options = ClientOptions {
        timeout_ms: cli.timeout_ms,
        ..ClientOptions::default()
    };
    let client = ResilientClient::with_options(&cli.base_address, &options)
        .context("building http client")?;
    let service = ManagedService::new(client, config, cli.path_key);

    host::run_until(&service, host::shutdown_signal())
        .await
        .context("service failed to start")?;

    tracing::info!("host stopped");
    Ok(())
}
