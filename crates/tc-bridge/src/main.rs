//! Teamcity provider plugin binary.
//!
//! The engine launches this process and exchanges JSON-RPC requests with it:
//!
//! ```bash
//! echo '{"id":1,"method":"get_plugin_info"}' | pulumi-resource-teamcity
//! ```
//!
//! Logs go to stderr so stdout carries protocol traffic only.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, ValueEnum};
use tc_bridge::{Bridge, BridgeConfig, BridgeServer};
use tc_provider::Provider;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
enum LogFormat {
    /// Human-readable lines.
    #[default]
    Plain,
    /// One JSON object per event.
    Json,
}

/// Teamcity resource provider plugin.
#[derive(Parser, Debug)]
#[command(name = "pulumi-resource-teamcity")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Engine address passed by the orchestrator. Unused: requests arrive on stdin.
    engine: Option<String>,

    /// Log output format.
    #[arg(long, env = "TEAMCITY_LOG_FORMAT", value_enum, default_value_t = LogFormat::Plain)]
    log_format: LogFormat,

    /// Log filter directive, e.g. `info` or `tc_provider=debug`.
    #[arg(long, env = "TEAMCITY_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Directory for resource records. Records are kept in memory when unset.
    #[arg(long, env = "TEAMCITY_STATE_DIR")]
    state_dir: Option<PathBuf>,

    /// Maximum number of lifecycle requests handled at once.
    #[arg(
        long,
        env = "TEAMCITY_MAX_IN_FLIGHT",
        default_value_t = tc_bridge::config::DEFAULT_MAX_IN_FLIGHT
    )]
    max_in_flight: usize,
}

fn init_tracing(format: LogFormat, level: &str) -> anyhow::Result<()> {
    let filter = EnvFilter::try_new(level)?;
    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Plain => registry
            .with(fmt::layer().with_writer(io::stderr).with_ansi(false))
            .try_init()?,
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(io::stderr))
            .try_init()?,
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format, &cli.log_level)?;

    info!(version = tc_provider::VERSION, "pulumi-resource-teamcity starting");
    if let Some(engine) = &cli.engine {
        info!(engine = %engine, "engine address ignored, serving stdio");
    }

    let mut config = BridgeConfig::new().with_max_in_flight(cli.max_in_flight);
    if let Some(dir) = cli.state_dir {
        config = config.with_state_dir(dir);
    }

    let bridge = Arc::new(Bridge::open(Provider::teamcity(), &config).await?);
    let server = BridgeServer::new(Arc::clone(&bridge), config);

    tokio::select! {
        result = server.serve_stdio() => result?,
        signal = tokio::signal::ctrl_c() => {
            signal?;
            warn!("interrupted, cancelling in-flight operations");
            bridge.cancel_all();
            bridge.shutdown();
        }
    }

    info!("pulumi-resource-teamcity shutting down");
    Ok(())
}
