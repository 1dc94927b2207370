//! afbridge CLI
//!
//! Runs cook sessions against an Afanasy farm, inspects farm jobs, and acts
//! as the reporting helper farm tasks call to talk back to the scheduler.

mod commands;
mod config;
mod console;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, handle_command};
use config::Config;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "afbridge")]
#[command(about = "Work-graph to Afanasy farm bridge", long_about = None)]
struct Cli {
    /// Afanasy server URL
    #[arg(long, env = "AFB_FARM_URL", default_value = "http://localhost:51000")]
    farm_url: String,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "afbridge=info,afbridge_scheduler=info,afbridge_report=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = Config {
        farm_url: cli.farm_url,
    };

    handle_command(cli.command, &config).await
}
