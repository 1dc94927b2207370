//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod cook;
mod farm;
mod path;
mod report;

pub use cook::CookArgs;
pub use farm::FarmCommands;
pub use path::PathCommands;
pub use report::ReportArgs;

use anyhow::Result;
use clap::Subcommand;

use crate::config::Config;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Cook a list of work items on the farm
    Cook(CookArgs),
    /// Farm inspection
    Farm {
        #[command(subcommand)]
        command: FarmCommands,
    },
    /// Report to the scheduler from inside a farm task
    Report(ReportArgs),
    /// Path localization helpers
    Path {
        #[command(subcommand)]
        command: PathCommands,
    },
}

/// Handle a CLI command
///
/// Routes the command to the appropriate handler module.
///
/// # Arguments
/// * `command` - The command to execute
/// * `config` - The CLI configuration
pub async fn handle_command(command: Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Cook(args) => cook::handle_cook_command(args, config).await,
        Commands::Farm { command } => farm::handle_farm_command(command, config).await,
        Commands::Report(args) => report::handle_report_command(args).await,
        Commands::Path { command } => path::handle_path_command(command),
    }
}
