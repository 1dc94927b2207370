//! Path command handlers

use afbridge_core::paths::{delocalize_path, localize_path};
use anyhow::Result;
use clap::Subcommand;

/// Path subcommands
#[derive(Subcommand)]
pub enum PathCommands {
    /// Replace `__PDG_*__` tokens and environment variables in a path
    Localize {
        path: String,
    },
    /// Root a local path at `__PDG_DIR__`
    Delocalize {
        path: String,
    },
}

pub fn handle_path_command(command: PathCommands) -> Result<()> {
    match command {
        PathCommands::Localize { path } => println!("{}", localize_path(&path)),
        PathCommands::Delocalize { path } => println!("{}", delocalize_path(&path)),
    }
    Ok(())
}
