//! Farm command handlers
//!
//! Read-only inspection of jobs on the Afanasy server.

use afbridge_client::{AfanasyClient, FarmClient};
use afbridge_core::domain::job::{JobId, PollSnapshot};
use afbridge_scheduler::reconcile::{JobState, classify};
use anyhow::{Context, Result};
use clap::Subcommand;
use colored::*;

use crate::config::Config;

/// Farm subcommands
#[derive(Subcommand)]
pub enum FarmCommands {
    /// Show the progress of a job
    Progress {
        /// Afanasy job id
        id: u64,
    },
}

/// Handle farm commands
pub async fn handle_farm_command(command: FarmCommands, config: &Config) -> Result<()> {
    let client = AfanasyClient::new(config.farm_url.clone());

    match command {
        FarmCommands::Progress { id } => show_progress(&client, JobId(id)).await,
    }
}

async fn show_progress(client: &AfanasyClient, id: JobId) -> Result<()> {
    let snapshot = client
        .poll_progress(id)
        .await
        .with_context(|| format!("Failed to query job {}", id))?;

    let state = classify(snapshot.as_ref());
    println!("{}", format!("Job {}:", id).bold());
    println!("  Status:   {}", colorize_state(&state));

    if let Some(snapshot) = &snapshot {
        print_snapshot(snapshot);
    }

    Ok(())
}

fn print_snapshot(snapshot: &PollSnapshot) {
    println!("  Raw:      {}", snapshot.raw_state.trim().dimmed());
    if let Some(started) = snapshot.started_at {
        println!(
            "  Started:  {}",
            started.format("%Y-%m-%d %H:%M:%S").to_string().dimmed()
        );
    }
    if let Some(finished) = snapshot.finished_at {
        println!(
            "  Finished: {}",
            finished.format("%Y-%m-%d %H:%M:%S").to_string().dimmed()
        );
    }
}

fn colorize_state(state: &JobState) -> ColoredString {
    match state {
        JobState::Lost => "LOST".red(),
        JobState::Ghost => "GHOST".red(),
        JobState::Running => "RUNNING".cyan(),
        JobState::Errored => "ERRORED".red(),
        JobState::Done { duration } => format!("DONE ({:.1}s)", duration).green(),
        JobState::Unclassified(raw) => raw.as_str().yellow(),
    }
}
