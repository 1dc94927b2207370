//! Cook command handler
//!
//! Runs one cook session over a JSON list of work items and waits until every
//! item reached a terminal state. Ctrl-C stops the cook, failing whatever is
//! still on the farm.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use afbridge_core::domain::work_item::{ScheduleResult, WorkItem};
use afbridge_scheduler::AfanasyScheduler;
use anyhow::{Context, Result, bail};
use clap::Args;
use colored::*;
use tracing::info;

use crate::config::Config;
use crate::console::{ConsoleEngine, Outcome};

/// Arguments of `afbridge cook`
#[derive(Args)]
pub struct CookArgs {
    /// JSON file holding an array of work items
    #[arg(long)]
    items: PathBuf,

    /// Shared root as seen from this machine
    #[arg(long, env = "AFB_LOCAL_SHARED_ROOT")]
    shared_root: Option<PathBuf>,

    /// Job directory relative to the shared root
    #[arg(long, env = "AFB_WORKING_DIR")]
    working_dir: Option<String>,

    /// Address farm tasks use to reach this machine
    #[arg(long, env = "AFB_CALLBACK_HOST")]
    callback_host: Option<String>,
}

/// Handle `afbridge cook`
pub async fn handle_cook_command(args: CookArgs, config: &Config) -> Result<()> {
    let items = load_items(&args.items)?;
    if items.is_empty() {
        println!("{}", "No work items to cook.".yellow());
        return Ok(());
    }

    let mut scheduler_config = config.scheduler_config()?;
    if let Some(root) = args.shared_root {
        scheduler_config.local_shared_root = root;
    }
    if let Some(dir) = args.working_dir {
        scheduler_config.working_dir = dir;
    }
    if let Some(host) = args.callback_host {
        scheduler_config.callback_host = host;
    }

    let engine = Arc::new(ConsoleEngine::new(items.iter().map(|i| i.name.clone())));
    let scheduler = AfanasyScheduler::from_config(scheduler_config, engine.clone())
        .context("Failed to create scheduler")?;

    if !scheduler.on_start().await {
        bail!("Failed to start the report channel");
    }

    let nodes: Vec<String> = items
        .iter()
        .map(|i| i.node_name.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    if !scheduler.on_start_cook(false, &nodes).await {
        scheduler.on_stop().await;
        bail!("Failed to start the cook");
    }

    println!(
        "{}",
        format!("Cooking {} item(s) on {}", items.len(), config.farm_url).bold()
    );

    for item in &items {
        match scheduler.on_schedule(item).await {
            ScheduleResult::CookSucceeded => {
                println!("{} {}", "✓ cooked".green(), item.name);
                engine.record(&item.name, Outcome::Cooked);
            }
            ScheduleResult::Succeeded => {
                println!("{} {}", "→ submitted".dimmed(), item.name);
            }
            ScheduleResult::Failed => {
                println!("{} {}", "✗ submission failed".red(), item.name);
                engine.record(&item.name, Outcome::Failed);
            }
        }
    }

    let cancelled = tokio::select! {
        _ = engine.wait_all() => false,
        _ = tokio::signal::ctrl_c() => {
            println!("{}", "⚠ Interrupted, stopping cook".yellow());
            true
        }
    };

    scheduler.on_stop_cook(cancelled).await;
    scheduler.on_stop().await;
    info!("Cook finished");

    engine.print_summary();

    let failures = engine.failures();
    if failures > 0 {
        bail!("{} item(s) did not succeed", failures);
    }
    Ok(())
}

/// Reads work items from a JSON file
fn load_items(path: &Path) -> Result<Vec<WorkItem>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let items: Vec<WorkItem> = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse work items from {}", path.display()))?;

    let mut seen = BTreeSet::new();
    for item in &items {
        if !seen.insert(item.name.as_str()) {
            bail!("Duplicate work item name '{}'", item.name);
        }
    }
    Ok(items)
}
