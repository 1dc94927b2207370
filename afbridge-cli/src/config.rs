//! Configuration module
//!
//! CLI-wide settings layered on top of the scheduler's `AFB_*` environment.

use afbridge_scheduler::SchedulerConfig;
use anyhow::{Context, Result};

/// CLI configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// URL of the Afanasy server
    pub farm_url: String,
}

impl Config {
    /// Scheduler configuration from the environment, with the farm URL flag applied
    pub fn scheduler_config(&self) -> Result<SchedulerConfig> {
        let mut config =
            SchedulerConfig::from_env().context("Invalid scheduler configuration")?;
        config.farm_url = self.farm_url.clone();
        Ok(config)
    }
}
