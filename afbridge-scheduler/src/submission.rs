//! Submission builder
//!
//! Produces the farm job description for a work item. Pure: configuration and
//! session values are read once per submission.

use std::collections::BTreeMap;

use afbridge_core::domain::job::{JobDescription, TaskSpec};
use afbridge_core::domain::work_item::WorkItem;
use afbridge_core::tokens::{self, ITEM_NAME_PREFIX};

use crate::config::SchedulerConfig;
use crate::error::{Result, SchedulerError};
use crate::session::SessionContext;

/// Service and parser used for every submitted block
pub const GENERIC_SERVICE: &str = "generic";

/// Builds the job description for `item`
///
/// # Arguments
/// * `item` - Work item being scheduled
/// * `command_line` - Materialized command of the item
/// * `config` - Current scheduler configuration
/// * `session` - Context of the running cook
///
/// # Errors
/// [`SchedulerError::Configuration`] when the result server address is
/// unknown or the job limits are inconsistent.
pub fn build(
    item: &WorkItem,
    command_line: &str,
    config: &SchedulerConfig,
    session: &SessionContext,
) -> Result<JobDescription> {
    if session.result_server.is_empty() {
        return Err(SchedulerError::configuration(
            "result server address is not known",
        ));
    }
    if config.capacity <= 0 {
        return Err(SchedulerError::configuration(format!(
            "capacity must be positive, got {}",
            config.capacity
        )));
    }
    let max_run_time = config.max_run_time();
    if !max_run_time.is_zero() && config.min_run_time > max_run_time {
        return Err(SchedulerError::configuration(
            "min_run_time cannot exceed max_run_time",
        ));
    }

    let temp_dir = session.dirs.temp_dir(false);
    let environment: BTreeMap<String, String> = [
        (tokens::env::RESULT_SERVER, session.result_server.clone()),
        (
            tokens::env::ITEM_NAME,
            format!("{}{}", ITEM_NAME_PREFIX, item.name),
        ),
        (tokens::env::DIR, session.dirs.work_dir(false).to_string()),
        (tokens::env::TEMP, temp_dir.clone()),
        (tokens::env::SHARED_TEMP, temp_dir),
        (tokens::env::INDEX, item.index.to_string()),
        (tokens::env::INDEX4, format!("{:04}", item.index)),
        (tokens::env::SCRIPT_DIR, session.dirs.script_dir(false)),
        (tokens::env::JOB_ID, session.cook_id.to_string()),
        (tokens::env::JOB_ID_VAR, tokens::env::JOB_ID.to_string()),
    ]
    .into_iter()
    .map(|(name, value)| (name.to_string(), value))
    .collect();

    Ok(JobDescription {
        name: format!("{}{}", ITEM_NAME_PREFIX, item.node_name),
        user_name: config.user_name.clone(),
        host_name: config.host_name.clone(),
        branch: config.job_branch.clone(),
        depend_mask: config.depend_mask.clone(),
        depend_mask_global: config.depend_mask_global.clone(),
        priority: config.priority,
        max_running_tasks: config.max_running_tasks,
        max_running_tasks_per_host: config.max_running_tasks_per_host,
        hosts_mask: config.hosts_mask.clone(),
        hosts_mask_exclude: config.hosts_mask_exclude.clone(),
        capacity: config.capacity,
        service: GENERIC_SERVICE.to_string(),
        parser: GENERIC_SERVICE.to_string(),
        task: TaskSpec {
            name: item.name.clone(),
            command_line: command_line.to_string(),
            environment,
            min_run_time: config.min_run_time,
            max_run_time,
        },
    })
}
