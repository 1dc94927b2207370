//! Command tokens and task environment variables
//!
//! Command templates carry `__PDG_*__` tokens that the scheduler replaces
//! before submission. The same names (without the underscores) are exported
//! into the task environment so that remote helpers can resolve them again.

pub const ITEM_NAME: &str = "__PDG_ITEM_NAME__";
pub const INDEX: &str = "__PDG_INDEX__";
pub const SHARED_TEMP: &str = "__PDG_SHARED_TEMP__";
pub const TEMP: &str = "__PDG_TEMP__";
pub const DIR: &str = "__PDG_DIR__";
pub const SCRIPT_DIR: &str = "__PDG_SCRIPTDIR__";
pub const RESULT_SERVER: &str = "__PDG_RESULT_SERVER__";
pub const PYTHON: &str = "__PDG_PYTHON__";
pub const HYTHON: &str = "__PDG_HYTHON__";

/// Environment variable names exported to every farm task
pub mod env {
    pub const RESULT_SERVER: &str = "PDG_RESULT_SERVER";
    pub const ITEM_NAME: &str = "PDG_ITEM_NAME";
    pub const DIR: &str = "PDG_DIR";
    pub const TEMP: &str = "PDG_TEMP";
    pub const SHARED_TEMP: &str = "PDG_SHARED_TEMP";
    pub const INDEX: &str = "PDG_INDEX";
    pub const INDEX4: &str = "PDG_INDEX4";
    pub const SCRIPT_DIR: &str = "PDG_SCRIPTDIR";
    pub const JOB_ID: &str = "PDG_JOBID";
    /// Names the variable holding the job token, so tasks can look it up generically
    pub const JOB_ID_VAR: &str = "PDG_JOBID_VAR";
    pub const PYTHON: &str = "PDG_PYTHON";
    pub const HYTHON: &str = "PDG_HYTHON";
    pub const HFS: &str = "HFS";
}

/// Prefix prepended to item names in the task environment
pub const ITEM_NAME_PREFIX: &str = "workitem_";

/// Item name as exported in `PDG_ITEM_NAME`, without the `workitem_` prefix
pub fn item_name_from_task_env(value: &str) -> &str {
    value.strip_prefix(ITEM_NAME_PREFIX).unwrap_or(value)
}

/// Resolves the job token of the current task through `PDG_JOBID_VAR`
///
/// Returns an empty string when either variable is missing.
pub fn job_token_from<F>(lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    lookup(env::JOB_ID_VAR)
        .and_then(|var| lookup(&var))
        .unwrap_or_default()
}
