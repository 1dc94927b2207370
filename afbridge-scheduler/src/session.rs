//! Per-cook session context
//!
//! Directory layout on the shared filesystem and the values every submission
//! of the current cook shares.

use std::path::Path;

use crate::config::SchedulerConfig;
use crate::error::{Result, SchedulerError};

const TEMP_DIR: &str = "pdgtemp";
const SCRIPT_DIR: &str = "scripts";
const LOG_DIR: &str = "logs";

/// Job directory as seen locally and from farm hosts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkingDirs {
    local: String,
    remote: String,
}

impl WorkingDirs {
    /// Resolves the job directory from the shared roots
    ///
    /// The remote directory equals the local one unless a remote shared root
    /// is configured.
    pub fn resolve(config: &SchedulerConfig) -> Result<Self> {
        config.validate()?;

        let working = config.working_dir.trim_matches(|c| c == '/' || c == '\\');
        let local_root = config.local_shared_root.to_string_lossy().replace('\\', "/");
        let local = join(&local_root, working);
        let remote = match config.remote_shared_root.as_deref() {
            Some(root) if !root.is_empty() => join(&root.replace('\\', "/"), working),
            _ => local.clone(),
        };

        Ok(Self { local, remote })
    }

    pub fn work_dir(&self, local: bool) -> &str {
        if local { &self.local } else { &self.remote }
    }

    pub fn temp_dir(&self, local: bool) -> String {
        format!("{}/{}", self.work_dir(local), TEMP_DIR)
    }

    pub fn script_dir(&self, local: bool) -> String {
        format!("{}/{}", self.temp_dir(local), SCRIPT_DIR)
    }

    pub fn log_dir(&self, local: bool) -> String {
        format!("{}/{}", self.temp_dir(local), LOG_DIR)
    }

    /// Creates the local job, temp, script and log directories
    pub fn create_local(&self) -> Result<()> {
        for dir in [self.script_dir(true), self.log_dir(true)] {
            std::fs::create_dir_all(&dir).map_err(|e| SchedulerError::io(&dir, e))?;
        }
        Ok(())
    }
}

fn join(root: &str, relative: &str) -> String {
    let root = root.trim_end_matches('/');
    if relative.is_empty() || relative == "." {
        return root.to_string();
    }
    format!("{}/{}", root, relative)
}

/// Everything a submission of the running cook needs besides the item
#[derive(Debug, Clone)]
pub struct SessionContext {
    /// Monotonic cook counter, exported to tasks as their job token
    pub cook_id: u64,
    /// `host:port` of the report channel
    pub result_server: String,
    pub dirs: WorkingDirs,
    pub python_bin: String,
    pub hython_bin: String,
}

impl SessionContext {
    /// `file:///` URI of an item's log
    pub fn log_uri(&self, item_name: &str) -> String {
        format!("file:///{}/{}.log", self.dirs.log_dir(true), item_name)
    }
}

/// Whether the local shared root can be used
pub fn check_shared_root(config: &SchedulerConfig) -> Result<()> {
    let root: &Path = &config.local_shared_root;
    if !root.is_dir() {
        return Err(SchedulerError::configuration(format!(
            "local shared root not found: {}",
            root.display()
        )));
    }
    Ok(())
}
