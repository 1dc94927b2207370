//! Scheduler configuration
//!
//! Defines every tunable of the adapter: farm connection, report channel
//! binding, shared filesystem layout, interpreter locations and the job
//! parameters stamped onto each submission.

use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;
use std::time::Duration;

use afbridge_report::PortRange;
use serde::Deserialize;

use crate::error::{Result, SchedulerError};
use crate::interpreter::Platform;

/// Prefix of every configuration environment variable
pub const ENV_PREFIX: &str = "AFB_";

/// Scheduler configuration
///
/// The scheduler reads job parameters at submission time, so replacing the
/// configuration between submissions only affects future jobs.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Afanasy server URL (e.g., "http://localhost:51000")
    pub farm_url: String,

    /// Timeout applied to every farm request
    pub request_timeout: Duration,

    /// How often active jobs are polled during a cook
    pub tick_interval: Duration,

    /// Host name or address farm tasks use to reach the report channel
    pub callback_host: String,

    /// Interface the report channel listens on
    pub callback_bind: IpAddr,

    /// Restricts the report channel to a port range; any free port otherwise
    pub callback_ports: Option<PortRange>,

    /// Shared root as seen from this machine
    pub local_shared_root: PathBuf,

    /// Job directory relative to the shared root
    pub working_dir: String,

    /// Shared root as seen from farm hosts, when it differs from the local one
    pub remote_shared_root: Option<String>,

    pub hfs_linux: Option<String>,
    pub hfs_macos: Option<String>,
    pub hfs_windows: Option<String>,
    pub hfs_universal: Option<String>,
    /// Use `hfs_universal` regardless of platform
    pub use_universal_hfs: bool,

    pub job_branch: String,
    pub depend_mask: String,
    pub depend_mask_global: String,
    pub priority: i32,
    /// -1 for unlimited
    pub max_running_tasks: i32,
    /// -1 for unlimited
    pub max_running_tasks_per_host: i32,
    pub hosts_mask: String,
    pub hosts_mask_exclude: String,
    pub capacity: i32,
    pub min_run_time: Duration,
    /// Maximum task run time in hours, 0 for unlimited
    pub max_run_time_hours: u32,

    pub user_name: String,
    pub host_name: String,
}

impl SchedulerConfig {
    /// Creates a new configuration with defaults
    pub fn new(farm_url: String, local_shared_root: PathBuf) -> Self {
        Self {
            farm_url,
            request_timeout: Duration::from_secs(10),
            tick_interval: Duration::from_millis(250),
            callback_host: "127.0.0.1".to_string(),
            callback_bind: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            callback_ports: None,
            local_shared_root,
            working_dir: "pdg".to_string(),
            remote_shared_root: None,
            hfs_linux: None,
            hfs_macos: None,
            hfs_windows: None,
            hfs_universal: None,
            use_universal_hfs: false,
            job_branch: String::new(),
            depend_mask: String::new(),
            depend_mask_global: String::new(),
            priority: 99,
            max_running_tasks: -1,
            max_running_tasks_per_host: -1,
            hosts_mask: String::new(),
            hosts_mask_exclude: String::new(),
            capacity: 1000,
            min_run_time: Duration::ZERO,
            max_run_time_hours: 0,
            user_name: std::env::var("USER")
                .or_else(|_| std::env::var("USERNAME"))
                .unwrap_or_else(|_| "afbridge".to_string()),
            host_name: std::env::var("HOSTNAME").unwrap_or_else(|_| "localhost".to_string()),
        }
    }

    /// Creates configuration from `AFB_*` environment variables
    ///
    /// Unset or unparsable numeric values fall back to their defaults. A
    /// malformed `AFB_CALLBACK_PORTS` is reported as an error.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Like [`from_env`](Self::from_env) against an arbitrary variable source
    ///
    /// `lookup` receives names without the `AFB_` prefix.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(&format!("{}{}", ENV_PREFIX, name));
        let parse_u64 = |name: &str| get(name).and_then(|s| s.parse::<u64>().ok());
        let parse_i32 = |name: &str| get(name).and_then(|s| s.parse::<i32>().ok());

        let mut config = Self::default();

        if let Some(url) = get("FARM_URL") {
            config.farm_url = url;
        }
        if let Some(secs) = parse_u64("REQUEST_TIMEOUT") {
            config.request_timeout = Duration::from_secs(secs);
        }
        if let Some(millis) = parse_u64("TICK_INTERVAL_MS") {
            config.tick_interval = Duration::from_millis(millis);
        }
        if let Some(host) = get("CALLBACK_HOST") {
            config.callback_host = host;
        }
        if let Some(bind) = get("CALLBACK_BIND").and_then(|s| s.parse::<IpAddr>().ok()) {
            config.callback_bind = bind;
        }
        if let Some(ports) = get("CALLBACK_PORTS") {
            config.callback_ports = Some(parse_port_range(&ports)?);
        }
        if let Some(root) = get("LOCAL_SHARED_ROOT") {
            config.local_shared_root = PathBuf::from(root);
        }
        if let Some(dir) = get("WORKING_DIR") {
            config.working_dir = dir;
        }
        config.remote_shared_root = get("REMOTE_SHARED_ROOT");
        config.hfs_linux = get("HFS_LINUX");
        config.hfs_macos = get("HFS_MACOS");
        config.hfs_windows = get("HFS_WINDOWS");
        config.hfs_universal = get("HFS_UNIVERSAL");
        config.use_universal_hfs = get("USE_UNIVERSAL_HFS")
            .map(|s| matches!(s.as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        if let Some(branch) = get("JOB_BRANCH") {
            config.job_branch = branch;
        }
        if let Some(mask) = get("DEPEND_MASK") {
            config.depend_mask = mask;
        }
        if let Some(mask) = get("DEPEND_MASK_GLOBAL") {
            config.depend_mask_global = mask;
        }
        if let Some(priority) = parse_i32("PRIORITY") {
            config.priority = priority;
        }
        if let Some(max) = parse_i32("MAX_RUNNING_TASKS") {
            config.max_running_tasks = max;
        }
        if let Some(max) = parse_i32("MAX_RUNNING_TASKS_PER_HOST") {
            config.max_running_tasks_per_host = max;
        }
        if let Some(mask) = get("HOSTS_MASK") {
            config.hosts_mask = mask;
        }
        if let Some(mask) = get("HOSTS_MASK_EXCLUDE") {
            config.hosts_mask_exclude = mask;
        }
        if let Some(capacity) = parse_i32("CAPACITY") {
            config.capacity = capacity;
        }
        if let Some(secs) = parse_u64("MIN_RUN_TIME") {
            config.min_run_time = Duration::from_secs(secs);
        }
        if let Some(hours) = get("MAX_RUN_TIME_HOURS").and_then(|s| s.parse::<u32>().ok()) {
            config.max_run_time_hours = hours;
        }
        if let Some(user) = get("USER_NAME") {
            config.user_name = user;
        }
        if let Some(host) = get("HOST_NAME") {
            config.host_name = host;
        }

        Ok(config)
    }

    /// Maximum task run time, zero meaning unlimited
    pub fn max_run_time(&self) -> Duration {
        Duration::from_secs(u64::from(self.max_run_time_hours) * 3600)
    }

    /// HFS location configured for `platform`, if any
    pub fn hfs_for(&self, platform: Platform) -> Option<&str> {
        if self.use_universal_hfs {
            return self.hfs_universal.as_deref();
        }
        let path = match platform {
            Platform::Linux => self.hfs_linux.as_deref(),
            Platform::MacOs => self.hfs_macos.as_deref(),
            Platform::Windows => self.hfs_windows.as_deref(),
            Platform::Other => None,
        };
        path.filter(|path| !path.is_empty())
    }

    /// Validates the configuration
    pub fn validate(&self) -> Result<()> {
        if self.farm_url.is_empty() {
            return Err(SchedulerError::configuration("farm_url cannot be empty"));
        }

        if !self.farm_url.starts_with("http://") && !self.farm_url.starts_with("https://") {
            return Err(SchedulerError::configuration(
                "farm_url must start with http:// or https://",
            ));
        }

        if self.tick_interval.is_zero() {
            return Err(SchedulerError::configuration(
                "tick_interval must be greater than 0",
            ));
        }

        if self.callback_host.is_empty() {
            return Err(SchedulerError::configuration("callback_host cannot be empty"));
        }

        if is_absolute(&self.working_dir) {
            return Err(SchedulerError::configuration(format!(
                "working_dir '{}' must be a relative path",
                self.working_dir
            )));
        }

        if self.capacity <= 0 {
            return Err(SchedulerError::configuration(
                "capacity must be greater than 0",
            ));
        }

        let max_run_time = self.max_run_time();
        if !max_run_time.is_zero() && self.min_run_time > max_run_time {
            return Err(SchedulerError::configuration(
                "min_run_time cannot exceed max_run_time",
            ));
        }

        if self.use_universal_hfs && self.hfs_universal.as_deref().is_none_or(str::is_empty) {
            return Err(SchedulerError::configuration(
                "use_universal_hfs requires hfs_universal",
            ));
        }

        Ok(())
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self::new(
            "http://localhost:51000".to_string(),
            std::env::temp_dir(),
        )
    }
}

/// Parses a `start-end` port range
fn parse_port_range(value: &str) -> Result<PortRange> {
    let invalid = || SchedulerError::configuration(format!("invalid port range '{}'", value));
    let (start, end) = value.split_once('-').ok_or_else(invalid)?;
    let start = start.trim().parse::<u16>().map_err(|_| invalid())?;
    let end = end.trim().parse::<u16>().map_err(|_| invalid())?;
    PortRange::new(start, end).map_err(|_| invalid())
}

/// Absolute on any platform farm hosts may run
fn is_absolute(path: &str) -> bool {
    let bytes = path.as_bytes();
    path.starts_with('/')
        || path.starts_with('\\')
        || (bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':')
}
