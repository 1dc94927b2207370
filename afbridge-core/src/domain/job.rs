//! Farm job domain types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Identifier the farm assigns to an accepted job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub u64);

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for JobId {
    fn from(id: u64) -> Self {
        JobId(id)
    }
}

/// Farm-native job description
///
/// Built once per submission by the submission builder and sent exactly once.
/// One job wraps one block which wraps one task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobDescription {
    pub name: String,
    pub user_name: String,
    pub host_name: String,
    pub branch: String,
    pub depend_mask: String,
    pub depend_mask_global: String,
    pub priority: i32,
    /// Maximum tasks running at once, -1 for unlimited
    pub max_running_tasks: i32,
    /// Maximum tasks running at once on one host, -1 for unlimited
    pub max_running_tasks_per_host: i32,
    pub hosts_mask: String,
    pub hosts_mask_exclude: String,
    pub capacity: i32,
    pub service: String,
    pub parser: String,
    pub task: TaskSpec,
}

/// The single task embedded in a job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskSpec {
    pub name: String,
    pub command_line: String,
    pub environment: BTreeMap<String, String>,
    pub min_run_time: Duration,
    /// Zero means no limit
    pub max_run_time: Duration,
}

/// Point-in-time view of a job as reported by the farm
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollSnapshot {
    /// Short state code, e.g. "RUN", "DON", "SKP", "RDY RER"
    pub raw_state: String,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl PollSnapshot {
    pub fn new(raw_state: impl Into<String>) -> Self {
        Self {
            raw_state: raw_state.into(),
            started_at: None,
            finished_at: None,
        }
    }

    pub fn with_times(
        mut self,
        started_at: Option<DateTime<Utc>>,
        finished_at: Option<DateTime<Utc>>,
    ) -> Self {
        self.started_at = started_at;
        self.finished_at = finished_at;
        self
    }

    /// Cook time in seconds (`finished_at - started_at`)
    ///
    /// Returns 0.0 when either timestamp is missing or the clock went backwards.
    pub fn duration_secs(&self) -> f64 {
        match (self.started_at, self.finished_at) {
            (Some(started), Some(finished)) => {
                let millis = (finished - started).num_milliseconds();
                if millis <= 0 { 0.0 } else { millis as f64 / 1000.0 }
            }
            _ => 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(secs, 0).single()
    }

    #[test]
    fn test_duration_is_finished_minus_started() {
        let snapshot = PollSnapshot::new("DON").with_times(at(1_700_000_000), at(1_700_000_042));
        assert_eq!(snapshot.duration_secs(), 42.0);
    }

    #[test]
    fn test_zero_duration_job() {
        let snapshot = PollSnapshot::new("DON").with_times(at(1_700_000_000), at(1_700_000_000));
        assert_eq!(snapshot.duration_secs(), 0.0);
    }

    #[test]
    fn test_missing_timestamps_yield_zero() {
        assert_eq!(PollSnapshot::new("SKP").duration_secs(), 0.0);
        let snapshot = PollSnapshot::new("DON").with_times(at(10), None);
        assert_eq!(snapshot.duration_secs(), 0.0);
    }

    #[test]
    fn test_job_id_display() {
        assert_eq!(JobId(17).to_string(), "17");
        assert_eq!(JobId::from(3), JobId(3));
    }
}
