//! Afanasy wire format
//!
//! Afanasy speaks JSON over HTTP: every request is a POST to the server root
//! whose body is a single-key object naming the operation (`job`, `get`, ...).

use std::collections::BTreeMap;

use afbridge_core::domain::job::{JobDescription, PollSnapshot};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Serialize)]
pub(crate) struct SubmitEnvelope {
    pub(crate) job: AfJob,
}

#[derive(Debug, Serialize)]
pub(crate) struct AfJob {
    name: String,
    user_name: String,
    host_name: String,
    branch: String,
    depend_mask: String,
    depend_mask_global: String,
    priority: i32,
    max_running_tasks: i32,
    max_running_tasks_per_host: i32,
    hosts_mask: String,
    hosts_mask_exclude: String,
    blocks: Vec<AfBlock>,
}

#[derive(Debug, Serialize)]
struct AfBlock {
    name: String,
    service: String,
    parser: String,
    capacity: i32,
    tasks_min_run_time: u64,
    tasks_max_run_time: u64,
    environment: BTreeMap<String, String>,
    tasks: Vec<AfTask>,
}

#[derive(Debug, Serialize)]
struct AfTask {
    name: String,
    command: String,
}

impl From<&JobDescription> for AfJob {
    fn from(job: &JobDescription) -> Self {
        let task = &job.task;
        Self {
            name: job.name.clone(),
            user_name: job.user_name.clone(),
            host_name: job.host_name.clone(),
            branch: job.branch.clone(),
            depend_mask: job.depend_mask.clone(),
            depend_mask_global: job.depend_mask_global.clone(),
            priority: job.priority,
            max_running_tasks: job.max_running_tasks,
            max_running_tasks_per_host: job.max_running_tasks_per_host,
            hosts_mask: job.hosts_mask.clone(),
            hosts_mask_exclude: job.hosts_mask_exclude.clone(),
            // The block shares the job's name
            blocks: vec![AfBlock {
                name: job.name.clone(),
                service: job.service.clone(),
                parser: job.parser.clone(),
                capacity: job.capacity,
                tasks_min_run_time: task.min_run_time.as_secs(),
                tasks_max_run_time: task.max_run_time.as_secs(),
                environment: task.environment.clone(),
                tasks: vec![AfTask {
                    name: task.name.clone(),
                    command: task.command_line.clone(),
                }],
            }],
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct SubmitReply {
    pub(crate) id: u64,
}

#[derive(Debug, Serialize)]
pub(crate) struct GetEnvelope {
    get: GetRequest,
}

#[derive(Debug, Serialize)]
struct GetRequest {
    #[serde(rename = "type")]
    kind: &'static str,
    ids: Vec<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    mode: Option<&'static str>,
}

impl GetEnvelope {
    pub(crate) fn job_progress(id: u64) -> Self {
        Self {
            get: GetRequest {
                kind: "jobs",
                ids: vec![id],
                mode: Some("progress"),
            },
        }
    }

    pub(crate) fn job_info(id: u64) -> Self {
        Self {
            get: GetRequest {
                kind: "jobs",
                ids: vec![id],
                mode: None,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProgressReply {
    pub(crate) job_progress: Option<JobProgress>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct JobProgress {
    #[serde(default)]
    pub(crate) progress: Value,
}

#[derive(Debug, Deserialize)]
pub(crate) struct JobsReply {
    #[serde(default)]
    pub(crate) jobs: Vec<JobInfo>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct JobInfo {
    #[serde(default)]
    pub(crate) time_started: i64,
    #[serde(default)]
    pub(crate) time_done: i64,
}

/// State of the first task found in a nested progress structure
///
/// Progress is reported as blocks of tasks (`[[{...}, ...], ...]`); the adapter
/// only ever submits one block with one task. An empty structure yields an
/// empty state.
pub(crate) fn first_task_state(progress: &Value) -> String {
    let mut node = progress;
    loop {
        match node {
            Value::Array(items) => match items.first() {
                Some(first) => node = first,
                None => return String::new(),
            },
            Value::Object(fields) => {
                return fields
                    .get("state")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();
            }
            _ => return String::new(),
        }
    }
}

/// Unix seconds to a timestamp; Afanasy uses 0 for "not yet"
pub(crate) fn unix_time(secs: i64) -> Option<DateTime<Utc>> {
    if secs <= 0 {
        return None;
    }
    DateTime::from_timestamp(secs, 0)
}

pub(crate) fn snapshot(progress: &JobProgress, info: &JobInfo) -> PollSnapshot {
    PollSnapshot::new(first_task_state(&progress.progress))
        .with_times(unix_time(info.time_started), unix_time(info.time_done))
}

#[cfg(test)]
mod tests {
    use super::*;
    use afbridge_core::domain::job::TaskSpec;
    use serde_json::json;
    use std::time::Duration;

    fn description() -> JobDescription {
        JobDescription {
            name: "workitem_ropnet".to_string(),
            user_name: "artist".to_string(),
            host_name: "ws01".to_string(),
            branch: "/pdg".to_string(),
            depend_mask: String::new(),
            depend_mask_global: String::new(),
            priority: 99,
            max_running_tasks: -1,
            max_running_tasks_per_host: 2,
            hosts_mask: "render.*".to_string(),
            hosts_mask_exclude: String::new(),
            capacity: 1000,
            service: "generic".to_string(),
            parser: "generic".to_string(),
            task: TaskSpec {
                name: "ropnet_3".to_string(),
                command_line: "hython cook.py".to_string(),
                environment: [("PDG_INDEX".to_string(), "3".to_string())].into(),
                min_run_time: Duration::from_secs(5),
                max_run_time: Duration::from_secs(7200),
            },
        }
    }

    #[test]
    fn test_submit_envelope_layout() {
        let envelope = SubmitEnvelope {
            job: AfJob::from(&description()),
        };
        let value = serde_json::to_value(&envelope).unwrap();

        assert_eq!(value["job"]["name"], "workitem_ropnet");
        assert_eq!(value["job"]["max_running_tasks_per_host"], 2);
        let block = &value["job"]["blocks"][0];
        assert_eq!(block["service"], "generic");
        assert_eq!(block["tasks_max_run_time"], 7200);
        assert_eq!(block["environment"]["PDG_INDEX"], "3");
        assert_eq!(block["tasks"][0]["command"], "hython cook.py");
        assert_eq!(block["tasks"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_get_envelopes() {
        let progress = serde_json::to_value(GetEnvelope::job_progress(9)).unwrap();
        assert_eq!(
            progress,
            json!({"get": {"type": "jobs", "ids": [9], "mode": "progress"}})
        );
        let info = serde_json::to_value(GetEnvelope::job_info(9)).unwrap();
        assert_eq!(info, json!({"get": {"type": "jobs", "ids": [9]}}));
    }

    #[test]
    fn test_first_task_state_descends_nesting() {
        let progress = json!([[{"state": "RUN", "tst": 10}], [{"state": "RDY"}]]);
        assert_eq!(first_task_state(&progress), "RUN");
    }

    #[test]
    fn test_first_task_state_empty_structures() {
        assert_eq!(first_task_state(&json!([])), "");
        assert_eq!(first_task_state(&json!([[]])), "");
        assert_eq!(first_task_state(&json!([[{"str": 1}]])), "");
        assert_eq!(first_task_state(&Value::Null), "");
    }

    #[test]
    fn test_snapshot_times() {
        let progress = JobProgress {
            progress: json!([[{"state": "DON"}]]),
        };
        let info = JobInfo {
            time_started: 1_700_000_000,
            time_done: 1_700_000_030,
        };
        let snap = snapshot(&progress, &info);
        assert_eq!(snap.raw_state, "DON");
        assert_eq!(snap.duration_secs(), 30.0);

        let pending = JobInfo {
            time_started: 0,
            time_done: 0,
        };
        assert!(snapshot(&progress, &pending).started_at.is_none());
    }
}
