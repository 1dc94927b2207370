//! In-crate fakes for the farm and the engine

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use afbridge_client::{ClientError, FarmClient};
use afbridge_core::domain::attribute::AttrValue;
use afbridge_core::domain::job::{JobDescription, JobId, PollSnapshot};
use async_trait::async_trait;
use parking_lot::Mutex;

use crate::engine::EnginePort;

/// Scripted farm
///
/// Jobs without a scripted snapshot are reported absent.
#[derive(Default)]
pub struct MockFarm {
    next_id: AtomicU64,
    submitted: Mutex<Vec<JobDescription>>,
    snapshots: Mutex<HashMap<JobId, PollSnapshot>>,
    poll_errors: Mutex<HashMap<JobId, u16>>,
    fail_submit: AtomicBool,
    submit_delay: Mutex<Duration>,
    unreachable: AtomicBool,
    submit_calls: AtomicUsize,
    poll_calls: AtomicUsize,
}

impl MockFarm {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(100),
            ..Default::default()
        }
    }

    pub fn set_state(&self, id: JobId, snapshot: PollSnapshot) {
        self.snapshots.lock().insert(id, snapshot);
    }

    pub fn forget(&self, id: JobId) {
        self.snapshots.lock().remove(&id);
    }

    /// Polls of `id` fail with an HTTP error of `status`
    pub fn fail_poll(&self, id: JobId, status: u16) {
        self.poll_errors.lock().insert(id, status);
    }

    pub fn fail_submissions(&self, fail: bool) {
        self.fail_submit.store(fail, Ordering::SeqCst);
    }

    /// Holds every submission for `delay` before the farm answers
    pub fn set_submit_delay(&self, delay: Duration) {
        *self.submit_delay.lock() = delay;
    }

    pub fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.store(unreachable, Ordering::SeqCst);
    }

    pub fn submitted(&self) -> Vec<JobDescription> {
        self.submitted.lock().clone()
    }

    pub fn submit_calls(&self) -> usize {
        self.submit_calls.load(Ordering::SeqCst)
    }

    pub fn poll_calls(&self) -> usize {
        self.poll_calls.load(Ordering::SeqCst)
    }
}

/// A genuine connection-refused error
pub async fn connect_error() -> ClientError {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let err = reqwest::get(format!("http://{}/", addr)).await.unwrap_err();
    ClientError::RequestFailed(err)
}

#[async_trait]
impl FarmClient for MockFarm {
    async fn submit(&self, job: &JobDescription) -> afbridge_client::Result<JobId> {
        self.submit_calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.submit_delay.lock();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if self.unreachable.load(Ordering::SeqCst) {
            return Err(connect_error().await);
        }
        if self.fail_submit.load(Ordering::SeqCst) {
            return Err(ClientError::api_error(500, "job rejected"));
        }
        self.submitted.lock().push(job.clone());
        Ok(JobId(self.next_id.fetch_add(1, Ordering::SeqCst)))
    }

    async fn poll_progress(&self, id: JobId) -> afbridge_client::Result<Option<PollSnapshot>> {
        self.poll_calls.fetch_add(1, Ordering::SeqCst);
        if self.unreachable.load(Ordering::SeqCst) {
            return Err(connect_error().await);
        }
        let status = self.poll_errors.lock().get(&id).copied();
        if let Some(status) = status {
            return Err(ClientError::api_error(status, "poll failed"));
        }
        Ok(self.snapshots.lock().get(&id).cloned())
    }
}

/// Engine event as recorded by [`RecordingEngine`]
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Started(String, i32),
    Succeeded(String, i32, f64),
    Failed(String, i32),
    Cancelled(String, i32),
    FileResult(String, i32, Vec<u8>, String, i64),
    Attribute(String, i32, String, Vec<AttrValue>),
}

impl Event {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Event::Succeeded(..) | Event::Failed(..) | Event::Cancelled(..)
        )
    }

    pub fn item_name(&self) -> &str {
        match self {
            Event::Started(name, _)
            | Event::Succeeded(name, _, _)
            | Event::Failed(name, _)
            | Event::Cancelled(name, _)
            | Event::FileResult(name, ..)
            | Event::Attribute(name, ..) => name,
        }
    }
}

/// Engine that records every callback in order
#[derive(Default)]
pub struct RecordingEngine {
    events: Mutex<Vec<Event>>,
    panic_on_start: AtomicBool,
}

impl RecordingEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// The next `work_item_started` call panics instead of recording
    pub fn panic_on_next_start(&self) {
        self.panic_on_start.store(true, Ordering::SeqCst);
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().clone()
    }

    pub fn terminal_count(&self, item_name: &str) -> usize {
        self.events
            .lock()
            .iter()
            .filter(|e| e.is_terminal() && e.item_name() == item_name)
            .count()
    }

    fn push(&self, event: Event) {
        self.events.lock().push(event);
    }
}

impl EnginePort for RecordingEngine {
    fn work_item_started(&self, item_name: &str, subindex: i32) {
        if self.panic_on_start.swap(false, Ordering::SeqCst) {
            panic!("engine rejected start of {}", item_name);
        }
        self.push(Event::Started(item_name.to_string(), subindex));
    }

    fn work_item_succeeded(&self, item_name: &str, subindex: i32, duration: f64) {
        self.push(Event::Succeeded(item_name.to_string(), subindex, duration));
    }

    fn work_item_failed(&self, item_name: &str, subindex: i32) {
        self.push(Event::Failed(item_name.to_string(), subindex));
    }

    fn work_item_cancelled(&self, item_name: &str, subindex: i32) {
        self.push(Event::Cancelled(item_name.to_string(), subindex));
    }

    fn work_item_file_result(
        &self,
        item_name: &str,
        subindex: i32,
        result: &[u8],
        tag: &str,
        hash: i64,
    ) {
        self.push(Event::FileResult(
            item_name.to_string(),
            subindex,
            result.to_vec(),
            tag.to_string(),
            hash,
        ));
    }

    fn work_item_set_attribute(
        &self,
        item_name: &str,
        subindex: i32,
        attr_name: &str,
        values: &[AttrValue],
    ) {
        self.push(Event::Attribute(
            item_name.to_string(),
            subindex,
            attr_name.to_string(),
            values.to_vec(),
        ));
    }
}
