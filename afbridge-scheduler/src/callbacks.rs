//! Push report handlers
//!
//! Reports pushed by farm tasks over the report channel are forwarded to the
//! engine. Terminal reports of regular items resolve through the active job
//! ledger so that an item never gets two terminal events when the tick loop
//! observes the same outcome.

use std::sync::Arc;

use afbridge_core::domain::attribute::AttrValue;
use afbridge_core::domain::shared_server::SharedServerInfo;
use afbridge_report::ReportHandler;
use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::engine::EnginePort;
use crate::ledger::{ActiveJobLedger, SharedServerLedger};
use crate::stopper::SharedServerStopper;

/// The scheduler's report channel capability
pub struct SchedulerCallbacks {
    ledger: Arc<ActiveJobLedger>,
    servers: Arc<SharedServerLedger>,
    engine: Arc<dyn EnginePort>,
    stopper: Arc<dyn SharedServerStopper>,
}

impl SchedulerCallbacks {
    pub fn new(
        ledger: Arc<ActiveJobLedger>,
        servers: Arc<SharedServerLedger>,
        engine: Arc<dyn EnginePort>,
        stopper: Arc<dyn SharedServerStopper>,
    ) -> Self {
        Self {
            ledger,
            servers,
            engine,
            stopper,
        }
    }

    /// Batch sub-items are not tracked by the ledger and always pass
    fn should_emit_terminal(&self, item_name: &str, subindex: i32) -> bool {
        if subindex >= 0 {
            return true;
        }
        let emit = self.ledger.resolve_item(item_name);
        if !emit {
            debug!(item = %item_name, "Item already resolved, ignoring terminal report");
        }
        emit
    }

    /// Shuts down every recorded shared server, best effort
    ///
    /// # Returns
    /// Number of servers that acknowledged the shutdown
    pub async fn stop_shared_servers(&self) -> usize {
        let mut stopped = 0;
        for server in self.servers.drain() {
            match self.stopper.stop(&server).await {
                Ok(()) => {
                    info!("Stopped shared server {}", server.name);
                    stopped += 1;
                }
                Err(e) => warn!("Failed to stop shared server {}: {}", server.name, e),
            }
        }
        stopped
    }
}

#[async_trait]
impl ReportHandler for SchedulerCallbacks {
    async fn start_cook(&self, item_name: &str, subindex: i32, job_id: &str) {
        debug!(item = %item_name, subindex, job_id, "Start cook reported");
        self.engine.work_item_started(item_name, subindex);
    }

    async fn succeeded(&self, item_name: &str, subindex: i32, duration: f64, job_id: &str) {
        debug!(item = %item_name, subindex, job_id, duration, "Success reported");
        if self.should_emit_terminal(item_name, subindex) {
            self.engine.work_item_succeeded(item_name, subindex, duration);
        }
    }

    async fn failed(&self, item_name: &str, subindex: i32, job_id: &str) {
        debug!(item = %item_name, subindex, job_id, "Failure reported");
        if self.should_emit_terminal(item_name, subindex) {
            self.engine.work_item_failed(item_name, subindex);
        }
    }

    async fn cancelled(&self, item_name: &str, subindex: i32, job_id: &str) {
        debug!(item = %item_name, subindex, job_id, "Cancellation reported");
        if self.should_emit_terminal(item_name, subindex) {
            self.engine.work_item_cancelled(item_name, subindex);
        }
    }

    async fn file_result(
        &self,
        item_name: &str,
        subindex: i32,
        result: &[u8],
        tag: &str,
        hash: i64,
        job_id: &str,
    ) {
        debug!(item = %item_name, subindex, job_id, tag, "Result reported");
        self.engine
            .work_item_file_result(item_name, subindex, result, tag, hash);
    }

    async fn set_attribute(
        &self,
        item_name: &str,
        subindex: i32,
        attr_name: &str,
        values: &[AttrValue],
        job_id: &str,
    ) {
        debug!(item = %item_name, subindex, job_id, attr = attr_name, "Attribute reported");
        self.engine
            .work_item_set_attribute(item_name, subindex, attr_name, values);
    }

    async fn shared_server_started(&self, info: SharedServerInfo, job_id: &str) -> bool {
        if info.name.is_empty() {
            return false;
        }
        info!(
            job_id,
            "Shared server {} started at {} (pid {})",
            info.name,
            info.address(),
            info.pid
        );
        self.servers.insert(info);
        true
    }

    async fn shared_server_ended(&self, name: &str) -> bool {
        let Some(server) = self.servers.get(name) else {
            warn!("Unknown shared server {}", name);
            return false;
        };

        match self.stopper.stop(&server).await {
            Ok(()) => {
                info!("Stopped shared server {}", name);
                self.servers.remove(name);
                true
            }
            Err(e) => {
                // Left in place so teardown at the end of the cook tries again
                warn!("Failed to stop shared server {}: {}", name, e);
                false
            }
        }
    }

    async fn shared_server_info(&self, name: &str) -> Option<SharedServerInfo> {
        self.servers.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Event, RecordingEngine};
    use afbridge_client::ClientError;
    use afbridge_core::domain::job::JobId;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct RecordingStopper {
        stopped: Mutex<Vec<String>>,
        fail: bool,
    }

    #[async_trait]
    impl SharedServerStopper for RecordingStopper {
        async fn stop(&self, info: &SharedServerInfo) -> afbridge_client::Result<()> {
            if self.fail {
                return Err(ClientError::api_error(503, "busy"));
            }
            self.stopped.lock().push(info.name.clone());
            Ok(())
        }
    }

    struct Fixture {
        ledger: Arc<ActiveJobLedger>,
        servers: Arc<SharedServerLedger>,
        engine: Arc<RecordingEngine>,
        stopper: Arc<RecordingStopper>,
        callbacks: SchedulerCallbacks,
    }

    fn fixture_with(stopper: RecordingStopper) -> Fixture {
        let ledger = Arc::new(ActiveJobLedger::new());
        let servers = Arc::new(SharedServerLedger::new());
        let engine = Arc::new(RecordingEngine::new());
        let stopper = Arc::new(stopper);
        let callbacks = SchedulerCallbacks::new(
            ledger.clone(),
            servers.clone(),
            engine.clone(),
            stopper.clone(),
        );
        Fixture {
            ledger,
            servers,
            engine,
            stopper,
            callbacks,
        }
    }

    fn fixture() -> Fixture {
        fixture_with(RecordingStopper::default())
    }

    fn server(name: &str) -> SharedServerInfo {
        SharedServerInfo {
            name: name.to_string(),
            host: "render05".to_string(),
            port: 48000,
            pid: 311,
            proto_type: "xmlrpc".to_string(),
        }
    }

    #[tokio::test]
    async fn test_terminal_push_resolves_ledger() {
        let f = fixture();
        f.ledger.track(JobId(1), "item_a");

        f.callbacks.start_cook("item_a", -1, "1").await;
        f.callbacks.succeeded("item_a", -1, 3.5, "1").await;
        f.callbacks.failed("item_a", -1, "1").await;

        assert_eq!(
            f.engine.events(),
            vec![
                Event::Started("item_a".to_string(), -1),
                Event::Succeeded("item_a".to_string(), -1, 3.5),
            ]
        );
        assert!(f.ledger.is_empty());
    }

    #[tokio::test]
    async fn test_push_after_poll_is_dropped() {
        let f = fixture();
        f.ledger.track(JobId(1), "item_a");
        assert!(f.ledger.resolve_job(JobId(1)).is_some());

        f.callbacks.cancelled("item_a", -1, "1").await;
        assert!(f.engine.events().is_empty());
    }

    #[tokio::test]
    async fn test_batch_reports_pass_through() {
        let f = fixture();
        f.ledger.track(JobId(1), "batch");

        f.callbacks.succeeded("batch", 0, 1.0, "1").await;
        f.callbacks.succeeded("batch", 1, 1.0, "1").await;
        f.callbacks.succeeded("batch", 1, 1.0, "1").await;

        assert_eq!(f.engine.terminal_count("batch"), 3);
        assert_eq!(f.ledger.len(), 1);
    }

    #[tokio::test]
    async fn test_results_and_attributes_forwarded() {
        let f = fixture();

        f.callbacks
            .file_result("item_a", -1, b"__PDG_DIR__/geo/a.bgeo", "file/geo", 9, "1")
            .await;
        f.callbacks
            .set_attribute("item_a", -1, "frame", &[AttrValue::Int(12)], "1")
            .await;

        assert_eq!(
            f.engine.events(),
            vec![
                Event::FileResult(
                    "item_a".to_string(),
                    -1,
                    b"__PDG_DIR__/geo/a.bgeo".to_vec(),
                    "file/geo".to_string(),
                    9
                ),
                Event::Attribute(
                    "item_a".to_string(),
                    -1,
                    "frame".to_string(),
                    vec![AttrValue::Int(12)]
                ),
            ]
        );
    }

    #[tokio::test]
    async fn test_shared_server_lifecycle() {
        let f = fixture();

        assert!(!f.callbacks.shared_server_started(server(""), "1").await);
        assert!(f.callbacks.shared_server_started(server("houdini_1"), "1").await);
        assert_eq!(
            f.callbacks.shared_server_info("houdini_1").await,
            Some(server("houdini_1"))
        );

        assert!(f.callbacks.shared_server_ended("houdini_1").await);
        assert!(!f.callbacks.shared_server_ended("houdini_1").await);
        assert_eq!(f.callbacks.shared_server_info("houdini_1").await, None);
        assert_eq!(*f.stopper.stopped.lock(), vec!["houdini_1".to_string()]);
    }

    #[tokio::test]
    async fn test_failed_stop_keeps_server() {
        let f = fixture_with(RecordingStopper {
            fail: true,
            ..Default::default()
        });
        f.callbacks.shared_server_started(server("houdini_1"), "1").await;

        assert!(!f.callbacks.shared_server_ended("houdini_1").await);
        assert_eq!(f.servers.len(), 1);

        assert_eq!(f.callbacks.stop_shared_servers().await, 0);
        assert!(f.servers.is_empty());
    }

    #[tokio::test]
    async fn test_stop_all_shared_servers() {
        let f = fixture();
        f.callbacks.shared_server_started(server("a"), "1").await;
        f.callbacks.shared_server_started(server("b"), "1").await;

        assert_eq!(f.callbacks.stop_shared_servers().await, 2);
        assert!(f.servers.is_empty());
        assert_eq!(*f.stopper.stopped.lock(), vec!["a".to_string(), "b".to_string()]);
    }
}
