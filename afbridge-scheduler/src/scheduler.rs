//! Scheduler session
//!
//! [`AfanasyScheduler`] owns the report channel, the ledgers and the tick
//! loop, and exposes the lifecycle the work-graph engine drives: start, start
//! cook, schedule items, stop cook, stop.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use afbridge_client::{AfanasyClient, FarmClient};
use afbridge_core::domain::attribute::AttrValue;
use afbridge_core::domain::work_item::{ScheduleResult, WorkItem};
use afbridge_report::{PortRange, ReportHandler, ReportServer};
use parking_lot::RwLock;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::callbacks::SchedulerCallbacks;
use crate::command::{self, CommandContext, Materialized};
use crate::config::SchedulerConfig;
use crate::engine::EnginePort;
use crate::error::{Result, SchedulerError};
use crate::interpreter::{self, InterpreterEnv, Platform};
use crate::ledger::{ActiveJobLedger, SharedServerLedger, Tracking};
use crate::reconcile::Reconciler;
use crate::session::{self, SessionContext, WorkingDirs};
use crate::stopper::{HttpStopper, SharedServerStopper};
use crate::submission;

/// Attribute the farm job id is written to after submission
pub const JOB_ID_ATTRIBUTE: &str = "afanasy_jobid";

#[derive(Default)]
struct Lifecycle {
    server: Option<ReportServer>,
    tick: Option<JoinHandle<()>>,
}

/// Scheduler adapter between a work-graph engine and an Afanasy farm
pub struct AfanasyScheduler {
    config: RwLock<SchedulerConfig>,
    farm: Arc<dyn FarmClient>,
    engine: Arc<dyn EnginePort>,
    ledger: Arc<ActiveJobLedger>,
    servers: Arc<SharedServerLedger>,
    callbacks: Arc<SchedulerCallbacks>,
    platform: Platform,
    cook_id: AtomicU64,
    session: RwLock<Option<SessionContext>>,
    lifecycle: Mutex<Lifecycle>,
}

impl AfanasyScheduler {
    /// Creates a scheduler with explicit collaborators
    ///
    /// # Arguments
    /// * `config` - Initial configuration
    /// * `farm` - Farm client facade
    /// * `engine` - Receiver of lifecycle events
    /// * `stopper` - Shuts shared servers down
    pub fn new(
        config: SchedulerConfig,
        farm: Arc<dyn FarmClient>,
        engine: Arc<dyn EnginePort>,
        stopper: Arc<dyn SharedServerStopper>,
    ) -> Self {
        let ledger = Arc::new(ActiveJobLedger::new());
        let servers = Arc::new(SharedServerLedger::new());
        let callbacks = Arc::new(SchedulerCallbacks::new(
            ledger.clone(),
            servers.clone(),
            engine.clone(),
            stopper,
        ));

        Self {
            config: RwLock::new(config),
            farm,
            engine,
            ledger,
            servers,
            callbacks,
            platform: Platform::current(),
            cook_id: AtomicU64::new(0),
            session: RwLock::new(None),
            lifecycle: Mutex::new(Lifecycle::default()),
        }
    }

    /// Creates a scheduler talking to the farm configured in `config`
    pub fn from_config(config: SchedulerConfig, engine: Arc<dyn EnginePort>) -> Result<Self> {
        config.validate()?;
        let farm = AfanasyClient::with_timeout(&config.farm_url, config.request_timeout)
            .map_err(|e| SchedulerError::configuration(format!("farm client: {}", e)))?;
        let stopper = HttpStopper::with_timeout(config.request_timeout)
            .map_err(|e| SchedulerError::configuration(format!("shared server client: {}", e)))?;
        Ok(Self::new(config, Arc::new(farm), engine, Arc::new(stopper)))
    }

    /// Current configuration
    pub fn config(&self) -> SchedulerConfig {
        self.config.read().clone()
    }

    /// Replaces the configuration
    ///
    /// Only submissions made after the call see the new values; directories
    /// and the report channel follow at the next cook start.
    pub fn set_config(&self, config: SchedulerConfig) -> Result<()> {
        config.validate()?;
        *self.config.write() = config;
        Ok(())
    }

    /// Report channel capability backed by this scheduler
    pub fn callbacks(&self) -> Arc<SchedulerCallbacks> {
        self.callbacks.clone()
    }

    /// Number of submissions awaiting a terminal state
    pub fn active_jobs(&self) -> usize {
        self.ledger.len()
    }

    /// Number of shared servers announced during the cook
    pub fn shared_servers(&self) -> usize {
        self.servers.len()
    }

    /// Token of the running cook, 0 before the first cook
    pub fn cook_id(&self) -> u64 {
        self.cook_id.load(Ordering::SeqCst)
    }

    /// Address the report channel listens on
    pub async fn report_server_addr(&self) -> Option<SocketAddr> {
        self.lifecycle
            .lock()
            .await
            .server
            .as_ref()
            .map(ReportServer::local_addr)
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Starts the report channel
    pub async fn on_start(&self) -> bool {
        info!("Starting scheduler");
        let mut lifecycle = self.lifecycle.lock().await;
        match self.ensure_report_server(&mut lifecycle).await {
            Ok(()) => true,
            Err(e) => {
                error!("Failed to start scheduler: {}", e);
                false
            }
        }
    }

    /// Stops the cook if one is running, then the report channel
    pub async fn on_stop(&self) -> bool {
        info!("Stopping scheduler");
        let mut lifecycle = self.lifecycle.lock().await;
        self.teardown_cook(&mut lifecycle).await;
        if let Some(server) = lifecycle.server.take() {
            server.stop().await;
        }
        true
    }

    /// Prepares the shared filesystem and starts reconciling
    ///
    /// # Arguments
    /// * `static_cook` - Whether the engine generated all items up front
    /// * `cook_set` - Names of the nodes taking part in the cook
    pub async fn on_start_cook(&self, static_cook: bool, cook_set: &[String]) -> bool {
        let mut lifecycle = self.lifecycle.lock().await;

        // Leftovers of a cook that was never stopped
        self.teardown_cook(&mut lifecycle).await;
        self.ledger.reset();

        match self.start_cook(&mut lifecycle).await {
            Ok(cook_id) => {
                info!(
                    cook_id,
                    static_cook,
                    nodes = cook_set.len(),
                    "Cook started"
                );
                true
            }
            Err(e) => {
                error!("Failed to start cook: {}", e);
                false
            }
        }
    }

    /// Stops reconciling and fails every outstanding item
    ///
    /// After this returns no tick can fire and the ledger is empty.
    pub async fn on_stop_cook(&self, cancel: bool) -> bool {
        let mut lifecycle = self.lifecycle.lock().await;
        info!(cancel, "Stopping cook");
        self.teardown_cook(&mut lifecycle).await;
        true
    }

    async fn start_cook(&self, lifecycle: &mut Lifecycle) -> Result<u64> {
        let config = self.config();

        session::check_shared_root(&config)?;
        let dirs = WorkingDirs::resolve(&config)?;
        dirs.create_local()?;

        self.ensure_report_server(lifecycle).await?;
        let port = lifecycle
            .server
            .as_ref()
            .map(|server| server.local_addr().port())
            .ok_or_else(|| SchedulerError::configuration("report server is not running"))?;

        let env = InterpreterEnv::from_process(config.hfs_for(self.platform).map(str::to_string));
        let cook_id = self.cook_id.fetch_add(1, Ordering::SeqCst) + 1;
        let session = SessionContext {
            cook_id,
            result_server: format!("{}:{}", config.callback_host, port),
            dirs,
            python_bin: interpreter::python_bin(self.platform, &env),
            hython_bin: interpreter::hython_bin(self.platform, &env),
        };
        debug!(
            work_dir = session.dirs.work_dir(true),
            result_server = %session.result_server,
            "Session ready"
        );
        *self.session.write() = Some(session);

        let reconciler = Arc::new(Reconciler::new(
            self.farm.clone(),
            self.ledger.clone(),
            self.engine.clone(),
        ));
        lifecycle.tick = Some(reconciler.spawn(config.tick_interval));

        Ok(cook_id)
    }

    /// Starts the report channel, restarting it when its port range changed
    async fn ensure_report_server(&self, lifecycle: &mut Lifecycle) -> Result<()> {
        let config = self.config();
        let wanted: Option<PortRange> = config.callback_ports;

        if let Some(server) = lifecycle.server.take() {
            if server.is_running() && server.port_range() == wanted {
                lifecycle.server = Some(server);
                return Ok(());
            }
            info!("Restarting report server");
            server.stop().await;
        }

        let handler: Arc<dyn ReportHandler> = self.callbacks.clone();
        let server = ReportServer::start(config.callback_bind, wanted, handler).await?;
        lifecycle.server = Some(server);
        Ok(())
    }

    async fn teardown_cook(&self, lifecycle: &mut Lifecycle) {
        if let Some(tick) = lifecycle.tick.take() {
            tick.abort();
            if let Err(e) = tick.await {
                if !e.is_cancelled() {
                    warn!("Reconciliation loop ended abnormally: {}", e);
                }
            }
        }

        let orphans = self.ledger.drain();
        if !orphans.is_empty() {
            warn!("Failing {} item(s) still on the farm", orphans.len());
        }
        for (job_id, item) in orphans {
            debug!(job_id = %job_id, item = %item, "Failing outstanding item");
            self.engine.work_item_failed(&item, -1);
        }

        self.callbacks.stop_shared_servers().await;
        *self.session.write() = None;
    }

    // ========================================================================
    // Scheduling
    // ========================================================================

    /// Submits a work item to the farm
    ///
    /// # Returns
    /// * `CookSucceeded` when the item has nothing to run remotely
    /// * `Succeeded` once the farm accepted the job
    /// * `Failed` when the job could not be built or submitted
    pub async fn on_schedule(&self, item: &WorkItem) -> ScheduleResult {
        if item.command.trim().is_empty() {
            debug!(item = %item.name, "Empty command, nothing to submit");
            return ScheduleResult::CookSucceeded;
        }

        match self.schedule(item).await {
            Ok(result) => result,
            Err(e) => {
                error!(item = %item.name, "Failed to schedule item: {}", e);
                ScheduleResult::Failed
            }
        }
    }

    async fn schedule(&self, item: &WorkItem) -> Result<ScheduleResult> {
        // Taken before the session so a teardown in between is always noticed
        let generation = self.ledger.prepare(&item.name);
        let session = self
            .session
            .read()
            .clone()
            .ok_or_else(|| SchedulerError::configuration("no cook in progress"))?;
        let config = self.config();

        let ctx = CommandContext {
            item_name: item.name.clone(),
            item_index: item.index,
            temp_dir: session.dirs.temp_dir(false),
            work_dir: session.dirs.work_dir(false).to_string(),
            script_dir: session.dirs.script_dir(false),
            result_server: session.result_server.clone(),
            python_bin: session.python_bin.clone(),
            hython_bin: session.hython_bin.clone(),
        };

        let command_line = match command::materialize(&item.command, &ctx) {
            Materialized::Command(command_line) => command_line,
            Materialized::NoOp => return Ok(ScheduleResult::CookSucceeded),
        };

        let job = submission::build(item, &command_line, &config, &session)?;

        let job_id = self
            .farm
            .submit(&job)
            .await
            .map_err(SchedulerError::Submission)?;

        info!(job_id = %job_id, item = %item.name, "Submitted job {}", job.name);
        match self.ledger.insert(generation, job_id, &item.name) {
            Tracking::Tracked => {}
            Tracking::AlreadyResolved => {
                debug!(job_id = %job_id, item = %item.name, "Item resolved before submission returned");
            }
            Tracking::CookEnded => {
                warn!(job_id = %job_id, item = %item.name, "Cook ended during submission, failing item");
                return Ok(ScheduleResult::Failed);
            }
        }

        // Ids beyond i64 cannot come from Afanasy, which numbers jobs with i32
        let id_value = i64::try_from(job_id.0).unwrap_or(i64::MAX);
        self.engine.work_item_set_attribute(
            &item.name,
            -1,
            JOB_ID_ATTRIBUTE,
            &[AttrValue::Int(id_value)],
        );

        Ok(ScheduleResult::Succeeded)
    }

    // ========================================================================
    // Item URIs
    // ========================================================================

    /// `file:///` URI of the item's log
    pub fn log_uri(&self, item_name: &str) -> String {
        if let Some(session) = self.session.read().as_ref() {
            return session.log_uri(item_name);
        }
        match WorkingDirs::resolve(&self.config()) {
            Ok(dirs) => format!("file:///{}/{}.log", dirs.log_dir(true), item_name),
            Err(_) => String::new(),
        }
    }

    /// Afanasy has no per-item status page
    pub fn status_uri(&self, _item_name: &str) -> String {
        String::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Event, MockFarm, RecordingEngine};
    use afbridge_client::ReportClient;
    use afbridge_core::domain::job::{JobId, PollSnapshot};
    use afbridge_core::domain::shared_server::SharedServerInfo;
    use async_trait::async_trait;
    use std::net::{IpAddr, Ipv4Addr};
    use std::time::Duration;
    use tempfile::TempDir;

    struct NoopStopper;

    #[async_trait]
    impl SharedServerStopper for NoopStopper {
        async fn stop(&self, _info: &SharedServerInfo) -> afbridge_client::Result<()> {
            Ok(())
        }
    }

    struct Fixture {
        _root: TempDir,
        farm: Arc<MockFarm>,
        engine: Arc<RecordingEngine>,
        scheduler: AfanasyScheduler,
    }

    fn fixture(tick_interval: Duration) -> Fixture {
        let root = tempfile::tempdir().unwrap();
        let mut config = SchedulerConfig::default();
        config.local_shared_root = root.path().to_path_buf();
        config.working_dir = "pdg".to_string();
        config.callback_bind = IpAddr::V4(Ipv4Addr::LOCALHOST);
        config.tick_interval = tick_interval;

        let farm = Arc::new(MockFarm::new());
        let engine = Arc::new(RecordingEngine::new());
        let scheduler =
            AfanasyScheduler::new(config, farm.clone(), engine.clone(), Arc::new(NoopStopper));
        Fixture {
            _root: root,
            farm,
            engine,
            scheduler,
        }
    }

    fn item(name: &str, command: &str) -> WorkItem {
        WorkItem::new(name, 0, "genericgenerator1", command)
    }

    async fn wait_until<F: Fn() -> bool>(condition: F) {
        for _ in 0..200 {
            if condition() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("condition not met in time");
    }

    #[tokio::test]
    async fn test_full_cook() {
        let f = fixture(Duration::from_millis(10));
        let s = &f.scheduler;
        // Running until the test says otherwise
        f.farm.set_state(JobId(100), PollSnapshot::new("RUN"));

        assert!(s.on_start().await);
        assert!(s.on_start_cook(false, &["genericgenerator1".to_string()]).await);
        assert_eq!(s.cook_id(), 1);

        let result = s.on_schedule(&item("gen_0", "python run.py __PDG_ITEM_NAME__")).await;
        assert_eq!(result, ScheduleResult::Succeeded);
        assert_eq!(s.active_jobs(), 1);

        let submitted = f.farm.submitted();
        assert_eq!(submitted.len(), 1);
        assert_eq!(submitted[0].name, "workitem_genericgenerator1");
        assert_eq!(submitted[0].task.command_line, "python run.py gen_0");
        assert_eq!(submitted[0].task.environment["PDG_JOBID"], "1");
        let addr = s.report_server_addr().await.unwrap();
        assert_eq!(
            submitted[0].task.environment["PDG_RESULT_SERVER"],
            format!("127.0.0.1:{}", addr.port())
        );

        f.farm.set_state(JobId(100), PollSnapshot::new("DON"));
        wait_until(|| s.active_jobs() == 0).await;

        let events = f.engine.events();
        assert_eq!(
            events[0],
            Event::Attribute(
                "gen_0".to_string(),
                -1,
                JOB_ID_ATTRIBUTE.to_string(),
                vec![AttrValue::Int(100)]
            )
        );
        assert_eq!(
            events.last(),
            Some(&Event::Succeeded("gen_0".to_string(), -1, 0.0))
        );
        assert_eq!(f.engine.terminal_count("gen_0"), 1);

        assert!(s.on_stop_cook(false).await);
        assert!(s.on_stop().await);
        assert!(s.report_server_addr().await.is_none());
    }

    #[tokio::test]
    async fn test_empty_command_never_reaches_farm() {
        let f = fixture(Duration::from_secs(3600));
        assert!(f.scheduler.on_start_cook(false, &[]).await);

        let result = f.scheduler.on_schedule(&item("gen_0", "")).await;
        assert_eq!(result, ScheduleResult::CookSucceeded);
        assert_eq!(f.farm.submit_calls(), 0);

        f.scheduler.on_stop().await;
    }

    #[tokio::test]
    async fn test_single_word_command_is_noop() {
        let f = fixture(Duration::from_secs(3600));
        assert!(f.scheduler.on_start_cook(false, &[]).await);

        let result = f.scheduler.on_schedule(&item("gen_0", "__PDG_PYTHON__")).await;
        assert_eq!(result, ScheduleResult::CookSucceeded);
        assert_eq!(f.farm.submit_calls(), 0);
        assert_eq!(f.scheduler.active_jobs(), 0);

        f.scheduler.on_stop().await;
    }

    #[tokio::test]
    async fn test_submission_failure() {
        let f = fixture(Duration::from_secs(3600));
        assert!(f.scheduler.on_start_cook(false, &[]).await);
        f.farm.fail_submissions(true);

        let result = f.scheduler.on_schedule(&item("gen_0", "python run.py")).await;
        assert_eq!(result, ScheduleResult::Failed);
        assert_eq!(f.scheduler.active_jobs(), 0);
        assert!(f.engine.events().is_empty());

        f.scheduler.on_stop().await;
    }

    #[tokio::test]
    async fn test_schedule_outside_cook_fails() {
        let f = fixture(Duration::from_secs(3600));
        let result = f.scheduler.on_schedule(&item("gen_0", "python run.py")).await;
        assert_eq!(result, ScheduleResult::Failed);
        assert_eq!(f.farm.submit_calls(), 0);
    }

    #[tokio::test]
    async fn test_missing_shared_root_fails_start_cook() {
        let f = fixture(Duration::from_secs(3600));
        let mut config = f.scheduler.config();
        config.local_shared_root = f._root.path().join("missing");
        f.scheduler.set_config(config).unwrap();

        assert!(!f.scheduler.on_start_cook(false, &[]).await);
        f.scheduler.on_stop().await;
    }

    #[tokio::test]
    async fn test_stop_cook_fails_outstanding_items() {
        let f = fixture(Duration::from_secs(3600));
        for id in 100..103 {
            f.farm.set_state(JobId(id), PollSnapshot::new("RUN"));
        }
        assert!(f.scheduler.on_start_cook(false, &[]).await);
        for i in 0..3 {
            let name = format!("gen_{}", i);
            let result = f.scheduler.on_schedule(&item(&name, "python run.py")).await;
            assert_eq!(result, ScheduleResult::Succeeded);
        }
        assert_eq!(f.scheduler.active_jobs(), 3);

        assert!(f.scheduler.on_stop_cook(true).await);
        assert_eq!(f.scheduler.active_jobs(), 0);
        for i in 0..3 {
            assert_eq!(f.engine.terminal_count(&format!("gen_{}", i)), 1);
        }

        // No tick may fire after teardown
        for id in 100..103 {
            f.farm.set_state(JobId(id), PollSnapshot::new("DON"));
        }
        let polls = f.farm.poll_calls();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(f.farm.poll_calls(), polls);
        for i in 0..3 {
            assert_eq!(f.engine.terminal_count(&format!("gen_{}", i)), 1);
        }

        f.scheduler.on_stop().await;
    }

    #[tokio::test]
    async fn test_stop_cook_during_submission_fails_item() {
        let f = fixture(Duration::from_secs(3600));
        f.farm.set_state(JobId(100), PollSnapshot::new("RUN"));
        f.farm.set_submit_delay(Duration::from_millis(200));
        assert!(f.scheduler.on_start_cook(false, &[]).await);

        let gen_0 = item("gen_0", "python run.py");
        let (result, _) = tokio::join!(f.scheduler.on_schedule(&gen_0), async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            assert!(f.scheduler.on_stop_cook(true).await);
            assert!(f.scheduler.on_stop().await);
        });

        assert_eq!(f.farm.submit_calls(), 1);
        assert_eq!(result, ScheduleResult::Failed);
        assert_eq!(f.scheduler.active_jobs(), 0);
        assert!(f.engine.events().is_empty());
    }

    #[tokio::test]
    async fn test_submission_from_previous_cook_not_tracked() {
        let f = fixture(Duration::from_secs(3600));
        f.farm.set_state(JobId(100), PollSnapshot::new("RUN"));
        f.farm.set_submit_delay(Duration::from_millis(200));
        assert!(f.scheduler.on_start_cook(false, &[]).await);

        let gen_0 = item("gen_0", "python run.py");
        let (result, restarted) = tokio::join!(f.scheduler.on_schedule(&gen_0), async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            f.scheduler.on_start_cook(false, &[]).await
        });

        assert!(restarted);
        assert_eq!(f.scheduler.cook_id(), 2);
        assert_eq!(result, ScheduleResult::Failed);
        assert_eq!(f.scheduler.active_jobs(), 0);

        // Submissions of the new cook are tracked normally
        f.farm.set_submit_delay(Duration::ZERO);
        f.farm.set_state(JobId(101), PollSnapshot::new("RUN"));
        let result = f.scheduler.on_schedule(&gen_0).await;
        assert_eq!(result, ScheduleResult::Succeeded);
        assert_eq!(f.scheduler.active_jobs(), 1);

        f.scheduler.on_stop().await;
    }

    #[tokio::test]
    async fn test_concurrent_schedules_are_all_tracked() {
        let f = fixture(Duration::from_secs(3600));
        for id in 100..103 {
            f.farm.set_state(JobId(id), PollSnapshot::new("RUN"));
        }
        f.farm.set_submit_delay(Duration::from_millis(20));
        assert!(f.scheduler.on_start_cook(false, &[]).await);

        let (a, b, c) = (
            item("gen_0", "python run.py"),
            item("gen_1", "python run.py"),
            item("gen_2", "python run.py"),
        );
        let results = tokio::join!(
            f.scheduler.on_schedule(&a),
            f.scheduler.on_schedule(&b),
            f.scheduler.on_schedule(&c)
        );

        assert_eq!(
            results,
            (
                ScheduleResult::Succeeded,
                ScheduleResult::Succeeded,
                ScheduleResult::Succeeded
            )
        );
        assert_eq!(f.scheduler.active_jobs(), 3);

        f.scheduler.on_stop().await;
    }

    #[tokio::test]
    async fn test_pushed_success_wins_over_poll() {
        let f = fixture(Duration::from_millis(10));
        f.farm.set_state(JobId(100), PollSnapshot::new("RUN"));
        assert!(f.scheduler.on_start_cook(false, &[]).await);

        let result = f.scheduler.on_schedule(&item("gen_0", "python run.py")).await;
        assert_eq!(result, ScheduleResult::Succeeded);

        let addr = f.scheduler.report_server_addr().await.unwrap();
        let client = ReportClient::new(&format!("127.0.0.1:{}", addr.port()), "1");
        client
            .success_and_result("gen_0", -1, b"__PDG_DIR__/out.txt", "file/text", 0, 4.0)
            .await
            .unwrap();
        assert_eq!(f.scheduler.active_jobs(), 0);

        f.farm.set_state(JobId(100), PollSnapshot::new("DON"));
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(f.engine.terminal_count("gen_0"), 1);
        assert!(f
            .engine
            .events()
            .contains(&Event::Succeeded("gen_0".to_string(), -1, 4.0)));

        f.scheduler.on_stop().await;
    }

    #[tokio::test]
    async fn test_cook_id_increments() {
        let f = fixture(Duration::from_secs(3600));
        for id in 100..102 {
            f.farm.set_state(JobId(id), PollSnapshot::new("RUN"));
        }

        assert!(f.scheduler.on_start_cook(false, &[]).await);
        f.scheduler.on_schedule(&item("gen_0", "python run.py")).await;
        f.scheduler.on_stop_cook(false).await;

        assert!(f.scheduler.on_start_cook(false, &[]).await);
        f.scheduler.on_schedule(&item("gen_0", "python run.py")).await;

        let submitted = f.farm.submitted();
        assert_eq!(submitted[0].task.environment["PDG_JOBID"], "1");
        assert_eq!(submitted[1].task.environment["PDG_JOBID"], "2");
        assert_eq!(f.scheduler.active_jobs(), 1);

        f.scheduler.on_stop().await;
    }

    #[tokio::test]
    async fn test_uris() {
        let f = fixture(Duration::from_secs(3600));
        let expected = format!(
            "file:///{}/pdg/pdgtemp/logs/gen_0.log",
            f._root.path().to_string_lossy().replace('\\', "/")
        );
        assert_eq!(f.scheduler.log_uri("gen_0"), expected);
        assert_eq!(f.scheduler.status_uri("gen_0"), "");
    }
}
