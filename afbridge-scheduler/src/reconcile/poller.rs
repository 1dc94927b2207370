//! Tick loop
//!
//! One task polls the farm for every tracked job on a fixed interval. Ticks
//! never overlap: a slow tick delays the next one. A tick that panics is
//! logged and skipped; the loop keeps running.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use afbridge_client::FarmClient;
use afbridge_core::domain::job::JobId;
use futures_util::FutureExt;
use tokio::task::JoinHandle;
use tokio::time::{self, Duration, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use super::classify::{JobState, classify};
use crate::engine::EnginePort;
use crate::error::SchedulerError;
use crate::ledger::ActiveJobLedger;

/// Counters of a single tick
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TickReport {
    pub polled: usize,
    pub started: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Jobs whose poll failed and stay for the next tick
    pub errors: usize,
    /// The farm was unreachable and the rest of the tick was skipped
    pub aborted: bool,
}

impl TickReport {
    pub fn terminal(&self) -> usize {
        self.succeeded + self.failed
    }
}

/// Reconciles farm state of tracked jobs into engine events
pub struct Reconciler {
    farm: Arc<dyn FarmClient>,
    ledger: Arc<ActiveJobLedger>,
    engine: Arc<dyn EnginePort>,
}

impl Reconciler {
    pub fn new(
        farm: Arc<dyn FarmClient>,
        ledger: Arc<ActiveJobLedger>,
        engine: Arc<dyn EnginePort>,
    ) -> Self {
        Self {
            farm,
            ledger,
            engine,
        }
    }

    /// Polls every tracked job once
    ///
    /// The ledger is only locked to snapshot ids and to resolve entries, never
    /// while waiting on the farm.
    pub async fn tick(&self) -> TickReport {
        let mut report = TickReport::default();

        for id in self.ledger.job_ids() {
            report.polled += 1;

            match self.farm.poll_progress(id).await {
                Ok(snapshot) => {
                    let state = classify(snapshot.as_ref());
                    debug!(job_id = %id, state = ?state, "Polled job");
                    self.apply(id, state, &mut report);
                }
                Err(e) => {
                    let err = SchedulerError::Poll(e);
                    if err.is_unreachable() {
                        warn!("Farm unreachable, skipping the rest of this tick: {}", err);
                        report.aborted = true;
                        break;
                    }
                    let item = self.ledger.item_name(id).unwrap_or_default();
                    warn!(job_id = %id, item = %item, "{}", err);
                    report.errors += 1;
                }
            }
        }

        report
    }

    fn apply(&self, id: JobId, state: JobState, report: &mut TickReport) {
        match state {
            JobState::Running => {
                // The entry may have been resolved by a push since the snapshot
                if let Some(item) = self.ledger.item_name(id) {
                    self.engine.work_item_started(&item, -1);
                    report.started += 1;
                }
            }
            JobState::Done { duration } => {
                if let Some(item) = self.ledger.resolve_job(id) {
                    debug!(job_id = %id, item = %item, duration, "Job finished");
                    self.engine.work_item_succeeded(&item, -1, duration);
                    report.succeeded += 1;
                }
            }
            JobState::Lost | JobState::Ghost | JobState::Errored => {
                if let Some(item) = self.ledger.resolve_job(id) {
                    warn!(job_id = %id, item = %item, state = ?state, "Job failed");
                    self.engine.work_item_failed(&item, -1);
                    report.failed += 1;
                }
            }
            JobState::Unclassified(_) => {}
        }
    }

    /// Starts the tick loop
    ///
    /// The returned handle is aborted to stop the loop.
    pub fn spawn(self: Arc<Self>, period: Duration) -> JoinHandle<()> {
        info!("Starting reconciliation loop (interval: {:?})", period);

        tokio::spawn(async move {
            let mut interval = time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                interval.tick().await;

                let report = match AssertUnwindSafe(self.tick()).catch_unwind().await {
                    Ok(report) => report,
                    Err(_) => {
                        error!("Tick panicked, skipping to the next one");
                        continue;
                    }
                };
                if report.terminal() > 0 {
                    info!(
                        "Reconciled {} job(s): {} succeeded, {} failed",
                        report.terminal(),
                        report.succeeded,
                        report.failed
                    );
                }
            }
        })
    }
}
