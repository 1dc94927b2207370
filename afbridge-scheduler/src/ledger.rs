//! Active job and shared server ledgers
//!
//! The active job ledger maps farm job ids to the work items they run. A job
//! id is present from the moment the farm accepts its submission until its
//! item reaches a terminal state, whichever of the tick loop or the report
//! channel observes that first.
//!
//! Submissions are tied to the cook they were prepared in. Tearing a cook
//! down closes its generation so a submission still in flight cannot land in
//! the ledger afterwards.

use std::collections::{BTreeMap, HashMap, HashSet};

use afbridge_core::domain::job::JobId;
use afbridge_core::domain::shared_server::SharedServerInfo;
use parking_lot::Mutex;

#[derive(Debug, Default)]
struct LedgerState {
    jobs: HashMap<JobId, String>,
    /// Items that already produced their terminal event this cook
    resolved: HashSet<String>,
    generation: u64,
    closed: bool,
}

/// Cook generation a submission was prepared in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Generation(u64);

/// Outcome of [`ActiveJobLedger::insert`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tracking {
    Tracked,
    /// A push report resolved the item while it was being submitted
    AlreadyResolved,
    /// The cook the submission belongs to was torn down meanwhile
    CookEnded,
}

/// Outstanding submissions of the running cook
///
/// Terminal resolution goes through this ledger from both the poll path
/// ([`resolve_job`](Self::resolve_job)) and the push path
/// ([`resolve_item`](Self::resolve_item)). Whoever resolves an item first is
/// told to emit; every later attempt is told not to.
#[derive(Debug, Default)]
pub struct ActiveJobLedger {
    state: Mutex<LedgerState>,
}

impl ActiveJobLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears the terminal mark of an item about to be (re)submitted
    ///
    /// # Returns
    /// The generation to hand back to [`insert`](Self::insert) once the farm
    /// accepted the job.
    pub fn prepare(&self, item_name: &str) -> Generation {
        let mut state = self.state.lock();
        state.resolved.remove(item_name);
        Generation(state.generation)
    }

    /// Tracks an accepted submission
    ///
    /// The job is tracked only when its cook is still open and no push
    /// report resolved the item during submission.
    pub fn insert(&self, generation: Generation, id: JobId, item_name: &str) -> Tracking {
        let mut state = self.state.lock();
        if state.closed || state.generation != generation.0 {
            return Tracking::CookEnded;
        }
        if state.resolved.contains(item_name) {
            return Tracking::AlreadyResolved;
        }
        state.jobs.insert(id, item_name.to_string());
        Tracking::Tracked
    }

    /// Prepares and inserts in one step
    #[cfg(test)]
    pub fn track(&self, id: JobId, item_name: &str) -> bool {
        let generation = self.prepare(item_name);
        self.insert(generation, id, item_name) == Tracking::Tracked
    }

    /// Snapshot of tracked job ids, in ascending order
    pub fn job_ids(&self) -> Vec<JobId> {
        let mut ids: Vec<JobId> = self.state.lock().jobs.keys().copied().collect();
        ids.sort();
        ids
    }

    /// Item a tracked job runs
    pub fn item_name(&self, id: JobId) -> Option<String> {
        self.state.lock().jobs.get(&id).cloned()
    }

    /// Resolves a job observed terminal by polling
    ///
    /// # Returns
    /// The item name when this call removed the entry, meaning the caller
    /// must emit the terminal event.
    pub fn resolve_job(&self, id: JobId) -> Option<String> {
        let mut state = self.state.lock();
        let item_name = state.jobs.remove(&id)?;
        state.resolved.insert(item_name.clone());
        Some(item_name)
    }

    /// Resolves an item reported terminal over the report channel
    ///
    /// # Returns
    /// Whether the caller must emit the terminal event. Items this ledger
    /// never tracked are emitted once as well.
    pub fn resolve_item(&self, item_name: &str) -> bool {
        let mut state = self.state.lock();
        state.jobs.retain(|_, name| name != item_name);
        state.resolved.insert(item_name.to_string())
    }

    /// Closes the running cook and removes every tracked job
    ///
    /// Drained items are marked resolved. Submissions prepared before the
    /// call are refused by [`insert`](Self::insert).
    pub fn drain(&self) -> Vec<(JobId, String)> {
        let mut state = self.state.lock();
        state.generation += 1;
        state.closed = true;
        let mut drained: Vec<(JobId, String)> = state.jobs.drain().collect();
        drained.sort_by_key(|(id, _)| *id);
        for (_, name) in &drained {
            state.resolved.insert(name.clone());
        }
        drained
    }

    /// Forgets everything, including terminal marks, and opens a new cook
    pub fn reset(&self) {
        let mut state = self.state.lock();
        state.jobs.clear();
        state.resolved.clear();
        state.generation += 1;
        state.closed = false;
    }

    pub fn len(&self) -> usize {
        self.state.lock().jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().jobs.is_empty()
    }
}

/// Shared servers announced during the running cook, keyed by name
#[derive(Debug, Default)]
pub struct SharedServerLedger {
    servers: Mutex<BTreeMap<String, SharedServerInfo>>,
}

impl SharedServerLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a server, replacing any previous one with the same name
    pub fn insert(&self, info: SharedServerInfo) -> Option<SharedServerInfo> {
        self.servers.lock().insert(info.name.clone(), info)
    }

    pub fn get(&self, name: &str) -> Option<SharedServerInfo> {
        self.servers.lock().get(name).cloned()
    }

    pub fn remove(&self, name: &str) -> Option<SharedServerInfo> {
        self.servers.lock().remove(name)
    }

    /// Removes every server
    pub fn drain(&self) -> Vec<SharedServerInfo> {
        std::mem::take(&mut *self.servers.lock())
            .into_values()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.servers.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.servers.lock().is_empty()
    }
}
