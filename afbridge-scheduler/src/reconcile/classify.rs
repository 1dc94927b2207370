//! Farm state classification

use afbridge_core::domain::job::PollSnapshot;

const STATE_RUNNING: &str = "RUN";
const STATE_ERRORED: &str = "RDY RER";
const STATE_DONE: &str = "DON";
const STATE_SKIPPED: &str = "SKP";

/// What a poll result means for the tracked item
#[derive(Debug, Clone, PartialEq)]
pub enum JobState {
    /// The farm no longer knows the job
    Lost,
    /// The job exists but its task reports no state
    Ghost,
    Running,
    /// Task failed and is waiting for a retry that will not be tracked
    Errored,
    /// Task done or skipped after `duration` seconds
    Done { duration: f64 },
    /// Any other state (queued, waiting on dependencies, ...)
    Unclassified(String),
}

impl JobState {
    /// Whether the job leaves the ledger
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobState::Lost | JobState::Ghost | JobState::Errored | JobState::Done { .. }
        )
    }
}

/// Classifies a poll result
pub fn classify(snapshot: Option<&PollSnapshot>) -> JobState {
    let Some(snapshot) = snapshot else {
        return JobState::Lost;
    };

    match snapshot.raw_state.trim() {
        "" => JobState::Ghost,
        STATE_RUNNING => JobState::Running,
        STATE_ERRORED => JobState::Errored,
        STATE_DONE | STATE_SKIPPED => JobState::Done {
            duration: snapshot.duration_secs(),
        },
        other => JobState::Unclassified(other.to_string()),
    }
}
