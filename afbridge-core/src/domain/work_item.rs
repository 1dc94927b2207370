//! Work item domain types

use serde::{Deserialize, Serialize};

/// Read-only view of a work item owned by the upstream engine.
///
/// The adapter never mutates the item directly; result attributes are written
/// back through the engine port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkItem {
    pub name: String,
    pub index: i64,
    pub node_name: String,
    /// Command template, possibly containing `__PDG_*__` tokens
    #[serde(default)]
    pub command: String,
}

impl WorkItem {
    pub fn new(
        name: impl Into<String>,
        index: i64,
        node_name: impl Into<String>,
        command: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            index,
            node_name: node_name.into(),
            command: command.into(),
        }
    }
}

/// Outcome of handing a work item to the scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScheduleResult {
    /// Nothing to run remotely; the item is already cooked
    CookSucceeded,
    /// Accepted for remote execution; the cook result arrives later
    Succeeded,
    /// The submission itself failed
    Failed,
}

impl std::fmt::Display for ScheduleResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScheduleResult::CookSucceeded => write!(f, "CookSucceeded"),
            ScheduleResult::Succeeded => write!(f, "Succeeded"),
            ScheduleResult::Failed => write!(f, "Failed"),
        }
    }
}
