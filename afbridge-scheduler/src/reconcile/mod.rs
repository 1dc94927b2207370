//! Reconciliation of farm state
//!
//! Polls every tracked job on a fixed interval, classifies what the farm
//! reports and turns it into engine lifecycle events.

mod classify;
mod poller;

pub use classify::{JobState, classify};
pub use poller::{Reconciler, TickReport};
