//! afbridge scheduler adapter
//!
//! Bridges a work-graph engine and an Afanasy render farm. Work items handed
//! over by the engine are materialized into farm jobs, tracked in an active
//! job ledger, and reconciled back into engine lifecycle events either by
//! polling the farm or through reports pushed by running tasks.
//!
//! Architecture:
//! - Command: token substitution and shell normalization of item commands
//! - Submission: builds farm job descriptions from items and configuration
//! - Ledger: active jobs and shared servers of the running cook
//! - Reconcile: classifies farm state and drives the tick loop
//! - Callbacks: the report channel capability forwarding to the engine
//! - Scheduler: session lifecycle tying everything together

pub mod callbacks;
pub mod command;
pub mod config;
pub mod engine;
pub mod error;
pub mod interpreter;
pub mod ledger;
pub mod reconcile;
pub mod scheduler;
pub mod session;
pub mod stopper;
pub mod submission;

#[cfg(test)]
mod testing;

pub use config::SchedulerConfig;
pub use engine::EnginePort;
pub use error::{Result, SchedulerError};
pub use scheduler::AfanasyScheduler;
