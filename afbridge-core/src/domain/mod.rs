//! Core domain types
//!
//! These types are shared between the scheduler (which builds and tracks
//! farm jobs), the farm client (which serializes them) and the report
//! channel (which carries work item updates back from running tasks).

pub mod attribute;
pub mod job;
pub mod shared_server;
pub mod work_item;
