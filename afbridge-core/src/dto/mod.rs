//! Data Transfer Objects
//!
//! Wire bodies exchanged between running farm tasks and the scheduler's
//! report channel.

pub mod report;
