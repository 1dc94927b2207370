//! afbridge Report Channel
//!
//! HTTP endpoint that running farm tasks call to push status, results and
//! attributes back to the scheduler, independently of the poll loop.
//!
//! The server knows nothing about work items itself: every call is forwarded
//! to a [`ReportHandler`] supplied by the owner of the server.

pub mod api;
pub mod error;
mod handler;
mod server;

pub use error::ReportError;
pub use handler::ReportHandler;
pub use server::{PortRange, ReportServer};
