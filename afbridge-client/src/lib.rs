//! afbridge HTTP clients
//!
//! Two small, typed clients built on `reqwest`:
//!
//! - [`AfanasyClient`]: the farm client facade used by the scheduler to submit
//!   jobs and poll their progress. It implements the [`FarmClient`] trait so
//!   the scheduler can be driven by fakes in tests.
//! - [`ReportClient`]: used by running farm tasks to push status, results and
//!   attributes back to the scheduler's report channel.
//!
//! # Example
//!
//! ```no_run
//! use afbridge_client::{AfanasyClient, FarmClient};
//! use afbridge_core::domain::job::JobId;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let farm = AfanasyClient::new("http://localhost:51000");
//!
//!     match farm.poll_progress(JobId(42)).await? {
//!         Some(snapshot) => println!("job 42: {}", snapshot.raw_state),
//!         None => println!("job 42 is unknown to the farm"),
//!     }
//!     Ok(())
//! }
//! ```

pub mod error;
mod farm;
mod report;
mod wire;

// Re-export commonly used types
pub use error::{ClientError, Result};
pub use farm::{AfanasyClient, FarmClient};
pub use report::ReportClient;
