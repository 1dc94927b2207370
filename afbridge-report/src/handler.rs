//! Report handler capability

use afbridge_core::domain::attribute::AttrValue;
use afbridge_core::domain::shared_server::SharedServerInfo;
use async_trait::async_trait;

/// Receiver of report channel calls
///
/// Items are keyed by name and batch subindex (-1 for regular items). The job
/// token sent by the task is passed along for logging only.
#[async_trait]
pub trait ReportHandler: Send + Sync + 'static {
    /// An item started cooking
    async fn start_cook(&self, item_name: &str, subindex: i32, job_id: &str);

    /// An item finished successfully after `duration` seconds
    async fn succeeded(&self, item_name: &str, subindex: i32, duration: f64, job_id: &str);

    /// An item failed
    async fn failed(&self, item_name: &str, subindex: i32, job_id: &str);

    /// An item was cancelled
    async fn cancelled(&self, item_name: &str, subindex: i32, job_id: &str);

    /// An item produced a result
    async fn file_result(
        &self,
        item_name: &str,
        subindex: i32,
        result: &[u8],
        tag: &str,
        hash: i64,
        job_id: &str,
    );

    /// An item wrote attribute values
    async fn set_attribute(
        &self,
        item_name: &str,
        subindex: i32,
        attr_name: &str,
        values: &[AttrValue],
        job_id: &str,
    );

    /// A shared server announced itself
    ///
    /// # Returns
    /// Whether the server was recorded
    async fn shared_server_started(&self, info: SharedServerInfo, job_id: &str) -> bool;

    /// A task asked for a shared server to be torn down
    ///
    /// # Returns
    /// Whether a server with that name existed and was torn down
    async fn shared_server_ended(&self, name: &str) -> bool;

    /// Looks up a shared server by name
    async fn shared_server_info(&self, name: &str) -> Option<SharedServerInfo>;
}
