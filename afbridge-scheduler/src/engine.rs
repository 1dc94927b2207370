//! Engine port
//!
//! The upstream work-graph engine receives lifecycle events through this
//! trait. Items are addressed by name and batch subindex; regular items use
//! a subindex of -1.

use afbridge_core::domain::attribute::AttrValue;

/// Lifecycle callbacks into the work-graph engine
///
/// Implementations must be cheap and non-blocking: they are invoked from the
/// tick loop and from report channel handlers, possibly concurrently.
pub trait EnginePort: Send + Sync {
    fn work_item_started(&self, item_name: &str, subindex: i32);

    fn work_item_succeeded(&self, item_name: &str, subindex: i32, duration: f64);

    fn work_item_failed(&self, item_name: &str, subindex: i32);

    fn work_item_cancelled(&self, item_name: &str, subindex: i32);

    /// A result produced by a task (usually a delocalized file path)
    fn work_item_file_result(
        &self,
        item_name: &str,
        subindex: i32,
        result: &[u8],
        tag: &str,
        hash: i64,
    );

    fn work_item_set_attribute(
        &self,
        item_name: &str,
        subindex: i32,
        attr_name: &str,
        values: &[AttrValue],
    );
}
