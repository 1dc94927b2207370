//! Report channel DTOs
//!
//! Bodies posted by running farm tasks to the scheduler's report channel.
//! Every request carries the task's job token, which is informational only.

use serde::{Deserialize, Serialize};

use crate::domain::attribute::AttrValue;
use crate::domain::shared_server::SharedServerInfo;

fn no_subindex() -> i32 {
    -1
}

/// start_cook / start_cook_batch / failed / cancelled
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemStatusRequest {
    pub item_name: String,
    /// Batch sub-item index, -1 for a regular item
    #[serde(default = "no_subindex")]
    pub subindex: i32,
    #[serde(default)]
    pub job_id: String,
}

/// succeeded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SucceededRequest {
    pub item_name: String,
    #[serde(default = "no_subindex")]
    pub subindex: i32,
    /// Cook time in seconds
    #[serde(default)]
    pub duration: f64,
    #[serde(default)]
    pub job_id: String,
}

/// result / result_batch / success_and_result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRequest {
    pub item_name: String,
    #[serde(default = "no_subindex")]
    pub subindex: i32,
    /// Base64 encoded result payload
    pub data: String,
    /// Result tag, e.g. "file/geo"; empty means "categorize by extension"
    #[serde(default)]
    pub tag: String,
    #[serde(default)]
    pub hash: i64,
    /// Only meaningful for success_and_result
    #[serde(default)]
    pub duration: f64,
    #[serde(default)]
    pub job_id: String,
}

/// write_attr
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WriteAttrRequest {
    pub item_name: String,
    #[serde(default = "no_subindex")]
    pub subindex: i32,
    pub attr_name: String,
    pub values: Vec<AttrValue>,
    #[serde(default)]
    pub job_id: String,
}

/// sharedserver_started
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SharedServerStartedRequest {
    pub info: SharedServerInfo,
    #[serde(default)]
    pub job_id: String,
}

/// sharedserver_ended
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SharedServerEndedRequest {
    pub name: String,
}

/// Reply to calls that report whether they took effect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcAck {
    pub ok: bool,
}
