//! Shared server domain types
//!
//! A shared server is a long-lived auxiliary process started by one work item
//! and used by others. It announces itself over the report channel and is torn
//! down when the cook ends.

use serde::{Deserialize, Serialize};

/// Announcement of a running shared server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharedServerInfo {
    /// Logical server name, unique within a session
    pub name: String,
    pub host: String,
    pub port: u16,
    pub pid: u32,
    /// Protocol spoken by the server (e.g. "xmlrpc", "http")
    #[serde(default)]
    pub proto_type: String,
}

impl SharedServerInfo {
    /// `host:port` of the server
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
