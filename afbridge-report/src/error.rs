//! Report server errors

use std::net::SocketAddr;

use thiserror::Error;

/// Errors raised while starting or running the report server
#[derive(Debug, Error)]
pub enum ReportError {
    /// Binding a listener failed for a reason other than the port being taken
    #[error("Failed to bind report server on {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// Every port in the configured range is taken
    #[error("No free port in range {start}-{end}")]
    NoFreePort { start: u16, end: u16 },

    /// Range start is after range end
    #[error("Invalid port range {start}-{end}")]
    InvalidPortRange { start: u16, end: u16 },
}
