//! Report server lifecycle
//!
//! Binds the report channel inside a port range and serves it on a background
//! task until stopped.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::api::create_router;
use crate::error::ReportError;
use crate::handler::ReportHandler;

/// Inclusive range of ports the report server may listen on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortRange {
    pub start: u16,
    pub end: u16,
}

impl PortRange {
    pub fn new(start: u16, end: u16) -> Result<Self, ReportError> {
        if start > end {
            return Err(ReportError::InvalidPortRange { start, end });
        }
        Ok(Self { start, end })
    }
}

impl std::fmt::Display for PortRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// A running report channel
pub struct ReportServer {
    local_addr: SocketAddr,
    port_range: Option<PortRange>,
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl ReportServer {
    /// Binds and starts serving
    ///
    /// # Arguments
    /// * `bind` - Interface to listen on
    /// * `port_range` - Ports to try in order; `None` lets the OS pick one
    /// * `handler` - Receiver of every report
    pub async fn start(
        bind: IpAddr,
        port_range: Option<PortRange>,
        handler: Arc<dyn ReportHandler>,
    ) -> Result<Self, ReportError> {
        let listener = match port_range {
            Some(range) => bind_in_range(bind, range).await?,
            None => {
                let addr = SocketAddr::new(bind, 0);
                TcpListener::bind(addr)
                    .await
                    .map_err(|source| ReportError::Bind { addr, source })?
            }
        };
        let local_addr = listener.local_addr().map_err(|source| ReportError::Bind {
            addr: SocketAddr::new(bind, 0),
            source,
        })?;

        let app = create_router(handler);
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let task = tokio::spawn(async move {
            let result = axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await;
            if let Err(e) = result {
                warn!("Report server stopped with error: {}", e);
            }
        });

        info!("Report server listening on {}", local_addr);

        Ok(Self {
            local_addr,
            port_range,
            shutdown: Some(shutdown_tx),
            task,
        })
    }

    /// Address the server is listening on
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Port range the server was started with
    pub fn port_range(&self) -> Option<PortRange> {
        self.port_range
    }

    /// Whether the serving task is still alive
    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    /// Stops accepting connections and waits for in-flight calls to finish
    pub async fn stop(mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Err(e) = (&mut self.task).await {
            warn!("Report server task ended abnormally: {}", e);
        }
        info!("Report server on {} stopped", self.local_addr);
    }
}

impl Drop for ReportServer {
    fn drop(&mut self) {
        // Dropped without stop(): make sure nothing keeps serving
        if self.shutdown.is_some() {
            self.task.abort();
        }
    }
}

async fn bind_in_range(bind: IpAddr, range: PortRange) -> Result<TcpListener, ReportError> {
    for port in range.start..=range.end {
        let addr = SocketAddr::new(bind, port);
        match TcpListener::bind(addr).await {
            Ok(listener) => return Ok(listener),
            Err(e) if e.kind() == std::io::ErrorKind::AddrInUse => {
                debug!("Port {} in use, trying next", port);
            }
            Err(source) => return Err(ReportError::Bind { addr, source }),
        }
    }
    Err(ReportError::NoFreePort {
        start: range.start,
        end: range.end,
    })
}
