//! Shared server teardown
//!
//! Shared servers run on farm hosts outside of any tracked job. The scheduler
//! asks them to shut down when a task ends them or when the cook stops.

use std::time::Duration;

use afbridge_client::ClientError;
use afbridge_core::domain::shared_server::SharedServerInfo;
use async_trait::async_trait;
use tracing::debug;

/// Capability to shut a shared server down
#[async_trait]
pub trait SharedServerStopper: Send + Sync {
    async fn stop(&self, info: &SharedServerInfo) -> afbridge_client::Result<()>;
}

/// Stops a shared server with `POST http://{host}:{port}/shutdown`
#[derive(Debug, Clone, Default)]
pub struct HttpStopper {
    client: reqwest::Client,
}

impl HttpStopper {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    pub fn with_timeout(timeout: Duration) -> afbridge_client::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::new(client))
    }
}

#[async_trait]
impl SharedServerStopper for HttpStopper {
    async fn stop(&self, info: &SharedServerInfo) -> afbridge_client::Result<()> {
        let url = format!("http://{}/shutdown", info.address());
        debug!("Requesting shutdown of shared server {} at {}", info.name, url);

        let response = self.client.post(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::api_error(status.as_u16(), message));
        }
        Ok(())
    }
}
