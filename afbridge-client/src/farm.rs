//! Farm client facade
//!
//! Thin interface over the Afanasy server: submit a job, ask for a job's
//! current progress. No retry logic lives here; callers decide what a failure
//! means.

use std::time::Duration;

use afbridge_core::domain::job::{JobDescription, JobId, PollSnapshot};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::{ClientError, Result};
use crate::wire::{self, AfJob, GetEnvelope, JobsReply, ProgressReply, SubmitEnvelope, SubmitReply};

/// Operations the scheduler needs from a farm
#[async_trait]
pub trait FarmClient: Send + Sync {
    /// Submits a job description
    ///
    /// # Returns
    /// The identifier the farm assigned to the new job
    async fn submit(&self, job: &JobDescription) -> Result<JobId>;

    /// Fetches a point-in-time snapshot of a job
    ///
    /// # Returns
    /// `None` when the farm has no record of the job
    async fn poll_progress(&self, id: JobId) -> Result<Option<PollSnapshot>>;
}

/// HTTP client for an Afanasy server
#[derive(Debug, Clone)]
pub struct AfanasyClient {
    /// Base URL of the server (e.g., "http://localhost:51000")
    base_url: String,
    /// HTTP client instance
    client: Client,
}

impl AfanasyClient {
    /// Create a new farm client
    ///
    /// # Arguments
    /// * `base_url` - The base URL of the Afanasy server
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    /// Create a farm client whose requests give up after `timeout`
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(base_url, client))
    }

    /// Create a new farm client with a custom HTTP client
    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    /// Get the base URL of the farm
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Posts one request and decodes the reply
    ///
    /// A 404 is not an error here: it means the farm does not know the object.
    async fn send<B: Serialize, T: DeserializeOwned>(&self, body: &B) -> Result<Option<T>> {
        let url = format!("{}/", self.base_url);
        let response = self.client.post(&url).json(body).send().await?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::api_error(status.as_u16(), error_text));
        }

        let value: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ClientError::ParseError(format!("Failed to parse JSON response: {}", e)))?;

        if let Some(message) = value.get("error").and_then(|e| e.as_str()) {
            return Err(ClientError::api_error(status.as_u16(), message));
        }

        serde_json::from_value(value)
            .map(Some)
            .map_err(|e| ClientError::ParseError(format!("Unexpected reply shape: {}", e)))
    }
}

#[async_trait]
impl FarmClient for AfanasyClient {
    async fn submit(&self, job: &JobDescription) -> Result<JobId> {
        let envelope = SubmitEnvelope {
            job: AfJob::from(job),
        };

        let reply: SubmitReply = self
            .send(&envelope)
            .await?
            .ok_or_else(|| ClientError::NotFound("job submission endpoint".to_string()))?;

        debug!(job_id = reply.id, job = %job.name, "Farm accepted job");
        Ok(JobId(reply.id))
    }

    async fn poll_progress(&self, id: JobId) -> Result<Option<PollSnapshot>> {
        let Some(progress) = self
            .send::<_, ProgressReply>(&GetEnvelope::job_progress(id.0))
            .await?
        else {
            return Ok(None);
        };
        let Some(progress) = progress.job_progress else {
            return Ok(None);
        };

        let Some(info) = self
            .send::<_, JobsReply>(&GetEnvelope::job_info(id.0))
            .await?
        else {
            return Ok(None);
        };
        let Some(info) = info.jobs.first() else {
            return Ok(None);
        };

        Ok(Some(wire::snapshot(&progress, info)))
    }
}
