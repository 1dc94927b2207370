//! Report channel client
//!
//! Used from inside a running farm task to report status, results and
//! attributes back to the scheduler that submitted it.

use afbridge_core::domain::attribute::AttrValue;
use afbridge_core::domain::shared_server::SharedServerInfo;
use afbridge_core::dto::report::{
    ItemStatusRequest, ResultRequest, RpcAck, SharedServerEndedRequest,
    SharedServerStartedRequest, SucceededRequest, WriteAttrRequest,
};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as B64;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{ClientError, Result};

/// HTTP client for a scheduler's report channel
#[derive(Debug, Clone)]
pub struct ReportClient {
    /// Base URL of the report channel (e.g., "http://10.0.0.5:53100")
    base_url: String,
    client: Client,
    /// Token of the job this task runs in, echoed with every call
    job_id: String,
}

impl ReportClient {
    /// Create a client for the report channel at `server_addr`
    ///
    /// # Arguments
    /// * `server_addr` - `host:port` as exported in `PDG_RESULT_SERVER`; a full URL is accepted too
    /// * `job_id` - Job token of the calling task, may be empty
    pub fn new(server_addr: &str, job_id: impl Into<String>) -> Self {
        let base_url = if server_addr.starts_with("http://") || server_addr.starts_with("https://")
        {
            server_addr.trim_end_matches('/').to_string()
        } else {
            format!("http://{}", server_addr.trim_end_matches('/'))
        };

        Self {
            base_url,
            client: Client::new(),
            job_id: job_id.into(),
        }
    }

    /// Get the base URL of the report channel
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // =============================================================================
    // Item Status
    // =============================================================================

    /// Report that an item (or batch sub-item when `subindex >= 0`) started cooking
    pub async fn start_cook(&self, item_name: &str, subindex: i32) -> Result<()> {
        let method = if subindex >= 0 {
            "start_cook_batch"
        } else {
            "start_cook"
        };
        self.notify(method, &self.status(item_name, subindex)).await
    }

    /// Report that an item finished successfully
    pub async fn succeeded(&self, item_name: &str, subindex: i32, duration: f64) -> Result<()> {
        let req = SucceededRequest {
            item_name: item_name.to_string(),
            subindex,
            duration,
            job_id: self.job_id.clone(),
        };
        self.notify("succeeded", &req).await
    }

    /// Report that an item failed
    pub async fn failed(&self, item_name: &str, subindex: i32) -> Result<()> {
        self.notify("failed", &self.status(item_name, subindex)).await
    }

    /// Report that an item was cancelled
    pub async fn cancelled(&self, item_name: &str, subindex: i32) -> Result<()> {
        self.notify("cancelled", &self.status(item_name, subindex)).await
    }

    // =============================================================================
    // Results & Attributes
    // =============================================================================

    /// Report a result (file path or raw bytes) for an item
    ///
    /// # Arguments
    /// * `data` - Result payload, sent base64 encoded
    /// * `tag` - Result tag such as "file/geo"
    /// * `hash` - Hash code of the result, 0 when unknown
    pub async fn result(
        &self,
        item_name: &str,
        subindex: i32,
        data: &[u8],
        tag: &str,
        hash: i64,
    ) -> Result<()> {
        let method = if subindex >= 0 { "result_batch" } else { "result" };
        let req = self.result_request(item_name, subindex, data, tag, hash, 0.0);
        self.notify(method, &req).await
    }

    /// Report a result and success in one call
    pub async fn success_and_result(
        &self,
        item_name: &str,
        subindex: i32,
        data: &[u8],
        tag: &str,
        hash: i64,
        duration: f64,
    ) -> Result<()> {
        let req = self.result_request(item_name, subindex, data, tag, hash, duration);
        self.notify("success_and_result", &req).await
    }

    /// Write attribute values into an item
    pub async fn write_attr(
        &self,
        item_name: &str,
        attr_name: &str,
        values: Vec<AttrValue>,
    ) -> Result<()> {
        if values.is_empty() {
            return Err(ClientError::InvalidRequest(format!(
                "attribute '{}' needs at least one value",
                attr_name
            )));
        }
        let req = WriteAttrRequest {
            item_name: item_name.to_string(),
            subindex: -1,
            attr_name: attr_name.to_string(),
            values,
            job_id: self.job_id.clone(),
        };
        self.notify("write_attr", &req).await
    }

    // =============================================================================
    // Shared Servers
    // =============================================================================

    /// Announce a shared server started by this task
    ///
    /// # Returns
    /// Whether the scheduler recorded the server
    pub async fn shared_server_started(&self, info: SharedServerInfo) -> Result<bool> {
        let req = SharedServerStartedRequest {
            info,
            job_id: self.job_id.clone(),
        };
        let ack: RpcAck = self.call("sharedserver_started", &req).await?;
        Ok(ack.ok)
    }

    /// Ask the scheduler to tear down a shared server
    pub async fn shared_server_ended(&self, name: &str) -> Result<bool> {
        let req = SharedServerEndedRequest {
            name: name.to_string(),
        };
        let ack: RpcAck = self.call("sharedserver_ended", &req).await?;
        Ok(ack.ok)
    }

    /// Look up a shared server by name
    ///
    /// # Returns
    /// `None` if no server with that name is registered
    pub async fn shared_server_info(&self, name: &str) -> Result<Option<SharedServerInfo>> {
        let url = format!("{}/rpc/sharedserver/{}", self.base_url, name);
        let response = self.client.get(&url).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        Self::decode(response).await.map(Some)
    }

    // =============================================================================
    // Helpers
    // =============================================================================

    fn status(&self, item_name: &str, subindex: i32) -> ItemStatusRequest {
        ItemStatusRequest {
            item_name: item_name.to_string(),
            subindex,
            job_id: self.job_id.clone(),
        }
    }

    fn result_request(
        &self,
        item_name: &str,
        subindex: i32,
        data: &[u8],
        tag: &str,
        hash: i64,
        duration: f64,
    ) -> ResultRequest {
        ResultRequest {
            item_name: item_name.to_string(),
            subindex,
            data: B64.encode(data),
            tag: tag.to_string(),
            hash,
            duration,
            job_id: self.job_id.clone(),
        }
    }

    /// Posts a notification that returns no content
    async fn notify<B: Serialize>(&self, method: &str, body: &B) -> Result<()> {
        let url = format!("{}/rpc/{}", self.base_url, method);
        let response = self.client.post(&url).json(body).send().await?;
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::api_error(status.as_u16(), error_text));
        }
        Ok(())
    }

    /// Posts a call and decodes its JSON reply
    async fn call<B: Serialize, T: DeserializeOwned>(&self, method: &str, body: &B) -> Result<T> {
        let url = format!("{}/rpc/{}", self.base_url, method);
        let response = self.client.post(&url).json(body).send().await?;
        Self::decode(response).await
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::api_error(status.as_u16(), error_text));
        }

        response
            .json()
            .await
            .map_err(|e| ClientError::ParseError(format!("Failed to parse JSON response: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_accepts_bare_address() {
        let client = ReportClient::new("10.0.0.5:53100", "3");
        assert_eq!(client.base_url(), "http://10.0.0.5:53100");
    }

    #[test]
    fn test_client_accepts_url() {
        let client = ReportClient::new("http://10.0.0.5:53100/", "");
        assert_eq!(client.base_url(), "http://10.0.0.5:53100");
    }

    #[test]
    fn test_result_payload_is_base64() {
        let client = ReportClient::new("localhost:1", "9");
        let req = client.result_request("a", -1, b"/tmp/out.bgeo", "file/geo", 0, 0.0);
        assert_eq!(req.data, B64.encode(b"/tmp/out.bgeo"));
        assert_eq!(req.job_id, "9");
    }

    #[tokio::test]
    async fn test_write_attr_requires_values() {
        let client = ReportClient::new("localhost:1", "");
        let err = client.write_attr("a", "frames", vec![]).await.unwrap_err();
        assert!(matches!(err, ClientError::InvalidRequest(_)));
    }
}
