//! Item API Handlers
//!
//! Status, result and attribute reports for work items.

use afbridge_core::dto::report::{
    ItemStatusRequest, ResultRequest, SucceededRequest, WriteAttrRequest,
};
use axum::{Json, extract::State, http::StatusCode};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as B64;

use crate::api::HandlerState;
use crate::api::error::{ApiError, ApiResult};

// =============================================================================
// Item Status Endpoints
// =============================================================================

/// POST /rpc/start_cook
pub async fn start_cook(
    State(handler): State<HandlerState>,
    Json(req): Json<ItemStatusRequest>,
) -> ApiResult<StatusCode> {
    tracing::debug!(item = %req.item_name, job_id = %req.job_id, "start_cook");

    handler.start_cook(&req.item_name, -1, &req.job_id).await;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /rpc/start_cook_batch
pub async fn start_cook_batch(
    State(handler): State<HandlerState>,
    Json(req): Json<ItemStatusRequest>,
) -> ApiResult<StatusCode> {
    tracing::debug!(item = %req.item_name, subindex = req.subindex, "start_cook_batch");

    require_batch_index(req.subindex)?;
    handler
        .start_cook(&req.item_name, req.subindex, &req.job_id)
        .await;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /rpc/succeeded
pub async fn succeeded(
    State(handler): State<HandlerState>,
    Json(req): Json<SucceededRequest>,
) -> ApiResult<StatusCode> {
    tracing::debug!(item = %req.item_name, duration = req.duration, "succeeded");

    handler
        .succeeded(&req.item_name, req.subindex, req.duration, &req.job_id)
        .await;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /rpc/failed
pub async fn failed(
    State(handler): State<HandlerState>,
    Json(req): Json<ItemStatusRequest>,
) -> ApiResult<StatusCode> {
    tracing::debug!(item = %req.item_name, job_id = %req.job_id, "failed");

    handler
        .failed(&req.item_name, req.subindex, &req.job_id)
        .await;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /rpc/cancelled
pub async fn cancelled(
    State(handler): State<HandlerState>,
    Json(req): Json<ItemStatusRequest>,
) -> ApiResult<StatusCode> {
    tracing::debug!(item = %req.item_name, job_id = %req.job_id, "cancelled");

    handler
        .cancelled(&req.item_name, req.subindex, &req.job_id)
        .await;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Result & Attribute Endpoints
// =============================================================================

/// POST /rpc/result
pub async fn result(
    State(handler): State<HandlerState>,
    Json(req): Json<ResultRequest>,
) -> ApiResult<StatusCode> {
    let data = decode_payload(&req.data)?;
    tracing::debug!(item = %req.item_name, tag = %req.tag, bytes = data.len(), "result");

    handler
        .file_result(&req.item_name, -1, &data, &req.tag, req.hash, &req.job_id)
        .await;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /rpc/result_batch
pub async fn result_batch(
    State(handler): State<HandlerState>,
    Json(req): Json<ResultRequest>,
) -> ApiResult<StatusCode> {
    require_batch_index(req.subindex)?;
    let data = decode_payload(&req.data)?;
    tracing::debug!(item = %req.item_name, subindex = req.subindex, tag = %req.tag, "result_batch");

    handler
        .file_result(
            &req.item_name,
            req.subindex,
            &data,
            &req.tag,
            req.hash,
            &req.job_id,
        )
        .await;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /rpc/success_and_result
/// The result is recorded before the item is marked succeeded
pub async fn success_and_result(
    State(handler): State<HandlerState>,
    Json(req): Json<ResultRequest>,
) -> ApiResult<StatusCode> {
    let data = decode_payload(&req.data)?;
    tracing::debug!(item = %req.item_name, tag = %req.tag, "success_and_result");

    handler
        .file_result(
            &req.item_name,
            req.subindex,
            &data,
            &req.tag,
            req.hash,
            &req.job_id,
        )
        .await;
    handler
        .succeeded(&req.item_name, req.subindex, req.duration, &req.job_id)
        .await;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /rpc/write_attr
pub async fn write_attr(
    State(handler): State<HandlerState>,
    Json(req): Json<WriteAttrRequest>,
) -> ApiResult<StatusCode> {
    tracing::debug!(item = %req.item_name, attr = %req.attr_name, "write_attr");

    if req.values.is_empty() {
        return Err(ApiError::BadRequest(format!(
            "attribute '{}' has no values",
            req.attr_name
        )));
    }

    handler
        .set_attribute(
            &req.item_name,
            req.subindex,
            &req.attr_name,
            &req.values,
            &req.job_id,
        )
        .await;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Helpers
// =============================================================================

fn require_batch_index(subindex: i32) -> ApiResult<()> {
    if subindex < 0 {
        return Err(ApiError::BadRequest(format!(
            "batch call needs a subindex >= 0, got {}",
            subindex
        )));
    }
    Ok(())
}

fn decode_payload(data: &str) -> ApiResult<Vec<u8>> {
    B64.decode(data)
        .map_err(|e| ApiError::BadRequest(format!("result payload is not base64: {}", e)))
}
