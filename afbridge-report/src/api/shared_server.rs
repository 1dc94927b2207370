//! Shared Server API Handlers

use afbridge_core::domain::shared_server::SharedServerInfo;
use afbridge_core::dto::report::{RpcAck, SharedServerEndedRequest, SharedServerStartedRequest};
use axum::{
    Json,
    extract::{Path, State},
};

use crate::api::HandlerState;
use crate::api::error::{ApiError, ApiResult};

/// POST /rpc/sharedserver_started
pub async fn sharedserver_started(
    State(handler): State<HandlerState>,
    Json(req): Json<SharedServerStartedRequest>,
) -> ApiResult<Json<RpcAck>> {
    tracing::info!(
        "Shared server '{}' started at {} (pid {})",
        req.info.name,
        req.info.address(),
        req.info.pid
    );

    if req.info.name.is_empty() {
        return Err(ApiError::BadRequest("shared server needs a name".to_string()));
    }

    let ok = handler.shared_server_started(req.info, &req.job_id).await;
    Ok(Json(RpcAck { ok }))
}

/// POST /rpc/sharedserver_ended
pub async fn sharedserver_ended(
    State(handler): State<HandlerState>,
    Json(req): Json<SharedServerEndedRequest>,
) -> ApiResult<Json<RpcAck>> {
    tracing::info!("Tear down requested for shared server '{}'", req.name);

    let ok = handler.shared_server_ended(&req.name).await;
    Ok(Json(RpcAck { ok }))
}

/// GET /rpc/sharedserver/{name}
pub async fn get_sharedserver_info(
    State(handler): State<HandlerState>,
    Path(name): Path<String>,
) -> ApiResult<Json<SharedServerInfo>> {
    tracing::debug!("Looking up shared server '{}'", name);

    handler
        .shared_server_info(&name)
        .await
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Shared server {} not found", name)))
}
