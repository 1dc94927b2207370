//! API Module
//!
//! HTTP layer of the report channel. Each submodule handles the endpoints
//! for one kind of report.

pub mod error;
pub mod health;
pub mod item;
pub mod shared_server;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::handler::ReportHandler;

/// Shared state of every endpoint
pub type HandlerState = Arc<dyn ReportHandler>;

/// Create the report channel router
pub fn create_router(handler: HandlerState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Item status
        .route("/rpc/start_cook", post(item::start_cook))
        .route("/rpc/start_cook_batch", post(item::start_cook_batch))
        .route("/rpc/succeeded", post(item::succeeded))
        .route("/rpc/failed", post(item::failed))
        .route("/rpc/cancelled", post(item::cancelled))
        // Results and attributes
        .route("/rpc/result", post(item::result))
        .route("/rpc/result_batch", post(item::result_batch))
        .route("/rpc/success_and_result", post(item::success_and_result))
        .route("/rpc/write_attr", post(item::write_attr))
        // Shared servers
        .route(
            "/rpc/sharedserver_started",
            post(shared_server::sharedserver_started),
        )
        .route(
            "/rpc/sharedserver_ended",
            post(shared_server::sharedserver_ended),
        )
        .route(
            "/rpc/sharedserver/{name}",
            get(shared_server::get_sharedserver_info),
        )
        // Add state and middleware
        .with_state(handler)
        .layer(TraceLayer::new_for_http())
}
