//! HTTP routes

mod functions;


use axum::{
    middleware,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};

use crate::{cors::cors_middleware, error::ApiError, state::AppState};

pub use functions::{debug_stripe_customer, sync_subscription, SyncResponse};

/// Build the application router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route(
            "/functions/v1/sync-subscription",
            post(sync_subscription).fallback(method_not_allowed),
        )
        .route(
            "/functions/v1/debug-stripe-customer",
            post(debug_stripe_customer).fallback(method_not_allowed),
        )
        .layer(middleware::from_fn(cors_middleware))
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}
