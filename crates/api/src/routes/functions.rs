//! Billing function endpoints
//!
//! Both endpoints take `{"customer_id": ".."}` and check, in order: body,
//! caller identity, then customer ownership.

use axum::{body::Bytes, extract::State, http::HeaderMap, Json};
use franklin_billing::DebugReport;
use franklin_shared::SubscriptionStatus;
use serde::{Deserialize, Serialize};

use crate::{
    auth::authenticate_bearer,
    error::{ApiError, ApiResult},
    state::AppState,
};

#[derive(Debug, Deserialize)]
struct CustomerRequest {
    #[serde(default)]
    customer_id: Option<String>,
}

/// Pull a non-empty `customer_id` out of the raw body.
///
/// Malformed JSON is treated the same as a missing id.
fn parse_customer_id(body: &[u8]) -> ApiResult<String> {
    let request: CustomerRequest = serde_json::from_slice(body).map_err(|e| {
        tracing::debug!(error = %e, "Unparseable request body");
        ApiError::MissingCustomerId
    })?;

    request
        .customer_id
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .ok_or(ApiError::MissingCustomerId)
}

#[derive(Debug, Serialize)]
pub struct SyncResponse {
    pub success: bool,
    pub message: &'static str,
    pub status: SubscriptionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscription_id: Option<String>,
}

/// POST /functions/v1/sync-subscription
pub async fn sync_subscription(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<SyncResponse>> {
    let customer_id = parse_customer_id(&body)?;
    let user = authenticate_bearer(&state.auth, &headers).await?;

    tracing::info!(
        user_id = %user.user_id,
        customer_id = %customer_id,
        "Syncing subscription"
    );

    let outcome = state.billing.sync.sync(user.user_id, &customer_id).await?;

    Ok(Json(SyncResponse {
        success: true,
        message: outcome.message,
        status: outcome.status,
        subscription_id: outcome.subscription_id,
    }))
}

/// POST /functions/v1/debug-stripe-customer
pub async fn debug_stripe_customer(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<DebugReport>> {
    let customer_id = parse_customer_id(&body)?;
    let user = authenticate_bearer(&state.auth, &headers).await?;

    tracing::info!(
        user_id = %user.user_id,
        customer_id = %customer_id,
        "Inspecting Stripe customer"
    );

    let report = state.billing.debug.inspect(user.user_id, &customer_id).await?;
    Ok(Json(report))
}
