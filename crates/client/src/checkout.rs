//! Stripe checkout

use franklin_shared::{CheckoutMode, Product};
use serde::{Deserialize, Serialize};

use crate::error::{ClientError, ClientResult};
use crate::supabase::SupabaseClient;

#[derive(Debug, Clone, Serialize)]
pub struct CheckoutParams {
    pub price_id: String,
    pub mode: CheckoutMode,
    pub success_url: String,
    pub cancel_url: String,
}

impl CheckoutParams {
    /// Checkout for a catalog product, using its price and mode
    pub fn for_product(
        product: &Product,
        success_url: impl Into<String>,
        cancel_url: impl Into<String>,
    ) -> Self {
        Self {
            price_id: product.price_id.to_string(),
            mode: product.mode,
            success_url: success_url.into(),
            cancel_url: cancel_url.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CheckoutSessionResponse {
    #[serde(rename = "sessionId", alias = "session_id")]
    pub session_id: String,
    pub url: String,
}

/// Create a hosted checkout session for the signed-in user
pub async fn create_checkout_session(
    client: &SupabaseClient,
    params: &CheckoutParams,
) -> ClientResult<CheckoutSessionResponse> {
    if client.access_token().is_none() {
        return Err(ClientError::NotAuthenticated);
    }

    let session: CheckoutSessionResponse = client
        .call_function(
            "stripe-checkout",
            params,
            Some("Failed to create checkout session"),
        )
        .await?;

    tracing::info!(
        session_id = %session.session_id,
        price_id = %params.price_id,
        "Checkout session created"
    );
    Ok(session)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use franklin_shared::product_by_id;
    use mockito::Matcher;
    use serde_json::json;
    use uuid::Uuid;

    fn params() -> CheckoutParams {
        CheckoutParams::for_product(
            product_by_id("prod_ScRbJ6ZECew9FE").unwrap(),
            "franklin://subscription-success",
            "franklin://subscription",
        )
    }

    #[tokio::test]
    async fn test_create_checkout_session() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/functions/v1/stripe-checkout")
            .match_header("authorization", "Bearer user-token")
            .match_body(Matcher::Json(json!({
                "price_id": "price_1RhCiGJteaQNzOZDgzrK6ws0",
                "mode": "subscription",
                "success_url": "franklin://subscription-success",
                "cancel_url": "franklin://subscription"
            })))
            .with_status(200)
            .with_body(r#"{"sessionId":"cs_test_1","url":"https://checkout.stripe.com/c/pay/cs_test_1"}"#)
            .create_async()
            .await;

        let client = SupabaseClient::new(ClientConfig::new(server.url(), "anon-key"))
            .with_session("user-token", Uuid::new_v4());
        let session = create_checkout_session(&client, &params()).await.unwrap();

        mock.assert_async().await;
        assert_eq!(session.session_id, "cs_test_1");
        assert!(session.url.starts_with("https://checkout.stripe.com/"));
    }

    #[tokio::test]
    async fn test_checkout_requires_token() {
        let client = SupabaseClient::new(ClientConfig::new("http://127.0.0.1:9", "anon"));
        let err = create_checkout_session(&client, &params()).await.unwrap_err();
        assert_eq!(err.to_string(), "No authentication token available");
    }

    #[tokio::test]
    async fn test_checkout_error_messages() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/functions/v1/stripe-checkout")
            .with_status(400)
            .with_body(r#"{"error":"No such price"}"#)
            .create_async()
            .await;

        let client = SupabaseClient::new(ClientConfig::new(server.url(), "anon-key"))
            .with_session("user-token", Uuid::new_v4());
        let err = create_checkout_session(&client, &params()).await.unwrap_err();
        assert_eq!(err.to_string(), "No such price");

        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/functions/v1/stripe-checkout")
            .with_status(500)
            .with_body("upstream timeout")
            .create_async()
            .await;

        let client = SupabaseClient::new(ClientConfig::new(server.url(), "anon-key"))
            .with_session("user-token", Uuid::new_v4());
        let err = create_checkout_session(&client, &params()).await.unwrap_err();
        assert_eq!(err.to_string(), "Failed to create checkout session");
    }
}
