//! Subscription diagnostics for support
//!
//! Collects what the signed-in user can see of their billing rows, plus the
//! live Stripe snapshot, into one serializable report. Every check records its
//! own failure so one broken query never hides the others.

use franklin_shared::UserSubscription;
use serde::Serialize;
use serde_json::{json, Value};

use crate::error::{ClientError, ClientResult};
use crate::subscription::{invoke_sync, lookup_customer_id, CustomerIdRow, SyncResult};
use crate::supabase::SupabaseClient;

/// Outcome of one check: data or the error message, never both
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Check<T> {
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> Check<T> {
    pub fn ok(data: T) -> Self {
        Self {
            data: Some(data),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            data: None,
            error: Some(error.into()),
        }
    }
}

impl<T> From<ClientResult<T>> for Check<T> {
    fn from(result: ClientResult<T>) -> Self {
        match result {
            Ok(data) => Check::ok(data),
            Err(e) => Check::failed(e.to_string()),
        }
    }
}

/// Everything gathered by [`DiagnosticCollector::run`]
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticSnapshot {
    /// `stripe_customers` rows for the user
    pub customers: Check<Vec<Value>>,
    /// All visible `stripe_subscriptions` rows
    pub subscriptions: Check<Vec<Value>>,
    /// Rows of the per-user view
    pub user_subscriptions: Check<Vec<UserSubscription>>,
    /// Customer id read the way the sync flow looks it up
    pub test_customer: Check<Option<String>>,
    /// Present only when a customer id was found
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test_subscription: Option<Check<Option<Value>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stripe_data: Option<Check<Value>>,
}

impl DiagnosticSnapshot {
    pub fn customer_id(&self) -> Option<&str> {
        self.test_customer.data.as_ref().and_then(|id| id.as_deref())
    }
}

/// Read-only check runner for the signed-in user
#[derive(Debug, Clone)]
pub struct DiagnosticCollector {
    client: SupabaseClient,
}

impl DiagnosticCollector {
    pub fn new(client: SupabaseClient) -> Self {
        Self { client }
    }

    /// Run every check.
    ///
    /// Only fails up front when the client is unconfigured or has no session.
    pub async fn run(&self) -> ClientResult<DiagnosticSnapshot> {
        if !self.client.is_configured() {
            return Err(ClientError::NotConfigured);
        }
        let user_id = self
            .client
            .user_id()
            .ok_or(ClientError::NotAuthenticated)?
            .to_string();
        let by_user = [("user_id", user_id.as_str())];

        let customers = Check::from(
            self.client
                .select_rows::<Value>("stripe_customers", &by_user)
                .await,
        );
        let subscriptions = Check::from(
            self.client
                .select_rows::<Value>("stripe_subscriptions", &[])
                .await,
        );
        let user_subscriptions = Check::from(
            self.client
                .select_rows::<UserSubscription>("stripe_user_subscriptions", &[])
                .await,
        );
        let test_customer = Check::from(
            self.client
                .select_maybe_single::<CustomerIdRow>("stripe_customers", &by_user)
                .await
                .map(|row| row.map(|r| r.customer_id)),
        );

        let mut snapshot = DiagnosticSnapshot {
            customers,
            subscriptions,
            user_subscriptions,
            test_customer,
            test_subscription: None,
            stripe_data: None,
        };

        if let Some(customer_id) = snapshot.customer_id().map(String::from) {
            snapshot.test_subscription = Some(Check::from(
                self.client
                    .select_maybe_single::<Value>(
                        "stripe_subscriptions",
                        &[("customer_id", customer_id.as_str())],
                    )
                    .await,
            ));
            snapshot.stripe_data = Some(self.fetch_stripe_data(&customer_id).await);
        }

        tracing::debug!(
            customer_found = snapshot.stripe_data.is_some(),
            "Diagnostics complete"
        );
        Ok(snapshot)
    }

    async fn fetch_stripe_data(&self, customer_id: &str) -> Check<Value> {
        match self
            .client
            .invoke_function::<_, Value>("debug-stripe-customer", &json!({ "customer_id": customer_id }))
            .await
        {
            Ok(data) => Check::ok(data),
            Err(ClientError::Api { status, message }) => {
                tracing::warn!(status, message = %message, "Debug function failed");
                Check::failed("Failed to fetch Stripe data")
            }
            Err(e) => Check::failed(format!("Stripe fetch error: {}", e)),
        }
    }

    /// Trigger reconciliation for the user's customer
    pub async fn sync_from_provider(&self) -> ClientResult<SyncResult> {
        let customer_id = lookup_customer_id(&self.client)
            .await?
            .ok_or(ClientError::NoCustomer)?;
        invoke_sync(&self.client, &customer_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use mockito::Matcher;
    use uuid::Uuid;

    fn collector(server: &mockito::Server, user_id: Uuid) -> DiagnosticCollector {
        DiagnosticCollector::new(
            SupabaseClient::new(ClientConfig::new(server.url(), "anon-key"))
                .with_session("user-token", user_id),
        )
    }

    async fn mock_table(server: &mut mockito::Server, table: &str, body: &str) -> mockito::Mock {
        server
            .mock("GET", format!("/rest/v1/{}", table).as_str())
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(body)
            .create_async()
            .await
    }

    #[tokio::test]
    async fn test_run_with_customer() {
        let mut server = mockito::Server::new_async().await;
        let user_id = Uuid::new_v4();
        mock_table(&mut server, "stripe_customers", r#"[{"customer_id":"cus_1"}]"#).await;
        mock_table(
            &mut server,
            "stripe_subscriptions",
            r#"[{"customer_id":"cus_1","status":"active"}]"#,
        )
        .await;
        mock_table(
            &mut server,
            "stripe_user_subscriptions",
            r#"[{"customer_id":"cus_1","subscription_status":"active","cancel_at_period_end":null}]"#,
        )
        .await;
        server
            .mock("POST", "/functions/v1/debug-stripe-customer")
            .match_body(Matcher::Json(json!({"customer_id": "cus_1"})))
            .with_status(200)
            .with_body(r#"{"customer":{"id":"cus_1"},"analysis":{"hasActiveSubscription":true}}"#)
            .create_async()
            .await;

        let snapshot = collector(&server, user_id).run().await.unwrap();

        assert_eq!(snapshot.customer_id(), Some("cus_1"));
        assert_eq!(snapshot.test_customer, Check::ok(Some("cus_1".to_string())));
        assert_eq!(snapshot.customers.data.as_ref().unwrap().len(), 1);
        assert!(snapshot.user_subscriptions.error.is_none());
        let sub = snapshot.test_subscription.as_ref().unwrap();
        assert_eq!(sub.data.as_ref().unwrap().as_ref().unwrap()["status"], "active");
        let stripe = snapshot.stripe_data.as_ref().unwrap();
        assert_eq!(stripe.data.as_ref().unwrap()["customer"]["id"], "cus_1");

        let value = serde_json::to_value(&snapshot).unwrap();
        assert!(value.get("userSubscriptions").is_some());
        assert!(value.get("stripeData").is_some());
        assert_eq!(value["testCustomer"]["data"], "cus_1");
    }

    #[tokio::test]
    async fn test_run_without_customer_skips_stripe() {
        let mut server = mockito::Server::new_async().await;
        mock_table(&mut server, "stripe_customers", "[]").await;
        mock_table(&mut server, "stripe_subscriptions", "[]").await;
        mock_table(&mut server, "stripe_user_subscriptions", "[]").await;
        let debug = server
            .mock("POST", "/functions/v1/debug-stripe-customer")
            .expect(0)
            .create_async()
            .await;

        let snapshot = collector(&server, Uuid::new_v4()).run().await.unwrap();

        debug.assert_async().await;
        assert_eq!(snapshot.test_customer, Check::ok(None));
        assert!(snapshot.test_subscription.is_none());
        assert!(snapshot.stripe_data.is_none());
    }

    #[tokio::test]
    async fn test_failing_checks_are_recorded() {
        let mut server = mockito::Server::new_async().await;
        mock_table(&mut server, "stripe_customers", r#"[{"customer_id":"cus_1"}]"#).await;
        server
            .mock("GET", "/rest/v1/stripe_subscriptions")
            .match_query(Matcher::Any)
            .with_status(403)
            .with_body(r#"{"message":"permission denied for table stripe_subscriptions"}"#)
            .create_async()
            .await;
        mock_table(&mut server, "stripe_user_subscriptions", "[]").await;
        server
            .mock("POST", "/functions/v1/debug-stripe-customer")
            .with_status(500)
            .with_body(r#"{"error":"No such customer: 'cus_1'"}"#)
            .create_async()
            .await;

        let snapshot = collector(&server, Uuid::new_v4()).run().await.unwrap();

        assert_eq!(
            snapshot.subscriptions.error.as_deref(),
            Some("permission denied for table stripe_subscriptions")
        );
        assert!(snapshot.test_subscription.unwrap().error.is_some());
        assert_eq!(
            snapshot.stripe_data,
            Some(Check::failed("Failed to fetch Stripe data"))
        );
        assert!(snapshot.customers.error.is_none());
    }

    #[tokio::test]
    async fn test_run_requires_session() {
        let collector = DiagnosticCollector::new(SupabaseClient::new(ClientConfig::new(
            "http://127.0.0.1:9",
            "anon",
        )));
        assert!(matches!(
            collector.run().await,
            Err(ClientError::NotAuthenticated)
        ));

        let demo = DiagnosticCollector::new(SupabaseClient::new(ClientConfig::default()));
        assert!(matches!(demo.run().await, Err(ClientError::NotConfigured)));
    }

    #[tokio::test]
    async fn test_sync_from_provider_without_customer() {
        let mut server = mockito::Server::new_async().await;
        mock_table(&mut server, "stripe_customers", "[]").await;

        let err = collector(&server, Uuid::new_v4())
            .sync_from_provider()
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "No customer record found");
    }

    #[tokio::test]
    async fn test_sync_from_provider_surfaces_backend_error() {
        let mut server = mockito::Server::new_async().await;
        mock_table(&mut server, "stripe_customers", r#"[{"customer_id":"cus_1"}]"#).await;
        server
            .mock("POST", "/functions/v1/sync-subscription")
            .with_status(500)
            .with_body(r#"{"error":"Failed to update subscription"}"#)
            .create_async()
            .await;

        let err = collector(&server, Uuid::new_v4())
            .sync_from_provider()
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Failed to update subscription");
    }
}
