//! Subscription state for the signed-in user

use franklin_shared::{entitlement, product_by_price_id, SubscriptionStatus, UserSubscription};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::{ClientError, ClientResult};
use crate::supabase::SupabaseClient;

const USER_SUBSCRIPTIONS_VIEW: &str = "stripe_user_subscriptions";

/// Response of the sync function
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncResult {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    /// Failure reason when `success` is false
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default)]
    pub status: Option<SubscriptionStatus>,
    #[serde(default)]
    pub subscription_id: Option<String>,
}

/// Projection of a `stripe_customers` row
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub(crate) struct CustomerIdRow {
    pub(crate) customer_id: String,
}

/// Stripe customer id of the session user, if a customer record exists
pub async fn lookup_customer_id(client: &SupabaseClient) -> ClientResult<Option<String>> {
    let user_id = client.user_id().ok_or(ClientError::NotAuthenticated)?;
    let user_id = user_id.to_string();

    let row: Option<CustomerIdRow> = client
        .select_maybe_single("stripe_customers", &[("user_id", user_id.as_str())])
        .await?;

    Ok(row.map(|r| r.customer_id).filter(|id| !id.is_empty()))
}

/// Ask the backend to reconcile `customer_id` with Stripe
pub(crate) async fn invoke_sync(client: &SupabaseClient, customer_id: &str) -> ClientResult<SyncResult> {
    let result: SyncResult = client
        .invoke_function("sync-subscription", &json!({ "customer_id": customer_id }))
        .await?;

    if !result.success {
        return Err(ClientError::Api {
            status: 200,
            message: result
                .error
                .or(result.message)
                .unwrap_or_else(|| "Failed to sync subscription".to_string()),
        });
    }

    tracing::info!(
        customer_id = %customer_id,
        status = ?result.status,
        "Subscription synced"
    );
    Ok(result)
}

/// Cached view of the user's subscription
///
/// `loading` starts out true and is false after every [`fetch`](Self::fetch).
#[derive(Debug, Clone)]
pub struct SubscriptionViewModel {
    client: SupabaseClient,
    pub subscription: Option<UserSubscription>,
    pub loading: bool,
    pub error: Option<String>,
}

impl SubscriptionViewModel {
    pub fn new(client: SupabaseClient) -> Self {
        Self {
            client,
            subscription: None,
            loading: true,
            error: None,
        }
    }

    pub fn client(&self) -> &SupabaseClient {
        &self.client
    }

    /// Reload the view row.
    ///
    /// Failures are logged and stored in `error`; the previous `subscription`
    /// is kept. Without configuration or a session nothing is requested.
    pub async fn fetch(&mut self) {
        if !self.client.is_configured() || self.client.user_id().is_none() {
            self.loading = false;
            return;
        }

        self.loading = true;
        self.error = None;

        match self
            .client
            .select_maybe_single::<UserSubscription>(USER_SUBSCRIPTIONS_VIEW, &[])
            .await
        {
            Ok(Some(mut row)) => {
                row.product_name = row
                    .price_id
                    .as_deref()
                    .and_then(product_by_price_id)
                    .map(|product| product.name.to_string());
                self.subscription = Some(row);
            }
            Ok(None) => self.subscription = None,
            Err(e) => {
                tracing::error!(error = %e, "Error fetching subscription");
                self.error = Some(e.to_string());
            }
        }

        self.loading = false;
    }

    pub fn has_active_subscription(&self) -> bool {
        entitlement::has_access(self.subscription.as_ref())
    }

    pub fn is_subscription_canceled(&self) -> bool {
        entitlement::is_canceled(self.subscription.as_ref())
    }

    /// Reconcile with Stripe now, then reload
    pub async fn sync_now(&mut self) -> ClientResult<SyncResult> {
        let customer_id = lookup_customer_id(&self.client)
            .await?
            .ok_or(ClientError::NoCustomer)?;

        let result = invoke_sync(&self.client, &customer_id).await?;
        self.fetch().await;
        Ok(result)
    }
}
