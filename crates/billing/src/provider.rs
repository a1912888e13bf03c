//! Payment provider port
//!
//! The reconciliation and diagnostics services only talk to Stripe through
//! [`BillingProvider`]. [`crate::client::StripeClient`] is the production
//! implementation; [`crate::memory::StaticBillingProvider`] serves tests and
//! local development.

use async_trait::async_trait;
use franklin_shared::SubscriptionStatus;
use serde::Serialize;

use crate::error::BillingResult;

/// Subscriptions fetched per sync call
pub const SYNC_SUBSCRIPTION_LIMIT: u64 = 5;

/// Subscriptions fetched for a debug snapshot
pub const DEBUG_SUBSCRIPTION_LIMIT: u64 = 10;

/// Invoices and payment methods fetched for a debug snapshot
pub const DEBUG_LIST_LIMIT: u64 = 5;

/// Default payment method attached to a subscription
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum PaymentMethodRef {
    /// Unexpanded reference, carries no display details
    Id(String),
    /// Expanded payment method. Fields are `None` when it is not a card.
    Card {
        brand: Option<String>,
        last4: Option<String>,
    },
}

/// The subset of a Stripe subscription that reconciliation needs
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderSubscription {
    pub id: String,
    pub status: SubscriptionStatus,
    /// Price of the first subscription item
    pub price_id: Option<String>,
    pub current_period_start: i64,
    pub current_period_end: i64,
    pub cancel_at_period_end: bool,
    pub default_payment_method: Option<PaymentMethodRef>,
}

impl ProviderSubscription {
    /// Card brand and last4, only when the payment method was expanded
    pub fn card_details(&self) -> (Option<String>, Option<String>) {
        match &self.default_payment_method {
            Some(PaymentMethodRef::Card { brand, last4 }) => (brand.clone(), last4.clone()),
            Some(PaymentMethodRef::Id(_)) | None => (None, None),
        }
    }
}

/// Raw Stripe objects for a customer, kept as JSON for support triage
#[derive(Debug, Clone, Default, Serialize)]
pub struct RawProviderData {
    pub customer: serde_json::Value,
    pub subscriptions: Vec<serde_json::Value>,
    pub invoices: Vec<serde_json::Value>,
    pub payment_methods: Vec<serde_json::Value>,
}

#[async_trait]
pub trait BillingProvider: Send + Sync {
    /// List up to `limit` subscriptions of a customer across all statuses,
    /// with the default payment method expanded. Order is provider-defined.
    async fn list_subscriptions(
        &self,
        customer_id: &str,
        limit: u64,
    ) -> BillingResult<Vec<ProviderSubscription>>;

    /// Fetch customer, subscriptions, invoices and payment methods as raw JSON
    async fn fetch_raw(&self, customer_id: &str) -> BillingResult<RawProviderData>;
}
