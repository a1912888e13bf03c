//! Customer diagnostics for support triage
//!
//! Fetches raw Stripe objects for a customer and derives a few flags from
//! them. Never writes anything.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::error::BillingResult;
use crate::provider::{BillingProvider, RawProviderData};
use crate::store::SubscriptionStore;
use crate::subscriptions::ensure_owned;

/// Flags derived from raw Stripe data
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderAnalysis {
    /// Any subscription is `active` or `trialing`
    pub has_active_subscription: bool,
    /// Customer flagged `promo`, or a subscription carries a 100% coupon
    pub is_promo_customer: bool,
    /// Customer flagged `beta`, a beta email address, or a beta-typed subscription
    pub is_beta_customer: bool,
}

fn jget<'a>(val: &'a Value, path: &[&str]) -> Option<&'a Value> {
    let mut cur = val;
    for key in path {
        cur = cur.get(*key)?;
    }
    Some(cur)
}

fn jstr<'a>(val: &'a Value, path: &[&str]) -> Option<&'a str> {
    jget(val, path)?.as_str()
}

impl ProviderAnalysis {
    pub fn from_raw(raw: &RawProviderData) -> Self {
        let has_active_subscription = raw.subscriptions.iter().any(|sub| {
            matches!(jstr(sub, &["status"]), Some("active") | Some("trialing"))
        });

        let is_promo_customer = jstr(&raw.customer, &["metadata", "promo"]) == Some("true")
            || raw.subscriptions.iter().any(|sub| {
                jget(sub, &["discount", "coupon", "percent_off"]).and_then(Value::as_f64)
                    == Some(100.0)
            });

        let is_beta_customer = jstr(&raw.customer, &["metadata", "beta"]) == Some("true")
            || jstr(&raw.customer, &["email"]).is_some_and(|email| email.contains("beta"))
            || raw
                .subscriptions
                .iter()
                .any(|sub| jstr(sub, &["metadata", "type"]) == Some("beta"));

        Self {
            has_active_subscription,
            is_promo_customer,
            is_beta_customer,
        }
    }
}

/// Debug snapshot returned to support tooling
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DebugReport {
    pub customer: Value,
    pub subscriptions: Vec<Value>,
    pub invoices: Vec<Value>,
    pub payment_methods: Vec<Value>,
    pub analysis: ProviderAnalysis,
}

impl From<RawProviderData> for DebugReport {
    fn from(raw: RawProviderData) -> Self {
        let analysis = ProviderAnalysis::from_raw(&raw);
        Self {
            customer: raw.customer,
            subscriptions: raw.subscriptions,
            invoices: raw.invoices,
            payment_methods: raw.payment_methods,
            analysis,
        }
    }
}

/// Live Stripe inspection for a caller's own customer
#[derive(Clone)]
pub struct DebugService {
    provider: Arc<dyn BillingProvider>,
    store: Arc<dyn SubscriptionStore>,
}

impl DebugService {
    pub fn new(provider: Arc<dyn BillingProvider>, store: Arc<dyn SubscriptionStore>) -> Self {
        Self { provider, store }
    }

    pub async fn inspect(&self, user_id: Uuid, customer_id: &str) -> BillingResult<DebugReport> {
        ensure_owned(self.store.as_ref(), user_id, customer_id).await?;

        let raw = self.provider.fetch_raw(customer_id).await?;
        tracing::debug!(
            customer_id = %customer_id,
            subscriptions = raw.subscriptions.len(),
            invoices = raw.invoices.len(),
            payment_methods = raw.payment_methods.len(),
            "Fetched raw Stripe data"
        );

        Ok(DebugReport::from(raw))
    }
}
