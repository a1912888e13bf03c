//! Stripe client wrapper

use async_trait::async_trait;
use franklin_shared::SubscriptionStatus;
use stripe::{
    Customer, CustomerId, Expandable, Invoice, ListInvoices, ListPaymentMethods,
    ListSubscriptions, PaymentMethod, Subscription, SubscriptionStatus as StripeSubStatus,
    SubscriptionStatusFilter,
};

use crate::error::{BillingError, BillingResult};
use crate::provider::{
    BillingProvider, PaymentMethodRef, ProviderSubscription, RawProviderData, DEBUG_LIST_LIMIT,
    DEBUG_SUBSCRIPTION_LIMIT,
};

/// Stripe configuration
#[derive(Debug, Clone)]
pub struct StripeConfig {
    pub secret_key: String,
    /// Reported to Stripe as app info on every request
    pub app_name: String,
}

impl StripeConfig {
    pub fn new(secret_key: impl Into<String>) -> Self {
        Self {
            secret_key: secret_key.into(),
            app_name: "Franklin".to_string(),
        }
    }

    pub fn validate(&self) -> BillingResult<()> {
        if self.secret_key.is_empty() {
            return Err(BillingError::NotConfigured(
                "STRIPE_SECRET_KEY is empty".to_string(),
            ));
        }
        if !self.secret_key.starts_with("sk_") && !self.secret_key.starts_with("rk_") {
            return Err(BillingError::NotConfigured(
                "STRIPE_SECRET_KEY must be a secret or restricted key".to_string(),
            ));
        }
        Ok(())
    }

    /// Whether the key targets Stripe test data
    pub fn is_test_mode(&self) -> bool {
        self.secret_key.starts_with("sk_test_") || self.secret_key.starts_with("rk_test_")
    }
}

/// Thin wrapper over the async-stripe client
#[derive(Clone)]
pub struct StripeClient {
    inner: stripe::Client,
}

impl StripeClient {
    pub fn new(config: StripeConfig) -> Self {
        let inner = stripe::Client::new(config.secret_key.clone()).with_app_info(
            config.app_name.clone(),
            Some(env!("CARGO_PKG_VERSION").to_string()),
            None,
        );
        Self { inner }
    }

    async fn list_stripe_subscriptions(
        &self,
        customer_id: &CustomerId,
        limit: u64,
    ) -> BillingResult<Vec<Subscription>> {
        let expand = ["data.default_payment_method"];
        let mut params = ListSubscriptions::new();
        params.customer = Some(customer_id.clone());
        params.limit = Some(limit);
        params.status = Some(SubscriptionStatusFilter::All);
        params.expand = &expand;

        let subscriptions = Subscription::list(&self.inner, &params).await?;
        Ok(subscriptions.data)
    }
}

fn parse_customer_id(customer_id: &str) -> BillingResult<CustomerId> {
    customer_id
        .parse::<CustomerId>()
        .map_err(|e| BillingError::InvalidCustomerId(format!("{}: {}", customer_id, e)))
}

pub(crate) fn map_status(status: &StripeSubStatus) -> SubscriptionStatus {
    match status {
        StripeSubStatus::Active => SubscriptionStatus::Active,
        StripeSubStatus::PastDue => SubscriptionStatus::PastDue,
        StripeSubStatus::Canceled => SubscriptionStatus::Canceled,
        StripeSubStatus::Unpaid => SubscriptionStatus::Unpaid,
        StripeSubStatus::Trialing => SubscriptionStatus::Trialing,
        StripeSubStatus::Incomplete => SubscriptionStatus::Incomplete,
        StripeSubStatus::IncompleteExpired => SubscriptionStatus::IncompleteExpired,
        StripeSubStatus::Paused => SubscriptionStatus::Paused,
    }
}

impl From<&Subscription> for ProviderSubscription {
    fn from(subscription: &Subscription) -> Self {
        let price_id = subscription
            .items
            .data
            .first()
            .and_then(|item| item.price.as_ref())
            .map(|p| p.id.to_string());

        let default_payment_method =
            subscription
                .default_payment_method
                .as_ref()
                .map(|method| match method {
                    Expandable::Id(id) => PaymentMethodRef::Id(id.to_string()),
                    Expandable::Object(method) => PaymentMethodRef::Card {
                        brand: method.card.as_ref().map(|card| card.brand.clone()),
                        last4: method.card.as_ref().map(|card| card.last4.clone()),
                    },
                });

        Self {
            id: subscription.id.to_string(),
            status: map_status(&subscription.status),
            price_id,
            current_period_start: subscription.current_period_start,
            current_period_end: subscription.current_period_end,
            cancel_at_period_end: subscription.cancel_at_period_end,
            default_payment_method,
        }
    }
}

#[async_trait]
impl BillingProvider for StripeClient {
    async fn list_subscriptions(
        &self,
        customer_id: &str,
        limit: u64,
    ) -> BillingResult<Vec<ProviderSubscription>> {
        let customer_id = parse_customer_id(customer_id)?;
        let subscriptions = self.list_stripe_subscriptions(&customer_id, limit).await?;
        Ok(subscriptions.iter().map(ProviderSubscription::from).collect())
    }

    async fn fetch_raw(&self, customer_id: &str) -> BillingResult<RawProviderData> {
        let customer_id = parse_customer_id(customer_id)?;

        let customer = Customer::retrieve(&self.inner, &customer_id, &[]).await?;

        let subscriptions = self
            .list_stripe_subscriptions(&customer_id, DEBUG_SUBSCRIPTION_LIMIT)
            .await?;

        let mut invoice_params = ListInvoices::new();
        invoice_params.customer = Some(customer_id.clone());
        invoice_params.limit = Some(DEBUG_LIST_LIMIT);
        let invoices = Invoice::list(&self.inner, &invoice_params).await?;

        let mut method_params = ListPaymentMethods::new();
        method_params.customer = Some(customer_id.clone());
        method_params.limit = Some(DEBUG_LIST_LIMIT);
        let payment_methods = PaymentMethod::list(&self.inner, &method_params).await?;

        Ok(RawProviderData {
            customer: serde_json::to_value(&customer)?,
            subscriptions: to_values(&subscriptions)?,
            invoices: to_values(&invoices.data)?,
            payment_methods: to_values(&payment_methods.data)?,
        })
    }
}

fn to_values<T: serde::Serialize>(items: &[T]) -> BillingResult<Vec<serde_json::Value>> {
    items
        .iter()
        .map(|item| serde_json::to_value(item).map_err(BillingError::from))
        .collect()
}
