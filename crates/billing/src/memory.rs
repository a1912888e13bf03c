//! In-memory implementations of the billing ports
//!
//! Used by tests across the workspace and for running the API without
//! Stripe or Postgres. Both types record how often they were called so
//! tests can assert that a rejected request touched nothing.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use franklin_shared::{CustomerRecord, SubscriptionRecord};
use time::OffsetDateTime;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::error::{BillingError, BillingResult};
use crate::provider::{BillingProvider, ProviderSubscription, RawProviderData};
use crate::store::SubscriptionStore;

#[derive(Default)]
struct StoreState {
    customers: Vec<CustomerRecord>,
    subscriptions: HashMap<String, SubscriptionRecord>,
    fail_writes: bool,
}

/// Subscription store kept in process memory
#[derive(Clone, Default)]
pub struct InMemorySubscriptionStore {
    state: Arc<Mutex<StoreState>>,
    subscription_reads: Arc<AtomicUsize>,
    subscription_writes: Arc<AtomicUsize>,
}

impl InMemorySubscriptionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_customer(&self, user_id: Uuid, customer_id: &str) {
        self.state.lock().await.customers.push(CustomerRecord {
            user_id,
            customer_id: customer_id.to_string(),
            created_at: OffsetDateTime::now_utc(),
            deleted_at: None,
        });
    }

    pub async fn soft_delete_customer(&self, customer_id: &str) {
        let mut state = self.state.lock().await;
        for customer in state.customers.iter_mut() {
            if customer.customer_id == customer_id {
                customer.deleted_at = Some(OffsetDateTime::now_utc());
            }
        }
    }

    /// Make every following upsert fail with a database error
    pub async fn fail_writes(&self, fail: bool) {
        self.state.lock().await.fail_writes = fail;
    }

    /// Stored record, without counting as a read
    pub async fn snapshot(&self, customer_id: &str) -> Option<SubscriptionRecord> {
        self.state.lock().await.subscriptions.get(customer_id).cloned()
    }

    pub async fn subscription_count(&self) -> usize {
        self.state.lock().await.subscriptions.len()
    }

    pub fn subscription_reads(&self) -> usize {
        self.subscription_reads.load(Ordering::SeqCst)
    }

    pub fn subscription_writes(&self) -> usize {
        self.subscription_writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SubscriptionStore for InMemorySubscriptionStore {
    async fn find_owned_customer(
        &self,
        user_id: Uuid,
        customer_id: &str,
    ) -> BillingResult<Option<CustomerRecord>> {
        let state = self.state.lock().await;
        Ok(state
            .customers
            .iter()
            .find(|c| c.user_id == user_id && c.customer_id == customer_id && !c.is_deleted())
            .cloned())
    }

    async fn upsert_subscription(&self, record: &SubscriptionRecord) -> BillingResult<()> {
        self.subscription_writes.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.lock().await;
        if state.fail_writes {
            return Err(BillingError::Database(sqlx::Error::PoolTimedOut));
        }
        state
            .subscriptions
            .insert(record.customer_id.clone(), record.clone());
        Ok(())
    }

    async fn get_subscription(&self, customer_id: &str) -> BillingResult<Option<SubscriptionRecord>> {
        self.subscription_reads.fetch_add(1, Ordering::SeqCst);
        Ok(self.snapshot(customer_id).await)
    }
}

#[derive(Default)]
struct ProviderState {
    subscriptions: HashMap<String, Vec<ProviderSubscription>>,
    raw: HashMap<String, RawProviderData>,
    error: Option<String>,
}

/// Billing provider answering from preloaded data
#[derive(Clone, Default)]
pub struct StaticBillingProvider {
    state: Arc<Mutex<ProviderState>>,
    calls: Arc<AtomicUsize>,
}

impl StaticBillingProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscriptions returned for `customer_id`, in provider order
    pub async fn set_subscriptions(&self, customer_id: &str, subscriptions: Vec<ProviderSubscription>) {
        self.state
            .lock()
            .await
            .subscriptions
            .insert(customer_id.to_string(), subscriptions);
    }

    pub async fn set_raw(&self, customer_id: &str, raw: RawProviderData) {
        self.state
            .lock()
            .await
            .raw
            .insert(customer_id.to_string(), raw);
    }

    /// Make every following call fail with this Stripe error message
    pub async fn set_error(&self, message: Option<&str>) {
        self.state.lock().await.error = message.map(String::from);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BillingProvider for StaticBillingProvider {
    async fn list_subscriptions(
        &self,
        customer_id: &str,
        limit: u64,
    ) -> BillingResult<Vec<ProviderSubscription>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let state = self.state.lock().await;
        if let Some(message) = &state.error {
            return Err(BillingError::StripeApi(message.clone()));
        }
        Ok(state
            .subscriptions
            .get(customer_id)
            .map(|subs| subs.iter().take(limit as usize).cloned().collect())
            .unwrap_or_default())
    }

    async fn fetch_raw(&self, customer_id: &str) -> BillingResult<RawProviderData> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let state = self.state.lock().await;
        if let Some(message) = &state.error {
            return Err(BillingError::StripeApi(message.clone()));
        }
        state
            .raw
            .get(customer_id)
            .cloned()
            .ok_or_else(|| BillingError::StripeApi(format!("No such customer: '{}'", customer_id)))
    }
}
