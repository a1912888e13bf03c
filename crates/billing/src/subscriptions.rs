//! Subscription reconciliation
//!
//! Re-derives a customer's cached [`SubscriptionRecord`] from Stripe. A
//! customer can have several current and historical subscriptions; exactly
//! one is selected by [`select_subscription`] and written with a full
//! overwrite. There is no automatic retry: the cache tolerates staleness and
//! the caller simply syncs again.

use std::sync::Arc;

use franklin_shared::{SubscriptionRecord, SubscriptionStatus};
use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::{BillingError, BillingResult};
use crate::provider::{BillingProvider, ProviderSubscription, SYNC_SUBSCRIPTION_LIMIT};
use crate::store::SubscriptionStore;

/// Selection order, most plausibly access-granting first
pub const STATUS_PRIORITY: [SubscriptionStatus; 6] = [
    SubscriptionStatus::Active,
    SubscriptionStatus::Trialing,
    SubscriptionStatus::PastDue,
    SubscriptionStatus::Incomplete,
    SubscriptionStatus::Canceled,
    SubscriptionStatus::Unpaid,
];

/// Pick the subscription to mirror.
///
/// Returns the first subscription with the highest-priority status present.
/// When no status in [`STATUS_PRIORITY`] matches, falls back to the first
/// subscription in provider order. `None` only for an empty slice.
pub fn select_subscription(subscriptions: &[ProviderSubscription]) -> Option<&ProviderSubscription> {
    STATUS_PRIORITY
        .iter()
        .find_map(|status| subscriptions.iter().find(|sub| sub.status == *status))
        .or_else(|| subscriptions.first())
}

/// Build the cached record for a selected subscription
pub fn record_from_subscription(
    customer_id: &str,
    subscription: &ProviderSubscription,
    reconciled_at: OffsetDateTime,
) -> SubscriptionRecord {
    let (payment_method_brand, payment_method_last4) = subscription.card_details();

    SubscriptionRecord {
        customer_id: customer_id.to_string(),
        subscription_id: Some(subscription.id.clone()),
        status: subscription.status,
        price_id: subscription.price_id.clone(),
        current_period_start: Some(subscription.current_period_start),
        current_period_end: Some(subscription.current_period_end),
        cancel_at_period_end: subscription.cancel_at_period_end,
        payment_method_brand,
        payment_method_last4,
        updated_at: reconciled_at,
    }
}

/// Result of a successful sync
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncOutcome {
    pub status: SubscriptionStatus,
    pub subscription_id: Option<String>,
    pub message: &'static str,
    /// False when the stored row already matched Stripe
    pub changed: bool,
}

type Clock = Arc<dyn Fn() -> OffsetDateTime + Send + Sync>;

/// Reconciles cached subscription rows with Stripe
#[derive(Clone)]
pub struct SyncService {
    provider: Arc<dyn BillingProvider>,
    store: Arc<dyn SubscriptionStore>,
    clock: Clock,
}

impl SyncService {
    pub fn new(provider: Arc<dyn BillingProvider>, store: Arc<dyn SubscriptionStore>) -> Self {
        Self {
            provider,
            store,
            clock: Arc::new(OffsetDateTime::now_utc),
        }
    }

    /// Replace the reconciliation timestamp source
    pub fn with_clock(mut self, clock: impl Fn() -> OffsetDateTime + Send + Sync + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Reconcile `customer_id` on behalf of `user_id`.
    ///
    /// Fails with [`BillingError::CustomerNotFound`] before touching Stripe or
    /// the subscription table when the customer is not owned by the caller.
    pub async fn sync(&self, user_id: Uuid, customer_id: &str) -> BillingResult<SyncOutcome> {
        ensure_owned(self.store.as_ref(), user_id, customer_id).await?;

        let subscriptions = self
            .provider
            .list_subscriptions(customer_id, SYNC_SUBSCRIPTION_LIMIT)
            .await?;

        tracing::info!(
            customer_id = %customer_id,
            count = subscriptions.len(),
            "Found subscriptions for customer"
        );

        let previous = self.previous(customer_id).await;
        let reconciled_at = (self.clock)();

        let Some(subscription) = select_subscription(&subscriptions) else {
            let record = SubscriptionRecord::not_started(customer_id, reconciled_at);
            self.write(&record, "Failed to update subscription status")
                .await?;
            let changed = has_changed(previous.as_ref(), &record);

            tracing::info!(customer_id = %customer_id, changed, "No subscriptions, marked not_started");

            return Ok(SyncOutcome {
                status: SubscriptionStatus::NotStarted,
                subscription_id: None,
                message: "No active subscriptions found",
                changed,
            });
        };

        tracing::info!(
            customer_id = %customer_id,
            subscription_id = %subscription.id,
            status = %subscription.status,
            total = subscriptions.len(),
            "Syncing selected subscription"
        );

        let record = record_from_subscription(customer_id, subscription, reconciled_at);
        self.write(&record, "Failed to update subscription").await?;
        let changed = has_changed(previous.as_ref(), &record);

        tracing::info!(
            customer_id = %customer_id,
            subscription_id = %subscription.id,
            status = %subscription.status,
            changed,
            "Subscription synced"
        );

        Ok(SyncOutcome {
            status: record.status,
            subscription_id: record.subscription_id,
            message: "Subscription synced successfully",
            changed,
        })
    }

    /// Currently cached row, if any. A failed read only costs the change flag.
    async fn previous(&self, customer_id: &str) -> Option<SubscriptionRecord> {
        match self.store.get_subscription(customer_id).await {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(customer_id = %customer_id, error = %e, "Could not read cached subscription");
                None
            }
        }
    }

    async fn write(&self, record: &SubscriptionRecord, message: &'static str) -> BillingResult<()> {
        self.store.upsert_subscription(record).await.map_err(|e| {
            tracing::error!(
                customer_id = %record.customer_id,
                error = %e,
                "Error updating subscription"
            );
            BillingError::UpsertFailed {
                message,
                source: Box::new(e),
            }
        })
    }
}

fn has_changed(previous: Option<&SubscriptionRecord>, current: &SubscriptionRecord) -> bool {
    match previous {
        Some(prev) => !prev.same_state(current),
        None => true,
    }
}

/// Ownership check shared by sync and diagnostics.
///
/// Lookup failures are reported as not found so the response never reveals
/// whether a customer id exists.
pub(crate) async fn ensure_owned(
    store: &dyn SubscriptionStore,
    user_id: Uuid,
    customer_id: &str,
) -> BillingResult<()> {
    match store.find_owned_customer(user_id, customer_id).await {
        Ok(Some(_)) => Ok(()),
        Ok(None) => {
            tracing::warn!(user_id = %user_id, customer_id = %customer_id, "Customer not owned by caller");
            Err(BillingError::CustomerNotFound)
        }
        Err(e) => {
            tracing::error!(user_id = %user_id, customer_id = %customer_id, error = %e, "Customer lookup failed");
            Err(BillingError::CustomerNotFound)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::PaymentMethodRef;

    fn sub(id: &str, status: SubscriptionStatus) -> ProviderSubscription {
        ProviderSubscription {
            id: id.to_string(),
            status,
            price_id: Some(format!("price_{}", id)),
            current_period_start: 1_700_000_000,
            current_period_end: 1_702_592_000,
            cancel_at_period_end: false,
            default_payment_method: None,
        }
    }

    // =========================================================================
    // Selection Tests
    // =========================================================================

    #[test]
    fn test_select_empty() {
        assert!(select_subscription(&[]).is_none());
    }

    #[test]
    fn test_select_active_over_canceled_in_either_order() {
        let a = [
            sub("old", SubscriptionStatus::Canceled),
            sub("new", SubscriptionStatus::Active),
        ];
        let b = [
            sub("new", SubscriptionStatus::Active),
            sub("old", SubscriptionStatus::Canceled),
        ];
        assert_eq!(select_subscription(&a).unwrap().id, "new");
        assert_eq!(select_subscription(&b).unwrap().id, "new");
    }

    #[test]
    fn test_select_follows_priority_order() {
        let subs = [
            sub("u", SubscriptionStatus::Unpaid),
            sub("c", SubscriptionStatus::Canceled),
            sub("i", SubscriptionStatus::Incomplete),
            sub("p", SubscriptionStatus::PastDue),
        ];
        assert_eq!(select_subscription(&subs).unwrap().id, "p");
        assert_eq!(select_subscription(&subs[..3]).unwrap().id, "i");
        assert_eq!(select_subscription(&subs[..2]).unwrap().id, "c");
        assert_eq!(select_subscription(&subs[..1]).unwrap().id, "u");
    }

    #[test]
    fn test_select_first_match_within_status() {
        let subs = [
            sub("t1", SubscriptionStatus::Trialing),
            sub("t2", SubscriptionStatus::Trialing),
        ];
        assert_eq!(select_subscription(&subs).unwrap().id, "t1");
    }

    #[test]
    fn test_select_falls_back_to_first_unlisted() {
        let subs = [
            sub("paused", SubscriptionStatus::Paused),
            sub("expired", SubscriptionStatus::IncompleteExpired),
        ];
        assert_eq!(select_subscription(&subs).unwrap().id, "paused");
    }

    // =========================================================================
    // Record Construction Tests
    // =========================================================================

    #[test]
    fn test_record_copies_card_details_from_expanded_method() {
        let mut s = sub("s1", SubscriptionStatus::Active);
        s.cancel_at_period_end = true;
        s.default_payment_method = Some(PaymentMethodRef::Card {
            brand: Some("mastercard".to_string()),
            last4: Some("4444".to_string()),
        });
        let now = OffsetDateTime::now_utc();

        let record = record_from_subscription("cus_1", &s, now);

        assert_eq!(record.subscription_id.as_deref(), Some("s1"));
        assert_eq!(record.price_id.as_deref(), Some("price_s1"));
        assert_eq!(record.current_period_start, Some(1_700_000_000));
        assert_eq!(record.current_period_end, Some(1_702_592_000));
        assert!(record.cancel_at_period_end);
        assert_eq!(record.payment_method_brand.as_deref(), Some("mastercard"));
        assert_eq!(record.payment_method_last4.as_deref(), Some("4444"));
        assert_eq!(record.updated_at, now);
    }

    #[test]
    fn test_record_ignores_bare_payment_method_reference() {
        let mut s = sub("s1", SubscriptionStatus::Trialing);
        s.default_payment_method = Some(PaymentMethodRef::Id("pm_1".to_string()));

        let record = record_from_subscription("cus_1", &s, OffsetDateTime::now_utc());

        assert!(record.payment_method_brand.is_none());
        assert!(record.payment_method_last4.is_none());
    }
}
