//! Subscription and customer data model

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use time::OffsetDateTime;
use uuid::Uuid;

/// Billing status of a customer's subscription, as mirrored from Stripe.
///
/// `NotStarted` is local-only: it marks a customer that has no subscription
/// at all on the provider side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    NotStarted,
    Active,
    Trialing,
    PastDue,
    Incomplete,
    IncompleteExpired,
    Canceled,
    Unpaid,
    Paused,
}

impl SubscriptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::NotStarted => "not_started",
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::Trialing => "trialing",
            SubscriptionStatus::PastDue => "past_due",
            SubscriptionStatus::Incomplete => "incomplete",
            SubscriptionStatus::IncompleteExpired => "incomplete_expired",
            SubscriptionStatus::Canceled => "canceled",
            SubscriptionStatus::Unpaid => "unpaid",
            SubscriptionStatus::Paused => "paused",
        }
    }
}

impl std::fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown subscription status: {0}")]
pub struct UnknownStatus(pub String);

impl FromStr for SubscriptionStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "not_started" => Ok(SubscriptionStatus::NotStarted),
            "active" => Ok(SubscriptionStatus::Active),
            "trialing" => Ok(SubscriptionStatus::Trialing),
            "past_due" => Ok(SubscriptionStatus::PastDue),
            "incomplete" => Ok(SubscriptionStatus::Incomplete),
            "incomplete_expired" => Ok(SubscriptionStatus::IncompleteExpired),
            "canceled" => Ok(SubscriptionStatus::Canceled),
            "unpaid" => Ok(SubscriptionStatus::Unpaid),
            "paused" => Ok(SubscriptionStatus::Paused),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

/// Cached copy of a customer's selected Stripe subscription.
///
/// One row per `customer_id`. Rows are only ever written by a full
/// overwrite during reconciliation; Stripe stays the system of record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionRecord {
    pub customer_id: String,
    pub subscription_id: Option<String>,
    pub status: SubscriptionStatus,
    pub price_id: Option<String>,
    /// Unix seconds
    pub current_period_start: Option<i64>,
    /// Unix seconds
    pub current_period_end: Option<i64>,
    pub cancel_at_period_end: bool,
    pub payment_method_brand: Option<String>,
    pub payment_method_last4: Option<String>,
    /// When this row was last reconciled against Stripe
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl SubscriptionRecord {
    /// Record for a customer with no subscriptions on the provider side
    pub fn not_started(customer_id: impl Into<String>, reconciled_at: OffsetDateTime) -> Self {
        Self {
            customer_id: customer_id.into(),
            subscription_id: None,
            status: SubscriptionStatus::NotStarted,
            price_id: None,
            current_period_start: None,
            current_period_end: None,
            cancel_at_period_end: false,
            payment_method_brand: None,
            payment_method_last4: None,
            updated_at: reconciled_at,
        }
    }

    /// Field equality ignoring the reconciliation timestamp
    pub fn same_state(&self, other: &Self) -> bool {
        self.customer_id == other.customer_id
            && self.subscription_id == other.subscription_id
            && self.status == other.status
            && self.price_id == other.price_id
            && self.current_period_start == other.current_period_start
            && self.current_period_end == other.current_period_end
            && self.cancel_at_period_end == other.cancel_at_period_end
            && self.payment_method_brand == other.payment_method_brand
            && self.payment_method_last4 == other.payment_method_last4
    }
}

/// Link between an application user and their Stripe customer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct CustomerRecord {
    pub user_id: Uuid,
    pub customer_id: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub deleted_at: Option<OffsetDateTime>,
}

impl CustomerRecord {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// Row of the `stripe_user_subscriptions` view as seen by the signed-in user.
///
/// Every column is nullable because the view is a left join from customers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSubscription {
    pub customer_id: Option<String>,
    pub subscription_id: Option<String>,
    pub subscription_status: Option<SubscriptionStatus>,
    pub price_id: Option<String>,
    pub current_period_start: Option<i64>,
    pub current_period_end: Option<i64>,
    #[serde(default, deserialize_with = "null_as_false")]
    pub cancel_at_period_end: bool,
    pub payment_method_brand: Option<String>,
    pub payment_method_last4: Option<String>,
    /// Display name resolved from the product catalog, not a view column
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_name: Option<String>,
}

/// The view yields `null` for customers without a subscription row
fn null_as_false<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(false))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trips_through_str() {
        for status in [
            SubscriptionStatus::NotStarted,
            SubscriptionStatus::IncompleteExpired,
            SubscriptionStatus::PastDue,
        ] {
            assert_eq!(status.as_str().parse::<SubscriptionStatus>(), Ok(status));
        }
    }

    #[test]
    fn test_same_state_ignores_updated_at() {
        let earlier = OffsetDateTime::UNIX_EPOCH;
        let later = earlier + time::Duration::hours(1);
        let a = SubscriptionRecord::not_started("cus_1", earlier);
        let mut b = SubscriptionRecord::not_started("cus_1", later);

        assert!(a.same_state(&b));
        assert_ne!(a, b);

        b.cancel_at_period_end = true;
        assert!(!a.same_state(&b));
    }

    #[test]
    fn test_unknown_status_rejected() {
        let err = "expired".parse::<SubscriptionStatus>().unwrap_err();
        assert_eq!(err.to_string(), "Unknown subscription status: expired");
    }

    #[test]
    fn test_status_serializes_snake_case() {
        let json = serde_json::to_string(&SubscriptionStatus::PastDue).unwrap();
        assert_eq!(json, "\"past_due\"");
    }

    #[test]
    fn test_not_started_clears_everything() {
        let now = OffsetDateTime::now_utc();
        let record = SubscriptionRecord::not_started("cus_123", now);

        assert_eq!(record.status, SubscriptionStatus::NotStarted);
        assert!(record.subscription_id.is_none());
        assert!(record.price_id.is_none());
        assert!(record.current_period_start.is_none());
        assert!(record.current_period_end.is_none());
        assert!(!record.cancel_at_period_end);
        assert!(record.payment_method_brand.is_none());
        assert!(record.payment_method_last4.is_none());
        assert_eq!(record.updated_at, now);
    }

    #[test]
    fn test_user_subscription_from_view_json() {
        let row: UserSubscription = serde_json::from_value(serde_json::json!({
            "customer_id": "cus_123",
            "subscription_id": "sub_1",
            "subscription_status": "trialing",
            "price_id": "price_1",
            "current_period_start": 1_700_000_000,
            "current_period_end": 1_702_592_000,
            "cancel_at_period_end": false,
            "payment_method_brand": "visa",
            "payment_method_last4": "4242"
        }))
        .unwrap();

        assert_eq!(row.subscription_status, Some(SubscriptionStatus::Trialing));
        assert_eq!(row.current_period_end, Some(1_702_592_000));
        assert!(row.product_name.is_none());
    }

    #[test]
    fn test_user_subscription_without_subscription_row() {
        let row: UserSubscription = serde_json::from_value(serde_json::json!({
            "customer_id": "cus_123",
            "subscription_id": null,
            "subscription_status": null,
            "cancel_at_period_end": null
        }))
        .unwrap();

        assert_eq!(row.customer_id.as_deref(), Some("cus_123"));
        assert!(row.subscription_status.is_none());
        assert!(!row.cancel_at_period_end);
    }
}
