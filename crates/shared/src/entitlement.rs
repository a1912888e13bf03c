//! Entitlement policy
//!
//! Decides whether a signed-in user is treated as having paid access, as
//! distinct from the literal billing status mirrored from Stripe.
//!
//! ## Current rule
//!
//! A user is entitled when their view row exists and **either**:
//!
//! 1. the row carries a Stripe `customer_id`, or
//! 2. the status is one of [`ENTITLED_STATUSES`].
//!
//! Rule 1 alone already covers every row that has a customer, so a customer
//! in `canceled` or `unpaid` keeps access. The rule conflates "has ever
//! subscribed" with "is entitled now". It is pinned by tests and awaits a
//! product decision before it is tightened.

use crate::models::{SubscriptionStatus, UserSubscription};

/// Statuses that grant access on their own, without relying on customer presence
pub const ENTITLED_STATUSES: [SubscriptionStatus; 4] = [
    SubscriptionStatus::Active,
    SubscriptionStatus::Trialing,
    SubscriptionStatus::PastDue,
    SubscriptionStatus::Incomplete,
];

/// Whether the user behind `row` has paid access. See the module docs.
pub fn has_access(row: Option<&UserSubscription>) -> bool {
    let Some(row) = row else {
        return false;
    };

    let has_customer = row
        .customer_id
        .as_deref()
        .is_some_and(|id| !id.is_empty());

    let status_grants_access = row
        .subscription_status
        .is_some_and(|status| ENTITLED_STATUSES.contains(&status));

    has_customer || status_grants_access
}

/// Whether the subscription is set to end at the close of the current period.
/// Independent of status.
pub fn is_canceled(row: Option<&UserSubscription>) -> bool {
    row.is_some_and(|row| row.cancel_at_period_end)
}
