//! Subscription store
//!
//! Persistence for the reconciled subscription cache. Rows in
//! `stripe_subscriptions` are keyed by `customer_id` and written with a single
//! `INSERT .. ON CONFLICT` so each sync is all-or-nothing.

use async_trait::async_trait;
use franklin_shared::{CustomerRecord, SubscriptionRecord};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::BillingResult;

#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    /// Customer owned by `user_id` with this Stripe id, excluding soft-deleted rows
    async fn find_owned_customer(
        &self,
        user_id: Uuid,
        customer_id: &str,
    ) -> BillingResult<Option<CustomerRecord>>;

    /// Insert or fully overwrite the record for `record.customer_id`
    async fn upsert_subscription(&self, record: &SubscriptionRecord) -> BillingResult<()>;

    async fn get_subscription(&self, customer_id: &str) -> BillingResult<Option<SubscriptionRecord>>;
}

/// Database row for `stripe_subscriptions`
#[derive(Debug, FromRow)]
struct SubscriptionRow {
    customer_id: String,
    subscription_id: Option<String>,
    status: String,
    price_id: Option<String>,
    current_period_start: Option<i64>,
    current_period_end: Option<i64>,
    cancel_at_period_end: bool,
    payment_method_brand: Option<String>,
    payment_method_last4: Option<String>,
    updated_at: OffsetDateTime,
}

impl TryFrom<SubscriptionRow> for SubscriptionRecord {
    type Error = crate::error::BillingError;

    fn try_from(row: SubscriptionRow) -> Result<Self, Self::Error> {
        Ok(SubscriptionRecord {
            customer_id: row.customer_id,
            subscription_id: row.subscription_id,
            status: row.status.parse()?,
            price_id: row.price_id,
            current_period_start: row.current_period_start,
            current_period_end: row.current_period_end,
            cancel_at_period_end: row.cancel_at_period_end,
            payment_method_brand: row.payment_method_brand,
            payment_method_last4: row.payment_method_last4,
            updated_at: row.updated_at,
        })
    }
}

/// Postgres-backed store using the service role connection
#[derive(Clone)]
pub struct PgSubscriptionStore {
    pool: PgPool,
}

impl PgSubscriptionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SubscriptionStore for PgSubscriptionStore {
    async fn find_owned_customer(
        &self,
        user_id: Uuid,
        customer_id: &str,
    ) -> BillingResult<Option<CustomerRecord>> {
        let customer: Option<CustomerRecord> = sqlx::query_as(
            r#"
            SELECT user_id, customer_id, created_at, deleted_at
            FROM stripe_customers
            WHERE user_id = $1
              AND customer_id = $2
              AND deleted_at IS NULL
            "#,
        )
        .bind(user_id)
        .bind(customer_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(customer)
    }

    async fn upsert_subscription(&self, record: &SubscriptionRecord) -> BillingResult<()> {
        sqlx::query(
            r#"
            INSERT INTO stripe_subscriptions (
                customer_id, subscription_id, status, price_id,
                current_period_start, current_period_end, cancel_at_period_end,
                payment_method_brand, payment_method_last4, updated_at
            ) VALUES (
                $1, $2, $3::stripe_subscription_status, $4, $5, $6, $7, $8, $9, $10
            )
            ON CONFLICT (customer_id) DO UPDATE SET
                subscription_id = EXCLUDED.subscription_id,
                status = EXCLUDED.status,
                price_id = EXCLUDED.price_id,
                current_period_start = EXCLUDED.current_period_start,
                current_period_end = EXCLUDED.current_period_end,
                cancel_at_period_end = EXCLUDED.cancel_at_period_end,
                payment_method_brand = EXCLUDED.payment_method_brand,
                payment_method_last4 = EXCLUDED.payment_method_last4,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(&record.customer_id)
        .bind(&record.subscription_id)
        .bind(record.status.as_str())
        .bind(&record.price_id)
        .bind(record.current_period_start)
        .bind(record.current_period_end)
        .bind(record.cancel_at_period_end)
        .bind(&record.payment_method_brand)
        .bind(&record.payment_method_last4)
        .bind(record.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_subscription(&self, customer_id: &str) -> BillingResult<Option<SubscriptionRecord>> {
        let row: Option<SubscriptionRow> = sqlx::query_as(
            r#"
            SELECT customer_id, subscription_id, status::TEXT AS status, price_id,
                   current_period_start, current_period_end, cancel_at_period_end,
                   payment_method_brand, payment_method_last4, updated_at
            FROM stripe_subscriptions
            WHERE customer_id = $1
              AND deleted_at IS NULL
            "#,
        )
        .bind(customer_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(SubscriptionRecord::try_from).transpose()
    }
}
