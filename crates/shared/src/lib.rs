#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Franklin Shared Types
//!
//! Data model, entitlement policy and product catalog used by the billing
//! service, the HTTP API and the client library.

pub mod catalog;
pub mod db;
pub mod entitlement;
pub mod models;

pub use catalog::{product_by_id, product_by_price_id, BillingInterval, CheckoutMode, Product};
pub use db::{create_pool, run_migrations};
pub use entitlement::{has_access, is_canceled, ENTITLED_STATUSES};
pub use models::{
    CustomerRecord, SubscriptionRecord, SubscriptionStatus, UnknownStatus, UserSubscription,
};
