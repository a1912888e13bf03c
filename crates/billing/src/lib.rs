// Test code patterns (expected in test files):
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Franklin Billing Module
//!
//! Keeps the local subscription cache in step with Stripe.
//!
//! ## Features
//!
//! - **Reconciliation**: Re-derive a customer's subscription row from Stripe on demand
//! - **Selection**: Pick one subscription out of a customer's current and past ones
//! - **Diagnostics**: Raw Stripe snapshot plus derived flags for support

pub mod client;
pub mod diagnostics;
pub mod error;
pub mod memory;
pub mod provider;
pub mod store;
pub mod subscriptions;


// Client
pub use client::{StripeClient, StripeConfig};

// Diagnostics
pub use diagnostics::{DebugReport, DebugService, ProviderAnalysis};

// Error
pub use error::{BillingError, BillingResult};

// In-memory ports
pub use memory::{InMemorySubscriptionStore, StaticBillingProvider};

// Provider
pub use provider::{BillingProvider, PaymentMethodRef, ProviderSubscription, RawProviderData};

// Store
pub use store::{PgSubscriptionStore, SubscriptionStore};

// Subscriptions
pub use subscriptions::{
    record_from_subscription, select_subscription, SyncOutcome, SyncService, STATUS_PRIORITY,
};

use std::sync::Arc;

use sqlx::PgPool;

/// Main billing service that combines all billing functionality
#[derive(Clone)]
pub struct BillingService {
    pub sync: SyncService,
    pub debug: DebugService,
}

impl BillingService {
    /// Create a new billing service with explicit config
    pub fn new(config: StripeConfig, pool: PgPool) -> Self {
        Self::with_ports(
            Arc::new(StripeClient::new(config)),
            Arc::new(PgSubscriptionStore::new(pool)),
        )
    }

    /// Create a billing service over arbitrary provider and store implementations
    pub fn with_ports(
        provider: Arc<dyn BillingProvider>,
        store: Arc<dyn SubscriptionStore>,
    ) -> Self {
        Self {
            sync: SyncService::new(provider.clone(), store.clone()),
            debug: DebugService::new(provider, store),
        }
    }
}
