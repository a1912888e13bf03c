#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Franklin Client Library
//!
//! Talks to Supabase on behalf of a signed-in user: reads the subscription
//! view, triggers reconciliation, runs support diagnostics and starts
//! checkout.

pub mod checkout;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod subscription;
pub mod supabase;

pub use checkout::{create_checkout_session, CheckoutParams, CheckoutSessionResponse};
pub use config::ClientConfig;
pub use diagnostics::{Check, DiagnosticCollector, DiagnosticSnapshot};
pub use error::{ClientError, ClientResult};
pub use subscription::{lookup_customer_id, SubscriptionViewModel, SyncResult};
pub use supabase::SupabaseClient;
