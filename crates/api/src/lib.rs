// API crate clippy configuration
#![allow(clippy::needless_borrows_for_generic_args)] // Sometimes needed for clarity
#![allow(clippy::inconsistent_digit_grouping)] // Epoch timestamps don't use grouping
// Test code patterns:
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::unwrap_used))]

//! Franklin API Library
//!
//! HTTP surface for subscription reconciliation and Stripe diagnostics.

pub mod auth;
pub mod config;
pub mod cors;
pub mod error;
pub mod routes;
pub mod state;

pub use config::Config;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
