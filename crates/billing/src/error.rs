//! Billing error types

use franklin_shared::UnknownStatus;

/// Billing errors
#[derive(Debug, thiserror::Error)]
pub enum BillingError {
    /// The customer does not exist, is soft-deleted, or belongs to another user
    #[error("Customer not found or access denied")]
    CustomerNotFound,

    #[error("Invalid customer ID: {0}")]
    InvalidCustomerId(String),

    #[error("{0}")]
    StripeApi(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The reconciled record could not be written; nothing was persisted
    #[error("{message}")]
    UpsertFailed {
        message: &'static str,
        #[source]
        source: Box<BillingError>,
    },

    #[error("Stripe not configured: {0}")]
    NotConfigured(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    UnknownStatus(#[from] UnknownStatus),
}

impl From<stripe::StripeError> for BillingError {
    fn from(err: stripe::StripeError) -> Self {
        match err {
            stripe::StripeError::Stripe(request_error) => BillingError::StripeApi(
                request_error
                    .message
                    .unwrap_or_else(|| format!("Stripe request failed ({})", request_error.http_status)),
            ),
            other => BillingError::StripeApi(other.to_string()),
        }
    }
}

pub type BillingResult<T> = Result<T, BillingError>;
