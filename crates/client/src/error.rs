//! Client error types

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("No authentication token available")]
    NotAuthenticated,

    #[error("Supabase is not configured")]
    NotConfigured,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-2xx response; `message` is the server's error text
    #[error("{message}")]
    Api { status: u16, message: String },

    #[error("Expected at most one row")]
    MultipleRows,

    #[error("No customer record found")]
    NoCustomer,

    #[error("Invalid response: {0}")]
    Decode(#[from] serde_json::Error),
}

pub type ClientResult<T> = Result<T, ClientError>;
