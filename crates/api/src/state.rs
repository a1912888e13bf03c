//! Application state

use std::sync::Arc;

use franklin_billing::{BillingError, BillingService, StripeConfig};
use reqwest::Client;
use sqlx::PgPool;

use crate::{auth::AuthState, config::Config};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub billing: Arc<BillingService>,
    pub auth: AuthState,
}

impl AppState {
    pub fn new(config: Config, pool: PgPool) -> Result<Self, BillingError> {
        let stripe = StripeConfig::new(config.stripe_secret_key.clone());
        stripe.validate()?;
        tracing::info!(test_mode = stripe.is_test_mode(), "Stripe configured");

        let billing = BillingService::new(stripe, pool);
        Ok(Self::with_billing(config, billing))
    }

    /// Build state around an already constructed billing service
    pub fn with_billing(config: Config, billing: BillingService) -> Self {
        let auth = AuthState {
            supabase_url: config.supabase_url.clone(),
            supabase_anon_key: config.supabase_anon_key.clone(),
            jwt_secret: config.supabase_jwt_secret.clone(),
            http_client: Client::new(),
        };

        Self {
            config,
            billing: Arc::new(billing),
            auth,
        }
    }
}
