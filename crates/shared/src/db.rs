//! Database pool and migrations

use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;

/// Create the connection pool used for request handling
pub async fn create_pool(database_url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url)
        .await
}

/// Apply the embedded schema migrations
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations").run(pool).await?;
    tracing::info!("Database migrations complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    const SCHEMA: &str = include_str!("../migrations/20250701000000_stripe_billing.sql");
    const POLICIES: &str = include_str!("../migrations/20250701000100_stripe_billing_rls.sql");

    fn policy_for(table: &str) -> &'static str {
        let header = format!("ON {}\n", table);
        let start = POLICIES
            .find(&format!("CREATE POLICY {}_select_own {}", table, header))
            .unwrap();
        let rest = &POLICIES[start..];
        &rest[..rest.find(";").unwrap()]
    }

    #[test]
    fn test_cache_tables_enable_row_level_security() {
        for table in ["stripe_customers", "stripe_subscriptions"] {
            assert!(
                POLICIES.contains(&format!("ALTER TABLE {} ENABLE ROW LEVEL SECURITY;", table)),
                "{} must have RLS enabled",
                table
            );
        }
    }

    #[test]
    fn test_customer_policy_scopes_to_caller() {
        let policy = policy_for("stripe_customers");
        assert!(policy.contains("FOR SELECT"));
        assert!(policy.contains("TO authenticated"));
        assert!(policy.contains("user_id = auth.uid() AND deleted_at IS NULL"));
    }

    #[test]
    fn test_subscription_policy_requires_owned_customer() {
        let policy = policy_for("stripe_subscriptions");
        assert!(policy.contains("FOR SELECT"));
        assert!(policy.contains("deleted_at IS NULL"));
        assert!(policy.contains("c.customer_id = stripe_subscriptions.customer_id"));
        assert!(policy.contains("c.user_id = auth.uid()"));
    }

    #[test]
    fn test_no_write_policies() {
        for verb in ["FOR INSERT", "FOR UPDATE", "FOR DELETE", "FOR ALL"] {
            assert!(!POLICIES.contains(verb), "unexpected {} policy", verb);
        }
    }

    #[test]
    fn test_schema_states_supabase_requirement() {
        assert!(SCHEMA.contains("Requires a Supabase database"));
        assert!(SCHEMA.contains("auth.uid()"));
    }
}
