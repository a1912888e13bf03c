//! Server configuration loaded from the environment

use std::env;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

/// API server configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub bind_address: String,
    pub database_url: String,
    pub database_max_connections: u32,
    /// Apply embedded migrations at startup.
    ///
    /// Only valid against a Supabase database: the schema uses the auth
    /// schema, `auth.uid()` and the `authenticated` role, so a plain Postgres
    /// server rejects it.
    pub run_migrations: bool,
    pub supabase_url: String,
    pub supabase_anon_key: String,
    /// When set, bearer tokens are verified locally instead of via the Supabase API
    pub supabase_jwt_secret: Option<String>,
    pub stripe_secret_key: String,
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or(ConfigError::MissingRequired(name))
}

fn optional(name: &'static str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_max_connections = match optional("DATABASE_MAX_CONNECTIONS") {
            Some(value) => value.parse().map_err(|_| ConfigError::Invalid {
                name: "DATABASE_MAX_CONNECTIONS",
                value,
            })?,
            None => 5,
        };

        let run_migrations = match optional("RUN_MIGRATIONS") {
            Some(value) => match value.as_str() {
                "true" | "1" => true,
                "false" | "0" => false,
                _ => {
                    return Err(ConfigError::Invalid {
                        name: "RUN_MIGRATIONS",
                        value,
                    })
                }
            },
            None => false,
        };

        let config = Self {
            bind_address: optional("BIND_ADDRESS").unwrap_or_else(|| "0.0.0.0:8080".to_string()),
            database_url: required("DATABASE_URL")?,
            database_max_connections,
            run_migrations,
            supabase_url: required("SUPABASE_URL")?
                .trim_end_matches('/')
                .to_string(),
            supabase_anon_key: optional("SUPABASE_ANON_KEY").unwrap_or_default(),
            supabase_jwt_secret: optional("SUPABASE_JWT_SECRET"),
            stripe_secret_key: required("STRIPE_SECRET_KEY")?,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.stripe_secret_key.starts_with("sk_") {
            return Err(ConfigError::Invalid {
                name: "STRIPE_SECRET_KEY",
                value: "<redacted>".to_string(),
            });
        }
        if self.supabase_jwt_secret.is_none() && self.supabase_anon_key.is_empty() {
            return Err(ConfigError::MissingRequired(
                "SUPABASE_ANON_KEY (or SUPABASE_JWT_SECRET)",
            ));
        }
        if self.database_max_connections == 0 {
            return Err(ConfigError::Invalid {
                name: "DATABASE_MAX_CONNECTIONS",
                value: "0".to_string(),
            });
        }
        Ok(())
    }
}
