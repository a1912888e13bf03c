//! Client configuration

use std::env;

/// Supabase project the client talks to
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientConfig {
    pub supabase_url: String,
    pub anon_key: String,
}

impl ClientConfig {
    pub fn new(supabase_url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        let supabase_url: String = supabase_url.into();
        Self {
            supabase_url: supabase_url.trim_end_matches('/').to_string(),
            anon_key: anon_key.into(),
        }
    }

    /// Read `FRANKLIN_SUPABASE_URL` and `FRANKLIN_SUPABASE_ANON_KEY`.
    ///
    /// Missing variables leave the client unconfigured rather than failing.
    pub fn from_env() -> Self {
        Self::new(
            env::var("FRANKLIN_SUPABASE_URL").unwrap_or_default(),
            env::var("FRANKLIN_SUPABASE_ANON_KEY").unwrap_or_default(),
        )
    }

    /// False in demo mode, when either value is empty
    pub fn is_configured(&self) -> bool {
        !self.supabase_url.trim().is_empty() && !self.anon_key.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_from_env() {
        env::set_var("FRANKLIN_SUPABASE_URL", "https://project.supabase.co/");
        env::set_var("FRANKLIN_SUPABASE_ANON_KEY", "anon");

        let config = ClientConfig::from_env();
        assert_eq!(config.supabase_url, "https://project.supabase.co");
        assert!(config.is_configured());

        env::remove_var("FRANKLIN_SUPABASE_URL");
        env::remove_var("FRANKLIN_SUPABASE_ANON_KEY");
    }

    #[test]
    #[serial]
    fn test_demo_mode() {
        env::remove_var("FRANKLIN_SUPABASE_URL");
        env::set_var("FRANKLIN_SUPABASE_ANON_KEY", "anon");
        assert!(!ClientConfig::from_env().is_configured());

        env::remove_var("FRANKLIN_SUPABASE_ANON_KEY");
        assert!(!ClientConfig::default().is_configured());
        assert!(!ClientConfig::new("https://x.supabase.co", "  ").is_configured());
    }
}
