//! Local verification of Supabase-issued access tokens

use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use super::AuthError;

/// Audience Supabase stamps on tokens of signed-in users
pub const SUPABASE_AUDIENCE: &str = "authenticated";

/// Claims carried by a Supabase access token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupabaseClaims {
    /// User id (UUID string)
    pub sub: String,
    pub aud: String,
    pub exp: i64,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

/// Validate an HS256 token against the project's JWT secret
pub fn verify_supabase_jwt(token: &str, secret: &str) -> Result<SupabaseClaims, AuthError> {
    let key = DecodingKey::from_secret(secret.as_bytes());
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_audience(&[SUPABASE_AUDIENCE]);
    validation.leeway = 60;

    decode::<SupabaseClaims>(token, &key, &validation)
        .map(|data| data.claims)
        .map_err(|e| {
            tracing::debug!(error = %e, "Supabase JWT rejected");
            AuthError::InvalidToken
        })
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_valid_token() {
        let user_id = Uuid::new_v4();
        let claims = verify_supabase_jwt(&token_for(user_id), TEST_SECRET).unwrap();

        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.email.as_deref(), Some("user@example.com"));
    }

    #[test]
    fn test_wrong_secret() {
        let token = token_for(Uuid::new_v4());
        assert!(matches!(
            verify_supabase_jwt(&token, "another-secret"),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn test_expired_token() {
        let mut claims = claims_for(Uuid::new_v4());
        claims.exp -= 7200;
        let token = sign(&claims, TEST_SECRET);

        assert!(verify_supabase_jwt(&token, TEST_SECRET).is_err());
    }

    #[test]
    fn test_anon_audience_rejected() {
        let mut claims = claims_for(Uuid::new_v4());
        claims.aud = "anon".to_string();
        let token = sign(&claims, TEST_SECRET);

        assert!(verify_supabase_jwt(&token, TEST_SECRET).is_err());
    }

    #[test]
    fn test_garbage_token() {
        assert!(verify_supabase_jwt("not.a.jwt", TEST_SECRET).is_err());
    }
}
