//! Bearer token authentication

use axum::http::{header::AUTHORIZATION, HeaderMap};
use reqwest::Client;
use serde::Deserialize;
use uuid::Uuid;

use super::jwt::verify_supabase_jwt;

/// Authenticated user resolved from a bearer token
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub email: Option<String>,
    pub auth_method: AuthMethod,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMethod {
    /// Signature checked locally with the project JWT secret
    LocalJwt,
    /// Token accepted by the Supabase auth API
    SupabaseApi,
}

/// Response from Supabase /auth/v1/user endpoint
#[derive(Debug, Clone, Deserialize)]
struct SupabaseUserResponse {
    id: String,
    email: Option<String>,
}

/// State needed for authentication
#[derive(Clone)]
pub struct AuthState {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub jwt_secret: Option<String>,
    pub http_client: Client,
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Missing authentication")]
    MissingAuth,
    #[error("Invalid authentication format")]
    InvalidAuthFormat,
    #[error("Invalid or expired token")]
    InvalidToken,
}

/// Extract the token from an `Authorization: Bearer ..` header
fn extract_bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let header = headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingAuth)?
        .to_str()
        .map_err(|_| AuthError::InvalidAuthFormat)?;

    match header.strip_prefix("Bearer ").map(str::trim) {
        Some(token) if !token.is_empty() => Ok(token),
        _ => Err(AuthError::InvalidAuthFormat),
    }
}

/// Resolve the calling user from request headers.
///
/// With a configured JWT secret the token is verified locally; otherwise the
/// Supabase auth API decides.
pub async fn authenticate_bearer(
    auth_state: &AuthState,
    headers: &HeaderMap,
) -> Result<AuthUser, AuthError> {
    let token = extract_bearer_token(headers)?;

    if let Some(secret) = &auth_state.jwt_secret {
        let claims = verify_supabase_jwt(token, secret)?;
        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| AuthError::InvalidToken)?;
        return Ok(AuthUser {
            user_id,
            email: claims.email,
            auth_method: AuthMethod::LocalJwt,
        });
    }

    let user = verify_supabase_token_api_call(auth_state, token).await?;
    let user_id = Uuid::parse_str(&user.id).map_err(|_| {
        tracing::warn!(id = %user.id, "Supabase returned a non-UUID user id");
        AuthError::InvalidToken
    })?;

    Ok(AuthUser {
        user_id,
        email: user.email,
        auth_method: AuthMethod::SupabaseApi,
    })
}

async fn verify_supabase_token_api_call(
    auth_state: &AuthState,
    token: &str,
) -> Result<SupabaseUserResponse, AuthError> {
    let url = format!("{}/auth/v1/user", auth_state.supabase_url);

    let response = auth_state
        .http_client
        .get(&url)
        .header("apikey", &auth_state.supabase_anon_key)
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .map_err(|e| {
            tracing::error!("Failed to verify Supabase token: {}", e);
            AuthError::InvalidToken
        })?;

    if !response.status().is_success() {
        tracing::warn!(
            "Supabase token verification failed with status: {}",
            response.status()
        );
        return Err(AuthError::InvalidToken);
    }

    response
        .json::<SupabaseUserResponse>()
        .await
        .map_err(|_| AuthError::InvalidToken)
}
