//! Authentication module
//!
//! Resolves the calling user from a Supabase access token, either by
//! verifying the JWT locally or by asking the Supabase auth API.

mod bearer;
mod jwt;


pub use bearer::{authenticate_bearer, AuthError, AuthMethod, AuthState, AuthUser};
pub use jwt::{verify_supabase_jwt, SupabaseClaims, SUPABASE_AUDIENCE};

#[cfg(test)]
pub(crate) use jwt::test_support;
