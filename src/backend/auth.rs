use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{
        header::{AUTHORIZATION, COOKIE},
        request::Parts,
    },
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use password_hash::rand_core::OsRng;
use password_hash::{PasswordHash, SaltString};
use serde::{Deserialize, Serialize};

use crate::backend::error::ApiError;
use crate::backend::AppState;

/// Signing key and lifetime shared by every session token.
#[derive(Debug, Clone)]
pub struct AuthSettings {
    pub secret: String,
    pub ttl_hours: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// user id
    pub sub: String,
    pub exp: usize,
}

pub fn issue_token(user_id: i64, settings: &AuthSettings) -> anyhow::Result<String> {
    let claims = Claims {
        sub: user_id.to_string(),
        exp: (Utc::now() + Duration::hours(settings.ttl_hours)).timestamp() as usize,
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(settings.secret.as_bytes()),
    )?;
    Ok(token)
}

pub fn verify_token(token: &str, settings: &AuthSettings) -> Option<i64> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(settings.secret.as_bytes()),
        &Validation::default(),
    )
    .ok()?;
    data.claims.sub.parse().ok()
}

pub fn session_cookie(token: &str, settings: &AuthSettings) -> String {
    format!(
        "token={}; HttpOnly; Path=/; Max-Age={}; SameSite=Strict",
        token,
        settings.ttl_hours * 3600
    )
}

pub fn expired_cookie() -> &'static str {
    "token=; HttpOnly; Path=/; Max-Age=0; SameSite=Strict"
}

pub fn hash_password(password: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("failed to hash password: {e}"))?;
    Ok(hash.to_string())
}

// A stored hash that fails to parse is treated as a mismatch
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

fn token_from_parts(parts: &Parts) -> Option<&str> {
    let bearer = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim);
    if bearer.is_some() {
        return bearer;
    }

    parts
        .headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .map(str::trim)
        .find_map(|s| s.strip_prefix("token="))
        .filter(|t| !t.is_empty())
}

/// The id of the user whose session signed this request.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser(pub i64);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = token_from_parts(parts).ok_or(ApiError::Unauthorized)?;
        let user_id = verify_token(token, &state.auth).ok_or_else(|| {
            tracing::debug!("rejected session token");
            ApiError::Unauthorized
        })?;
        Ok(AuthUser(user_id))
    }
}
