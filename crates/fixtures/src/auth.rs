//! Login, session tokens and the current-user payload.
//!
//! Tokens are JWT-shaped (`header.claims.signature`, base64url without
//! padding) and carry the role, so a later `/auth/me` can resolve the caller
//! without any server-side session table.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use serenity_common::{role_for_email, Identity, Role, TEST_PASSWORD};
use uuid::Uuid;

/// Access token lifetime in seconds.
pub const TOKEN_TTL_SECS: i64 = 8 * 60 * 60;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    pub sub: String,
    pub email: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
}

pub fn encode_token(identity: &Identity) -> String {
    let now = Utc::now();
    let claims = TokenClaims {
        sub: identity.id.clone(),
        email: identity.email.clone(),
        role: identity.role,
        iat: now.timestamp(),
        exp: (now + Duration::seconds(TOKEN_TTL_SECS)).timestamp(),
        jti: Uuid::new_v4().to_string(),
    };
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    // Claims always serialize; an empty payload only yields an undecodable token.
    let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims).unwrap_or_default());
    let signature = URL_SAFE_NO_PAD.encode(b"serenity-mock-signature");
    format!("{}.{}.{}", header, payload, signature)
}

/// Decode claims from a mock token. Anything malformed decodes to `None`.
pub fn decode_token(token: &str) -> Option<TokenClaims> {
    let token = token.trim().strip_prefix("Bearer ").unwrap_or(token.trim());
    let mut parts = token.split('.');
    let (_header, payload, _signature) = (parts.next()?, parts.next()?, parts.next()?);
    if parts.next().is_some() {
        return None;
    }
    let bytes = URL_SAFE_NO_PAD.decode(payload).ok()?;
    serde_json::from_slice(&bytes).ok()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub success: bool,
    pub token: String,
    pub refresh_token: String,
    pub expires_in: i64,
    pub user: Identity,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthFailure {
    pub success: bool,
    pub error: String,
}

impl AuthFailure {
    pub fn invalid_credentials() -> Self {
        Self { success: false, error: "Invalid credentials".to_string() }
    }

    pub fn unauthorized() -> Self {
        Self { success: false, error: "Unauthorized".to_string() }
    }
}

pub fn login_response_for(identity: Identity) -> LoginResponse {
    LoginResponse {
        success: true,
        token: encode_token(&identity),
        refresh_token: format!("refresh-{}", Uuid::new_v4().simple()),
        expires_in: TOKEN_TTL_SECS,
        user: identity,
    }
}

/// Check credentials against the test identities.
pub fn login(email: &str, password: &str) -> Result<LoginResponse, AuthFailure> {
    match role_for_email(email) {
        Some(role) if password == TEST_PASSWORD => Ok(login_response_for(Identity::for_role(role))),
        _ => Err(AuthFailure::invalid_credentials()),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUserResponse {
    pub success: bool,
    pub user: Identity,
}

/// Resolve the `Authorization` header of a `/auth/me` call.
pub fn current_user(authorization: Option<&str>) -> Result<CurrentUserResponse, AuthFailure> {
    let claims = authorization
        .and_then(decode_token)
        .ok_or_else(AuthFailure::unauthorized)?;
    Ok(CurrentUserResponse { success: true, user: Identity::for_role(claims.role) })
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshResponse {
    pub success: bool,
    pub token: String,
}

pub fn refresh_response(authorization: Option<&str>) -> Result<RefreshResponse, AuthFailure> {
    let claims = authorization
        .and_then(decode_token)
        .ok_or_else(AuthFailure::unauthorized)?;
    Ok(RefreshResponse { success: true, token: encode_token(&Identity::for_role(claims.role)) })
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self { success: true, message: message.into() }
    }
}
