use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::models::Role;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // User ID
    pub exp: i64,    // Expiration time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>, // Issued at
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

impl Claims {
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::<Utc>::from_timestamp(self.exp, 0)
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TokenError {
    #[error("Malformed token: {0}")]
    Malformed(String),

    #[error("Expiry claim out of range: {0}")]
    ExpiryOutOfRange(i64),

    #[error("Token encoding failed: {0}")]
    Encoding(String),
}

/// Reads the claims of a JWT without checking its signature.
///
/// Signatures are verified by the backend; the client only needs `exp` and `sub`.
pub fn decode_claims(token: &str) -> Result<Claims, TokenError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    let data = decode::<Claims>(token, &DecodingKey::from_secret(&[]), &validation)
        .map_err(|e| TokenError::Malformed(e.to_string()))?;

    Ok(data.claims)
}

/// Decodes the expiry instant recorded in `token`.
pub fn decode_expiry(token: &str) -> Result<DateTime<Utc>, TokenError> {
    let claims = decode_claims(token)?;
    claims
        .expires_at()
        .ok_or(TokenError::ExpiryOutOfRange(claims.exp))
}

/// Signs `claims` with HS256. Used by fixtures and local tooling that mint test sessions.
pub fn encode_claims(claims: &Claims, secret: &str) -> Result<String, TokenError> {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| TokenError::Encoding(e.to_string()))
}
