use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::session::UserProfile;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthProvider {
    Google,
    Facebook,
}

impl AuthProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthProvider::Google => "google",
            AuthProvider::Facebook => "facebook",
        }
    }
}

impl fmt::Display for AuthProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Serialize)]
pub struct OtpRequest<'a> {
    pub phone: &'a str,
}

#[derive(Debug, Serialize)]
pub struct OtpVerifyRequest<'a> {
    pub phone: &'a str,
    pub otp: &'a str,
}

#[derive(Debug, Serialize)]
pub struct OAuthRequest<'a> {
    pub access_token: &'a str,
}

#[derive(Debug, Serialize)]
pub struct RefreshRequest<'a> {
    pub refresh_token: &'a str,
}

/// Returned by the backend after a code was sent.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OtpDispatch {
    pub message: String,
    #[serde(default)]
    pub expires_in: Option<u64>,
}

/// Successful login of any kind.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub refresh_token: String,
    pub user: UserProfile,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RefreshResponse {
    pub token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub user: Option<UserProfile>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LinkResponse {
    pub user: UserProfile,
    #[serde(default)]
    pub message: Option<String>,
}

/// Failure body: `{"message": "..."}`.
#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthAction {
    OtpSent,
    OtpResent,
    OtpVerified,
    OauthLogin,
    ProviderLinked,
    ProviderUnlinked,
    TokenRefreshed,
    Logout,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuthAuditEvent {
    pub id: Uuid,
    pub action: AuthAction,
    pub success: bool,
    pub provider: Option<AuthProvider>,
    pub user_id: Option<String>,
    pub detail: Option<String>,
    pub at: DateTime<Utc>,
}

impl AuthAuditEvent {
    pub fn new(action: AuthAction, success: bool) -> Self {
        Self {
            id: Uuid::new_v4(),
            action,
            success,
            provider: None,
            user_id: None,
            detail: None,
            at: Utc::now(),
        }
    }

    pub fn with_provider(mut self, provider: AuthProvider) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn with_user(mut self, user_id: Option<String>) -> Self {
        self.user_id = user_id;
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}
