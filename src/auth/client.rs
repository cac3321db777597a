use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, error};
use url::Url;

use super::models::{
    AuthAuditEvent, AuthProvider, AuthResponse, ErrorBody, LinkResponse, OAuthRequest,
    OtpDispatch, OtpRequest, OtpVerifyRequest, RefreshRequest, RefreshResponse,
};
use crate::error::{AppError, AuthError};

/// The authentication backend. Every call is a single JSON request with no retries.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuthApi: Send + Sync {
    async fn send_otp(&self, phone: &str) -> Result<OtpDispatch, AppError>;

    async fn verify_otp(&self, phone: &str, otp: &str) -> Result<AuthResponse, AppError>;

    async fn resend_otp(&self, phone: &str) -> Result<OtpDispatch, AppError>;

    async fn oauth_login(
        &self,
        provider: AuthProvider,
        access_token: &str,
    ) -> Result<AuthResponse, AppError>;

    async fn link_provider(
        &self,
        session_token: &str,
        provider: AuthProvider,
        access_token: &str,
    ) -> Result<LinkResponse, AppError>;

    async fn unlink_provider(
        &self,
        session_token: &str,
        provider: AuthProvider,
    ) -> Result<LinkResponse, AppError>;

    async fn refresh_token(&self, refresh_token: &str) -> Result<RefreshResponse, AppError>;

    async fn log_auth_action(&self, event: &AuthAuditEvent) -> Result<(), AppError>;
}

pub struct HttpAuthClient {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpAuthClient {
    pub fn new(base_url: &str) -> Result<Self, AppError> {
        // Url::join drops the last segment unless the base ends with a slash
        let normalized = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{}/", base_url)
        };
        let base_url = Url::parse(&normalized)
            .map_err(|e| AppError::ConfigError(format!("Invalid auth base URL {}: {}", base_url, e)))?;

        Ok(Self {
            client: reqwest::Client::new(),
            base_url,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, AppError> {
        self.base_url
            .join(path)
            .map_err(|e| AppError::InternalError(format!("Invalid endpoint {}: {}", path, e)))
    }

    async fn send<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
        bearer: Option<&str>,
    ) -> Result<reqwest::Response, AppError> {
        let url = self.endpoint(path)?;
        debug!("POST {}", url);

        let mut request = self.client.post(url).json(body);
        if let Some(token) = bearer {
            request = request.bearer_auth(token);
        }

        let res = request.send().await?;
        if res.status().is_success() {
            return Ok(res);
        }

        let status = res.status();
        let message = res.json::<ErrorBody>().await.ok().map(|body| body.message);
        error!("Auth backend rejected {}: {} {:?}", path, status, message);
        Err(rejection(status, message).into())
    }

    async fn post<B: Serialize + ?Sized, R: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
        bearer: Option<&str>,
    ) -> Result<R, AppError> {
        let res = self.send(path, body, bearer).await?;
        let parsed = res.json::<R>().await?;
        Ok(parsed)
    }
}

fn rejection(status: StatusCode, message: Option<String>) -> AuthError {
    match message {
        Some(message) => AuthError::Rejected(message),
        None if status == StatusCode::UNAUTHORIZED => AuthError::InvalidCredentials,
        None if status == StatusCode::FORBIDDEN => AuthError::Unauthorized,
        None if status == StatusCode::TOO_MANY_REQUESTS => AuthError::RateLimited,
        None => AuthError::Rejected(format!("Request failed with status {}", status)),
    }
}

#[async_trait]
impl AuthApi for HttpAuthClient {
    async fn send_otp(&self, phone: &str) -> Result<OtpDispatch, AppError> {
        self.post("auth/otp/send", &OtpRequest { phone }, None).await
    }

    async fn verify_otp(&self, phone: &str, otp: &str) -> Result<AuthResponse, AppError> {
        self.post("auth/otp/verify", &OtpVerifyRequest { phone, otp }, None)
            .await
    }

    async fn resend_otp(&self, phone: &str) -> Result<OtpDispatch, AppError> {
        self.post("auth/otp/resend", &OtpRequest { phone }, None).await
    }

    async fn oauth_login(
        &self,
        provider: AuthProvider,
        access_token: &str,
    ) -> Result<AuthResponse, AppError> {
        let path = format!("auth/oauth/{}", provider);
        self.post(&path, &OAuthRequest { access_token }, None).await
    }

    async fn link_provider(
        &self,
        session_token: &str,
        provider: AuthProvider,
        access_token: &str,
    ) -> Result<LinkResponse, AppError> {
        let path = format!("auth/oauth/{}/link", provider);
        self.post(&path, &OAuthRequest { access_token }, Some(session_token))
            .await
    }

    async fn unlink_provider(
        &self,
        session_token: &str,
        provider: AuthProvider,
    ) -> Result<LinkResponse, AppError> {
        let path = format!("auth/oauth/{}/unlink", provider);
        self.post(&path, &serde_json::json!({}), Some(session_token))
            .await
    }

    async fn refresh_token(&self, refresh_token: &str) -> Result<RefreshResponse, AppError> {
        self.post("auth/refresh", &RefreshRequest { refresh_token }, None)
            .await
    }

    async fn log_auth_action(&self, event: &AuthAuditEvent) -> Result<(), AppError> {
        self.send("auth/audit", event, None).await?;
        Ok(())
    }
}
