use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use super::client::AuthApi;
use super::models::{AuthAction, AuthAuditEvent, AuthProvider, AuthResponse, OtpDispatch};
use super::rate_limit::{spawn_throttle_pruner, OtpThrottle, OtpThrottleConfig};
use super::validation::{normalize_phone, validate_otp};
use crate::config::AuthConfig;
use crate::error::{AppError, AuthError};
use crate::session::{SharedSession, UserProfile};

/// Runs the login flows against the backend and keeps the session store in step.
pub struct AuthService {
    api: Arc<dyn AuthApi>,
    session: SharedSession,
    throttle: Arc<OtpThrottle>,
    otp_length: usize,
}

impl AuthService {
    pub fn new(api: Arc<dyn AuthApi>, session: SharedSession, config: &AuthConfig) -> Self {
        Self {
            api,
            session,
            throttle: Arc::new(OtpThrottle::new(OtpThrottleConfig {
                window_size: config.otp_window(),
                max_requests: config.otp_max_requests,
            })),
            otp_length: config.otp_length,
        }
    }

    pub fn session(&self) -> SharedSession {
        self.session.clone()
    }

    /// Keeps the OTP throttle from holding on to numbers that stopped asking for codes.
    /// Must run inside a tokio runtime.
    pub fn spawn_throttle_pruner(&self) -> JoinHandle<()> {
        let window = self.throttle.window_size();
        spawn_throttle_pruner(self.throttle.clone(), window)
    }

    pub async fn throttled_numbers(&self) -> usize {
        self.throttle.tracked_numbers().await
    }

    pub async fn send_otp(&self, phone: &str) -> Result<OtpDispatch, AppError> {
        let phone = normalize_phone(phone)?;
        self.throttle_otp(&phone).await?;

        let result = self.api.send_otp(&phone).await;
        self.audit(outcome_event(AuthAction::OtpSent, &result), None)
            .await;
        result
    }

    pub async fn resend_otp(&self, phone: &str) -> Result<OtpDispatch, AppError> {
        let phone = normalize_phone(phone)?;
        self.throttle_otp(&phone).await?;

        let result = self.api.resend_otp(&phone).await;
        self.audit(outcome_event(AuthAction::OtpResent, &result), None)
            .await;
        result
    }

    /// Exchanges a phone/OTP pair for a session.
    pub async fn verify_otp(&self, phone: &str, otp: &str) -> Result<UserProfile, AppError> {
        let phone = normalize_phone(phone)?;
        validate_otp(otp, self.otp_length)?;

        info!("Verifying OTP for {}", phone);
        let result = self.api.verify_otp(&phone, otp.trim()).await;
        self.finish_login(AuthAction::OtpVerified, None, result).await
    }

    pub async fn login_with_provider(
        &self,
        provider: AuthProvider,
        access_token: &str,
    ) -> Result<UserProfile, AppError> {
        if access_token.trim().is_empty() {
            return Err(AuthError::InvalidCredentials.into());
        }

        info!("Signing in with {}", provider);
        let result = self.api.oauth_login(provider, access_token).await;
        self.finish_login(AuthAction::OauthLogin, Some(provider), result)
            .await
    }

    pub async fn link_provider(
        &self,
        provider: AuthProvider,
        access_token: &str,
    ) -> Result<UserProfile, AppError> {
        if access_token.trim().is_empty() {
            return Err(AuthError::InvalidCredentials.into());
        }
        let token = self.current_token().await?;

        let result = self
            .api
            .link_provider(&token, provider, access_token)
            .await
            .map(|response| response.user);
        self.finish_profile_change(AuthAction::ProviderLinked, provider, result)
            .await
    }

    pub async fn unlink_provider(&self, provider: AuthProvider) -> Result<UserProfile, AppError> {
        let token = self.current_token().await?;

        let result = self
            .api
            .unlink_provider(&token, provider)
            .await
            .map(|response| response.user);
        self.finish_profile_change(AuthAction::ProviderUnlinked, provider, result)
            .await
    }

    /// Trades the stored refresh token for a new session token.
    ///
    /// Any failure ends the session. Concurrent calls are not coalesced; whichever
    /// response lands last is the one that sticks.
    pub async fn refresh(&self) -> Result<(), AppError> {
        let (refresh_token, user_id) = {
            let mut store = self.session.write().await;
            let user_id = store.current_user().map(|u| u.id.clone());
            (store.begin_refresh(), user_id)
        };

        let Some(refresh_token) = refresh_token else {
            warn!("No refresh token held, ending session");
            self.end_session().await;
            return Err(AuthError::InvalidToken.into());
        };

        match self.api.refresh_token(&refresh_token).await {
            Ok(response) => {
                let applied = self.session.write().await.complete_refresh(
                    response.token,
                    response.refresh_token,
                    response.user,
                );

                match applied {
                    Ok(()) => {
                        info!("Session token refreshed");
                        self.audit(AuthAuditEvent::new(AuthAction::TokenRefreshed, true), user_id)
                            .await;
                        Ok(())
                    }
                    Err(e) => {
                        error!("Refreshed token could not be applied: {}", e);
                        self.audit(
                            AuthAuditEvent::new(AuthAction::TokenRefreshed, false)
                                .with_detail(e.to_string()),
                            user_id,
                        )
                        .await;
                        Err(e)
                    }
                }
            }
            Err(e) => {
                error!("Token refresh failed: {}", e);
                self.end_session().await;
                self.audit(
                    AuthAuditEvent::new(AuthAction::TokenRefreshed, false).with_detail(e.to_string()),
                    user_id,
                )
                .await;
                Err(e)
            }
        }
    }

    pub async fn logout(&self) -> Result<(), AppError> {
        let user_id = {
            let mut store = self.session.write().await;
            let user_id = store.current_user().map(|u| u.id.clone());
            store.logout()?;
            user_id
        };
        self.audit(AuthAuditEvent::new(AuthAction::Logout, true), user_id)
            .await;
        Ok(())
    }

    async fn throttle_otp(&self, phone: &str) -> Result<(), AppError> {
        if self.throttle.check(phone).await {
            Ok(())
        } else {
            warn!("Too many OTP requests for {}", phone);
            Err(AuthError::RateLimited.into())
        }
    }

    async fn current_token(&self) -> Result<String, AppError> {
        let mut store = self.session.write().await;
        if !store.is_authenticated() {
            return Err(AuthError::Unauthorized.into());
        }
        store
            .token()
            .map(str::to_string)
            .ok_or_else(|| AuthError::Unauthorized.into())
    }

    async fn finish_login(
        &self,
        action: AuthAction,
        provider: Option<AuthProvider>,
        result: Result<AuthResponse, AppError>,
    ) -> Result<UserProfile, AppError> {
        let mut event = AuthAuditEvent::new(action, result.is_ok());
        if let Some(provider) = provider {
            event = event.with_provider(provider);
        }

        match result {
            Ok(response) => {
                let user = response.user.clone();
                self.session.write().await.set_session(
                    response.token,
                    Some(response.refresh_token),
                    response.user,
                )?;
                info!("User {} signed in as {:?}", user.id, user.role);
                self.audit(event, Some(user.id.clone())).await;
                Ok(user)
            }
            Err(e) => {
                error!("Sign-in failed: {}", e);
                self.audit(event.with_detail(e.to_string()), None).await;
                Err(e)
            }
        }
    }

    async fn finish_profile_change(
        &self,
        action: AuthAction,
        provider: AuthProvider,
        result: Result<UserProfile, AppError>,
    ) -> Result<UserProfile, AppError> {
        let event = AuthAuditEvent::new(action, result.is_ok()).with_provider(provider);

        match result {
            Ok(user) => {
                self.session.write().await.replace_user(user.clone())?;
                self.audit(event, Some(user.id.clone())).await;
                Ok(user)
            }
            Err(e) => {
                error!("{:?} with {} failed: {}", action, provider, e);
                self.audit(event.with_detail(e.to_string()), None).await;
                Err(e)
            }
        }
    }

    async fn end_session(&self) {
        if let Err(e) = self.session.write().await.logout() {
            error!("Failed to clear session: {}", e);
        }
    }

    // Audit delivery is best effort; a failed write never fails the user action.
    async fn audit(&self, event: AuthAuditEvent, user_id: Option<String>) {
        let event = event.with_user(user_id);
        if let Err(e) = self.api.log_auth_action(&event).await {
            warn!("Failed to record auth audit event {:?}: {}", event.action, e);
        }
    }
}

fn outcome_event<T>(action: AuthAction, result: &Result<T, AppError>) -> AuthAuditEvent {
    match result {
        Ok(_) => AuthAuditEvent::new(action, true),
        Err(e) => AuthAuditEvent::new(action, false).with_detail(e.to_string()),
    }
}
