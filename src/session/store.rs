use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info, warn};

use super::models::{Role, SessionState, UserProfile};
use super::storage::{
    SessionStorage, EXPIRY_KEY, REFRESH_TOKEN_KEY, SESSION_KEYS, TOKEN_KEY, USER_KEY,
};
use super::token::decode_expiry;
use crate::error::{AppError, AuthError, StorageError};

pub type SharedSession = Arc<RwLock<SessionStore>>;

/// Client-held authentication state, written through to a [`SessionStorage`].
pub struct SessionStore {
    storage: Box<dyn SessionStorage>,
    token: Option<String>,
    refresh_token: Option<String>,
    expires_at: Option<DateTime<Utc>>,
    user: Option<UserProfile>,
    refreshing: bool,
}

impl SessionStore {
    /// An anonymous store. Anything already in `storage` is ignored until overwritten.
    pub fn new(storage: Box<dyn SessionStorage>) -> Self {
        Self {
            storage,
            token: None,
            refresh_token: None,
            expires_at: None,
            user: None,
            refreshing: false,
        }
    }

    /// Rehydrates a store from previously persisted fields.
    pub fn load(storage: Box<dyn SessionStorage>) -> Result<Self, StorageError> {
        let token = storage.get(TOKEN_KEY)?;
        let refresh_token = storage.get(REFRESH_TOKEN_KEY)?;

        let expires_at = match storage.get(EXPIRY_KEY)? {
            Some(raw) => match DateTime::parse_from_rfc3339(&raw) {
                Ok(ts) => Some(ts.with_timezone(&Utc)),
                Err(e) => {
                    warn!("Ignoring unreadable stored expiry {:?}: {}", raw, e);
                    None
                }
            },
            None => None,
        };

        let user = match storage.get(USER_KEY)? {
            Some(raw) => match serde_json::from_str::<UserProfile>(&raw) {
                Ok(user) => Some(user),
                Err(e) => {
                    warn!("Ignoring unreadable stored user profile: {}", e);
                    None
                }
            },
            None => None,
        };

        Ok(Self {
            storage,
            token,
            refresh_token,
            expires_at,
            user,
            refreshing: false,
        })
    }

    pub fn into_shared(self) -> SharedSession {
        Arc::new(RwLock::new(self))
    }

    /// Records a freshly issued session.
    ///
    /// A token whose expiry cannot be decoded is kept but counts as already expired.
    pub fn set_session(
        &mut self,
        token: String,
        refresh_token: Option<String>,
        user: UserProfile,
    ) -> Result<(), StorageError> {
        let expires_at = match decode_expiry(&token) {
            Ok(expiry) => Some(expiry),
            Err(e) => {
                warn!("Session token for user {} has no usable expiry: {}", user.id, e);
                None
            }
        };

        let user_json = serde_json::to_string(&user)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;

        self.token = Some(token);
        self.refresh_token = refresh_token;
        self.expires_at = expires_at;
        self.user = Some(user);
        self.refreshing = false;

        self.save(&user_json)?;
        info!(
            "Session established for user {}",
            self.user.as_ref().map(|u| u.id.as_str()).unwrap_or_default()
        );
        Ok(())
    }

    fn save(&mut self, user_json: &str) -> Result<(), StorageError> {
        match &self.token {
            Some(token) => self.storage.set(TOKEN_KEY, token)?,
            None => self.storage.remove(TOKEN_KEY)?,
        }
        match &self.refresh_token {
            Some(refresh) => self.storage.set(REFRESH_TOKEN_KEY, refresh)?,
            None => self.storage.remove(REFRESH_TOKEN_KEY)?,
        }
        match self.expires_at {
            Some(expiry) => self.storage.set(EXPIRY_KEY, &expiry.to_rfc3339())?,
            None => self.storage.remove(EXPIRY_KEY)?,
        }
        self.storage.set(USER_KEY, user_json)
    }

    pub fn is_authenticated(&mut self) -> bool {
        self.is_authenticated_at(Utc::now())
    }

    /// True while a token is held and `now` is before its expiry.
    /// A stale session is cleared as a side effect.
    pub fn is_authenticated_at(&mut self, now: DateTime<Utc>) -> bool {
        if self.is_valid_at(now) {
            return true;
        }
        self.expire_if_needed(now);
        false
    }

    /// Clears the session if it is held but no longer valid. Returns whether anything was cleared.
    pub fn expire_if_needed(&mut self, now: DateTime<Utc>) -> bool {
        if self.is_valid_at(now) || !self.has_fields() {
            return false;
        }

        info!("Session expired, clearing stored credentials");
        if let Err(e) = self.clear() {
            error!("Failed to clear expired session from storage: {}", e);
        }
        true
    }

    /// Drops every session field, in memory and in storage.
    pub fn logout(&mut self) -> Result<(), StorageError> {
        if let Some(user) = &self.user {
            info!("Logging out user {}", user.id);
        }
        self.clear()
    }

    fn clear(&mut self) -> Result<(), StorageError> {
        self.token = None;
        self.refresh_token = None;
        self.expires_at = None;
        self.user = None;
        self.refreshing = false;

        for key in SESSION_KEYS {
            self.storage.remove(key)?;
        }
        Ok(())
    }

    pub fn can_access(&mut self, required: Role) -> bool {
        self.can_access_at(required, Utc::now())
    }

    pub fn can_access_at(&mut self, required: Role, now: DateTime<Utc>) -> bool {
        if !self.is_authenticated_at(now) {
            return false;
        }
        self.user
            .as_ref()
            .map(|user| user.role.satisfies(required))
            .unwrap_or(false)
    }

    pub fn state(&self) -> SessionState {
        self.state_at(Utc::now())
    }

    pub fn state_at(&self, now: DateTime<Utc>) -> SessionState {
        if self.token.is_none() {
            SessionState::Anonymous
        } else if self.refreshing {
            SessionState::Refreshing
        } else if self.is_valid_at(now) {
            SessionState::Authenticated
        } else {
            SessionState::Expired
        }
    }

    /// Marks a refresh as in flight and hands out the refresh token, if any.
    pub fn begin_refresh(&mut self) -> Option<String> {
        let refresh_token = self.refresh_token.clone();
        if refresh_token.is_some() {
            self.refreshing = true;
        }
        refresh_token
    }

    /// Applies a refreshed token. Missing fields keep their current values.
    ///
    /// If the session was cleared while the refresh was in flight and the response
    /// carries no user, the token is discarded and `AuthError::InvalidToken` returned.
    pub fn complete_refresh(
        &mut self,
        token: String,
        refresh_token: Option<String>,
        user: Option<UserProfile>,
    ) -> Result<(), AppError> {
        let refresh_token = refresh_token.or_else(|| self.refresh_token.take());
        let user = match user.or_else(|| self.user.take()) {
            Some(user) => user,
            None => {
                warn!("Refreshed token arrived without a known user, discarding session");
                self.clear()?;
                return Err(AuthError::InvalidToken.into());
            }
        };
        Ok(self.set_session(token, refresh_token, user)?)
    }

    /// Swaps the stored profile, e.g. after a provider was linked.
    pub fn replace_user(&mut self, user: UserProfile) -> Result<(), StorageError> {
        let user_json = serde_json::to_string(&user)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        self.storage.set(USER_KEY, &user_json)?;
        self.user = Some(user);
        Ok(())
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref()
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    pub fn current_user(&self) -> Option<&UserProfile> {
        self.user.as_ref()
    }

    fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        match (&self.token, self.expires_at) {
            (Some(_), Some(expiry)) => now < expiry,
            _ => false,
        }
    }

    fn has_fields(&self) -> bool {
        self.token.is_some()
            || self.refresh_token.is_some()
            || self.expires_at.is_some()
            || self.user.is_some()
    }
}
