pub mod auth;
pub mod config;
pub mod error;
pub mod schools;
pub mod session;
pub mod telemetry;

use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::info;

pub use crate::error::AppError;
pub type Result<T> = std::result::Result<T, AppError>;
pub use crate::config::Settings;

pub use auth::{AuthApi, AuthService, HttpAuthClient};
pub use schools::{FilterCriteria, School, ScoredSchool, SortKey, SortOrder};
pub use session::{FileStorage, IdleTracker, Role, SessionStore, SharedSession};

/// Portal state shared across all components
pub struct Portal {
    pub config: Arc<Settings>,
    pub session: SharedSession,
    pub auth: Arc<AuthService>,
    pub idle: IdleTracker,
    watchers: Mutex<Vec<JoinHandle<()>>>,
}

impl Portal {
    /// Restores the persisted session and connects to the configured auth backend.
    pub fn new(config: Settings) -> Result<Self> {
        let storage = FileStorage::open(&config.session.storage_path)?;
        let api: Arc<dyn AuthApi> = Arc::new(HttpAuthClient::new(&config.auth.base_url)?);
        Self::with_parts(config, Box::new(storage), api)
    }

    pub fn with_parts(
        config: Settings,
        storage: Box<dyn session::SessionStorage>,
        api: Arc<dyn AuthApi>,
    ) -> Result<Self> {
        let session = SessionStore::load(storage)?.into_shared();
        let auth = Arc::new(AuthService::new(api, session.clone(), &config.auth));

        Ok(Self {
            config: Arc::new(config),
            session,
            auth,
            idle: IdleTracker::new(),
            watchers: Mutex::new(Vec::new()),
        })
    }

    /// Spawns the expiry and inactivity watchers plus the OTP throttle pruner.
    /// Must run inside a tokio runtime.
    pub async fn start_watchers(&self) {
        let session_config = &self.config.session;
        let every = session_config.expiry_check_interval();

        let expiry = session::spawn_expiry_watcher(self.session.clone(), every);
        let idle = session::spawn_idle_watcher(
            self.session.clone(),
            self.idle.clone(),
            session_config.idle_timeout(),
            every,
        );

        let pruner = self.auth.spawn_throttle_pruner();

        let mut watchers = self.watchers.lock().await;
        watchers.push(expiry);
        watchers.push(idle);
        watchers.push(pruner);
        info!(
            "Session watchers started (check every {:?}, idle timeout {:?})",
            every,
            session_config.idle_timeout()
        );
    }

    pub fn ranked_schools(
        &self,
        listing: &[School],
        criteria: &FilterCriteria,
        key: SortKey,
        order: SortOrder,
    ) -> Vec<ScoredSchool> {
        self.idle.record_activity();
        schools::rank(listing, criteria, key, order)
    }

    pub fn compare_schools(&self, listing: &[School], ids: &[u64]) -> schools::Comparison {
        self.idle.record_activity();
        schools::compare(listing, ids, self.config.schools.compare_limit)
    }

    /// Gate for role-restricted actions such as uploads or penalty management.
    pub async fn can_access(&self, required: Role) -> bool {
        self.session.write().await.can_access(required)
    }

    pub async fn shutdown(&self) -> Result<()> {
        let mut watchers = self.watchers.lock().await;
        for handle in watchers.drain(..) {
            handle.abort();
        }
        info!("Portal shut down");
        Ok(())
    }
}
