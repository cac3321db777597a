use chrono::Utc;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{error, info};

use super::store::SharedSession;

/// Shortest period either watcher will tick at.
pub const MIN_CHECK_INTERVAL: Duration = Duration::from_secs(1);

/// Periodically clears the session once its token has expired.
pub fn spawn_expiry_watcher(session: SharedSession, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(every.max(MIN_CHECK_INTERVAL));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let mut store = session.write().await;
            if store.expire_if_needed(Utc::now()) {
                info!("Expiry watcher ended the session");
            }
        }
    })
}

/// Timestamp of the last user interaction.
#[derive(Debug, Clone)]
pub struct IdleTracker {
    last_activity: Arc<Mutex<Instant>>,
}

impl IdleTracker {
    pub fn new() -> Self {
        Self {
            last_activity: Arc::new(Mutex::new(Instant::now())),
        }
    }

    /// Call on every user event (click, key press, scroll).
    pub fn record_activity(&self) {
        if let Ok(mut last) = self.last_activity.lock() {
            *last = Instant::now();
        }
    }

    pub fn idle_for(&self) -> Duration {
        match self.last_activity.lock() {
            Ok(last) => last.elapsed(),
            Err(_) => Duration::ZERO,
        }
    }
}

impl Default for IdleTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// Logs the user out after `idle_timeout` without recorded activity.
pub fn spawn_idle_watcher(
    session: SharedSession,
    tracker: IdleTracker,
    idle_timeout: Duration,
    every: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(every.max(MIN_CHECK_INTERVAL));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            if tracker.idle_for() < idle_timeout {
                continue;
            }

            let mut store = session.write().await;
            if store.token().is_none() {
                continue;
            }
            info!("No activity for {:?}, logging out", tracker.idle_for());
            if let Err(e) = store.logout() {
                error!("Failed to clear idle session from storage: {}", e);
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::models::{Role, UserProfile};
    use crate::session::storage::MemoryStorage;
    use crate::session::store::SessionStore;
    use crate::session::token::{encode_claims, Claims};
    use chrono::Duration as ChronoDuration;
    use tokio::time::sleep;

    fn shared_session(valid_for: ChronoDuration) -> SharedSession {
        let claims = Claims {
            sub: "u1".to_string(),
            exp: (Utc::now() + valid_for).timestamp(),
            iat: None,
            role: None,
        };
        let token = encode_claims(&claims, "test_secret").unwrap();
        let mut store = SessionStore::new(Box::new(MemoryStorage::new()));
        store
            .set_session(token, None, UserProfile::new("u1", Role::Parent))
            .unwrap();
        store.into_shared()
    }

    #[tokio::test(start_paused = true)]
    async fn test_expiry_watcher_clears_expired_session() {
        let session = shared_session(ChronoDuration::seconds(-5));
        let handle = spawn_expiry_watcher(session.clone(), Duration::from_secs(60));

        sleep(Duration::from_secs(90)).await;
        assert!(session.read().await.token().is_none());
        handle.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_expiry_watcher_keeps_valid_session() {
        let session = shared_session(ChronoDuration::hours(1));
        let handle = spawn_expiry_watcher(session.clone(), Duration::from_secs(60));

        sleep(Duration::from_secs(5 * 60)).await;
        assert!(session.read().await.token().is_some());
        assert!(!handle.is_finished());
        handle.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_interval_watchers_keep_running() {
        let session = shared_session(ChronoDuration::seconds(-5));
        let expiry = spawn_expiry_watcher(session.clone(), Duration::ZERO);
        let idle = spawn_idle_watcher(
            session.clone(),
            IdleTracker::new(),
            Duration::from_secs(15 * 60),
            Duration::ZERO,
        );

        sleep(Duration::from_secs(3)).await;
        assert!(!expiry.is_finished());
        assert!(!idle.is_finished());
        assert!(session.read().await.token().is_none());
        expiry.abort();
        idle.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_watcher_logs_out_after_timeout() {
        let session = shared_session(ChronoDuration::hours(1));
        let tracker = IdleTracker::new();
        let handle = spawn_idle_watcher(
            session.clone(),
            tracker.clone(),
            Duration::from_secs(15 * 60),
            Duration::from_secs(60),
        );

        sleep(Duration::from_secs(14 * 60)).await;
        assert!(session.read().await.token().is_some());

        sleep(Duration::from_secs(2 * 60)).await;
        assert!(session.read().await.token().is_none());
        handle.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_activity_postpones_idle_logout() {
        let session = shared_session(ChronoDuration::hours(1));
        let tracker = IdleTracker::new();
        let handle = spawn_idle_watcher(
            session.clone(),
            tracker.clone(),
            Duration::from_secs(15 * 60),
            Duration::from_secs(60),
        );

        sleep(Duration::from_secs(10 * 60)).await;
        tracker.record_activity();
        sleep(Duration::from_secs(10 * 60)).await;
        assert!(session.read().await.token().is_some());
        handle.abort();
    }
}
