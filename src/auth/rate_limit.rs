use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct OtpThrottleConfig {
    pub window_size: Duration,
    pub max_requests: u32,
}

impl Default for OtpThrottleConfig {
    fn default() -> Self {
        Self {
            window_size: Duration::from_secs(10 * 60),
            max_requests: 3, // 3 codes per phone per window
        }
    }
}

#[derive(Debug)]
struct RequestWindow {
    timestamps: Vec<Instant>,
}

impl RequestWindow {
    fn new() -> Self {
        Self {
            timestamps: Vec::new(),
        }
    }

    fn cleanup_old_requests(&mut self, now: Instant, window_size: Duration) {
        self.timestamps
            .retain(|ts| now.saturating_duration_since(*ts) < window_size);
    }

    fn add_request(&mut self, now: Instant) {
        self.timestamps.push(now);
    }

    fn request_count(&self) -> usize {
        self.timestamps.len()
    }
}

/// Caps how many OTP codes may be requested for one phone number per window.
pub struct OtpThrottle {
    windows: Arc<RwLock<HashMap<String, RequestWindow>>>,
    config: OtpThrottleConfig,
}

impl OtpThrottle {
    pub fn new(config: OtpThrottleConfig) -> Self {
        Self {
            windows: Arc::new(RwLock::new(HashMap::new())),
            config,
        }
    }

    pub fn window_size(&self) -> Duration {
        self.config.window_size
    }

    /// Records a request for `phone` and reports whether it is allowed.
    pub async fn check(&self, phone: &str) -> bool {
        let now = Instant::now();
        let mut windows = self.windows.write().await;

        let window = windows
            .entry(phone.to_string())
            .or_insert_with(RequestWindow::new);

        window.cleanup_old_requests(now, self.config.window_size);

        if window.request_count() < self.config.max_requests as usize {
            window.add_request(now);
            true
        } else {
            false
        }
    }

    /// Forgets numbers with no request inside the current window. Returns how many were dropped.
    pub async fn cleanup(&self) -> usize {
        let now = Instant::now();
        let mut windows = self.windows.write().await;
        let before = windows.len();

        windows.retain(|_, window| {
            window.cleanup_old_requests(now, self.config.window_size);
            !window.timestamps.is_empty()
        });
        before - windows.len()
    }

    pub async fn tracked_numbers(&self) -> usize {
        self.windows.read().await.len()
    }
}

/// Periodically forgets phone numbers whose window has run out.
pub fn spawn_throttle_pruner(throttle: Arc<OtpThrottle>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(every.max(Duration::from_secs(1)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let dropped = throttle.cleanup().await;
            if dropped > 0 {
                debug!("Pruned OTP throttle windows for {} numbers", dropped);
            }
        }
    })
}
