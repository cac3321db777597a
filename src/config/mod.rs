use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub base_url: String,
    pub otp_length: usize,
    pub otp_max_requests: u32,
    pub otp_window_minutes: i64,
}

impl AuthConfig {
    pub fn otp_window(&self) -> Duration {
        let minutes = u64::try_from(self.otp_window_minutes).unwrap_or(0);
        Duration::from_secs(minutes.saturating_mul(60))
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SessionConfig {
    pub storage_path: String,
    pub idle_timeout_minutes: u64,
    pub expiry_check_interval_secs: u64,
}

impl SessionConfig {
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_minutes.saturating_mul(60))
    }

    /// Never shorter than one second; a zero period would stop the watchers.
    pub fn expiry_check_interval(&self) -> Duration {
        Duration::from_secs(self.expiry_check_interval_secs.max(1))
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SchoolsConfig {
    pub compare_limit: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub environment: String,
    pub auth: AuthConfig,
    pub session: SessionConfig,
    pub schools: SchoolsConfig,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = Config::builder()
            // Start with default values
            .set_default("environment", "development")?
            .set_default("auth.base_url", "http://127.0.0.1:8080/api/")?
            .set_default("auth.otp_length", 6)?
            .set_default("auth.otp_max_requests", 3)?
            .set_default("auth.otp_window_minutes", 10)?
            .set_default("session.storage_path", "session.json")?
            .set_default("session.idle_timeout_minutes", 15)?
            .set_default("session.expiry_check_interval_secs", 60)?
            .set_default("schools.compare_limit", 4)?
            // Add in settings from the config file if it exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // E.g., `APP_SESSION__IDLE_TIMEOUT_MINUTES=30` would set `Settings.session.idle_timeout_minutes`
            .add_source(
                Environment::with_prefix("app")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        s.try_deserialize()
    }

    #[cfg(test)]
    pub fn new_for_test() -> Result<Self, ConfigError> {
        Config::builder()
            .set_default("environment", "test")?
            .set_default("auth.base_url", "http://127.0.0.1:9999/")?
            .set_default("auth.otp_length", 6)?
            .set_default("auth.otp_max_requests", 3)?
            .set_default("auth.otp_window_minutes", 10)?
            .set_default("session.storage_path", "test_session.json")?
            .set_default("session.idle_timeout_minutes", 15)?
            .set_default("session.expiry_check_interval_secs", 60)?
            .set_default("schools.compare_limit", 4)?
            .build()?
            .try_deserialize()
    }
}
