//! Global application configuration manager.
//!
//! `AppConfig` is a lazily initialized, globally accessible singleton containing
//! runtime configuration values loaded from environment variables. It provides
//! thread-safe access and mutation for testing or overrides in runtime environments.

use chrono::{FixedOffset, Offset, Utc};
use std::env;
use std::str::FromStr;
use std::sync::{OnceLock, RwLock};

/// Represents the complete application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: String,
    pub project_name: String,
    pub log_level: String,
    pub log_file: String,
    pub log_to_stdout: bool,
    pub database_path: String,
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub jwt_duration_minutes: u64,
    /// Lifetime of a QR attendance session when the lecturer does not pass one.
    pub session_ttl_seconds: i64,
    /// Upper bound accepted for a requested session lifetime.
    pub max_session_ttl_seconds: i64,
    /// Tolerance around a class schedule's start and end.
    pub schedule_grace_minutes: i64,
    /// Offset of the campus clock from UTC. Calendar dates and schedule times are local to it.
    pub campus_utc_offset_minutes: i32,
}

/// Lazily-initialized, thread-safe singleton instance of `AppConfig`.
static CONFIG_INSTANCE: OnceLock<RwLock<AppConfig>> = OnceLock::new();

fn parse_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

impl AppConfig {
    /// Loads the configuration from `.env` and environment variables.
    ///
    /// Missing or malformed values fall back to development defaults.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            env: env::var("APP_ENV").unwrap_or_else(|_| "development".into()),
            project_name: env::var("PROJECT_NAME").unwrap_or_else(|_| "presence".into()),
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "api=info".into()),
            log_file: env::var("LOG_FILE").unwrap_or_else(|_| "api.log".into()),
            log_to_stdout: env::var("LOG_TO_STDOUT").unwrap_or_else(|_| "false".into()) == "true",
            database_path: env::var("DATABASE_PATH").unwrap_or_else(|_| "data/presence.db".into()),
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".into()),
            port: parse_or("PORT", 3000),
            jwt_secret: env::var("JWT_SECRET").unwrap_or_else(|_| "dev-secret-change-me".into()),
            jwt_duration_minutes: parse_or("JWT_DURATION_MINUTES", 60),
            session_ttl_seconds: parse_or("SESSION_TTL_SECONDS", 300),
            max_session_ttl_seconds: parse_or("MAX_SESSION_TTL_SECONDS", 3600),
            schedule_grace_minutes: parse_or("SCHEDULE_GRACE_MINUTES", 15),
            campus_utc_offset_minutes: parse_or("CAMPUS_UTC_OFFSET_MINUTES", 0),
        }
    }

    /// Returns a shared reference to the global configuration.
    ///
    /// # Panics
    /// Panics if the lock cannot be acquired.
    pub fn global() -> std::sync::RwLockReadGuard<'static, AppConfig> {
        CONFIG_INSTANCE
            .get_or_init(|| RwLock::new(AppConfig::from_env()))
            .read()
            .expect("Failed to acquire AppConfig read lock")
    }

    /// Resets the configuration by reloading from environment variables.
    ///
    /// Useful in tests to clear overrides.
    pub fn reset() {
        if let Some(lock) = CONFIG_INSTANCE.get() {
            if let Ok(mut guard) = lock.write() {
                *guard = AppConfig::from_env();
            }
        }
    }

    fn set_field<F>(setter: F)
    where
        F: FnOnce(&mut AppConfig),
    {
        let lock = CONFIG_INSTANCE.get_or_init(|| RwLock::new(AppConfig::from_env()));
        let mut guard = lock
            .write()
            .expect("Failed to acquire AppConfig write lock");
        setter(&mut guard);
    }

    /// The campus clock as a chrono offset. Out-of-range values fall back to UTC.
    pub fn campus_offset(&self) -> FixedOffset {
        self.campus_utc_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .unwrap_or_else(|| Utc.fix())
    }

    // --- Per-field setters below ---

    pub fn set_session_ttl_seconds(value: i64) {
        AppConfig::set_field(|cfg| cfg.session_ttl_seconds = value);
    }

    pub fn set_schedule_grace_minutes(value: i64) {
        AppConfig::set_field(|cfg| cfg.schedule_grace_minutes = value);
    }

    pub fn set_campus_utc_offset_minutes(value: i32) {
        AppConfig::set_field(|cfg| cfg.campus_utc_offset_minutes = value);
    }
}

// --- Free accessors ---

pub fn env() -> String {
    AppConfig::global().env.clone()
}

pub fn project_name() -> String {
    AppConfig::global().project_name.clone()
}

pub fn log_level() -> String {
    AppConfig::global().log_level.clone()
}

pub fn log_file() -> String {
    AppConfig::global().log_file.clone()
}

pub fn log_to_stdout() -> bool {
    AppConfig::global().log_to_stdout
}

pub fn database_path() -> String {
    AppConfig::global().database_path.clone()
}

pub fn host() -> String {
    AppConfig::global().host.clone()
}

pub fn port() -> u16 {
    AppConfig::global().port
}

pub fn jwt_secret() -> String {
    AppConfig::global().jwt_secret.clone()
}

pub fn jwt_duration_minutes() -> u64 {
    AppConfig::global().jwt_duration_minutes
}

pub fn campus_offset() -> FixedOffset {
    AppConfig::global().campus_offset()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn setters_override_and_reset_restores() {
        AppConfig::set_schedule_grace_minutes(42);
        assert_eq!(AppConfig::global().schedule_grace_minutes, 42);

        AppConfig::reset();
        assert_eq!(
            AppConfig::global().schedule_grace_minutes,
            AppConfig::from_env().schedule_grace_minutes
        );
    }

    #[test]
    #[serial]
    fn campus_offset_follows_minutes() {
        AppConfig::set_campus_utc_offset_minutes(420);
        assert_eq!(campus_offset().local_minus_utc(), 420 * 60);

        AppConfig::set_campus_utc_offset_minutes(100_000);
        assert_eq!(campus_offset().local_minus_utc(), 0);

        AppConfig::set_campus_utc_offset_minutes(i32::MAX);
        assert_eq!(campus_offset().local_minus_utc(), 0);

        AppConfig::reset();
    }
}
