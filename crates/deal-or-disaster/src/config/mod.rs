use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use crate::game::{GameSettings, RetryPolicy, DEFAULT_CASE_SECONDS};

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub game: GameConfig,
    pub persistence: PersistenceConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let timer_seconds = match env::var("GAME_TIMER_SECONDS") {
            Ok(raw) => raw
                .trim()
                .parse::<u32>()
                .ok()
                .filter(|seconds| *seconds > 0)
                .ok_or(ConfigError::InvalidTimer { value: raw })?,
            Err(_) => DEFAULT_CASE_SECONDS,
        };
        let cases_path = env::var("GAME_CASES_PATH")
            .ok()
            .map(|raw| raw.trim().to_string())
            .filter(|raw| !raw.is_empty())
            .map(PathBuf::from);

        let defaults = RetryPolicy::default();
        let max_attempts = match env::var("PERSIST_MAX_ATTEMPTS") {
            Ok(raw) => raw
                .trim()
                .parse::<u32>()
                .ok()
                .filter(|attempts| *attempts >= 1)
                .ok_or(ConfigError::InvalidAttempts { value: raw })?,
            Err(_) => defaults.max_attempts,
        };
        let backoff_ms = match env::var("PERSIST_BACKOFF_MS") {
            Ok(raw) => raw
                .trim()
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidBackoff { value: raw })?,
            Err(_) => u64::try_from(defaults.backoff.as_millis()).unwrap_or(u64::MAX),
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            game: GameConfig {
                timer_seconds,
                cases_path,
            },
            persistence: PersistenceConfig {
                max_attempts,
                backoff_ms,
            },
        })
    }

    pub fn game_settings(&self) -> GameSettings {
        GameSettings {
            timer_seconds: self.game.timer_seconds,
            retry: self.persistence.retry_policy(),
        }
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing and metrics controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Per-case countdown and where the case catalog comes from.
#[derive(Debug, Clone)]
pub struct GameConfig {
    pub timer_seconds: u32,
    /// Falls back to the embedded catalog when unset.
    pub cases_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy)]
pub struct PersistenceConfig {
    pub max_attempts: u32,
    pub backoff_ms: u64,
}

impl PersistenceConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            backoff: Duration::from_millis(self.backoff_ms),
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidTimer { value: String },
    InvalidAttempts { value: String },
    InvalidBackoff { value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidTimer { value } => {
                write!(f, "GAME_TIMER_SECONDS must be a positive integer, got '{value}'")
            }
            ConfigError::InvalidAttempts { value } => {
                write!(f, "PERSIST_MAX_ATTEMPTS must be at least 1, got '{value}'")
            }
            ConfigError::InvalidBackoff { value } => {
                write!(f, "PERSIST_BACKOFF_MS must be milliseconds, got '{value}'")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidTimer { .. }
            | ConfigError::InvalidAttempts { .. }
            | ConfigError::InvalidBackoff { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        for key in [
            "APP_ENV",
            "APP_HOST",
            "APP_PORT",
            "APP_LOG_LEVEL",
            "GAME_TIMER_SECONDS",
            "GAME_CASES_PATH",
            "PERSIST_MAX_ATTEMPTS",
            "PERSIST_BACKOFF_MS",
        ] {
            env::remove_var(key);
        }
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.telemetry.log_level, "info");
        assert_eq!(config.game.timer_seconds, 300);
        assert!(config.game.cases_path.is_none());
        assert_eq!(config.game_settings().retry, RetryPolicy::default());
    }

    #[test]
    fn accepts_localhost_host() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_HOST", "localhost");
        let config = AppConfig::load().expect("config loads");
        let addr = config.server.socket_addr().expect("localhost resolves");
        assert_eq!(addr, SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 3000));
        reset_env();
    }

    #[test]
    fn game_and_persistence_overrides_apply() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_ENV", "production");
        env::set_var("GAME_TIMER_SECONDS", "90");
        env::set_var("GAME_CASES_PATH", "data/cases.json");
        env::set_var("PERSIST_MAX_ATTEMPTS", "5");
        env::set_var("PERSIST_BACKOFF_MS", "10");

        let config = AppConfig::load().expect("config loads");
        let settings = config.game_settings();

        assert_eq!(config.environment, AppEnvironment::Production);
        assert_eq!(settings.timer_seconds, 90);
        assert_eq!(
            config.game.cases_path.as_deref(),
            Some(std::path::Path::new("data/cases.json"))
        );
        assert_eq!(settings.retry.max_attempts, 5);
        assert_eq!(settings.retry.backoff, Duration::from_millis(10));
        reset_env();
    }

    #[test]
    fn rejects_zero_timer_and_zero_attempts() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("GAME_TIMER_SECONDS", "0");
        assert!(matches!(
            AppConfig::load(),
            Err(ConfigError::InvalidTimer { .. })
        ));

        reset_env();
        env::set_var("PERSIST_MAX_ATTEMPTS", "0");
        assert!(matches!(
            AppConfig::load(),
            Err(ConfigError::InvalidAttempts { .. })
        ));
        reset_env();
    }
}
