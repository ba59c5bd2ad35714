use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

use crate::query::QueryLimits;

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

/// Top-level configuration, built once at process start and handed to each component.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub query: QueryLimits,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("MARKET_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("MARKET_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("MARKET_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("MARKET_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let defaults = QueryLimits::default();
        let default_page_size =
            page_size_var("MARKET_DEFAULT_PAGE_SIZE", defaults.default_page_size)?;
        let max_page_size = page_size_var("MARKET_MAX_PAGE_SIZE", defaults.max_page_size)?;
        if default_page_size > max_page_size {
            return Err(ConfigError::PageSizeOrder {
                default_page_size,
                max_page_size,
            });
        }

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            query: QueryLimits {
                default_page_size,
                max_page_size,
            },
        })
    }
}

fn page_size_var(name: &'static str, fallback: u64) -> Result<u64, ConfigError> {
    match env::var(name) {
        Ok(raw) => match raw.trim().parse::<u64>() {
            Ok(value) if value > 0 => Ok(value),
            _ => Err(ConfigError::InvalidPageSize { variable: name }),
        },
        Err(_) => Ok(fallback),
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

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidPageSize { variable: &'static str },
    PageSizeOrder {
        default_page_size: u64,
        max_page_size: u64,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "MARKET_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "MARKET_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidPageSize { variable } => {
                write!(f, "{} must be a positive integer", variable)
            }
            ConfigError::PageSizeOrder {
                default_page_size,
                max_page_size,
            } => write!(
                f,
                "default page size {} exceeds maximum page size {}",
                default_page_size, max_page_size
            ),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidPageSize { .. }
            | ConfigError::PageSizeOrder { .. } => None,
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
        for name in [
            "MARKET_ENV",
            "MARKET_HOST",
            "MARKET_PORT",
            "MARKET_LOG_LEVEL",
            "MARKET_DEFAULT_PAGE_SIZE",
            "MARKET_MAX_PAGE_SIZE",
        ] {
            env::remove_var(name);
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
        assert_eq!(config.query.default_page_size, 10);
        assert_eq!(config.query.max_page_size, 100);
    }

    #[test]
    fn accepts_localhost_host() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("MARKET_HOST", "localhost");
        let config = AppConfig::load().expect("config loads");
        let addr = config.server.socket_addr().expect("localhost resolves");
        assert_eq!(addr, SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 3000));
        reset_env();
    }

    #[test]
    fn reads_page_size_overrides() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("MARKET_DEFAULT_PAGE_SIZE", "25");
        env::set_var("MARKET_MAX_PAGE_SIZE", "50");
        let config = AppConfig::load().expect("config loads");
        assert_eq!(config.query.default_page_size, 25);
        assert_eq!(config.query.max_page_size, 50);
        reset_env();
    }

    #[test]
    fn rejects_default_page_size_above_maximum() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("MARKET_DEFAULT_PAGE_SIZE", "200");
        let err = AppConfig::load().expect_err("default above max is rejected");
        assert!(matches!(err, ConfigError::PageSizeOrder { .. }));
        reset_env();
    }

    #[test]
    fn rejects_zero_page_size() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("MARKET_MAX_PAGE_SIZE", "0");
        let err = AppConfig::load().expect_err("zero is rejected");
        assert!(matches!(
            err,
            ConfigError::InvalidPageSize {
                variable: "MARKET_MAX_PAGE_SIZE"
            }
        ));
        reset_env();
    }
}
