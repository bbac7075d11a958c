use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

const MEMORY_STORE_SCHEME: &str = "memory://";
pub const MAX_LOOKBACK_MONTHS: u32 = 24;

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
    pub store: StoreConfig,
    pub reporting: ReportingConfig,
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
        let cors = CorsPolicy::parse(&env::var("APP_CORS_ORIGINS").unwrap_or_else(|_| "*".into()))?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let url = env::var("STORE_URL").unwrap_or_else(|_| MEMORY_STORE_SCHEME.to_string());
        if !url.starts_with(MEMORY_STORE_SCHEME) {
            return Err(ConfigError::UnsupportedStore { url });
        }
        let fixtures = env::var("STORE_FIXTURES")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from);

        let lookback_months = env::var("REPORT_LOOKBACK_MONTHS")
            .unwrap_or_else(|_| "5".to_string())
            .parse::<u32>()
            .ok()
            .filter(|months| (1..=MAX_LOOKBACK_MONTHS).contains(months))
            .ok_or(ConfigError::InvalidLookback)?;
        let top_n = env::var("REPORT_TOP_N")
            .unwrap_or_else(|_| "5".to_string())
            .parse::<usize>()
            .ok()
            .filter(|top| *top > 0)
            .ok_or(ConfigError::InvalidTopN)?;

        Ok(Self {
            environment,
            server: ServerConfig { host, port, cors },
            telemetry: TelemetryConfig { log_level },
            store: StoreConfig { url, fixtures },
            reporting: ReportingConfig {
                lookback_months,
                top_n,
            },
        })
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors: CorsPolicy,
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

/// Origins allowed to call the API from a browser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorsPolicy {
    AnyOrigin,
    Origins(Vec<String>),
}

impl CorsPolicy {
    fn parse(raw: &str) -> Result<Self, ConfigError> {
        let origins: Vec<String> = raw
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(str::to_string)
            .collect();

        if origins.is_empty() || origins.iter().any(|origin| origin == "*") {
            return Ok(Self::AnyOrigin);
        }

        if let Some(bad) = origins
            .iter()
            .find(|origin| !(origin.starts_with("http://") || origin.starts_with("https://")))
        {
            return Err(ConfigError::InvalidCorsOrigin {
                origin: bad.clone(),
            });
        }

        Ok(Self::Origins(origins))
    }
}

/// Tracing and metrics controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Tenant store connection settings.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub url: String,
    pub fixtures: Option<PathBuf>,
}

/// Dashboard and export tuning.
#[derive(Debug, Clone, Copy)]
pub struct ReportingConfig {
    pub lookback_months: u32,
    pub top_n: usize,
}

impl Default for ReportingConfig {
    fn default() -> Self {
        Self {
            lookback_months: 5,
            top_n: 5,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidCorsOrigin { origin: String },
    UnsupportedStore { url: String },
    InvalidLookback,
    InvalidTopN,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidCorsOrigin { origin } => write!(
                f,
                "APP_CORS_ORIGINS entry '{}' must start with http:// or https://",
                origin
            ),
            ConfigError::UnsupportedStore { url } => write!(
                f,
                "STORE_URL '{}' is not supported; expected a {} url",
                url, MEMORY_STORE_SCHEME
            ),
            ConfigError::InvalidLookback => write!(
                f,
                "REPORT_LOOKBACK_MONTHS must be between 1 and {}",
                MAX_LOOKBACK_MONTHS
            ),
            ConfigError::InvalidTopN => write!(f, "REPORT_TOP_N must be a positive integer"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            _ => None,
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
            "APP_CORS_ORIGINS",
            "STORE_URL",
            "STORE_FIXTURES",
            "REPORT_LOOKBACK_MONTHS",
            "REPORT_TOP_N",
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
        assert_eq!(config.server.cors, CorsPolicy::AnyOrigin);
        assert_eq!(config.telemetry.log_level, "info");
        assert_eq!(config.store.url, "memory://");
        assert!(config.store.fixtures.is_none());
        assert_eq!(config.reporting.lookback_months, 5);
        assert_eq!(config.reporting.top_n, 5);
    }

    #[test]
    fn accepts_localhost_host() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_HOST", "localhost");
        let config = AppConfig::load().expect("config loads");
        let addr = config.server.socket_addr().expect("localhost resolves");
        assert_eq!(addr, SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 3000));
    }

    #[test]
    fn rejects_non_memory_store_urls() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("STORE_URL", "postgres://localhost/talent");
        let err = AppConfig::load().expect_err("postgres is not wired");
        assert!(matches!(err, ConfigError::UnsupportedStore { .. }));
        reset_env();
    }

    #[test]
    fn parses_cors_origin_lists() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var(
            "APP_CORS_ORIGINS",
            "https://dashboard.example.com, http://localhost:3001",
        );
        let config = AppConfig::load().expect("config loads");
        assert_eq!(
            config.server.cors,
            CorsPolicy::Origins(vec![
                "https://dashboard.example.com".to_string(),
                "http://localhost:3001".to_string(),
            ])
        );

        env::set_var("APP_CORS_ORIGINS", "dashboard.example.com");
        assert!(matches!(
            AppConfig::load(),
            Err(ConfigError::InvalidCorsOrigin { .. })
        ));
        reset_env();
    }

    #[test]
    fn rejects_out_of_range_lookback() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("REPORT_LOOKBACK_MONTHS", "0");
        assert!(matches!(AppConfig::load(), Err(ConfigError::InvalidLookback)));
        env::set_var("REPORT_LOOKBACK_MONTHS", "36");
        assert!(matches!(AppConfig::load(), Err(ConfigError::InvalidLookback)));
        reset_env();
    }
}
