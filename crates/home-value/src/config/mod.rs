use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_GEOCODER_URL: &str =
    "https://geocoding.geo.census.gov/geocoder/geographies/onelineaddress";
const DEFAULT_COMPARABLES_URL: &str =
    "https://api.gateway.attomdata.com/propertyapi/v1.0.0/sale/snapshot";

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
    pub providers: ProviderConfig,
    pub valuation: ValuationConfig,
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

        let timeout_secs = env::var("PROVIDER_TIMEOUT_SECS")
            .unwrap_or_else(|_| "5".to_string())
            .parse::<u64>()
            .ok()
            .filter(|secs| *secs > 0)
            .ok_or(ConfigError::InvalidProviderTimeout)?;
        let geocoder_url =
            env::var("GEOCODER_URL").unwrap_or_else(|_| DEFAULT_GEOCODER_URL.to_string());
        let comparables_url =
            env::var("ATTOM_URL").unwrap_or_else(|_| DEFAULT_COMPARABLES_URL.to_string());
        let attom_api_key = env::var("ATTOM_API_KEY")
            .ok()
            .filter(|value| !value.trim().is_empty());

        let current_year = match env::var("VALUATION_CURRENT_YEAR") {
            Ok(raw) => Some(
                raw.trim()
                    .parse::<i32>()
                    .map_err(|_| ConfigError::InvalidCurrentYear)?,
            ),
            Err(_) => None,
        };
        let baseline_csv = env::var("BASELINE_CSV")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from);

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            providers: ProviderConfig {
                timeout: Duration::from_secs(timeout_secs),
                geocoder_url,
                comparables_url,
                attom_api_key,
            },
            valuation: ValuationConfig {
                current_year,
                baseline_csv,
            },
        })
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

/// Outbound data provider settings.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// Upper bound for every individual provider call.
    pub timeout: Duration,
    pub geocoder_url: String,
    pub comparables_url: String,
    /// Enables the comparable-sales lookup when present.
    pub attom_api_key: Option<String>,
}

/// Knobs for the valuation pipeline itself.
#[derive(Debug, Clone, Default)]
pub struct ValuationConfig {
    /// Pins the calendar year used for age math; `None` follows the local clock.
    pub current_year: Option<i32>,
    /// Replaces the built-in baseline table when set.
    pub baseline_csv: Option<PathBuf>,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidProviderTimeout,
    InvalidCurrentYear,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidProviderTimeout => {
                write!(f, "PROVIDER_TIMEOUT_SECS must be a positive integer")
            }
            ConfigError::InvalidCurrentYear => {
                write!(f, "VALUATION_CURRENT_YEAR must be a calendar year")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidProviderTimeout
            | ConfigError::InvalidCurrentYear => None,
        }
    }
}
