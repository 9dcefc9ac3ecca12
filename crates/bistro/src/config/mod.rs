use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use rust_decimal::Decimal;

use crate::reputation::EnginePolicy;

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
    pub policy: EnginePolicy,
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
        let ansi = environment == AppEnvironment::Development;

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level, ansi },
            policy: load_policy()?,
        })
    }
}

/// Business rule overrides; anything unset keeps the house defaults.
fn load_policy() -> Result<EnginePolicy, ConfigError> {
    let mut policy = EnginePolicy::default();

    override_from_env("BISTRO_DELIVERY_FEE", &mut policy.checkout.standard_delivery_fee)?;
    override_from_env("BISTRO_VIP_DISCOUNT_RATE", &mut policy.checkout.vip_discount_rate)?;
    override_from_env("BISTRO_FREE_DELIVERY_EVERY", &mut policy.checkout.free_delivery_every)?;
    override_from_env("BISTRO_VIP_SPEND_THRESHOLD", &mut policy.status.vip_spend_threshold)?;
    override_from_env("BISTRO_VIP_ORDER_THRESHOLD", &mut policy.status.vip_order_threshold)?;
    override_from_env("BISTRO_DEMOTION_WARNINGS", &mut policy.status.demotion_warnings)?;
    override_from_env("BISTRO_DEACTIVATION_WARNINGS", &mut policy.status.deactivation_warnings)?;
    override_from_env("BISTRO_MAX_DEPOSIT", &mut policy.max_deposit)?;

    if policy.checkout.standard_delivery_fee < Decimal::ZERO {
        return Err(ConfigError::InvalidPolicy {
            key: "BISTRO_DELIVERY_FEE",
            value: policy.checkout.standard_delivery_fee.to_string(),
        });
    }
    if policy.checkout.vip_discount_rate < Decimal::ZERO
        || policy.checkout.vip_discount_rate > Decimal::ONE
    {
        return Err(ConfigError::InvalidPolicy {
            key: "BISTRO_VIP_DISCOUNT_RATE",
            value: policy.checkout.vip_discount_rate.to_string(),
        });
    }

    Ok(policy)
}

fn override_from_env<T: FromStr>(key: &'static str, slot: &mut T) -> Result<(), ConfigError> {
    let Ok(raw) = env::var(key) else {
        return Ok(());
    };

    *slot = raw.trim().parse::<T>().map_err(|_| ConfigError::InvalidPolicy {
        key,
        value: raw.clone(),
    })?;
    Ok(())
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
    pub ansi: bool,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidPolicy { key: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidPolicy { key, value } => {
                write!(f, "{key} has an invalid value '{value}'")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort | ConfigError::InvalidPolicy { .. } => None,
            ConfigError::InvalidHost { source } => Some(source),
        }
    }
}
