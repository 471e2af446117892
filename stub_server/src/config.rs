use std::{env, fmt::Display, str::FromStr, time::Duration};

use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
#[error("invalid {key}: {message}")]
pub struct ConfigError {
    pub key: &'static str,
    pub message: String,
}

#[derive(Clone, Debug)]
pub struct StubConfig {
    pub port: u16,
    pub jwt_secret: String,
    pub access_ttl: Duration,
    pub bcrypt_cost: u32,
}

impl StubConfig {
    pub fn load() -> Result<Self, ConfigError> {
        Ok(Self {
            port: try_load("STUB_PORT", "8001")?,
            jwt_secret: require("STUB_JWT_SECRET")?,
            access_ttl: Duration::from_secs(try_load("STUB_ACCESS_TTL_SECS", "900")?),
            bcrypt_cost: try_load("STUB_BCRYPT_COST", "10")?,
        })
    }

    /// Settings for in-process test servers: random port, cheapest hashing.
    pub fn for_tests() -> Self {
        Self {
            port: 0,
            jwt_secret: "test-secret".to_string(),
            access_ttl: Duration::from_secs(900),
            bcrypt_cost: 4,
        }
    }
}

fn require(key: &'static str) -> Result<String, ConfigError> {
    env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| {
            warn!("{key} must be set");
            ConfigError {
                key,
                message: "must be set".to_string(),
            }
        })
}

fn try_load<T: FromStr>(key: &'static str, default: &str) -> Result<T, ConfigError>
where
    T::Err: Display,
{
    env::var(key)
        .unwrap_or_else(|_| {
            info!("{key} not set, using default: {default}");
            default.to_string()
        })
        .parse()
        .map_err(|e: T::Err| {
            warn!("Invalid {key} value: {e}");
            ConfigError {
                key,
                message: e.to_string(),
            }
        })
}
