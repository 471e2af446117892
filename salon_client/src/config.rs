use std::env;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

use crate::error::{ApiResult, ClientError};

pub const USER_SERVICE_URL: &str = "SALON_USER_SERVICE_URL";
pub const CATALOG_SERVICE_URL: &str = "SALON_CATALOG_SERVICE_URL";
pub const STAFF_SERVICE_URL: &str = "SALON_STAFF_SERVICE_URL";
pub const APPOINTMENT_SERVICE_URL: &str = "SALON_APPOINTMENT_SERVICE_URL";
pub const ANALYTICS_SERVICE_URL: &str = "SALON_ANALYTICS_SERVICE_URL";
pub const NOTIFICATION_SERVICE_URL: &str = "SALON_NOTIFICATION_SERVICE_URL";
pub const HTTP_TIMEOUT_SECS: &str = "SALON_HTTP_TIMEOUT_SECS";
pub const SESSION_FILE: &str = "SALON_SESSION_FILE";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_SESSION_FILE: &str = ".salon-session.json";

/// Where each backend lives. Base URLs have no built-in fallbacks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub user_service: Url,
    pub catalog_service: Url,
    pub staff_service: Url,
    pub appointment_service: Url,
    pub analytics_service: Url,
    pub notification_service: Option<Url>,
    pub request_timeout: Duration,
    pub session_file: PathBuf,
}

impl ClientConfig {
    /// Reads the process environment (after a `.env` file, if any, was loaded).
    pub fn from_env() -> ApiResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> ApiResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let required_url = |key: &str| -> ApiResult<Url> {
            let raw = value(key).ok_or_else(|| ClientError::Config(format!("{key} must be set")))?;
            parse_base_url(key, &raw)
        };

        let notification_service = value(NOTIFICATION_SERVICE_URL)
            .map(|raw| parse_base_url(NOTIFICATION_SERVICE_URL, &raw))
            .transpose()?;

        let request_timeout = match value(HTTP_TIMEOUT_SECS) {
            Some(raw) => {
                let secs: u64 = raw.parse().map_err(|e| {
                    ClientError::Config(format!("{HTTP_TIMEOUT_SECS} must be a whole number of seconds: {e}"))
                })?;
                Duration::from_secs(secs)
            }
            None => {
                debug!("{HTTP_TIMEOUT_SECS} not set, using {}s", DEFAULT_TIMEOUT.as_secs());
                DEFAULT_TIMEOUT
            }
        };

        let session_file = value(SESSION_FILE)
            .map(PathBuf::from)
            .unwrap_or_else(|| {
                info!("{SESSION_FILE} not set, using {DEFAULT_SESSION_FILE}");
                PathBuf::from(DEFAULT_SESSION_FILE)
            });

        Ok(Self {
            user_service: required_url(USER_SERVICE_URL)?,
            catalog_service: required_url(CATALOG_SERVICE_URL)?,
            staff_service: required_url(STAFF_SERVICE_URL)?,
            appointment_service: required_url(APPOINTMENT_SERVICE_URL)?,
            analytics_service: required_url(ANALYTICS_SERVICE_URL)?,
            notification_service,
            request_timeout,
            session_file,
        })
    }

    /// Every service on one host, `port` for each as in a local compose setup.
    pub fn local(host: &str) -> ApiResult<Self> {
        let url = |port: u16| parse_base_url("host", &format!("http://{host}:{port}"));
        Ok(Self {
            user_service: url(8001)?,
            catalog_service: url(8002)?,
            staff_service: url(8003)?,
            appointment_service: url(8004)?,
            notification_service: Some(url(8005)?),
            analytics_service: url(8006)?,
            request_timeout: DEFAULT_TIMEOUT,
            session_file: PathBuf::from(DEFAULT_SESSION_FILE),
        })
    }
}

fn parse_base_url(key: &str, raw: &str) -> ApiResult<Url> {
    let url = Url::parse(raw).map_err(|e| ClientError::Config(format!("{key} is not a valid URL ({raw}): {e}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ClientError::Config(format!("{key} must be an http(s) URL, got {raw}")));
    }
    Ok(url)
}
