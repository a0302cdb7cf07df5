use std::{env, fmt::Display, path::PathBuf, str::FromStr, time::Duration};

use tracing::{info, warn};
use url::Url;

use crate::error::ConfigError;

const API_BASE_URL: &str = "CONSOLE_API_BASE_URL";
const IDENTITY_API_KEY: &str = "CONSOLE_IDENTITY_API_KEY";
const SESSION_CACHE: &str = "CONSOLE_SESSION_CACHE";
const ACTOR_BUFFER: &str = "CONSOLE_ACTOR_BUFFER";
const POLL_INTERVAL: &str = "CONSOLE_POLL_INTERVAL_SECS";
const REQUEST_TIMEOUT: &str = "CONSOLE_REQUEST_TIMEOUT_SECS";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub api_base_url: Url,
    /// Without a key, password sign-in is unavailable.
    pub identity_api_key: Option<String>,
    pub session_cache: PathBuf,
    pub actor_buffer: usize,
    /// Zero disables order polling.
    pub poll_interval: Duration,
    pub request_timeout: Duration,
}

impl Config {
    /// Reads the process environment, after loading `.env` if there is one.
    pub fn load() -> Result<Self, ConfigError> {
        if let Err(e) = dotenvy::dotenv() {
            info!("No .env file loaded: {e}");
        }
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let raw_url = lookup(API_BASE_URL)
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::Missing(API_BASE_URL))?;
        let api_base_url =
            Url::parse(raw_url.trim().trim_end_matches('/')).map_err(|e| ConfigError::Invalid {
                key: API_BASE_URL,
                reason: e.to_string(),
            })?;

        let identity_api_key = lookup(IDENTITY_API_KEY).filter(|v| !v.trim().is_empty());
        if identity_api_key.is_none() {
            warn!("{IDENTITY_API_KEY} not set, password sign-in disabled");
        }

        let actor_buffer: usize = try_load(&lookup, ACTOR_BUFFER, "32")?;
        if actor_buffer == 0 {
            return Err(ConfigError::Invalid {
                key: ACTOR_BUFFER,
                reason: "must be at least 1".to_string(),
            });
        }

        Ok(Self {
            api_base_url,
            identity_api_key,
            session_cache: try_load(&lookup, SESSION_CACHE, ".console-session.json")?,
            actor_buffer,
            poll_interval: Duration::from_secs(try_load(&lookup, POLL_INTERVAL, "0")?),
            request_timeout: Duration::from_secs(try_load(&lookup, REQUEST_TIMEOUT, "15")?),
        })
    }
}

fn try_load<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: &str,
) -> Result<T, ConfigError>
where
    T::Err: Display,
{
    lookup(key)
        .unwrap_or_else(|| {
            info!("{key} not set, using default: {default}");
            default.to_string()
        })
        .trim()
        .parse()
        .map_err(|e: T::Err| {
            warn!("Invalid {key} value: {e}");
            ConfigError::Invalid {
                key,
                reason: e.to_string(),
            }
        })
}
