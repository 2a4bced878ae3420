//! Process configuration, read once from the environment at startup.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use log::{info, warn};

use crate::storage::StorageConfig;

pub const REMOTE_URL_ENV: &str = "BORA_CRM_REMOTE_URL";
pub const REMOTE_KEY_ENV: &str = "BORA_CRM_REMOTE_KEY";
pub const AI_API_KEY_ENV: &str = "API_KEY";
pub const AI_API_KEY_FALLBACK_ENV: &str = "GEMINI_API_KEY";
pub const DATA_DIR_ENV: &str = "BORA_CRM_DATA_DIR";
pub const LOCAL_LATENCY_ENV: &str = "BORA_CRM_LOCAL_LATENCY_MS";
pub const REMOTE_TIMEOUT_ENV: &str = "BORA_CRM_REMOTE_TIMEOUT_SECS";

const DEFAULT_DATA_DIR: &str = "./data";

/// Endpoint and credential of the hosted remote store.
#[derive(Clone, PartialEq, Eq)]
pub struct RemoteConfig {
    pub endpoint: String,
    pub credential: String,
}

impl std::fmt::Debug for RemoteConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteConfig")
            .field("endpoint", &self.endpoint)
            .field("credential", &"<redacted>")
            .finish()
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// `None` unless both endpoint and credential are set and non-blank.
    pub remote: Option<RemoteConfig>,
    pub ai_api_key: Option<String>,
    pub storage: StorageConfig,
    pub data_dir: PathBuf,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("remote", &self.remote)
            .field("ai_api_key", &self.ai_api_key.as_ref().map(|_| "<redacted>"))
            .field("storage", &self.storage)
            .field("data_dir", &self.data_dir)
            .finish()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            remote: None,
            ai_api_key: None,
            storage: StorageConfig::default(),
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let remote = match (var(REMOTE_URL_ENV), var(REMOTE_KEY_ENV)) {
            (Some(endpoint), Some(credential)) => Some(RemoteConfig {
                endpoint: endpoint.trim_end_matches('/').to_string(),
                credential,
            }),
            (None, None) => {
                info!("Remote store not configured");
                None
            }
            _ => {
                warn!(
                    "Only one of {} and {} is set; remote store disabled",
                    REMOTE_URL_ENV, REMOTE_KEY_ENV
                );
                None
            }
        };

        let ai_api_key = var(AI_API_KEY_ENV).or_else(|| var(AI_API_KEY_FALLBACK_ENV));
        if ai_api_key.is_none() {
            info!("No AI credential configured, assistant runs in demo mode");
        }

        let defaults = StorageConfig::default();
        let storage = StorageConfig {
            local_latency: parse_or_default(
                LOCAL_LATENCY_ENV,
                var(LOCAL_LATENCY_ENV),
                defaults.local_latency.as_millis() as u64,
            )
            .map(Duration::from_millis)
            .unwrap_or(defaults.local_latency),
            remote_timeout: parse_or_default(
                REMOTE_TIMEOUT_ENV,
                var(REMOTE_TIMEOUT_ENV),
                defaults.remote_timeout.as_secs(),
            )
            .map(Duration::from_secs)
            .unwrap_or(defaults.remote_timeout),
        };

        Self {
            remote,
            ai_api_key,
            storage,
            data_dir: var(DATA_DIR_ENV)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR)),
        }
    }
}

fn parse_or_default<N>(name: &str, raw: Option<String>, default: N) -> Option<N>
where
    N: FromStr + Copy + std::fmt::Display,
{
    let raw = raw?;
    match raw.parse::<N>() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(
                "Ignoring invalid {}={:?}, using default {}",
                name, raw, default
            );
            Some(default)
        }
    }
}
