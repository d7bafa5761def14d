use std::{env, path::Path, path::PathBuf, time::Duration};

use dirs_next::config_dir;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use specsource_util::expand_tilde;
use tracing::debug;

pub const CONFIG_PATH_ENV: &str = "SPECSOURCE_CONFIG_PATH";
pub const BASE_URL_ENV: &str = "SPECSOURCE_BASE_URL";
pub const API_TOKEN_ENV: &str = "SPECSOURCE_API_TOKEN";

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// User configuration for reading data sources.
///
/// Every field is optional; command-line flags take precedence over the
/// environment, which takes precedence over the file.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpecSourceConfig {
    /// Path of the OpenAPI document describing the resources
    pub spec: Option<String>,
    pub base_url: Option<String>,
    /// Headers sent with every listing request
    pub headers: IndexMap<String, String>,
    pub timeout_secs: Option<u64>,
    /// Endpoint receiving usage counters; telemetry is only logged when unset
    pub telemetry_endpoint: Option<String>,
}

impl SpecSourceConfig {
    /// Loads the configuration from [`default_config_path`].
    pub fn load() -> Self {
        Self::load_from(&default_config_path())
    }

    /// Loads the configuration at `path`. A missing or malformed file yields
    /// the default configuration.
    pub fn load_from(path: &Path) -> Self {
        if let Ok(content) = std::fs::read_to_string(path)
            && let Ok(config) = serde_json::from_str(&content)
        {
            debug!(path = %path.display(), "loaded configuration");
            return config;
        }
        debug!(path = %path.display(), "no usable configuration file; using defaults");
        SpecSourceConfig::default()
    }

    /// Applies `SPECSOURCE_BASE_URL` and `SPECSOURCE_API_TOKEN`.
    ///
    /// The token becomes a bearer `Authorization` header unless one is
    /// already configured.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(base_url) = env::var(BASE_URL_ENV)
            && !base_url.trim().is_empty()
        {
            self.base_url = Some(base_url.trim().to_string());
        }

        if let Ok(token) = env::var(API_TOKEN_ENV)
            && !token.trim().is_empty()
        {
            let has_authorization = self
                .headers
                .keys()
                .any(|name| name.eq_ignore_ascii_case("authorization"));
            if !has_authorization {
                self.headers
                    .insert("Authorization".to_string(), format!("Bearer {}", token.trim()));
            }
        }

        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS))
    }
}

/// Get the default path for the configuration file.
pub fn default_config_path() -> PathBuf {
    if let Ok(path) = env::var(CONFIG_PATH_ENV)
        && !path.trim().is_empty()
    {
        return expand_tilde(&path);
    }

    config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("specsource")
        .join("config.json")
}
