//! Configuration resolution for veriscan
//!
//! Multi-tier resolution with ENV → TOML → default priority for the backend
//! base URL and the request timeout.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{DetectError, Result};

/// Default backend address when nothing is configured
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:5000";

/// Default request timeout; video inference is slow on the backend
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// On-disk TOML configuration (all fields optional)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    pub backend_url: Option<String>,
    pub request_timeout_secs: Option<u64>,
}

impl TomlConfig {
    /// Read and parse a TOML config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| DetectError::Config(format!("Read TOML failed: {}", e)))?;
        toml::from_str(&content)
            .map_err(|e| DetectError::Config(format!("Parse TOML failed: {}", e)))
    }
}

/// Resolved backend connection settings
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Base address, no trailing slash
    pub base_url: String,
    pub request_timeout: Duration,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BACKEND_URL.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl BackendConfig {
    /// Resolve settings with ENV → TOML → default priority
    pub fn resolve(toml_config: Option<&TomlConfig>) -> Self {
        let env_url = std::env::var("VERISCAN_BACKEND_URL").ok();
        let toml_url = toml_config.and_then(|c| c.backend_url.clone());

        let (base_url, source) = if let Some(url) = env_url {
            (url, "environment")
        } else if let Some(url) = toml_url {
            (url, "TOML")
        } else {
            (DEFAULT_BACKEND_URL.to_string(), "default")
        };
        let base_url = base_url.trim_end_matches('/').to_string();
        info!("Backend URL loaded from {}: {}", source, base_url);

        let timeout_secs = std::env::var("VERISCAN_TIMEOUT_SECS")
            .ok()
            .and_then(|v| match v.parse::<u64>() {
                Ok(secs) => Some(secs),
                Err(_) => {
                    warn!("Ignoring unparsable VERISCAN_TIMEOUT_SECS: {}", v);
                    None
                }
            })
            .or_else(|| toml_config.and_then(|c| c.request_timeout_secs))
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        Self {
            base_url,
            request_timeout: Duration::from_secs(timeout_secs),
        }
    }
}
