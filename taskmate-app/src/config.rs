// taskmate-app/src/config.rs

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use taskmate_net::{ApiConfig, RateLimitManager};
use taskmate_platform::PlatformConfig;
use thiserror::Error;

/// Path of an explicit config file.
pub const CONFIG_ENV: &str = "TASKMATE_CONFIG";
/// Overrides `[api] base_url`.
pub const BASE_URL_ENV: &str = "TASKMATE_API_BASE_URL";

pub const DEFAULT_BASE_URL: &str = "http://localhost:3000/api/v1";
pub const DEFAULT_LOG_FILTER: &str = "info,reqwest=warn,hyper=warn";
const CONFIG_FILE: &str = "taskmate.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSection {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for ApiSection {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitSection {
    /// Backoff assumed when a 429 has no usable Retry-After.
    pub fallback_window_secs: u64,
}

impl Default for RateLimitSection {
    fn default() -> Self {
        Self {
            fallback_window_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub api: ApiSection,
    pub platform: PlatformConfig,
    pub rate_limit: RateLimitSection,
    /// Used when `RUST_LOG` is unset.
    pub log_filter: Option<String>,
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "TaskMate", "taskmate")
}

pub fn default_config_path() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE))
}

pub fn default_data_dir() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.data_dir().to_path_buf())
}

impl AppConfig {
    /// Defaults, then the config file, then the environment.
    pub fn load() -> Result<Self, ConfigError> {
        let explicit = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
        let base_url = std::env::var(BASE_URL_ENV).ok();
        let mut config = Self::load_from(explicit.as_deref(), base_url.as_deref())?;
        if config.platform.data_dir.is_none() {
            config.platform.data_dir = default_data_dir();
        }
        Ok(config)
    }

    /// An explicit path must exist; the default location is optional.
    pub fn load_from(
        explicit: Option<&Path>,
        base_url_override: Option<&str>,
    ) -> Result<Self, ConfigError> {
        let mut config = match explicit {
            Some(path) => Self::read(path)?,
            None => match default_config_path() {
                Some(path) if path.is_file() => Self::read(&path)?,
                _ => Self::default(),
            },
        };

        if let Some(url) = base_url_override.map(str::trim).filter(|u| !u.is_empty()) {
            config.api.base_url = url.to_string();
        }

        config.validate()?;
        Ok(config)
    }

    pub fn read(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(path, &raw)
    }

    fn parse(path: &Path, raw: &str) -> Result<Self, ConfigError> {
        toml::from_str(raw).map_err(|err| ConfigError::Parse {
            path: path.to_path_buf(),
            message: err.to_string(),
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api.timeout_secs == 0 {
            return Err(ConfigError::Invalid("api.timeout_secs must be greater than zero".into()));
        }
        if self.rate_limit.fallback_window_secs == 0 {
            return Err(ConfigError::Invalid(
                "rate_limit.fallback_window_secs must be greater than zero".into(),
            ));
        }
        self.api_config()
            .validate()
            .map_err(|err| ConfigError::Invalid(err.to_string()))
    }

    pub fn api_config(&self) -> ApiConfig {
        ApiConfig::new(&self.api.base_url)
            .with_timeout_ms(self.api.timeout_secs.saturating_mul(1000))
    }

    pub fn rate_limit_manager(&self) -> RateLimitManager {
        RateLimitManager::new(self.rate_limit.fallback_window_secs.saturating_mul(1000))
    }

    pub fn log_filter(&self) -> &str {
        self.log_filter.as_deref().unwrap_or(DEFAULT_LOG_FILTER)
    }
}
