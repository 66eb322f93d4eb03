// src/config.rs
//! Layered configuration: defaults, then `config.yaml`, then environment,
//! then command-line flags.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::session::SessionStore;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080/api";
pub const DEFAULT_PAGE_SIZE: u32 = 50;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_CONFIG_FILE: &str = "config.yaml";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub page_size: u32,
    pub timeout_seconds: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            timeout_seconds: DEFAULT_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub store_path: PathBuf,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            store_path: SessionStore::default_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter used when `RUST_LOG` is unset
    pub filter: String,
    /// Optional JSON log file, truncated at startup
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "warn".to_string(),
            file: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AdminConfig {
    pub api: ApiConfig,
    pub session: SessionConfig,
    pub logging: LoggingConfig,
    /// File the settings were read from, with its environment section
    #[serde(skip)]
    pub source: Option<(PathBuf, String)>,
}

#[derive(Debug, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    local: Option<AdminConfig>,
    #[serde(default)]
    production: Option<AdminConfig>,
}

/// Flag values that win over every other source
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub config_path: Option<PathBuf>,
    pub base_url: Option<String>,
    pub page_size: Option<u32>,
}

impl AdminConfig {
    /// Load all configuration layers
    pub fn load(overrides: &ConfigOverrides) -> Result<Self> {
        let environment = Self::get_environment();

        let mut config = match Self::config_path(overrides) {
            Some(path) => {
                let mut config = Self::load_from_file(&path, &environment)?;
                config.source = Some((path, environment));
                config
            }
            None => Self::default(),
        };

        config.apply_env(|key| std::env::var(key).ok())?;
        config.apply_overrides(overrides);
        config.validate()?;

        Ok(config)
    }

    fn get_environment() -> String {
        std::env::var("CAREER_ADMIN_ENV")
            .or_else(|_| std::env::var("ENVIRONMENT"))
            .unwrap_or_else(|_| "local".to_string())
    }

    fn config_path(overrides: &ConfigOverrides) -> Option<PathBuf> {
        overrides
            .config_path
            .clone()
            .or_else(|| std::env::var("CAREER_ADMIN_CONFIG").ok().map(PathBuf::from))
            .or_else(|| {
                let default = PathBuf::from(DEFAULT_CONFIG_FILE);
                default.exists().then_some(default)
            })
    }

    fn load_from_file(path: &Path, environment: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_yaml(&content, environment)
            .with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// Pick the section for `environment`; `local` is the fallback
    pub fn from_yaml(content: &str, environment: &str) -> Result<Self> {
        let file: ConfigFile = serde_yaml::from_str(content)?;

        let section = match environment {
            "production" => file.production.or(file.local),
            _ => file.local,
        };

        Ok(section.unwrap_or_default())
    }

    fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("CAREER_ADMIN_API_URL") {
            self.api.base_url = url;
        }
        if let Some(size) = lookup("CAREER_ADMIN_PAGE_SIZE") {
            self.api.page_size = size
                .parse()
                .context("CAREER_ADMIN_PAGE_SIZE must be a positive integer")?;
        }
        if let Some(secs) = lookup("CAREER_ADMIN_TIMEOUT_SECS") {
            self.api.timeout_seconds = secs
                .parse()
                .context("CAREER_ADMIN_TIMEOUT_SECS must be a number of seconds")?;
        }
        if let Some(path) = lookup("CAREER_ADMIN_SESSION_FILE") {
            self.session.store_path = PathBuf::from(path);
        }
        if let Some(path) = lookup("CAREER_ADMIN_LOG_FILE") {
            self.logging.file = Some(PathBuf::from(path));
        }
        Ok(())
    }

    fn apply_overrides(&mut self, overrides: &ConfigOverrides) {
        if let Some(url) = &overrides.base_url {
            self.api.base_url = url.clone();
        }
        if let Some(size) = overrides.page_size {
            self.api.page_size = size;
        }
    }

    pub fn validate(&self) -> Result<()> {
        let url = self.api.base_url.trim();
        if url.is_empty() {
            anyhow::bail!("API base URL must not be empty");
        }
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            anyhow::bail!("API base URL must start with http:// or https://: {}", url);
        }
        if self.api.page_size == 0 {
            anyhow::bail!("Page size must be greater than zero");
        }
        Ok(())
    }
}
