//! Configuration management for Sitelens.
//!
//! Provides TOML-based configuration with XDG-compliant paths and
//! environment variable overrides.

use crate::error::{ConfigError, ConfigResult};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Main audit configuration.
///
/// Loaded from `~/.config/sitelens/config.toml` (or platform equivalent).
/// If the file doesn't exist, default values are used.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    /// HTTP fetch behavior settings
    pub fetch: FetchConfig,
    /// Headless browser settings
    pub browser: BrowserConfig,
    /// Per-check tuning knobs
    pub checks: CheckTuning,
}

/// HTTP fetch behavior: timeouts, retry schedules, concurrency caps.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Default per-request timeout in seconds
    pub request_timeout_secs: u64,
    /// Escalating timeout schedule (seconds) for slow-target retries
    pub retry_schedule_secs: Vec<u64>,
    /// Retry count for transient HTTP statuses (408, 429, 5xx transients)
    pub transient_retries: u32,
    /// Concurrency cap for link-liveness fan-out
    pub link_concurrency: usize,
    /// Concurrency cap for page-level fan-out (breadcrumbs, coherence)
    pub page_concurrency: usize,
    /// Concurrency cap for remote validator API calls
    pub validator_concurrency: usize,
    /// Timeout in seconds for remote validator API calls
    pub validator_timeout_secs: u64,
    /// Unreachable-fraction tolerance threshold, in percent
    pub tolerance_percent: u8,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: 10,
            retry_schedule_secs: vec![15, 20, 40, 60],
            transient_retries: 1,
            link_concurrency: 20,
            page_concurrency: 5,
            validator_concurrency: 3,
            validator_timeout_secs: 45,
            tolerance_percent: 30,
        }
    }
}

/// Headless browser settings for scroll/viewport checks.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// Run the browser headless (disable for debugging)
    pub headless: bool,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self { headless: true }
    }
}

/// Tuning knobs for individual checks.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckTuning {
    /// CSS selectors tried when locating the main banner container
    pub banner_selectors: Vec<String>,
    /// Path prefixes excluded when classifying banner destination links
    pub banner_excluded_paths: Vec<String>,
}

impl Default for CheckTuning {
    fn default() -> Self {
        Self {
            banner_selectors: vec![
                "#banner-principal".to_string(),
                "#main-hero".to_string(),
                ".hero-section".to_string(),
                ".main-slider".to_string(),
                ".banner-area".to_string(),
                ".header-banner-container".to_string(),
            ],
            banner_excluded_paths: vec![
                "/servicos".to_string(),
                "/contato".to_string(),
                "/blog".to_string(),
                "/empresa".to_string(),
                "/quem-somos".to_string(),
                "/sobre".to_string(),
            ],
        }
    }
}

impl AuditConfig {
    /// Load configuration from disk, falling back to defaults if not found.
    ///
    /// # Errors
    /// Returns error if the file exists but cannot be read or parsed.
    pub fn load() -> ConfigResult<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            tracing::debug!("Loading config from {}", config_path.display());
            let contents = fs::read_to_string(&config_path)?;
            let config = toml::from_str(&contents)?;
            Ok(config)
        } else {
            tracing::debug!("Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Load configuration with environment variable overrides.
    ///
    /// Supports the following environment variables:
    /// - `SITELENS_REQUEST_TIMEOUT_SECS`: Override the default request timeout
    /// - `SITELENS_TOLERANCE_PERCENT`: Override the unreachable tolerance threshold
    /// - `SITELENS_HEADLESS`: Override browser headless mode (true/false)
    pub fn load_with_env() -> ConfigResult<Self> {
        let mut config = Self::load()?;
        config.apply_env();
        Ok(config)
    }

    /// Apply environment variable overrides to an already-loaded config.
    pub fn apply_env(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    // Overrides read through a lookup so tests never mutate process env.
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(val) = lookup("SITELENS_REQUEST_TIMEOUT_SECS") {
            if let Ok(secs) = val.parse() {
                self.fetch.request_timeout_secs = secs;
                tracing::debug!("Override request_timeout_secs from env: {}", secs);
            }
        }

        if let Some(val) = lookup("SITELENS_TOLERANCE_PERCENT") {
            if let Ok(percent) = val.parse() {
                self.fetch.tolerance_percent = percent;
                tracing::debug!("Override tolerance_percent from env: {}", percent);
            }
        }

        if let Some(val) = lookup("SITELENS_HEADLESS") {
            if let Ok(headless) = val.parse() {
                self.browser.headless = headless;
                tracing::debug!("Override browser.headless from env: {}", headless);
            }
        }
    }

    /// Save configuration to disk.
    ///
    /// Creates the config directory if it doesn't exist.
    pub fn save(&self) -> ConfigResult<()> {
        let config_path = Self::config_path()?;
        let config_dir = config_path
            .parent()
            .ok_or_else(|| ConfigError::InvalidValue {
                field: "config_path".to_string(),
                reason: "no parent directory".to_string(),
            })?;

        fs::create_dir_all(config_dir)?;
        tracing::debug!("Saving config to {}", config_path.display());

        let contents = toml::to_string_pretty(self)?;
        fs::write(config_path, contents)?;
        Ok(())
    }

    /// Get the path to the configuration file.
    ///
    /// Uses XDG base directories: `~/.config/sitelens/config.toml`
    pub fn config_path() -> ConfigResult<PathBuf> {
        let dirs =
            ProjectDirs::from("io", "sitelens", "sitelens").ok_or(ConfigError::NoConfigDir)?;
        Ok(dirs.config_dir().join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AuditConfig::default();
        assert_eq!(config.fetch.request_timeout_secs, 10);
        assert_eq!(config.fetch.retry_schedule_secs, vec![15, 20, 40, 60]);
        assert_eq!(config.fetch.transient_retries, 1);
        assert_eq!(config.fetch.link_concurrency, 20);
        assert_eq!(config.fetch.page_concurrency, 5);
        assert_eq!(config.fetch.validator_concurrency, 3);
        assert_eq!(config.fetch.tolerance_percent, 30);
        assert!(config.browser.headless);
        assert_eq!(config.checks.banner_selectors.len(), 6);
    }

    #[test]
    fn test_parse_partial_toml() {
        let toml_str = r#"
            [fetch]
            tolerance_percent = 50

            [browser]
            headless = false
        "#;

        let config: AuditConfig = toml::from_str(toml_str).expect("parse config");
        assert_eq!(config.fetch.tolerance_percent, 50);
        assert!(!config.browser.headless);
        // Unspecified fields fall back to defaults
        assert_eq!(config.fetch.link_concurrency, 20);
    }

    #[test]
    fn test_roundtrip() {
        let config = AuditConfig::default();
        let serialized = toml::to_string_pretty(&config).expect("serialize config");
        let parsed: AuditConfig = toml::from_str(&serialized).expect("parse config");
        assert_eq!(
            parsed.fetch.retry_schedule_secs,
            config.fetch.retry_schedule_secs
        );
        assert_eq!(
            parsed.checks.banner_excluded_paths,
            config.checks.banner_excluded_paths
        );
    }

    #[test]
    fn test_env_override() {
        let mut config = AuditConfig::default();
        config.apply_overrides(|name| match name {
            "SITELENS_TOLERANCE_PERCENT" => Some("45".to_string()),
            "SITELENS_HEADLESS" => Some("false".to_string()),
            _ => None,
        });
        assert_eq!(config.fetch.tolerance_percent, 45);
        assert!(!config.browser.headless);
        // Untouched fields keep their loaded values
        assert_eq!(config.fetch.request_timeout_secs, 10);
    }

    #[test]
    fn test_env_override_ignores_unparseable() {
        let mut config = AuditConfig::default();
        config.apply_overrides(|name| {
            (name == "SITELENS_TOLERANCE_PERCENT").then(|| "lots".to_string())
        });
        assert_eq!(config.fetch.tolerance_percent, 30);
    }
}
