//! Configuration management
//!
//! Settings live in `settings.json` in the client directory:
//! ```json
//! {
//!   "apiUrl": "http://localhost:8080/api",
//!   "timeoutSecs": 30,
//!   "pageSizes": { "users": 10, "transactions": 15, "logs": 20 }
//! }
//! ```
//! Keys this crate does not manage are kept as-is when saving.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::adapters::http::{DEFAULT_API_URL, DEFAULT_TIMEOUT_SECS};
use crate::services::listing::{
    DEFAULT_LOGS_PER_PAGE, DEFAULT_TRANSACTIONS_PER_PAGE, DEFAULT_USERS_PER_PAGE,
};

/// Environment variable overriding the backend URL
pub const API_URL_ENV: &str = "CCX_API_URL";

const SETTINGS_FILE: &str = "settings.json";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    api_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    timeout_secs: Option<u64>,
    #[serde(default)]
    page_sizes: PageSizes,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

/// Rows per page for each listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageSizes {
    pub users: usize,
    pub transactions: usize,
    pub logs: usize,
}

impl Default for PageSizes {
    fn default() -> Self {
        Self {
            users: DEFAULT_USERS_PER_PAGE,
            transactions: DEFAULT_TRANSACTIONS_PER_PAGE,
            logs: DEFAULT_LOGS_PER_PAGE,
        }
    }
}

/// Where the effective backend URL came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiUrlSource {
    Default,
    Settings,
    Environment,
}

impl ApiUrlSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApiUrlSource::Default => "default",
            ApiUrlSource::Settings => "settings.json",
            ApiUrlSource::Environment => API_URL_ENV,
        }
    }
}

/// Client configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: String,
    pub api_url_source: ApiUrlSource,
    pub timeout_secs: u64,
    pub page_sizes: PageSizes,
    // Keep the raw settings for preservation when saving
    _raw_settings: SettingsFile,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_url_source: ApiUrlSource::Default,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            page_sizes: PageSizes::default(),
            _raw_settings: SettingsFile::default(),
        }
    }
}

/// Check that `url` is an absolute http(s) URL
pub fn validate_api_url(url: &str) -> Result<String> {
    let trimmed = url.trim().trim_end_matches('/');
    let parsed = Url::parse(trimmed).with_context(|| format!("Invalid API URL '{}'", url))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        bail!("API URL must use http or https, got '{}'", parsed.scheme());
    }
    Ok(trimmed.to_string())
}

impl Config {
    /// Load config from the client directory, applying `CCX_API_URL`
    pub fn load(ccx_dir: &Path) -> Result<Self> {
        Self::load_with_override(ccx_dir, std::env::var(API_URL_ENV).ok())
    }

    fn load_with_override(ccx_dir: &Path, env_url: Option<String>) -> Result<Self> {
        let settings_path = ccx_dir.join(SETTINGS_FILE);

        let raw: SettingsFile = if settings_path.exists() {
            let content = std::fs::read_to_string(&settings_path)?;
            serde_json::from_str(&content).unwrap_or_default()
        } else {
            SettingsFile::default()
        };

        let (api_url, api_url_source) = match (env_url.filter(|u| !u.trim().is_empty()), &raw.api_url) {
            (Some(url), _) => (
                validate_api_url(&url).with_context(|| format!("{} is invalid", API_URL_ENV))?,
                ApiUrlSource::Environment,
            ),
            (None, Some(url)) => (validate_api_url(url)?, ApiUrlSource::Settings),
            (None, None) => (DEFAULT_API_URL.to_string(), ApiUrlSource::Default),
        };

        Ok(Self {
            api_url,
            api_url_source,
            timeout_secs: raw
                .timeout_secs
                .filter(|t| *t > 0)
                .unwrap_or(DEFAULT_TIMEOUT_SECS),
            page_sizes: sanitize(raw.page_sizes),
            _raw_settings: raw,
        })
    }

    /// Save config to the client directory
    ///
    /// An environment override is never written back.
    pub fn save(&self, ccx_dir: &Path) -> Result<()> {
        let settings_path = ccx_dir.join(SETTINGS_FILE);

        let mut settings = if settings_path.exists() {
            let content = std::fs::read_to_string(&settings_path)?;
            serde_json::from_str::<SettingsFile>(&content).unwrap_or_default()
        } else {
            self._raw_settings.clone()
        };

        match self.api_url_source {
            ApiUrlSource::Settings => settings.api_url = Some(self.api_url.clone()),
            ApiUrlSource::Default => settings.api_url = None,
            ApiUrlSource::Environment => {}
        }
        settings.timeout_secs = Some(self.timeout_secs);
        settings.page_sizes = self.page_sizes;

        std::fs::create_dir_all(ccx_dir)?;
        let content = serde_json::to_string_pretty(&settings)?;
        std::fs::write(&settings_path, content)?;
        Ok(())
    }

    pub fn set_api_url(&mut self, url: &str) -> Result<()> {
        self.api_url = validate_api_url(url)?;
        self.api_url_source = ApiUrlSource::Settings;
        Ok(())
    }

    pub fn set_timeout(&mut self, secs: u64) -> Result<()> {
        if secs == 0 {
            bail!("Timeout must be at least one second");
        }
        self.timeout_secs = secs;
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn sanitize(sizes: PageSizes) -> PageSizes {
    let defaults = PageSizes::default();
    let or_default = |v: usize, d: usize| if v == 0 { d } else { v };
    PageSizes {
        users: or_default(sizes.users, defaults.users),
        transactions: or_default(sizes.transactions, defaults.transactions),
        logs: or_default(sizes.logs, defaults.logs),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults_without_file() {
        let dir = tempdir().unwrap();
        let config = Config::load_with_override(dir.path(), None).unwrap();
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.api_url_source, ApiUrlSource::Default);
        assert_eq!(config.timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert_eq!(config.page_sizes, PageSizes::default());
    }

    #[test]
    fn test_env_overrides_file() {
        let dir = tempdir().unwrap();
        std::fs::write(
            dir.path().join(SETTINGS_FILE),
            r#"{"apiUrl": "http://files.example/api"}"#,
        )
        .unwrap();

        let config = Config::load_with_override(dir.path(), None).unwrap();
        assert_eq!(config.api_url, "http://files.example/api");
        assert_eq!(config.api_url_source, ApiUrlSource::Settings);

        let config =
            Config::load_with_override(dir.path(), Some("https://env.example/api/".into())).unwrap();
        assert_eq!(config.api_url, "https://env.example/api");
        assert_eq!(config.api_url_source, ApiUrlSource::Environment);

        assert!(Config::load_with_override(dir.path(), Some("ftp://x".into())).is_err());
    }

    #[test]
    fn test_save_preserves_unknown_keys() {
        let dir = tempdir().unwrap();
        std::fs::write(
            dir.path().join(SETTINGS_FILE),
            r#"{"theme": "dark", "pageSizes": {"users": 25}}"#,
        )
        .unwrap();

        let mut config = Config::load_with_override(dir.path(), None).unwrap();
        assert_eq!(config.page_sizes.users, 25);
        assert_eq!(config.page_sizes.logs, DEFAULT_LOGS_PER_PAGE);

        config.set_api_url("https://prod.example/api").unwrap();
        config.set_timeout(5).unwrap();
        config.save(dir.path()).unwrap();

        let content = std::fs::read_to_string(dir.path().join(SETTINGS_FILE)).unwrap();
        let value: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(value["theme"], "dark");
        assert_eq!(value["apiUrl"], "https://prod.example/api");
        assert_eq!(value["timeoutSecs"], 5);

        let reloaded = Config::load_with_override(dir.path(), None).unwrap();
        assert_eq!(reloaded.timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_env_url_is_not_saved() {
        let dir = tempdir().unwrap();
        let config =
            Config::load_with_override(dir.path(), Some("http://env.example".into())).unwrap();
        config.save(dir.path()).unwrap();

        let content = std::fs::read_to_string(dir.path().join(SETTINGS_FILE)).unwrap();
        assert!(!content.contains("env.example"));
    }

    #[test]
    fn test_setters_validate() {
        let mut config = Config::default();
        assert!(config.set_api_url("not a url").is_err());
        assert!(config.set_timeout(0).is_err());
        assert_eq!(config.api_url, DEFAULT_API_URL);
    }
}
