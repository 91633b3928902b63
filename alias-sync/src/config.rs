// alias-sync/src/config.rs
use anyhow::{anyhow, Result};
use directories::BaseDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const CONFIG_DIR_NAME: &str = "simplelogin-cli";
const API_KEY_ENV: &str = "SIMPLELOGIN_API_KEY";
const API_URL_ENV: &str = "SIMPLELOGIN_API_URL";

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct Config {
    /// API key sent in the `Authentication` header
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Per-request timeout; a timed out request counts as a network error
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// `tracing` filter directive used when `RUST_LOG` is unset
    #[serde(default)]
    pub log_level: Option<String>,
}

fn default_api_url() -> String {
    "https://app.simplelogin.io".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_url: default_api_url(),
            timeout_secs: default_timeout_secs(),
            log_level: None,
        }
    }
}

impl Config {
    /// Load from the user config directory, creating a default file on first use.
    pub fn load() -> Result<Self> {
        let config_dir = Self::config_dir()?;
        let mut config = Self::load_from(&config_dir.join("config.toml"))?;
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            let default = Self::default();
            default.save_to(config_path)?;
            return Ok(default);
        }
        Self::read_from(config_path)
    }

    /// The stored file as-is: no env overrides, nothing written when it is missing.
    pub fn load_stored() -> Result<Self> {
        let config_dir = Self::config_dir()?;
        Self::read_from(&config_dir.join("config.toml"))
    }

    pub fn read_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(config_path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Environment variables override the file
    fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(api_key) = var(API_KEY_ENV) {
            self.api_key = api_key;
        }
        if let Some(api_url) = var(API_URL_ENV) {
            self.api_url = api_url;
        }
    }

    pub fn save(&self) -> Result<()> {
        let config_dir = Self::config_dir()?;
        self.save_to(&config_dir.join("config.toml"))
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(dir) = config_path.parent() {
            fs::create_dir_all(dir)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(config_path, content)?;

        // Set permissions to 600 (owner read/write only)
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = fs::metadata(config_path)?.permissions();
            perms.set_mode(0o600);
            fs::set_permissions(config_path, perms)?;
        }

        Ok(())
    }

    pub fn config_dir() -> Result<PathBuf> {
        let base_dirs =
            BaseDirs::new().ok_or_else(|| anyhow!("Cannot determine config directory"))?;
        Ok(base_dirs.config_dir().join(CONFIG_DIR_NAME))
    }

    pub fn api_key(&self) -> Result<&str> {
        if self.api_key.trim().is_empty() {
            return Err(anyhow!(
                "API key not set. Run `aliases setup` or set {}",
                API_KEY_ENV
            ));
        }
        Ok(&self.api_key)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
