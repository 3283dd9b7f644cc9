//! Layered application configuration.
//!
//! Precedence, lowest first: built-in defaults, `config.yaml` in the user
//! config directory, `.env`, `PIXELDOJO_*` environment variables, then the OS
//! keyring for the API key when nothing above supplied one. Client builders
//! layer their own overrides on top.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

pub const APP_NAME: &str = "pixeldojo";
pub const KEYRING_SERVICE: &str = "pixeldojo-api";
pub const KEYRING_USERNAME: &str = "api_key";
pub const DEFAULT_API_URL: &str = "https://pixeldojo.ai/api/v1";
const ENV_PREFIX: &str = "PIXELDOJO_";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_key: String,
    pub api_url: String,
    /// Seconds, 1-600
    pub timeout: f64,
    /// 0-10
    pub max_retries: u32,
    /// Initial backoff in seconds, 0.1-30
    pub retry_delay: f64,
    /// 1-100
    pub max_connections: usize,

    pub debug: bool,
    pub default_model: String,
    pub default_aspect_ratio: String,
    pub default_num_outputs: u8,
    pub download_dir: PathBuf,
    pub history_enabled: bool,
    pub max_history: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_url: DEFAULT_API_URL.to_string(),
            timeout: 120.0,
            max_retries: 3,
            retry_delay: 1.0,
            max_connections: 10,
            debug: false,
            default_model: "flux-pro".to_string(),
            default_aspect_ratio: "1:1".to_string(),
            default_num_outputs: 1,
            download_dir: default_download_dir(),
            history_enabled: true,
            max_history: 1000,
        }
    }
}

fn default_download_dir() -> PathBuf {
    dirs::picture_dir()
        .or_else(|| dirs::home_dir().map(|h| h.join("Pictures")))
        .unwrap_or_else(|| PathBuf::from("."))
        .join("PixelDojo")
}

pub fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

pub fn data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

pub fn cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

pub fn config_file_path() -> PathBuf {
    config_dir().join("config.yaml")
}

pub fn ensure_directories() -> Result<()> {
    for dir in [config_dir(), data_dir(), cache_dir()] {
        std::fs::create_dir_all(&dir)?;
    }
    Ok(())
}

impl Config {
    /// Load every layer. Directories are created on first use.
    pub fn load() -> Result<Self> {
        ensure_directories()?;

        let path = config_file_path();
        let mut config = if path.exists() {
            Self::from_file(&path)?
        } else {
            Self::default()
        };

        if let Ok(env_file) = dotenvy::dotenv() {
            debug!(path = %env_file.display(), "loaded .env file");
        }
        config.apply_env_with(|key| std::env::var(key).ok())?;

        if config.api_key.is_empty() {
            if let Some(key) = load_keyring_key() {
                config.api_key = key;
            }
        }

        config.normalize();
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml(&text).map_err(|e| match e {
            Error::Configuration { message } => {
                Error::configuration(format!("{}: {}", path.display(), message))
            }
            other => other,
        })
    }

    pub fn from_yaml(text: &str) -> Result<Self> {
        let mut config: Config = serde_yaml::from_str(text)
            .map_err(|e| Error::configuration(format!("invalid config file: {}", e)))?;
        config.normalize();
        config.validate()?;
        Ok(config)
    }

    /// Apply `PIXELDOJO_*` overrides from `lookup` (normally the process environment).
    pub fn apply_env_with<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(&format!("{}{}", ENV_PREFIX, name));

        if let Some(v) = get("API_KEY") {
            self.api_key = v;
        }
        if let Some(v) = get("API_URL") {
            self.api_url = v;
        }
        if let Some(v) = get("TIMEOUT") {
            self.timeout = parse_env("TIMEOUT", &v)?;
        }
        if let Some(v) = get("MAX_RETRIES") {
            self.max_retries = parse_env("MAX_RETRIES", &v)?;
        }
        if let Some(v) = get("RETRY_DELAY") {
            self.retry_delay = parse_env("RETRY_DELAY", &v)?;
        }
        if let Some(v) = get("MAX_CONNECTIONS") {
            self.max_connections = parse_env("MAX_CONNECTIONS", &v)?;
        }
        if let Some(v) = get("DEBUG") {
            self.debug = parse_bool(&v);
        }
        if let Some(v) = get("DEFAULT_MODEL") {
            self.default_model = v;
        }
        if let Some(v) = get("DEFAULT_ASPECT_RATIO") {
            self.default_aspect_ratio = v;
        }
        if let Some(v) = get("DEFAULT_NUM_OUTPUTS") {
            self.default_num_outputs = parse_env("DEFAULT_NUM_OUTPUTS", &v)?;
        }
        if let Some(v) = get("DOWNLOAD_DIR") {
            self.download_dir = PathBuf::from(v);
        }
        if let Some(v) = get("HISTORY_ENABLED") {
            self.history_enabled = parse_bool(&v);
        }
        if let Some(v) = get("MAX_HISTORY") {
            self.max_history = parse_env("MAX_HISTORY", &v)?;
        }
        self.normalize();
        Ok(())
    }

    fn normalize(&mut self) {
        let trimmed = self.api_url.trim_end_matches('/').len();
        self.api_url.truncate(trimmed);
    }

    pub fn validate(&self) -> Result<()> {
        check_range("timeout", self.timeout, 1.0, 600.0)?;
        check_range("max_retries", self.max_retries, 0, 10)?;
        check_range("retry_delay", self.retry_delay, 0.1, 30.0)?;
        check_range("max_connections", self.max_connections, 1, 100)?;
        check_range("default_num_outputs", self.default_num_outputs, 1, 4)?;
        if self.api_url.is_empty() {
            return Err(Error::configuration("api_url must not be empty"));
        }
        Ok(())
    }

    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }

    pub fn timeout_duration(&self) -> Duration {
        Duration::from_secs_f64(self.timeout)
    }

    pub fn retry_delay_duration(&self) -> Duration {
        Duration::from_secs_f64(self.retry_delay)
    }

    /// Store the key in the OS keyring and use it for this config.
    pub fn save_api_key(&mut self, api_key: &str) -> Result<()> {
        keyring_entry()?
            .set_password(api_key)
            .map_err(|e| Error::configuration(format!("failed to store API key: {}", e)))?;
        self.api_key = api_key.to_string();
        Ok(())
    }

    /// Remove the stored key. A missing entry is not an error.
    pub fn delete_api_key(&mut self) -> Result<()> {
        match keyring_entry()?.delete_password() {
            Ok(()) | Err(keyring::Error::NoEntry) => {}
            Err(e) => {
                return Err(Error::configuration(format!(
                    "failed to remove API key: {}",
                    e
                )))
            }
        }
        self.api_key.clear();
        Ok(())
    }

    pub fn ensure_download_dir(&self) -> Result<&Path> {
        std::fs::create_dir_all(&self.download_dir)?;
        Ok(&self.download_dir)
    }

    pub fn history_path(&self) -> PathBuf {
        data_dir().join("history.json")
    }

    pub fn log_path(&self) -> PathBuf {
        data_dir().join("pixeldojo.log")
    }

    /// API key with everything but the last four characters hidden.
    pub fn masked_api_key(&self) -> String {
        let n = self.api_key.chars().count();
        if n > 4 {
            let tail: String = self.api_key.chars().skip(n - 4).collect();
            format!("****{}", tail)
        } else {
            "(not set)".to_string()
        }
    }
}

fn keyring_entry() -> Result<keyring::Entry> {
    keyring::Entry::new(KEYRING_SERVICE, KEYRING_USERNAME)
        .map_err(|e| Error::configuration(format!("keyring unavailable: {}", e)))
}

fn load_keyring_key() -> Option<String> {
    // Keyring backends are optional on headless hosts; absence is not an error.
    let entry = keyring::Entry::new(KEYRING_SERVICE, KEYRING_USERNAME).ok()?;
    entry.get_password().ok().filter(|k| !k.is_empty())
}

fn parse_env<T: std::str::FromStr>(name: &str, raw: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    raw.trim().parse::<T>().map_err(|e| {
        Error::configuration(format!("{}{}={:?}: {}", ENV_PREFIX, name, raw, e))
    })
}

fn parse_bool(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn check_range<T: PartialOrd + std::fmt::Display>(name: &str, v: T, min: T, max: T) -> Result<()> {
    if !(v >= min && v <= max) {
        return Err(Error::configuration(format!(
            "{} must be between {} and {}, got {}",
            name, min, max, v
        )));
    }
    Ok(())
}
