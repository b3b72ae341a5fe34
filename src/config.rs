use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use url::Url;

pub const BASE_URL_ENV: &str = "AGENTDESK_BASE_URL";
const DEFAULT_BASE_URL: &str = "http://localhost:8000/";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("invalid base url '{raw}': {source}")]
    BaseUrl {
        raw: String,
        source: url::ParseError,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub base_url: Url,
    pub request_timeout_secs: u64,
    pub log_level: String,
    pub window_width: f32,
    pub window_height: f32,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    base_url: Option<String>,
    request_timeout_secs: Option<u64>,
    log_level: Option<String>,
    window_width: Option<f32>,
    window_height: Option<f32>,
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".agentdesk").join("config.toml"))
}

impl Config {
    fn defaults() -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: parse_base_url(DEFAULT_BASE_URL)?,
            request_timeout_secs: 30,
            log_level: "info".to_string(),
            window_width: 1280.0,
            window_height: 800.0,
        })
    }

    // An explicit `path` must exist; the default path may be absent.
    pub fn load(path: Option<&Path>, base_url_override: Option<&str>) -> Result<Self, ConfigError> {
        let mut config = Self::defaults()?;

        match path {
            Some(path) => config.merge_file(path)?,
            None => {
                if let Some(path) = default_config_path().filter(|path| path.exists()) {
                    config.merge_file(&path)?;
                }
            }
        }

        if let Ok(raw) = std::env::var(BASE_URL_ENV) {
            if !raw.trim().is_empty() {
                config.base_url = parse_base_url(&raw)?;
            }
        }
        if let Some(raw) = base_url_override {
            config.base_url = parse_base_url(raw)?;
        }

        Ok(config)
    }

    fn merge_file(&mut self, path: &Path) -> Result<(), ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let file: ConfigFile = toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        if let Some(raw) = file.base_url {
            self.base_url = parse_base_url(&raw)?;
        }
        if let Some(timeout) = file.request_timeout_secs {
            self.request_timeout_secs = timeout.max(1);
        }
        if let Some(level) = file.log_level {
            self.log_level = level;
        }
        if let Some(width) = file.window_width {
            self.window_width = width;
        }
        if let Some(height) = file.window_height {
            self.window_height = height;
        }
        Ok(())
    }
}

pub fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
    let mut url = Url::parse(raw.trim()).map_err(|source| ConfigError::BaseUrl {
        raw: raw.to_string(),
        source,
    })?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}
