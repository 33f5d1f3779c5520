//! Process configuration.
//!
//! Read once at startup: defaults, then the TOML file, then `VOTES_*`
//! environment variables. A missing or malformed file stops the process.

use std::env;
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use rocket::figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Deserializer, Serialize};
use tally_shared::{ChoiceRegistry, RegistryError};
use tracing::{info, warn};

use crate::redis_store::StoreSettings;
use crate::utils::local_hostname;

pub const CONFIG_PATH_VAR: &str = "VOTES_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";
pub const ENV_PREFIX: &str = "VOTES_";
pub const MEMORY_STORE_URL: &str = "memory://";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config file {0} not found")]
    Missing(PathBuf),
    #[error("Invalid configuration: {0}")]
    Invalid(#[from] Box<rocket::figment::Error>),
    #[error("Invalid port {0:?}")]
    InvalidPort(String),
    #[error("Invalid address {0:?}")]
    InvalidAddress(String),
    #[error("{0} must be at least 1")]
    TooSmall(&'static str),
    #[error("Invalid choices: {0}")]
    Choices(#[from] RegistryError),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub debug: bool,
    #[serde(deserialize_with = "string_or_number")]
    pub port: String,
    pub title: String,
    pub choices: Vec<String>,
    pub showhost: bool,
    pub address: String,
    pub store_url: String,
    pub pool_size: usize,
    pub store_timeout_ms: u64,
    pub key_prefix: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            debug: true,
            port: "8080".into(),
            title: "title default".into(),
            choices: vec!["First".into(), "Second".into()],
            showhost: true,
            address: "0.0.0.0".into(),
            store_url: "redis://127.0.0.1:6379".into(),
            pool_size: 10,
            store_timeout_ms: 500,
            key_prefix: String::new(),
        }
    }
}

impl Settings {
    /// Path from `VOTES_CONFIG`, or `config.toml` in the working directory.
    pub fn config_path() -> PathBuf {
        env::var(CONFIG_PATH_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH))
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        Self::load_with_env(path, Env::prefixed(ENV_PREFIX).ignore(&["config"]))
    }

    pub(crate) fn load_with_env(path: &Path, env: Env) -> Result<Self, ConfigError> {
        if !path.is_file() {
            return Err(ConfigError::Missing(path.to_path_buf()));
        }

        let settings: Settings = Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file(path))
            .merge(env)
            .extract()
            .map_err(Box::new)?;

        settings.validate()?;
        info!("Loaded configuration from {}", path.display());

        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.port()?;
        self.address()?;
        if self.pool_size == 0 {
            return Err(ConfigError::TooSmall("pool_size"));
        }
        if self.store_timeout_ms == 0 {
            return Err(ConfigError::TooSmall("store_timeout_ms"));
        }
        self.registry()?;
        Ok(())
    }

    pub fn port(&self) -> Result<u16, ConfigError> {
        self.port
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidPort(self.port.clone()))
    }

    pub fn address(&self) -> Result<IpAddr, ConfigError> {
        self.address
            .parse()
            .map_err(|_| ConfigError::InvalidAddress(self.address.clone()))
    }

    pub fn registry(&self) -> Result<ChoiceRegistry, ConfigError> {
        Ok(ChoiceRegistry::new(self.choices.iter().cloned())?)
    }

    pub fn uses_memory_store(&self) -> bool {
        self.store_url == MEMORY_STORE_URL
    }

    pub fn store_settings(&self) -> StoreSettings {
        StoreSettings {
            url: self.store_url.clone(),
            pool_size: self.pool_size,
            op_timeout: Duration::from_millis(self.store_timeout_ms),
        }
    }

    /// Page heading: the hostname when `showhost` is set and it can be
    /// determined, the configured title otherwise.
    pub fn resolved_title(&self) -> String {
        if !self.showhost {
            return self.title.clone();
        }
        match local_hostname() {
            Some(hostname) => hostname,
            None => {
                warn!("Hostname lookup failed, using configured title");
                self.title.clone()
            }
        }
    }
}

/// TOML and env values may carry the port as a number or as a string.
fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Port {
        Text(String),
        Number(i64),
    }

    Ok(match Port::deserialize(deserializer)? {
        Port::Text(text) => text,
        Port::Number(number) => number.to_string(),
    })
}
