use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::api::models::DEFAULT_MODEL;
use crate::core::config::io::ConfigError;

pub const DEFAULT_MODEL_BASE_URL: &str = "https://ai.izdrail.com/api";
pub const DEFAULT_STORE_BASE_URL: &str = "http://localhost:4321/api";

/// Where conversations are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    /// The `/conversations` + `/messages` JSON API.
    #[default]
    Http,
    /// Process-local, gone on exit.
    Memory,
}

impl fmt::Display for StoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreKind::Http => write!(f, "http"),
            StoreKind::Memory => write!(f, "memory"),
        }
    }
}

impl FromStr for StoreKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "http" => Ok(StoreKind::Http),
            "memory" => Ok(StoreKind::Memory),
            other => Err(format!("unknown store kind '{other}' (expected http or memory)")),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq)]
pub struct Config {
    /// Base URL of the model endpoint (`/chat`, `/tags`).
    pub model_base_url: Option<String>,
    /// Base URL of the conversation store.
    pub store_base_url: Option<String>,
    pub default_model: Option<String>,
    pub store: Option<StoreKind>,
}

/// Keys accepted by `config set` / `config unset`.
pub const CONFIG_KEYS: [&str; 4] = ["model-base-url", "store-base-url", "default-model", "store"];

impl Config {
    pub fn model_base_url(&self) -> &str {
        self.model_base_url
            .as_deref()
            .unwrap_or(DEFAULT_MODEL_BASE_URL)
    }

    pub fn store_base_url(&self) -> &str {
        self.store_base_url
            .as_deref()
            .unwrap_or(DEFAULT_STORE_BASE_URL)
    }

    pub fn default_model(&self) -> &str {
        self.default_model.as_deref().unwrap_or(DEFAULT_MODEL)
    }

    pub fn store_kind(&self) -> StoreKind {
        self.store.unwrap_or_default()
    }

    /// Set a key by its command-line name. Underscores are accepted too.
    pub fn set_value(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let value = value.trim();
        if value.is_empty() {
            return Err(ConfigError::InvalidValue {
                key: key.to_string(),
                message: "value must not be empty".to_string(),
            });
        }
        match normalize_key(key).as_str() {
            "model-base-url" => self.model_base_url = Some(value.to_string()),
            "store-base-url" => self.store_base_url = Some(value.to_string()),
            "default-model" => self.default_model = Some(value.to_string()),
            "store" => {
                let kind = value
                    .parse::<StoreKind>()
                    .map_err(|message| ConfigError::InvalidValue {
                        key: key.to_string(),
                        message,
                    })?;
                self.store = Some(kind);
            }
            _ => return Err(ConfigError::UnknownKey(key.to_string())),
        }
        Ok(())
    }

    pub fn unset_value(&mut self, key: &str) -> Result<(), ConfigError> {
        match normalize_key(key).as_str() {
            "model-base-url" => self.model_base_url = None,
            "store-base-url" => self.store_base_url = None,
            "default-model" => self.default_model = None,
            "store" => self.store = None,
            _ => return Err(ConfigError::UnknownKey(key.to_string())),
        }
        Ok(())
    }
}

fn normalize_key(key: &str) -> String {
    key.trim().to_ascii_lowercase().replace('_', "-")
}

/// Get a user-friendly display string for a path, using `~` for the home
/// directory on Unix-like systems.
pub fn path_display<P: AsRef<Path>>(path: P) -> String {
    let path = path.as_ref();

    #[cfg(unix)]
    {
        if let Some(home) = std::env::var_os("HOME") {
            let home_path = PathBuf::from(home);
            if let Ok(relative) = path.strip_prefix(&home_path) {
                return format!("~/{}", relative.display());
            }
        }
    }

    path.display().to_string()
}
