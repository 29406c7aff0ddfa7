//! Engine configuration
//!
//! ```toml
//! default_request = "current"
//! default_list = "reply"
//! verify = true
//! ```

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::template::{ListKind, RequestRef};

/// Errors that can occur when loading configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("failed to parse config TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("unknown request qualifier '{0}'")]
    UnknownRequest(String),
    #[error("unknown list '{0}'")]
    UnknownList(String),
}

/// Defaults applied when parsing references, and checking options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Request used when a reference has no request qualifier
    pub default_request: RequestRef,
    /// List used when a reference has no list qualifier
    pub default_list: ListKind,
    /// Run the consistency checks on parsed templates
    pub verify: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_request: RequestRef::Current,
            default_list: ListKind::Request,
            verify: false,
        }
    }
}

/// TOML structure for deserializing configuration
#[derive(Deserialize)]
struct TomlConfig {
    default_request: Option<String>,
    default_list: Option<String>,
    #[serde(default)]
    verify: bool,
}

impl EngineConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let parsed: TomlConfig = toml::from_str(content)?;
        let mut config = EngineConfig {
            verify: parsed.verify,
            ..EngineConfig::default()
        };

        if let Some(name) = parsed.default_request {
            config.default_request =
                RequestRef::from_name(&name).ok_or(ConfigError::UnknownRequest(name))?;
        }
        if let Some(name) = parsed.default_list {
            config.default_list = ListKind::from_name(&name).ok_or(ConfigError::UnknownList(name))?;
        }
        Ok(config)
    }

    pub fn with_request(mut self, request: RequestRef) -> Self {
        self.default_request = request;
        self
    }

    pub fn with_list(mut self, list: ListKind) -> Self {
        self.default_list = list;
        self
    }
}
