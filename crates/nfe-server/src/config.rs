//! Server configuration.
//!
//! Values come from built-in defaults, an optional TOML file and CLI flags,
//! in increasing order of precedence. They are fixed once the server starts.

use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use nfe_infer::DecisionRule;
use serde::Deserialize;
use thiserror::Error;

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8000";
pub const DEFAULT_DATA_PATH: &str = "base_para_teste.csv";
pub const DEFAULT_MODEL_PATH: &str = "modelo_lgbm.txt";

/// Errors raised while loading the configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: Box<toml::de::Error>,
    },
}

/// Effective server settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// Socket address the HTTP listener binds to.
    pub bind_addr: SocketAddr,
    /// Invoice dataset (`;`-delimited, header required).
    pub data_path: PathBuf,
    /// Classifier artifact in LightGBM text format.
    pub model_path: PathBuf,
    /// How probabilities become class indices.
    pub decision_rule: DecisionRule,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8000)),
            data_path: PathBuf::from(DEFAULT_DATA_PATH),
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            decision_rule: DecisionRule::default(),
        }
    }
}

/// Command-line values that override the file and the defaults.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub bind_addr: Option<SocketAddr>,
    pub data_path: Option<PathBuf>,
    pub model_path: Option<PathBuf>,
    pub decision_rule: Option<DecisionRule>,
}

impl ServerConfig {
    /// Parses a TOML document; missing keys keep their defaults.
    pub fn from_toml_str(text: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source: Box::new(source),
        })
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text, path)
    }

    /// Resolves the effective configuration.
    pub fn load(file: Option<&Path>, overrides: ConfigOverrides) -> Result<Self, ConfigError> {
        let base = match file {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        Ok(base.with_overrides(overrides))
    }

    #[must_use]
    pub fn with_overrides(mut self, overrides: ConfigOverrides) -> Self {
        if let Some(addr) = overrides.bind_addr {
            self.bind_addr = addr;
        }
        if let Some(path) = overrides.data_path {
            self.data_path = path;
        }
        if let Some(path) = overrides.model_path {
            self.model_path = path;
        }
        if let Some(rule) = overrides.decision_rule {
            self.decision_rule = rule;
        }
        self
    }
}
