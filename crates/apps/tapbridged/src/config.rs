use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tapbridge_capture::{DEFAULT_MAX_BODY_SIZE, DEFAULT_MAX_PER_DOMAIN};

pub const DEFAULT_PORT: u16 = 8198;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("{field} must be at least 1")]
    Invalid { field: &'static str },
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct BridgeConfig {
    /// Loopback port of the WebSocket endpoint.
    pub port: u16,
    /// Shared secret; empty disables authentication.
    pub auth_token: String,
    pub max_requests_per_domain: usize,
    /// Bytes kept per request or response body.
    pub max_body_size: usize,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            auth_token: String::new(),
            max_requests_per_domain: DEFAULT_MAX_PER_DOMAIN,
            max_body_size: DEFAULT_MAX_BODY_SIZE,
        }
    }
}

impl BridgeConfig {
    pub fn from_toml(input: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
        Self::from_toml(&contents)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_requests_per_domain == 0 {
            return Err(ConfigError::Invalid { field: "max_requests_per_domain" });
        }
        if self.max_body_size == 0 {
            return Err(ConfigError::Invalid { field: "max_body_size" });
        }
        Ok(())
    }
}
