//! JSON file configuration adapter.
//!
//! Implements [`ConfigPort`].  A missing file is not an error: the stock
//! defaults are used.  Fields absent from the file keep their defaults.
//! Whatever is loaded is validated before it is returned.

use std::io::ErrorKind;
use std::path::PathBuf;

use log::info;

use crate::app::ports::{ConfigError, ConfigPort};
use crate::config::BridgeConfig;

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "CAVEHAT2MQTT_CONFIG";

pub struct JsonFileConfig {
    path: Option<PathBuf>,
}

impl JsonFileConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    /// Path from [`CONFIG_ENV`], or defaults only when unset.
    pub fn from_env() -> Self {
        Self {
            path: std::env::var_os(CONFIG_ENV).map(PathBuf::from),
        }
    }
}

impl ConfigPort for JsonFileConfig {
    fn load(&self) -> Result<BridgeConfig, ConfigError> {
        let config = match &self.path {
            None => {
                info!("No {} set, using default configuration", CONFIG_ENV);
                BridgeConfig::default()
            }
            Some(path) => match std::fs::read(path) {
                Ok(bytes) => {
                    info!("Config loaded from {}", path.display());
                    serde_json::from_slice(&bytes).map_err(|_| ConfigError::Corrupted)?
                }
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    info!("{} not found, using default configuration", path.display());
                    BridgeConfig::default()
                }
                Err(_) => return Err(ConfigError::IoError),
            },
        };
        config.validate().map_err(ConfigError::ValidationFailed)?;
        Ok(config)
    }
}
