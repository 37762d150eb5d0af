//! CLI configuration

use crate::error::{CliError, CliResult};
use lostfound_registry::RegistryConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// CLI configuration, read from TOML
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct CliConfig {
    /// Identity to act as when `--as` is not given
    pub identity: Option<String>,

    /// Tracing filter directive (e.g. `lostfound_registry=debug`)
    pub log_filter: Option<String>,

    /// Registry settings
    pub registry: RegistryConfig,
}

impl CliConfig {
    /// Load configuration from file; a missing file yields defaults.
    pub fn load(path: Option<&str>) -> CliResult<Self> {
        let config_path = match path {
            Some(p) => PathBuf::from(p),
            None => match Self::default_config_path() {
                Some(p) => p,
                None => return Ok(CliConfig::default()),
            },
        };

        if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path)?;
            let config: CliConfig =
                toml::from_str(&contents).map_err(|e| CliError::Config(e.to_string()))?;
            Ok(config)
        } else {
            Ok(CliConfig::default())
        }
    }

    /// `<config_dir>/lostfound/config.toml`
    fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("lostfound").join("config.toml"))
    }

    /// Registry settings with the data directory resolved: the flag wins, then
    /// the file, then `<data_dir>/lostfound`.
    pub fn registry_config(&self, data_dir: Option<PathBuf>) -> CliResult<RegistryConfig> {
        let mut registry = self.registry.clone();
        if let Some(dir) = data_dir {
            registry.data_dir = Some(dir);
        }
        if registry.data_dir.is_none() {
            let dir = dirs::data_dir()
                .ok_or_else(|| CliError::Config("Cannot find data directory".into()))?;
            registry.data_dir = Some(dir.join("lostfound"));
        }
        Ok(registry)
    }
}
