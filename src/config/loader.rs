use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use super::types::Config;
use super::validation::Validate;
use crate::log_error;

pub struct ConfigLoader {
    config_path: PathBuf,
}

impl ConfigLoader {
    /// Loader for `<config dir>/evaluator/config.toml`.
    pub fn new() -> Result<Self> {
        let config_dir = dirs::config_dir()
            .context("Failed to determine config directory")?
            .join("evaluator");

        fs::create_dir_all(&config_dir).context("Failed to create config directory")?;

        Ok(Self {
            config_path: config_dir.join("config.toml"),
        })
    }

    pub fn with_path<P: AsRef<Path>>(path: P) -> Self {
        Self {
            config_path: path.as_ref().to_path_buf(),
        }
    }

    pub fn config_path(&self) -> &PathBuf {
        &self.config_path
    }

    pub fn load_or_create(&self) -> Result<Config> {
        if !self.config_path.exists() {
            let default_config = Config::default();
            self.save(&default_config)?;
            Ok(default_config)
        } else {
            self.load()
        }
    }

    /// Reads the file. A file that does not parse yields the defaults.
    pub fn load(&self) -> Result<Config> {
        let content = fs::read_to_string(&self.config_path)
            .with_context(|| format!("Failed to read config file {:?}", self.config_path))?;

        let mut config: Config = toml::from_str(&content).unwrap_or_else(|e| {
            log_error!("Failed to parse config: {}. Using defaults.", e);
            Config::default()
        });

        config.validate();
        Ok(config)
    }

    pub fn save(&self, config: &Config) -> Result<()> {
        let toml_string = toml::to_string_pretty(config).context("Failed to serialize config")?;

        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }
        fs::write(&self.config_path, toml_string).context("Failed to write config file")?;

        Ok(())
    }
}
