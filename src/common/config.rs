//! Configuration schema, defaults, and layered loading.
//!
//! Precedence: defaults < config file < environment.

use anyhow::{ensure, Context, Result};
use directories::ProjectDirs;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::categories::Category;

pub fn config_path() -> PathBuf {
    ProjectDirs::from("", "", "duffel")
        .map(|p| p.config_dir().join("config.toml"))
        .unwrap_or_else(|| PathBuf::from("duffel.toml"))
}

fn default_data_dir() -> PathBuf {
    ProjectDirs::from("", "", "duffel")
        .map(|p| p.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("data"))
}

/// Fully resolved application configuration after all layers merge.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DuffelConfig {
    /// Live data directory holding one subdirectory per category.
    pub data_dir: PathBuf,
    /// SQLite database filename, resolved relative to `data_dir`.
    pub database_file: String,
}

impl Default for DuffelConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            database_file: "duffel.db".to_string(),
        }
    }
}

impl DuffelConfig {
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(&self.database_file)
    }

    /// Physical directory for a logical category under the live data dir.
    pub fn category_dir(&self, category: Category) -> PathBuf {
        self.data_dir.join(category.dir_name())
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            !self.data_dir.as_os_str().is_empty(),
            "Invalid config: data_dir must not be empty"
        );
        ensure!(
            !self.database_file.is_empty(),
            "Invalid config: database_file must not be empty"
        );
        Ok(())
    }
}

/// Loads config from defaults/file/env.
pub fn load_config() -> Result<DuffelConfig> {
    let path = config_path();

    let config: DuffelConfig = Figment::new()
        .merge(Serialized::defaults(DuffelConfig::default()))
        .merge(Toml::file(&path))
        .merge(Env::prefixed("DUFFEL_"))
        .extract()
        .context("Failed to load configuration")?;

    config.validate()?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = DuffelConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_empty_database_file() {
        let config = DuffelConfig {
            database_file: String::new(),
            ..DuffelConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn category_dir_nests_under_data_dir() {
        let config = DuffelConfig {
            data_dir: PathBuf::from("/srv/duffel"),
            ..DuffelConfig::default()
        };
        assert_eq!(
            config.category_dir(Category::Photos),
            PathBuf::from("/srv/duffel/photos")
        );
    }
}
