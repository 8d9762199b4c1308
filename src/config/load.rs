//! Configuration loading from files.
//!
//! Values come from the YAML file, then from `ROLLOS__*` environment
//! variables (e.g. `ROLLOS__CONCURRENCY=4`).

use std::path::{Path, PathBuf};

use super::{ConfigError, PipelineConfig};

pub const DEFAULT_CONFIG_FILE: &str = "rollos.yaml";

/// The directory relative paths in a config file are resolved against.
pub fn base_path_from_config(config_path: &Path) -> PathBuf {
    config_path
        .parent()
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

impl PipelineConfig {
    /// Load the config from the command line argument, defaulting to `rollos.yaml`
    pub fn load_from_arg(config_file: Option<&Path>) -> Result<(Self, PathBuf), ConfigError> {
        let config_file = config_file.unwrap_or(Path::new(DEFAULT_CONFIG_FILE));
        let config_file = if config_file.is_relative() {
            std::env::current_dir()
                .map_err(ConfigError::CwdFailure)?
                .join(config_file)
        } else {
            config_file.to_path_buf()
        };

        let config = Self::load_from_file(&config_file)?;
        Ok((config, config_file))
    }

    /// Load, resolve and validate the config at `path`.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.is_file() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        let path_str = path
            .as_os_str()
            .to_str()
            .ok_or_else(|| ConfigError::EncodePath(path.to_path_buf()))?;

        let mut config = config::Config::builder()
            .add_source(config::File::new(path_str, config::FileFormat::Yaml))
            .add_source(
                config::Environment::with_prefix("ROLLOS")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize::<PipelineConfig>()?;

        let base = base_path_from_config(path);
        for collection in &mut config.collections {
            collection.resolve_paths(&base);
        }

        config.validate()?;
        Ok(config)
    }
}
