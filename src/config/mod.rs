//! Configuration loading and types for the rollos pipeline.
//!
//! This module handles all aspects of configuration:
//! - Type definitions for config structures (`types`)
//! - Loading, path resolution and validation (`load`)

mod load;
mod types;

use std::collections::HashSet;
use std::path::PathBuf;

pub use load::DEFAULT_CONFIG_FILE;
pub use types::{
    CollectionConfig, DedupConfig, PagesConfig, PipelineConfig, ReadmeConfig, RenameConfig,
    SequenceConfig,
};

// =============================================================================
// Errors
// =============================================================================

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("failed to encode config file path as a unicode string: {0}")]
    EncodePath(PathBuf),

    #[error("failed to deserialize config: {0}")]
    Deserialize(#[from] config::ConfigError),

    #[error("failed to get current working directory: {0}")]
    CwdFailure(std::io::Error),

    #[error("config file not found: {0}")]
    NotFound(PathBuf),

    #[error("{0}")]
    Validation(String),

    #[error("collection '{0}' not found in config")]
    CollectionNotFound(String),
}

// =============================================================================
// Defaults and validation
// =============================================================================

impl PipelineConfig {
    /// The three collections of the celestial corpus.
    pub fn scaffold() -> Self {
        let rollos = CollectionConfig::with_layout("rollos", "rollos", "rollo");

        let mut minirollos =
            CollectionConfig::with_layout("minirollos", "divino-minirollo", "divino-minirollo");
        minirollos.sequence.check_pages = true;

        let mut leyes =
            CollectionConfig::with_layout("divinas-leyes", "divinas-leyes", "divinas-leyes");
        leyes.sequence.check_pages = true;
        leyes.pages.page_size = 100;

        Self {
            concurrency: crate::util::default_concurrency(),
            collections: vec![rollos, minirollos, leyes],
        }
    }

    /// Reject configs that no stage could run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.concurrency == 0 {
            return Err(ConfigError::Validation(
                "concurrency must be greater than 0".to_string(),
            ));
        }
        if self.collections.is_empty() {
            return Err(ConfigError::Validation(
                "at least one collection is required".to_string(),
            ));
        }

        let mut names = HashSet::new();
        for collection in &self.collections {
            if collection.name.trim().is_empty() {
                return Err(ConfigError::Validation(
                    "collection name must not be empty".to_string(),
                ));
            }
            if !names.insert(collection.name.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "duplicate collection name '{}'",
                    collection.name
                )));
            }
            if collection.readme.per_page == 0 {
                return Err(ConfigError::Validation(format!(
                    "collection '{}': readme.per_page must be greater than 0",
                    collection.name
                )));
            }
            if collection.pages.page_size == 0 {
                return Err(ConfigError::Validation(format!(
                    "collection '{}': pages.page_size must be greater than 0",
                    collection.name
                )));
            }
        }

        Ok(())
    }

    /// Pick collections by name, or all of them when `names` is empty.
    pub fn select(&self, names: &[String]) -> Result<Vec<&CollectionConfig>, ConfigError> {
        if names.is_empty() {
            return Ok(self.collections.iter().collect());
        }
        names
            .iter()
            .map(|name| {
                self.collections
                    .iter()
                    .find(|c| &c.name == name)
                    .ok_or_else(|| ConfigError::CollectionNotFound(name.clone()))
            })
            .collect()
    }
}
