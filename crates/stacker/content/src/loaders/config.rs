//! Engine configuration loader.

use std::path::Path;

use stacker_core::StackerConfig;

use crate::loaders::{LoadResult, read_file};

const DEFAULT_CONFIG: &str = include_str!("../../data/config.toml");

/// Loader for [`StackerConfig`] from TOML files.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load config data from a TOML file.
    ///
    /// Keys missing from the file keep their default values.
    pub fn load(path: &Path) -> LoadResult<StackerConfig> {
        let content = read_file(path)?;
        Self::parse(&content)
            .map_err(|e| anyhow::anyhow!("Failed to load config {}: {}", path.display(), e))
    }

    pub fn parse(content: &str) -> LoadResult<StackerConfig> {
        let config: StackerConfig = toml::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse config TOML: {}", e))?;

        if config.loot.approximation_enabled && config.loot.approximation_amount == 0 {
            anyhow::bail!("loot.approximation_amount must be positive when approximation is enabled");
        }

        Ok(config)
    }

    /// The configuration shipped with the crate.
    pub fn load_default() -> LoadResult<StackerConfig> {
        Self::parse(DEFAULT_CONFIG)
    }
}
