//! Stack settings catalog loader.
//!
//! The catalog is a RON list of [`EntityStackSettings`] records, one per
//! creature type.

use std::collections::HashSet;
use std::path::Path;

use stacker_core::{EntityStackSettings, SettingsTable};
use tracing::debug;

use crate::loaders::{LoadResult, read_file};

const DEFAULT_CATALOG: &str = include_str!("../../data/entity_settings.ron");

/// Loader for stack settings from RON files.
pub struct SettingsLoader;

impl SettingsLoader {
    /// Load the settings catalog from a RON file.
    ///
    /// RON format: `Vec<EntityStackSettings>`
    pub fn load(path: &Path) -> LoadResult<Vec<EntityStackSettings>> {
        let content = read_file(path)?;
        Self::parse(&content)
            .map_err(|e| anyhow::anyhow!("Failed to load settings {}: {}", path.display(), e))
    }

    /// Parse and validate a catalog.
    ///
    /// Every kind may appear once and every maximum stack size must be
    /// positive.
    pub fn parse(content: &str) -> LoadResult<Vec<EntityStackSettings>> {
        let entries: Vec<EntityStackSettings> = ron::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse settings RON: {}", e))?;

        let mut seen = HashSet::new();
        for settings in &entries {
            if !seen.insert(settings.kind) {
                anyhow::bail!("duplicate settings for {}", settings.kind);
            }
            if settings.max_stack_size == 0 {
                anyhow::bail!("max_stack_size for {} must be positive", settings.kind);
            }
        }

        debug!(target: "stacker::content", entries = entries.len(), "parsed settings catalog");
        Ok(entries)
    }

    /// The catalog shipped with the crate.
    pub fn load_default() -> LoadResult<Vec<EntityStackSettings>> {
        Self::parse(DEFAULT_CATALOG)
    }

    /// The shipped catalog as a ready-to-use table.
    pub fn default_table() -> LoadResult<SettingsTable> {
        Ok(SettingsTable::new(Self::load_default()?))
    }
}
