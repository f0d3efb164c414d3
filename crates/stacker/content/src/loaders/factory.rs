//! Content factory for loading all stacker content from a data directory.

use std::path::{Path, PathBuf};

use stacker_core::{SettingsTable, StackerConfig, TemplateMessages};
use tracing::info;

use crate::loaders::{ConfigLoader, LoadResult, MessagesLoader, SettingsLoader};

const CONFIG_FILE: &str = "config.toml";
const SETTINGS_FILE: &str = "entity_settings.ron";
const LOCALE_FILE: &str = "locale.toml";

/// Everything a host needs to build a stack context.
#[derive(Debug)]
pub struct ContentBundle {
    pub config: StackerConfig,
    pub settings: SettingsTable,
    pub messages: TemplateMessages,
}

impl ContentBundle {
    /// The content shipped with the crate.
    pub fn defaults() -> LoadResult<Self> {
        Ok(Self {
            config: ConfigLoader::load_default()?,
            settings: SettingsLoader::default_table()?,
            messages: MessagesLoader::load_default()?,
        })
    }
}

/// Content factory that loads stacker content from a data directory.
///
/// # Directory Structure
///
/// ```text
/// data_dir/
/// ├── config.toml
/// ├── entity_settings.ron
/// └── locale.toml
/// ```
///
/// Files missing from the directory fall back to the shipped defaults.
pub struct ContentFactory {
    data_dir: PathBuf,
}

impl ContentFactory {
    /// Creates a new content factory pointing to a data directory.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn file(&self, name: &str) -> Option<PathBuf> {
        let path = self.data_dir.join(name);
        if path.is_file() {
            Some(path)
        } else {
            info!(
                target: "stacker::content",
                file = name,
                data_dir = %self.data_dir.display(),
                "using shipped default"
            );
            None
        }
    }

    /// Load engine configuration from `config.toml`.
    pub fn load_config(&self) -> LoadResult<StackerConfig> {
        match self.file(CONFIG_FILE) {
            Some(path) => ConfigLoader::load(&path),
            None => ConfigLoader::load_default(),
        }
    }

    /// Load the settings table from `entity_settings.ron`.
    pub fn load_settings(&self) -> LoadResult<SettingsTable> {
        let entries = match self.file(SETTINGS_FILE) {
            Some(path) => SettingsLoader::load(&path)?,
            None => SettingsLoader::load_default()?,
        };
        Ok(SettingsTable::new(entries))
    }

    /// Load message templates from `locale.toml`.
    pub fn load_messages(&self) -> LoadResult<TemplateMessages> {
        match self.file(LOCALE_FILE) {
            Some(path) => MessagesLoader::load(&path),
            None => MessagesLoader::load_default(),
        }
    }

    pub fn load_bundle(&self) -> LoadResult<ContentBundle> {
        Ok(ContentBundle {
            config: self.load_config()?,
            settings: self.load_settings()?,
            messages: self.load_messages()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factory_paths() {
        let factory = ContentFactory::new("/tmp/data");
        assert_eq!(factory.data_dir(), Path::new("/tmp/data"));
    }
}
