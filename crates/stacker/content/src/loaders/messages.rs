//! Message template loader.

use std::collections::HashMap;
use std::path::Path;

use stacker_core::TemplateMessages;

use crate::loaders::{LoadResult, read_file};

const DEFAULT_LOCALE: &str = include_str!("../../data/locale.toml");

/// Loader for message templates from flat TOML tables.
pub struct MessagesLoader;

impl MessagesLoader {
    /// Load templates from a TOML file of `key = "template"` pairs.
    ///
    /// Keys not present in the file keep their built-in templates.
    pub fn load(path: &Path) -> LoadResult<TemplateMessages> {
        let content = read_file(path)?;
        Self::parse(&content)
            .map_err(|e| anyhow::anyhow!("Failed to load locale {}: {}", path.display(), e))
    }

    pub fn parse(content: &str) -> LoadResult<TemplateMessages> {
        let templates: HashMap<String, String> = toml::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse locale TOML: {}", e))?;

        Ok(templates
            .into_iter()
            .fold(TemplateMessages::default(), |messages, (key, template)| {
                messages.with_template(key, template)
            }))
    }

    /// The locale shipped with the crate.
    pub fn load_default() -> LoadResult<TemplateMessages> {
        Self::parse(DEFAULT_LOCALE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stacker_core::MessageSource;
    use stacker_core::env::{STACK_DISPLAY, STACK_DISPLAY_CUSTOM_NAME};

    #[test]
    fn overrides_merge_with_builtins() {
        let messages = MessagesLoader::parse(r#"entity-stack-display = "[%amount%] %name%""#).unwrap();

        assert_eq!(
            messages.message(STACK_DISPLAY, &[("amount", "12"), ("name", "Cow")]),
            "[12] Cow"
        );
        assert_eq!(
            messages.message(STACK_DISPLAY_CUSTOM_NAME, &[("amount", "2"), ("name", "Bob")]),
            "2x Bob"
        );
    }

    #[test]
    fn shipped_locale_loads() {
        let messages = MessagesLoader::load_default().unwrap();
        assert_eq!(
            messages.message(STACK_DISPLAY, &[("amount", "1,024"), ("name", "Zombie")]),
            "1,024x Zombie"
        );
    }
}
