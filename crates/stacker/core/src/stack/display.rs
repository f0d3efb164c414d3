//! Stack name tags.

use crate::config::DisplayConfig;
use crate::env::{MessageSource, STACK_DISPLAY, STACK_DISPLAY_CUSTOM_NAME, format_amount};

/// What a stack's name tag should show.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DisplayName {
    /// Tag text, `None` for no tag.
    pub text: Option<String>,
    /// Always visible rather than only on hover.
    pub visible: bool,
}

impl DisplayName {
    fn hidden(text: Option<String>) -> Self {
        Self {
            text,
            visible: false,
        }
    }
}

/// Inputs the tag is derived from.
#[derive(Clone, Copy, Debug)]
pub struct DisplayInput<'a> {
    pub size: usize,
    pub custom_name: Option<&'a str>,
    pub head_dead: bool,
    /// Settings display label, `None` when the type has no settings.
    pub label: Option<&'a str>,
}

/// Derives the name tag in a single pass.
pub fn derive_display_name(
    input: DisplayInput<'_>,
    config: &DisplayConfig,
    messages: &dyn MessageSource,
) -> DisplayName {
    let custom_name = input.custom_name.map(str::to_owned);

    let Some(label) = input.label.filter(|_| config.tags) else {
        return DisplayName::hidden(custom_name);
    };

    if input.head_dead {
        return DisplayName::hidden(None);
    }

    if input.size > 1 || config.tags_single {
        let amount = format_amount(input.size);
        let text = match input.custom_name {
            Some(name) if config.tags_custom_name => messages.message(
                STACK_DISPLAY_CUSTOM_NAME,
                &[("amount", &amount), ("name", name)],
            ),
            _ => messages.message(STACK_DISPLAY, &[("amount", &amount), ("name", label)]),
        };
        return DisplayName {
            text: Some(text),
            visible: !config.tags_hover,
        };
    }

    DisplayName::hidden(custom_name)
}

/// Lazily computed name tag, cleared by every mutation.
///
/// The name is derived outside the stack lock, so a result is only kept if
/// no mutation happened since its inputs were read.
#[derive(Debug, Default)]
pub(crate) struct DisplayCache {
    cached: Option<DisplayName>,
    generation: u64,
}

impl DisplayCache {
    pub(crate) fn invalidate(&mut self) {
        self.cached = None;
        self.generation = self.generation.wrapping_add(1);
    }

    pub(crate) fn cached(&self) -> Option<DisplayName> {
        self.cached.clone()
    }

    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }

    /// Stores `name` unless the cache was invalidated after `generation`.
    pub(crate) fn store(&mut self, generation: u64, name: &DisplayName) {
        if self.generation == generation {
            self.cached = Some(name.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::TemplateMessages;

    fn input(size: usize, custom_name: Option<&str>) -> DisplayInput<'_> {
        DisplayInput {
            size,
            custom_name,
            head_dead: false,
            label: Some("Zombie"),
        }
    }

    #[test]
    fn stacked_shows_amount_and_label() {
        let name = derive_display_name(
            input(1500, None),
            &DisplayConfig::default(),
            &TemplateMessages::default(),
        );
        assert_eq!(name.text.as_deref(), Some("1,500x Zombie"));
        assert!(name.visible);
    }

    #[test]
    fn stacked_custom_name_replaces_label() {
        let name = derive_display_name(
            input(3, Some("Bob")),
            &DisplayConfig::default(),
            &TemplateMessages::default(),
        );
        assert_eq!(name.text.as_deref(), Some("3x Bob"));

        let config = DisplayConfig {
            tags_custom_name: false,
            ..DisplayConfig::default()
        };
        let name = derive_display_name(input(3, Some("Bob")), &config, &TemplateMessages::default());
        assert_eq!(name.text.as_deref(), Some("3x Zombie"));
    }

    #[test]
    fn single_named_shows_own_name_hidden() {
        let name = derive_display_name(
            input(1, Some("Bob")),
            &DisplayConfig::default(),
            &TemplateMessages::default(),
        );
        assert_eq!(name, DisplayName::hidden(Some("Bob".into())));
    }

    #[test]
    fn single_unnamed_has_no_tag() {
        let name = derive_display_name(
            input(1, None),
            &DisplayConfig::default(),
            &TemplateMessages::default(),
        );
        assert_eq!(name, DisplayName::default());
    }

    #[test]
    fn hover_hides_tag() {
        let config = DisplayConfig {
            tags_hover: true,
            ..DisplayConfig::default()
        };
        let name = derive_display_name(input(2, None), &config, &TemplateMessages::default());
        assert_eq!(name.text.as_deref(), Some("2x Zombie"));
        assert!(!name.visible);
    }

    #[test]
    fn disabled_tags_fall_back_to_custom_name() {
        let config = DisplayConfig {
            tags: false,
            ..DisplayConfig::default()
        };
        let name = derive_display_name(input(9, Some("Bob")), &config, &TemplateMessages::default());
        assert_eq!(name, DisplayName::hidden(Some("Bob".into())));
    }

    #[test]
    fn dead_head_has_no_tag() {
        let mut dead = input(9, None);
        dead.head_dead = true;
        let name = derive_display_name(dead, &DisplayConfig::default(), &TemplateMessages::default());
        assert_eq!(name, DisplayName::default());
    }

    #[test]
    fn cache_keeps_names_until_invalidated() {
        let mut cache = DisplayCache::default();
        let name = DisplayName::hidden(Some("Bob".into()));
        cache.store(cache.generation(), &name);
        assert_eq!(cache.cached(), Some(name.clone()));

        cache.invalidate();
        assert_eq!(cache.cached(), None);
    }

    #[test]
    fn stale_names_are_not_stored() {
        let mut cache = DisplayCache::default();
        let generation = cache.generation();
        cache.invalidate();

        cache.store(generation, &DisplayName::default());
        assert_eq!(cache.cached(), None);

        cache.store(cache.generation(), &DisplayName::default());
        assert_eq!(cache.cached(), Some(DisplayName::default()));
    }
}
