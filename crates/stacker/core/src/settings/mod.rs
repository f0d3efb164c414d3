//! Data-driven per-type stack settings.
//!
//! A [`SettingsTable`] maps each [`EntityKind`] to an [`EntityStackSettings`]
//! record. Records are plain data (loadable from RON by `stacker-content`);
//! type-specific behaviour is selected by the record's [`StackBehavior`] tag
//! rather than by code living next to the type.
mod behavior;
mod merge;

pub use behavior::StackBehavior;
pub use merge::{MergeConditions, MergePredicate};

use std::collections::HashMap;
use std::sync::Arc;

use crate::stack::CreatureStack;
use crate::types::{EntityKind, ItemStack};

/// Static facts about a creature type.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EntityTypeData {
    pub swimming: bool,
    pub flying: bool,
}

/// Stack settings for one creature type.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EntityStackSettings {
    pub kind: EntityKind,
    #[cfg_attr(feature = "serde", serde(default = "defaults::enabled"))]
    pub enabled: bool,
    /// Label used in stack tags.
    pub display_name: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub type_data: EntityTypeData,
    #[cfg_attr(feature = "serde", serde(default = "defaults::max_stack_size"))]
    pub max_stack_size: usize,
    /// Every death of this type kills the whole stack.
    #[cfg_attr(feature = "serde", serde(default))]
    pub kill_entire_stack_on_death: bool,
    /// Constructing this type has an unrepeatable global side effect.
    ///
    /// Captures and materializations run on the designated thread, and the
    /// stack never splits through a probe check.
    #[cfg_attr(feature = "serde", serde(default))]
    pub sensitive: bool,
    #[cfg_attr(feature = "serde", serde(default))]
    pub merge_conditions: MergeConditions,
    /// Items added to every member's loot roll.
    #[cfg_attr(feature = "serde", serde(default))]
    pub bonus_drops: Vec<ItemStack>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub behavior: StackBehavior,
}

#[cfg(feature = "serde")]
mod defaults {
    pub fn enabled() -> bool {
        true
    }

    pub fn max_stack_size() -> usize {
        super::EntityStackSettings::DEFAULT_MAX_STACK_SIZE
    }
}

impl EntityStackSettings {
    pub const DEFAULT_MAX_STACK_SIZE: usize = 128;

    pub fn new(kind: EntityKind, display_name: impl Into<String>) -> Self {
        Self {
            kind,
            enabled: true,
            display_name: display_name.into(),
            type_data: EntityTypeData::default(),
            max_stack_size: Self::DEFAULT_MAX_STACK_SIZE,
            kill_entire_stack_on_death: false,
            sensitive: false,
            merge_conditions: MergeConditions::default(),
            bonus_drops: Vec::new(),
            behavior: StackBehavior::Standard,
        }
    }

    pub fn with_type_data(mut self, type_data: EntityTypeData) -> Self {
        self.type_data = type_data;
        self
    }

    pub fn with_max_stack_size(mut self, max_stack_size: usize) -> Self {
        self.max_stack_size = max_stack_size;
        self
    }

    pub fn with_kill_entire_stack_on_death(mut self, enabled: bool) -> Self {
        self.kill_entire_stack_on_death = enabled;
        self
    }

    pub fn with_sensitive(mut self, sensitive: bool) -> Self {
        self.sensitive = sensitive;
        self
    }

    pub fn with_merge_conditions(mut self, conditions: MergeConditions) -> Self {
        self.merge_conditions = conditions;
        self
    }

    pub fn with_bonus_drop(mut self, item: ItemStack) -> Self {
        self.bonus_drops.push(item);
        self
    }

    pub fn with_behavior(mut self, behavior: StackBehavior) -> Self {
        self.behavior = behavior;
        self
    }
}

/// Source of per-type settings and the merge predicate.
pub trait SettingsProvider: Send + Sync {
    fn settings(&self, kind: EntityKind) -> Option<Arc<EntityStackSettings>>;

    /// Whether `a` and `b` may share one stack.
    fn can_merge(&self, a: &CreatureStack, b: &CreatureStack, is_probe: bool) -> bool;

    fn display_label(&self, kind: EntityKind) -> Option<String> {
        self.settings(kind).map(|settings| settings.display_name.clone())
    }
}

/// Settings keyed by creature type.
#[derive(Default)]
pub struct SettingsTable {
    entries: HashMap<EntityKind, Arc<EntityStackSettings>>,
    predicate: Option<Arc<dyn MergePredicate>>,
}

impl SettingsTable {
    pub fn new(entries: impl IntoIterator<Item = EntityStackSettings>) -> Self {
        Self {
            entries: entries
                .into_iter()
                .map(|settings| (settings.kind, Arc::new(settings)))
                .collect(),
            predicate: None,
        }
    }

    /// Adds a predicate that must also pass for any merge.
    pub fn with_predicate(mut self, predicate: Arc<dyn MergePredicate>) -> Self {
        self.predicate = Some(predicate);
        self
    }

    pub fn insert(&mut self, settings: EntityStackSettings) {
        self.entries.insert(settings.kind, Arc::new(settings));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl SettingsProvider for SettingsTable {
    fn settings(&self, kind: EntityKind) -> Option<Arc<EntityStackSettings>> {
        self.entries.get(&kind).cloned()
    }

    fn can_merge(&self, a: &CreatureStack, b: &CreatureStack, is_probe: bool) -> bool {
        let Some(settings) = a.settings() else {
            return false;
        };

        merge::standard_can_merge(settings, a, b, is_probe)
            && self
                .predicate
                .as_ref()
                .is_none_or(|predicate| predicate.can_merge(a, b, is_probe))
    }
}

impl std::fmt::Debug for SettingsTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SettingsTable")
            .field("entries", &self.entries.len())
            .field("custom_predicate", &self.predicate.is_some())
            .finish()
    }
}
