/// Tunable parameters read by the stack engine.
///
/// Defaults match the values the stacker ships with. Hosts load overrides
/// through `stacker-content` (TOML) or construct the struct directly.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct StackerConfig {
    pub display: DisplayConfig,
    pub loot: LootConfig,
    pub death: DeathConfig,
    /// When two flying stacks meet, the lower one survives the merge.
    pub stack_flying_downwards: bool,
}

impl StackerConfig {
    pub fn new() -> Self {
        Self {
            display: DisplayConfig::default(),
            loot: LootConfig::default(),
            death: DeathConfig::default(),
            stack_flying_downwards: false,
        }
    }
}

impl Default for StackerConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Name tag behaviour.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DisplayConfig {
    /// Show stack tags at all.
    pub tags: bool,
    /// Show a tag even on stacks of size 1.
    pub tags_single: bool,
    /// Use a custom name as the label when the head has one.
    pub tags_custom_name: bool,
    /// Only reveal the tag while the creature is looked at.
    pub tags_hover: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            tags: true,
            tags_single: false,
            tags_custom_name: true,
            tags_hover: false,
        }
    }
}

/// Drop computation.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct LootConfig {
    /// Compute full per-member loot on multi-kills.
    pub accurate_items: bool,
    /// Scale experience by the number of members killed.
    pub accurate_experience: bool,
    /// Run loot computation on the worker context instead of inline.
    pub compute_async: bool,
    pub approximation_enabled: bool,
    /// Requested counts above this are approximated.
    pub approximation_threshold: u32,
    /// Members actually sampled when approximating.
    pub approximation_amount: u32,
    /// Multi-roll types roll once per predicted split result.
    pub precise_splitting_drops: bool,
    /// Extra items granted when the death was dealt by a given entity.
    pub killer_bonus_drops: Vec<KillerBonus>,
}

impl Default for LootConfig {
    fn default() -> Self {
        Self {
            accurate_items: true,
            accurate_experience: true,
            compute_async: true,
            approximation_enabled: true,
            approximation_threshold: 2048,
            approximation_amount: 1024,
            precise_splitting_drops: true,
            killer_bonus_drops: vec![KillerBonus::wither_rose()],
        }
    }
}

/// A bonus item granted when any of `killers` dealt the last damage.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct KillerBonus {
    pub killers: Vec<crate::types::EntityKind>,
    pub item: crate::types::ItemStack,
}

impl KillerBonus {
    pub fn wither_rose() -> Self {
        use crate::types::{EntityKind, ItemStack};

        Self {
            killers: vec![EntityKind::Wither, EntityKind::WitherSkull],
            item: ItemStack::new("wither_rose", 1),
        }
    }
}

/// Whole-stack death triggers and bookkeeping.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DeathConfig {
    /// Damage cause names that kill the entire stack, matched case-insensitively.
    pub kill_entire_stack_conditions: Vec<String>,
    /// Stacks whose head has AI disabled die all at once.
    pub kill_entire_stack_when_ai_disabled: bool,
    /// Credit killers with a kill per member.
    pub track_statistics: bool,
}

impl Default for DeathConfig {
    fn default() -> Self {
        Self {
            kill_entire_stack_conditions: Vec::new(),
            kill_entire_stack_when_ai_disabled: false,
            track_statistics: true,
        }
    }
}
