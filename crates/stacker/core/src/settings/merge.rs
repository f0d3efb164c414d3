//! Merge eligibility between two stacks.

use bitflags::bitflags;

use crate::env::Creature;
use crate::settings::EntityStackSettings;
use crate::stack::CreatureStack;

bitflags! {
    /// Conditions that keep two otherwise-compatible stacks apart.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    #[cfg_attr(feature = "serde", serde(transparent))]
    pub struct MergeConditions: u8 {
        /// Never stack creatures carrying a custom name.
        const SEPARATE_CUSTOM_NAMED = 1 << 0;
        /// Juveniles and adults stack separately.
        const SEPARATE_AGES = 1 << 1;
        /// Creatures with and without AI stack separately.
        const SEPARATE_AI_STATES = 1 << 2;
        /// Splitting creatures of different sizes stack separately.
        const SEPARATE_SIZES = 1 << 3;
        /// Burning creatures never stack.
        const SEPARATE_BURNING = 1 << 4;
    }
}

impl Default for MergeConditions {
    fn default() -> Self {
        Self::SEPARATE_AGES | Self::SEPARATE_AI_STATES | Self::SEPARATE_SIZES
    }
}

/// Extra eligibility check layered on top of the data-driven rules.
pub trait MergePredicate: Send + Sync {
    fn can_merge(&self, a: &CreatureStack, b: &CreatureStack, is_probe: bool) -> bool;
}

/// The data-driven merge rule for `settings`.
///
/// Probes skip the size cap: they only ask whether the top member still
/// belongs with the head, not whether the two would fit together.
pub(crate) fn standard_can_merge(
    settings: &EntityStackSettings,
    a: &CreatureStack,
    b: &CreatureStack,
    is_probe: bool,
) -> bool {
    if !settings.enabled {
        return false;
    }

    let head_a = a.head();
    let head_b = b.head();
    if head_a.kind() != settings.kind || head_b.kind() != settings.kind {
        return false;
    }

    if !is_probe {
        if head_a.id() == head_b.id() {
            return false;
        }
        if a.size().saturating_add(b.size()) > settings.max_stack_size {
            return false;
        }
    }

    conditions_allow(settings.merge_conditions, head_a.as_ref(), head_b.as_ref())
}

fn conditions_allow(conditions: MergeConditions, a: &dyn Creature, b: &dyn Creature) -> bool {
    if conditions.contains(MergeConditions::SEPARATE_CUSTOM_NAMED)
        && (a.custom_name().is_some() || b.custom_name().is_some())
    {
        return false;
    }

    if conditions.contains(MergeConditions::SEPARATE_AGES) && a.is_juvenile() != b.is_juvenile() {
        return false;
    }

    if conditions.contains(MergeConditions::SEPARATE_AI_STATES) && a.ai_disabled() != b.ai_disabled()
    {
        return false;
    }

    if conditions.contains(MergeConditions::SEPARATE_SIZES) && a.size() != b.size() {
        return false;
    }

    if conditions.contains(MergeConditions::SEPARATE_BURNING)
        && (a.fire_ticks() > 0 || b.fire_ticks() > 0)
    {
        return false;
    }

    true
}
