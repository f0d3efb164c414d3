//! Per-type behaviour hooks.
//!
//! Instead of one settings subclass per creature type, each settings record
//! carries a [`StackBehavior`] tag. The engine calls the hooks at fixed points
//! of the split and loot pipelines.

use rand::Rng;

use crate::env::Creature;

/// Behaviour variant attached to a creature type.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum StackBehavior {
    #[default]
    Standard,
    /// Creatures that split into smaller copies on death (slimes).
    ///
    /// Loot is only rolled at `loot_size`; after rolling, members are set to
    /// `settle_size` so their death cannot spawn offspring.
    Splitting { loot_size: u32, settle_size: u32 },
}

impl StackBehavior {
    /// Number of independent loot rolls `member` is worth.
    ///
    /// In precise mode a splitting creature rolls once per creature its
    /// split chain would eventually produce: every halving of its size
    /// multiplies the population by a random factor of 2 to 4.
    pub fn loot_rolls(&self, member: &dyn Creature, precise: bool, rng: &mut impl Rng) -> u32 {
        match self {
            StackBehavior::Standard => 1,
            StackBehavior::Splitting { .. } if !precise => 1,
            StackBehavior::Splitting { .. } => {
                let mut size = member.size().unwrap_or(1);
                let mut total: u32 = 1;
                while size > 1 {
                    size /= 2;
                    let low = total.saturating_mul(2);
                    let high = total.saturating_mul(4);
                    total = rng.gen_range(low..=high);
                }
                total
            }
        }
    }

    /// Puts a member into the state its loot table expects.
    pub fn prepare_for_loot(&self, member: &dyn Creature) {
        if let StackBehavior::Splitting { loot_size, .. } = self {
            member.set_size(*loot_size);
        }
    }

    /// Resets the count-like property so a death produces no offspring.
    pub fn settle(&self, creature: &dyn Creature) {
        if let StackBehavior::Splitting { settle_size, .. } = self {
            creature.set_size(*settle_size);
        }
    }

    /// Type-specific fixups for a head that was just split off.
    pub fn apply_unstack_properties(&self, new_head: &dyn Creature, old_head: &dyn Creature) {
        if let StackBehavior::Splitting { .. } = self
            && let Some(size) = old_head.size()
        {
            new_head.set_size(size);
        }
    }
}
