//! Collaborator contracts consumed by the stack engine.
//!
//! Everything the engine needs from the host simulation is behind one of these
//! traits. A [`StackContext`](crate::StackContext) bundles one implementation of
//! each and is injected into every stack at construction time.
mod creature;
mod dispatch;
mod messages;

pub use creature::{Creature, CreatureHandle};
pub use dispatch::{
    Dispatcher, Execution, Task, run_computation, run_on_designated, run_with_affinity,
};
pub use messages::{
    MessageSource, STACK_DISPLAY, STACK_DISPLAY_CUSTOM_NAME, TemplateMessages, format_amount,
};

use crate::error::Result;
use crate::stack::CreatureStack;
use crate::storage::{MemberSnapshot, MemberStorage, VecMemberStorage};
use crate::types::{CreatureId, EntityKind, ItemStack, Killer, Location};

/// Converts between live creatures and member snapshots.
pub trait EntityAdapter: Send + Sync {
    /// Captures enough state to later rebuild an equivalent creature.
    fn capture(&self, creature: &dyn Creature) -> Result<MemberSnapshot>;

    /// Rebuilds a creature at `location`.
    ///
    /// With `spawn == false` the creature is detached: it is never added to the
    /// world and exists only for inspection (probes, loot sampling).
    fn materialize(
        &self,
        snapshot: &MemberSnapshot,
        kind: EntityKind,
        location: Location,
        spawn: bool,
    ) -> Result<CreatureHandle>;

    /// Fresh, empty storage for a stack of `kind`.
    fn create_storage(&self, _kind: EntityKind) -> Box<dyn MemberStorage> {
        Box::new(VecMemberStorage::new())
    }
}

/// Natural loot of single creatures.
pub trait LootRules: Send + Sync {
    fn natural_loot(
        &self,
        creature: &dyn Creature,
        killer: Option<&Killer>,
        location: Location,
        looting: Option<u32>,
    ) -> Vec<ItemStack>;

    /// Experience one creature drops when no death event reported it.
    fn base_experience(&self, creature: &dyn Creature) -> u32;
}

/// Applies computed results to the world.
pub trait Placement: Send + Sync {
    fn accept_drops(&self, items: Vec<ItemStack>, location: Location);

    fn spawn_experience(&self, location: Location, amount: u32);

    /// Credits `killer` with `count` additional kills of `kind`.
    fn record_kills(&self, _killer: &Killer, _kind: EntityKind, _count: u32) {}
}

/// Tracks live stacks. Guarantees at most one structural mutation per stack
/// is in flight.
pub trait StackRegistry: Send + Sync {
    fn deregister(&self, stack: &CreatureStack);

    /// The stack formerly headed by `old` is now headed by `new`.
    fn replace_head(&self, old: CreatureId, new: CreatureId);

    /// Suspends automatic stacking of newly spawned creatures.
    fn set_stacking_suspended(&self, _suspended: bool) {}
}
