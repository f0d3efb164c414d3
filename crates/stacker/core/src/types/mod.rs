//! Value types shared by the stack engine and its collaborators.

mod entity;
mod item;

pub use entity::{CreatureId, DamageCause, DamageSource, EntityKind, Killer, Location, Vector};
pub use item::{DEFAULT_MAX_STACK_SIZE, ItemStack, multiply_items};
