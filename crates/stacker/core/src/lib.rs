//! Creature stack engine.
//!
//! `stacker-core` collapses many equivalent creatures into one live head plus
//! a storage of captured members, while keeping loot, experience, death and
//! display behaviour as if every member existed. The engine never touches the
//! host simulation directly: every side effect goes through the collaborator
//! traits in [`env`], bundled into a [`StackContext`] at construction time.
pub mod config;
pub mod death;
pub mod env;
pub mod error;
pub mod loot;
pub mod settings;
pub mod stack;
pub mod storage;
pub mod types;

#[cfg(feature = "sandbox")]
pub mod sandbox;

pub use config::{DeathConfig, DisplayConfig, KillerBonus, LootConfig, StackerConfig};
pub use death::DeathEvent;
pub use env::{
    Creature, CreatureHandle, Dispatcher, EntityAdapter, Execution, LootRules, MessageSource,
    Placement, StackRegistry, Task, TemplateMessages,
};
pub use error::{Result, StackError};
pub use loot::{DropPlan, DropRequest, Drops, DropsObserver};
pub use settings::{
    EntityStackSettings, EntityTypeData, MergeConditions, MergePredicate, SettingsProvider,
    SettingsTable, StackBehavior,
};
pub use stack::{CreatureStack, DisplayName, StackContext};
pub use storage::{MemberSnapshot, MemberStorage, VecMemberStorage};
pub use types::{
    CreatureId, DamageCause, DamageSource, EntityKind, ItemStack, Killer, Location, Vector,
};
