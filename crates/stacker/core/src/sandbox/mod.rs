//! In-memory host for tests and the simulation driver.
//!
//! Creatures live in a [`SandboxWorld`], snapshots are bincode-encoded
//! creature records, and placement and registry calls are recorded for
//! inspection.
mod creature;
mod dispatch;
mod recording;
mod world;

pub use creature::SandboxCreature;
pub use dispatch::ManualDispatcher;
pub use recording::{RecordingPlacement, RecordingRegistry};
pub use world::SandboxWorld;

use std::sync::Arc;

use crate::config::StackerConfig;
use crate::env::{Dispatcher, TemplateMessages};
use crate::settings::{
    EntityStackSettings, EntityTypeData, MergeConditions, SettingsTable, StackBehavior,
};
use crate::stack::{CreatureStack, StackContext};
use crate::types::{EntityKind, ItemStack, Location};

/// A small settings catalog covering every behavior variant.
pub fn default_settings() -> SettingsTable {
    let flying = EntityTypeData {
        swimming: false,
        flying: true,
    };

    SettingsTable::new([
        EntityStackSettings::new(EntityKind::Zombie, "Zombie"),
        EntityStackSettings::new(EntityKind::Skeleton, "Skeleton"),
        EntityStackSettings::new(EntityKind::Cow, "Cow"),
        EntityStackSettings::new(EntityKind::Chicken, "Chicken"),
        EntityStackSettings::new(EntityKind::Squid, "Squid").with_type_data(EntityTypeData {
            swimming: true,
            flying: false,
        }),
        EntityStackSettings::new(EntityKind::Bat, "Bat").with_type_data(flying),
        EntityStackSettings::new(EntityKind::Slime, "Slime").with_behavior(
            StackBehavior::Splitting {
                loot_size: 1,
                settle_size: 1,
            },
        ),
        EntityStackSettings::new(EntityKind::MagmaCube, "Magma Cube").with_behavior(
            StackBehavior::Splitting {
                loot_size: 2,
                settle_size: 1,
            },
        ),
        EntityStackSettings::new(EntityKind::Wither, "Wither")
            .with_type_data(flying)
            .with_bonus_drop(ItemStack::new("nether_star", 1)),
        EntityStackSettings::new(EntityKind::EnderDragon, "Ender Dragon")
            .with_type_data(flying)
            .with_sensitive(true)
            .with_merge_conditions(MergeConditions::SEPARATE_AGES),
    ])
}

/// A fully wired stack context over an in-memory world.
pub struct Sandbox {
    pub world: Arc<SandboxWorld>,
    pub placement: Arc<RecordingPlacement>,
    pub registry: Arc<RecordingRegistry>,
    pub context: Arc<StackContext>,
}

impl Sandbox {
    pub fn new(config: StackerConfig, dispatcher: Arc<dyn Dispatcher>) -> Self {
        Self::with_settings(config, default_settings(), dispatcher)
    }

    pub fn with_settings(
        config: StackerConfig,
        settings: SettingsTable,
        dispatcher: Arc<dyn Dispatcher>,
    ) -> Self {
        let world = Arc::new(SandboxWorld::new());
        world.watch_dispatcher(Arc::clone(&dispatcher));
        let placement = Arc::new(RecordingPlacement::new());
        let registry = Arc::new(RecordingRegistry::new());

        let context = Arc::new(StackContext {
            config: Arc::new(config),
            settings: Arc::new(settings),
            adapter: world.clone(),
            loot_rules: world.clone(),
            placement: placement.clone(),
            registry: registry.clone(),
            dispatcher,
            messages: Arc::new(TemplateMessages::default()),
        });

        Self {
            world,
            placement,
            registry,
            context,
        }
    }

    pub fn spawn(&self, kind: EntityKind) -> Arc<SandboxCreature> {
        self.spawn_at(kind, Location::ORIGIN)
    }

    pub fn spawn_at(&self, kind: EntityKind, location: Location) -> Arc<SandboxCreature> {
        self.world.spawn(kind, location)
    }

    /// A size-1 stack headed by `head`.
    pub fn stack(&self, head: Arc<SandboxCreature>) -> Arc<CreatureStack> {
        Arc::new(CreatureStack::new(Arc::clone(&self.context), head))
    }

    /// A freshly spawned stack of `size` identical members.
    ///
    /// # Panics
    ///
    /// Panics if the head cannot be captured, which the sandbox world never
    /// reports for its own creatures.
    pub fn stack_of(&self, kind: EntityKind, size: usize) -> Arc<CreatureStack> {
        let stack = self.stack(self.spawn(kind));
        if let Err(err) = stack.merge_in_bulk(size.saturating_sub(1)) {
            panic!("sandbox capture failed: {err}");
        }
        stack
    }
}
