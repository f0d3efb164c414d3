use std::fmt;
use std::sync::Arc;

use crate::types::{CreatureId, DamageSource, EntityKind, Killer, Location, Vector};

/// A live creature owned by the host simulation.
///
/// Handles are shared and mutated through `&self`; the host is responsible for
/// its own interior synchronization. Setters that only make sense on some
/// creature types (size, age) are no-ops elsewhere.
pub trait Creature: Send + Sync + fmt::Debug {
    fn id(&self) -> CreatureId;

    fn kind(&self) -> EntityKind;

    fn location(&self) -> Location;

    fn custom_name(&self) -> Option<String>;

    fn is_dead(&self) -> bool;

    /// Ticks since the creature was first spawned.
    fn ticks_lived(&self) -> u64;

    /// Young creatures drop nothing on death.
    fn is_juvenile(&self) -> bool;

    /// Disabled-activity marker (spawner mobs without AI).
    fn ai_disabled(&self) -> bool;

    fn set_ai_disabled(&self, disabled: bool);

    fn fire_ticks(&self) -> i32;

    fn set_fire_ticks(&self, ticks: i32);

    fn last_damage(&self) -> Option<DamageSource>;

    fn set_last_damage(&self, source: Option<DamageSource>);

    /// Player credited with the last hit.
    fn killer(&self) -> Option<Killer>;

    fn set_killer(&self, killer: Option<Killer>);

    /// Count-like size property of splitting creatures.
    fn size(&self) -> Option<u32>;

    fn set_size(&self, size: u32);

    fn velocity(&self) -> Vector;

    fn set_velocity(&self, velocity: Vector);

    fn teleport(&self, location: Location);

    /// Removes the creature from the world without a death.
    fn remove(&self);
}

/// Shared handle to a live creature.
pub type CreatureHandle = Arc<dyn Creature>;
