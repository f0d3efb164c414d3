use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};

use crate::env::Creature;
use crate::types::{CreatureId, DamageSource, EntityKind, Killer, Location, Vector};

/// The part of a creature that survives capture.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct CreatureRecord {
    pub(crate) kind: EntityKind,
    pub(crate) custom_name: Option<String>,
    pub(crate) juvenile: bool,
    pub(crate) ai_disabled: bool,
    pub(crate) fire_ticks: i32,
    pub(crate) size: Option<u32>,
    pub(crate) ticks_lived: u64,
}

impl CreatureRecord {
    fn new(kind: EntityKind) -> Self {
        let size = matches!(kind, EntityKind::Slime | EntityKind::MagmaCube).then_some(1);
        Self {
            kind,
            custom_name: None,
            juvenile: false,
            ai_disabled: false,
            fire_ticks: 0,
            size,
            ticks_lived: 0,
        }
    }
}

#[derive(Debug)]
struct CreatureState {
    record: CreatureRecord,
    location: Location,
    velocity: Vector,
    last_damage: Option<DamageSource>,
    killer: Option<Killer>,
    dead: bool,
    removed: bool,
}

/// In-memory creature.
#[derive(Debug)]
pub struct SandboxCreature {
    id: CreatureId,
    state: Mutex<CreatureState>,
}

impl SandboxCreature {
    pub fn new(id: CreatureId, kind: EntityKind, location: Location) -> Self {
        Self::from_record(id, CreatureRecord::new(kind), location)
    }

    pub(crate) fn from_record(id: CreatureId, record: CreatureRecord, location: Location) -> Self {
        Self {
            id,
            state: Mutex::new(CreatureState {
                record,
                location,
                velocity: Vector::ZERO,
                last_damage: None,
                killer: None,
                dead: false,
                removed: false,
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, CreatureState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_custom_name(&self, name: Option<String>) {
        self.state().record.custom_name = name;
    }

    pub fn set_juvenile(&self, juvenile: bool) {
        self.state().record.juvenile = juvenile;
    }

    pub fn set_ticks_lived(&self, ticks: u64) {
        self.state().record.ticks_lived = ticks;
    }

    /// Marks the creature dead without removing it.
    pub fn kill(&self) {
        self.state().dead = true;
    }

    pub fn is_removed(&self) -> bool {
        self.state().removed
    }
}

impl Creature for SandboxCreature {
    fn id(&self) -> CreatureId {
        self.id
    }

    fn kind(&self) -> EntityKind {
        self.state().record.kind
    }

    fn location(&self) -> Location {
        self.state().location
    }

    fn custom_name(&self) -> Option<String> {
        self.state().record.custom_name.clone()
    }

    fn is_dead(&self) -> bool {
        let state = self.state();
        state.dead || state.removed
    }

    fn ticks_lived(&self) -> u64 {
        self.state().record.ticks_lived
    }

    fn is_juvenile(&self) -> bool {
        self.state().record.juvenile
    }

    fn ai_disabled(&self) -> bool {
        self.state().record.ai_disabled
    }

    fn set_ai_disabled(&self, disabled: bool) {
        self.state().record.ai_disabled = disabled;
    }

    fn fire_ticks(&self) -> i32 {
        self.state().record.fire_ticks
    }

    fn set_fire_ticks(&self, ticks: i32) {
        self.state().record.fire_ticks = ticks;
    }

    fn last_damage(&self) -> Option<DamageSource> {
        self.state().last_damage.clone()
    }

    fn set_last_damage(&self, source: Option<DamageSource>) {
        self.state().last_damage = source;
    }

    fn killer(&self) -> Option<Killer> {
        self.state().killer.clone()
    }

    fn set_killer(&self, killer: Option<Killer>) {
        self.state().killer = killer;
    }

    fn size(&self) -> Option<u32> {
        self.state().record.size
    }

    fn set_size(&self, size: u32) {
        let mut state = self.state();
        if state.record.size.is_some() {
            state.record.size = Some(size.max(1));
        }
    }

    fn velocity(&self) -> Vector {
        self.state().velocity
    }

    fn set_velocity(&self, velocity: Vector) {
        self.state().velocity = velocity;
    }

    fn teleport(&self, location: Location) {
        self.state().location = location;
    }

    fn remove(&self) {
        self.state().removed = true;
    }
}
