use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use tracing::trace;

use super::creature::{CreatureRecord, SandboxCreature};
use crate::env::{Creature, CreatureHandle, Dispatcher, EntityAdapter, LootRules};
use crate::error::{Result, StackError};
use crate::storage::MemberSnapshot;
use crate::types::{CreatureId, EntityKind, ItemStack, Killer, Location};

/// In-memory world: spawns creatures, captures them as bincode records and
/// rolls fixed per-type loot.
#[derive(Default)]
pub struct SandboxWorld {
    next_id: AtomicU64,
    creatures: Mutex<HashMap<CreatureId, Arc<SandboxCreature>>>,
    fail_materialize: AtomicBool,
    materializations: AtomicUsize,
    off_designated: AtomicUsize,
    dispatcher: OnceLock<Arc<dyn Dispatcher>>,
    loot_contexts: Mutex<Vec<(i32, Option<u64>)>>,
}

impl SandboxWorld {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts materializations that happen off `dispatcher`'s designated thread.
    pub fn watch_dispatcher(&self, dispatcher: Arc<dyn Dispatcher>) {
        if self.dispatcher.set(dispatcher).is_err() {
            trace!(target: "stacker::sandbox", "dispatcher already watched");
        }
    }

    fn allocate_id(&self) -> CreatureId {
        CreatureId(self.next_id.fetch_add(1, Ordering::Relaxed) + 1)
    }

    fn insert(&self, creature: Arc<SandboxCreature>) {
        self.creatures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(creature.id(), creature);
    }

    pub fn spawn(&self, kind: EntityKind, location: Location) -> Arc<SandboxCreature> {
        let creature = Arc::new(SandboxCreature::new(self.allocate_id(), kind, location));
        self.insert(Arc::clone(&creature));
        creature
    }

    pub fn creature(&self, id: CreatureId) -> Option<Arc<SandboxCreature>> {
        self.creatures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned()
    }

    pub fn is_removed(&self, id: CreatureId) -> bool {
        self.creature(id).is_some_and(|creature| creature.is_removed())
    }

    /// Spawned creatures of `kind` that are neither dead nor removed.
    pub fn live_count(&self, kind: EntityKind) -> usize {
        self.creatures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .filter(|creature| creature.kind() == kind && !creature.is_dead())
            .count()
    }

    /// Makes every following materialization fail.
    pub fn fail_materialize(&self, fail: bool) {
        self.fail_materialize.store(fail, Ordering::SeqCst);
    }

    pub fn materializations(&self) -> usize {
        self.materializations.load(Ordering::SeqCst)
    }

    pub fn materializations_off_designated(&self) -> usize {
        self.off_designated.load(Ordering::SeqCst)
    }

    /// Fire ticks and killer id seen by every loot roll, in order.
    pub fn loot_contexts(&self) -> Vec<(i32, Option<u64>)> {
        self.loot_contexts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl EntityAdapter for SandboxWorld {
    fn capture(&self, creature: &dyn Creature) -> Result<MemberSnapshot> {
        let record = CreatureRecord {
            kind: creature.kind(),
            custom_name: creature.custom_name(),
            juvenile: creature.is_juvenile(),
            ai_disabled: creature.ai_disabled(),
            fire_ticks: creature.fire_ticks(),
            size: creature.size(),
            ticks_lived: creature.ticks_lived(),
        };

        bincode::serialize(&record)
            .map(MemberSnapshot::new)
            .map_err(|err| StackError::Capture {
                kind: creature.kind(),
                creature: creature.id(),
                reason: err.to_string(),
            })
    }

    fn materialize(
        &self,
        snapshot: &MemberSnapshot,
        kind: EntityKind,
        location: Location,
        spawn: bool,
    ) -> Result<CreatureHandle> {
        if self.fail_materialize.load(Ordering::SeqCst) {
            return Err(StackError::Materialize {
                kind,
                reason: "materialization disabled".into(),
            });
        }

        let record: CreatureRecord =
            bincode::deserialize(snapshot.as_bytes()).map_err(|err| StackError::Materialize {
                kind,
                reason: err.to_string(),
            })?;

        self.materializations.fetch_add(1, Ordering::SeqCst);
        if let Some(dispatcher) = self.dispatcher.get()
            && !dispatcher.is_designated_thread()
        {
            self.off_designated.fetch_add(1, Ordering::SeqCst);
        }

        let creature = Arc::new(SandboxCreature::from_record(
            self.allocate_id(),
            record,
            location,
        ));
        if spawn {
            self.insert(Arc::clone(&creature));
        }
        Ok(creature)
    }
}

impl LootRules for SandboxWorld {
    fn natural_loot(
        &self,
        creature: &dyn Creature,
        killer: Option<&Killer>,
        _location: Location,
        looting: Option<u32>,
    ) -> Vec<ItemStack> {
        self.loot_contexts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((creature.fire_ticks(), killer.map(|killer| killer.id)));

        let amount = 1 + looting.unwrap_or(0);
        let size = creature.size().unwrap_or(1);
        match creature.kind() {
            EntityKind::Zombie => vec![ItemStack::new("rotten_flesh", amount)],
            EntityKind::Skeleton => vec![
                ItemStack::new("bone", amount),
                ItemStack::new("arrow", amount),
            ],
            EntityKind::Cow => vec![
                ItemStack::new("beef", amount),
                ItemStack::new("leather", 1),
            ],
            EntityKind::Chicken => vec![
                ItemStack::new("chicken", 1),
                ItemStack::new("feather", amount),
            ],
            EntityKind::Slime if size == 1 => vec![ItemStack::new("slime_ball", amount)],
            EntityKind::MagmaCube if size > 1 => vec![ItemStack::new("magma_cream", amount)],
            _ => Vec::new(),
        }
    }

    fn base_experience(&self, creature: &dyn Creature) -> u32 {
        if creature.is_juvenile() {
            return 0;
        }
        match creature.kind() {
            EntityKind::Chicken
            | EntityKind::Cow
            | EntityKind::Pig
            | EntityKind::Sheep
            | EntityKind::Rabbit
            | EntityKind::Squid => 2,
            EntityKind::EnderDragon => 500,
            EntityKind::Wither => 50,
            _ => 5,
        }
    }
}
