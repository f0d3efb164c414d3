use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::env::{Placement, StackRegistry};
use crate::stack::CreatureStack;
use crate::types::{CreatureId, EntityKind, ItemStack, Killer, Location};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Placement that records everything it is handed.
#[derive(Debug, Default)]
pub struct RecordingPlacement {
    drops: Mutex<Vec<(Vec<ItemStack>, Location)>>,
    experience: Mutex<Vec<(Location, u32)>>,
    kills: Mutex<Vec<(u64, EntityKind, u32)>>,
}

impl RecordingPlacement {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn drops(&self) -> Vec<(Vec<ItemStack>, Location)> {
        lock(&self.drops).clone()
    }

    /// Total amount of `material` placed so far.
    pub fn amount_of(&self, material: &str) -> u64 {
        lock(&self.drops)
            .iter()
            .flat_map(|(items, _)| items.iter())
            .filter(|item| item.material == material)
            .map(|item| u64::from(item.amount))
            .sum()
    }

    /// Total experience spawned so far.
    pub fn experience(&self) -> u64 {
        lock(&self.experience)
            .iter()
            .map(|(_, amount)| u64::from(*amount))
            .sum()
    }

    /// `(killer id, kind, count)` per recorded statistic.
    pub fn kills(&self) -> Vec<(u64, EntityKind, u32)> {
        lock(&self.kills).clone()
    }
}

impl Placement for RecordingPlacement {
    fn accept_drops(&self, items: Vec<ItemStack>, location: Location) {
        lock(&self.drops).push((items, location));
    }

    fn spawn_experience(&self, location: Location, amount: u32) {
        lock(&self.experience).push((location, amount));
    }

    fn record_kills(&self, killer: &Killer, kind: EntityKind, count: u32) {
        lock(&self.kills).push((killer.id, kind, count));
    }
}

/// Registry that records calls instead of tracking stacks.
#[derive(Debug, Default)]
pub struct RecordingRegistry {
    deregistered: Mutex<Vec<CreatureId>>,
    replaced: Mutex<Vec<(CreatureId, CreatureId)>>,
    suspended: AtomicBool,
    suspensions: AtomicUsize,
}

impl RecordingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Head ids of deregistered stacks, in order.
    pub fn deregistered(&self) -> Vec<CreatureId> {
        lock(&self.deregistered).clone()
    }

    pub fn replaced(&self) -> Vec<(CreatureId, CreatureId)> {
        lock(&self.replaced).clone()
    }

    pub fn is_suspended(&self) -> bool {
        self.suspended.load(Ordering::SeqCst)
    }

    /// How many times stacking was suspended.
    pub fn suspensions(&self) -> usize {
        self.suspensions.load(Ordering::SeqCst)
    }
}

impl StackRegistry for RecordingRegistry {
    fn deregister(&self, stack: &CreatureStack) {
        lock(&self.deregistered).push(stack.head_id());
    }

    fn replace_head(&self, old: CreatureId, new: CreatureId) {
        lock(&self.replaced).push((old, new));
    }

    fn set_stacking_suspended(&self, suspended: bool) {
        if suspended {
            self.suspensions.fetch_add(1, Ordering::SeqCst);
        }
        self.suspended.store(suspended, Ordering::SeqCst);
    }
}
