//! Concurrent in-memory registry of live stacks keyed by head id.
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use stacker_core::{CreatureId, CreatureStack, StackRegistry};
use tracing::{debug, trace, warn};

#[derive(Debug, Default)]
pub struct InMemoryStackRegistry {
    stacks: RwLock<HashMap<CreatureId, Arc<CreatureStack>>>,
    suspended: AtomicBool,
}

impl InMemoryStackRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tracks `stack` under its current head id, replacing any previous entry.
    pub fn register(&self, stack: Arc<CreatureStack>) {
        let head = stack.head_id();
        let previous = self
            .stacks
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(head, stack);
        if previous.is_some() {
            warn!(target: "runtime::registry", %head, "replaced existing stack for head");
        } else {
            trace!(target: "runtime::registry", %head, "registered stack");
        }
    }

    pub fn lookup(&self, head: CreatureId) -> Option<Arc<CreatureStack>> {
        self.stacks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&head)
            .cloned()
    }

    pub fn contains(&self, head: CreatureId) -> bool {
        self.stacks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&head)
    }

    pub fn len(&self) -> usize {
        self.stacks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of every tracked stack.
    pub fn stacks(&self) -> Vec<Arc<CreatureStack>> {
        self.stacks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect()
    }

    /// Sum of all tracked stack sizes.
    pub fn total_members(&self) -> usize {
        self.stacks().iter().map(|stack| stack.size()).sum()
    }

    pub fn is_stacking_suspended(&self) -> bool {
        self.suspended.load(Ordering::SeqCst)
    }

    /// Drops every entry. Stacks hold the context that holds this registry,
    /// so a host tearing down must clear it to release them.
    pub fn clear(&self) {
        self.stacks
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl StackRegistry for InMemoryStackRegistry {
    fn deregister(&self, stack: &CreatureStack) {
        let head = stack.head_id();
        let mut stacks = self.stacks.write().unwrap_or_else(PoisonError::into_inner);
        match stacks.get(&head) {
            Some(tracked) if std::ptr::eq(tracked.as_ref(), stack) => {
                stacks.remove(&head);
                debug!(target: "runtime::registry", %head, "deregistered stack");
            }
            Some(_) => {
                warn!(target: "runtime::registry", %head, "deregister of untracked stack instance ignored");
            }
            None => trace!(target: "runtime::registry", %head, "deregister of unknown head"),
        }
    }

    fn replace_head(&self, old: CreatureId, new: CreatureId) {
        let mut stacks = self.stacks.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(stack) = stacks.remove(&old) {
            stacks.insert(new, stack);
            debug!(target: "runtime::registry", %old, %new, "stack head replaced");
        }
    }

    fn set_stacking_suspended(&self, suspended: bool) {
        self.suspended.store(suspended, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stacker_core::sandbox::{ManualDispatcher, Sandbox};
    use stacker_core::{EntityKind, StackerConfig};

    fn sandbox() -> Sandbox {
        Sandbox::new(
            StackerConfig::default(),
            Arc::new(ManualDispatcher::designated()),
        )
    }

    #[test]
    fn register_lookup_and_deregister() {
        let sandbox = sandbox();
        let registry = InMemoryStackRegistry::new();
        let stack = sandbox.stack_of(EntityKind::Zombie, 3);
        let head = stack.head_id();

        registry.register(Arc::clone(&stack));
        assert!(registry.contains(head));
        assert_eq!(registry.total_members(), 3);
        assert!(Arc::ptr_eq(&registry.lookup(head).unwrap(), &stack));

        registry.deregister(&stack);
        assert!(registry.is_empty());
    }

    #[test]
    fn deregister_ignores_a_different_instance_with_the_same_head() {
        let sandbox = sandbox();
        let registry = InMemoryStackRegistry::new();
        let head = sandbox.spawn(EntityKind::Cow);
        let tracked = sandbox.stack(Arc::clone(&head));
        let stranger = sandbox.stack(head);

        registry.register(Arc::clone(&tracked));
        registry.deregister(&stranger);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn replace_head_rekeys_the_entry() {
        let sandbox = sandbox();
        let registry = InMemoryStackRegistry::new();
        let stack = sandbox.stack_of(EntityKind::Skeleton, 2);
        let old = stack.head_id();
        registry.register(Arc::clone(&stack));

        let new = CreatureId(old.0 + 100);
        registry.replace_head(old, new);
        assert!(!registry.contains(old));
        assert!(registry.contains(new));

        registry.replace_head(CreatureId(9999), CreatureId(10_000));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn suspension_flag_round_trips() {
        let registry = InMemoryStackRegistry::new();
        assert!(!registry.is_stacking_suspended());
        registry.set_stacking_suspended(true);
        assert!(registry.is_stacking_suspended());
        registry.set_stacking_suspended(false);
        assert!(!registry.is_stacking_suspended());
    }
}
