//! The stack entity: one live head plus the captured members behind it.
//!
//! A [`CreatureStack`] is shared as `Arc<CreatureStack>` between the host
//! simulation, the registry and in-flight dispatched tasks. Its mutable state
//! sits behind one mutex that is only ever held for short, collaborator-free
//! sections. Nothing outside the stack is called while it is locked: no
//! adapter, registry, placement or message call, and no read of a live
//! creature.
mod context;
mod display;

pub use context::StackContext;
pub use display::{DisplayInput, DisplayName, derive_display_name};

use context::StackingSuspended;

use std::cmp::Ordering;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, error, warn};

use crate::env::{Creature, CreatureHandle, Execution, run_with_affinity};
use crate::error::{Result, StackError};
use crate::settings::{EntityStackSettings, StackBehavior};
use crate::storage::{MemberStorage, VecMemberStorage};
use crate::types::{CreatureId, EntityKind, Location, Vector};

use display::DisplayCache;

/// Magnitude of the random velocity given to a freshly split head.
const SPLIT_NUDGE: f64 = 0.01;

pub(crate) struct StackInner {
    pub(crate) head: CreatureHandle,
    pub(crate) storage: Box<dyn MemberStorage>,
    display: DisplayCache,
}

impl StackInner {
    pub(crate) fn touch(&mut self) {
        self.display.invalidate();
    }
}

/// A group of same-type creatures represented by one live head.
pub struct CreatureStack {
    pub(crate) ctx: Arc<StackContext>,
    pub(crate) kind: EntityKind,
    pub(crate) settings: Option<Arc<EntityStackSettings>>,
    inner: Mutex<StackInner>,
}

impl CreatureStack {
    /// Creates a size-1 stack around `head` with storage from the adapter.
    pub fn new(ctx: Arc<StackContext>, head: CreatureHandle) -> Self {
        let storage = ctx.adapter.create_storage(head.kind());
        Self::with_storage(ctx, head, storage)
    }

    /// Creates a stack around `head` backed by existing `storage`.
    pub fn with_storage(
        ctx: Arc<StackContext>,
        head: CreatureHandle,
        storage: Box<dyn MemberStorage>,
    ) -> Self {
        let kind = head.kind();
        let settings = ctx.settings.settings(kind);
        Self::assemble(ctx, head, storage, settings)
    }

    /// Throwaway stack used only to ask the merge predicate a question.
    fn probe(
        ctx: Arc<StackContext>,
        head: CreatureHandle,
        settings: Option<Arc<EntityStackSettings>>,
    ) -> Self {
        Self::assemble(ctx, head, Box::new(VecMemberStorage::new()), settings)
    }

    fn assemble(
        ctx: Arc<StackContext>,
        head: CreatureHandle,
        storage: Box<dyn MemberStorage>,
        settings: Option<Arc<EntityStackSettings>>,
    ) -> Self {
        Self {
            ctx,
            kind: head.kind(),
            settings,
            inner: Mutex::new(StackInner {
                head,
                storage,
                display: DisplayCache::default(),
            }),
        }
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, StackInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn head(&self) -> CreatureHandle {
        Arc::clone(&self.lock().head)
    }

    pub fn head_id(&self) -> CreatureId {
        self.head().id()
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn location(&self) -> Location {
        self.head().location()
    }

    pub fn context(&self) -> &Arc<StackContext> {
        &self.ctx
    }

    pub fn settings(&self) -> Option<&Arc<EntityStackSettings>> {
        self.settings.as_ref()
    }

    /// Head plus stored members.
    pub fn size(&self) -> usize {
        self.lock().storage.len() + 1
    }

    /// Whether captures and materializations of this type are pinned to the
    /// designated thread.
    pub fn is_sensitive(&self) -> bool {
        self.settings.as_ref().is_some_and(|settings| settings.sensitive)
    }

    pub(crate) fn behavior(&self) -> StackBehavior {
        self.settings
            .as_ref()
            .map(|settings| settings.behavior)
            .unwrap_or_default()
    }

    fn is_flying(&self) -> bool {
        self.settings
            .as_ref()
            .is_some_and(|settings| settings.type_data.flying)
    }

    /// Captures `member` and pushes it on top of the stack.
    ///
    /// Sensitive types captured off the designated thread are resubmitted
    /// there; the member then appears asynchronously and capture failures are
    /// only logged.
    pub fn merge_in(self: &Arc<Self>, member: CreatureHandle) -> Result<Execution> {
        if self.is_sensitive() && !self.ctx.dispatcher.is_designated_thread() {
            let stack = Arc::clone(self);
            self.ctx.dispatcher.dispatch_designated(Box::new(move || {
                if let Err(err) = stack.push_captured(member.as_ref()) {
                    error!(
                        target: "stacker::stack",
                        kind = %stack.kind,
                        member = %member.id(),
                        error = %err,
                        "deferred merge failed"
                    );
                }
            }));
            return Ok(Execution::Resubmitted);
        }

        self.push_captured(member.as_ref())?;
        Ok(Execution::Inline)
    }

    fn push_captured(&self, member: &dyn Creature) -> Result<()> {
        let snapshot = self.ctx.adapter.capture(member)?;
        let mut inner = self.lock();
        inner.storage.push(snapshot);
        inner.touch();
        Ok(())
    }

    /// Grows the stack by `count` copies of the current head.
    pub fn merge_in_bulk(&self, count: usize) -> Result<()> {
        if count == 0 {
            return Ok(());
        }

        let head = self.head();
        let snapshot = self.ctx.adapter.capture(head.as_ref())?;

        let mut inner = self.lock();
        for _ in 0..count {
            inner.storage.push(snapshot.clone());
        }
        inner.touch();
        Ok(())
    }

    /// Moves every snapshot out of `other` onto this stack, preserving order.
    pub fn merge_in_serialized(&self, other: &mut dyn MemberStorage) {
        let members = other.drain_all();
        if members.is_empty() {
            return;
        }

        let mut inner = self.lock();
        inner.storage.extend(members);
        inner.touch();
    }

    /// Takes over `donor`'s head and members, leaving it with an empty storage.
    ///
    /// The donor is not deregistered; the caller owns its lifecycle.
    pub fn absorb(self: &Arc<Self>, donor: &CreatureStack) -> Result<Execution> {
        if std::ptr::eq(self.as_ref(), donor) {
            return Ok(Execution::Inline);
        }

        let execution = self.merge_in(donor.head())?;
        let members = {
            let mut donor_inner = donor.lock();
            donor_inner.touch();
            donor_inner.storage.drain_all()
        };
        if !members.is_empty() {
            let mut inner = self.lock();
            inner.storage.extend(members);
            inner.touch();
        }
        Ok(execution)
    }

    /// Discards up to `count` members from the top without materializing them.
    pub(crate) fn pop_members(&self, count: usize) -> usize {
        let mut inner = self.lock();
        let removed = inner.storage.pop_many(count);
        if removed > 0 {
            inner.touch();
        }
        removed
    }

    /// Promotes the top member to a new live head.
    ///
    /// Returns the former head as a detached size-1 stack, or `None` when the
    /// stack had no members. On materialization failure the member is put
    /// back and the stack is unchanged.
    pub fn split(&self) -> Result<Option<CreatureStack>> {
        if self.is_sensitive() && !self.ctx.dispatcher.is_designated_thread() {
            return Err(StackError::RequiresDesignatedThread {
                operation: "split",
                kind: self.kind,
            });
        }

        let (snapshot, old_head) = {
            let mut inner = self.lock();
            let Some(snapshot) = inner.storage.pop() else {
                return Ok(None);
            };
            (snapshot, Arc::clone(&inner.head))
        };

        let materialized = {
            let _suspended = StackingSuspended::new(self.ctx.registry.as_ref());
            self.ctx
                .adapter
                .materialize(&snapshot, self.kind, old_head.location(), true)
        };

        let new_head = match materialized {
            Ok(head) => head,
            Err(err) => {
                let mut inner = self.lock();
                inner.storage.push(snapshot);
                return Err(err);
            }
        };

        self.prepare_split_head(new_head.as_ref(), old_head.as_ref());
        self.ctx.registry.replace_head(old_head.id(), new_head.id());

        let new_id = new_head.id();
        {
            let mut inner = self.lock();
            inner.head = new_head;
            inner.touch();
        }

        debug!(
            target: "stacker::stack",
            kind = %self.kind,
            old_head = %old_head.id(),
            new_head = %new_id,
            "split stack"
        );

        let leftover = self.ctx.adapter.create_storage(self.kind);
        Ok(Some(CreatureStack::with_storage(
            Arc::clone(&self.ctx),
            old_head,
            leftover,
        )))
    }

    fn prepare_split_head(&self, new_head: &dyn Creature, old_head: &dyn Creature) {
        self.behavior().apply_unstack_properties(new_head, old_head);

        let nudge = Vector::random(&mut rand::thread_rng(), SPLIT_NUDGE);
        new_head.set_velocity(new_head.velocity().add(nudge));

        // A juvenile head that grew up would otherwise clip into blocks.
        if old_head.is_juvenile() && !new_head.is_juvenile() {
            new_head.teleport(old_head.location().block_centered());
        }
    }

    /// Splits on the thread the type allows and hands the result to `on_split`.
    ///
    /// Never blocks: sensitive stacks split off the designated thread are
    /// resubmitted there.
    pub fn split_with_affinity<F>(self: &Arc<Self>, on_split: F) -> Execution
    where
        F: FnOnce(Result<Option<CreatureStack>>) + Send + 'static,
    {
        let stack = Arc::clone(self);
        run_with_affinity(
            self.ctx.dispatcher.as_ref(),
            self.is_sensitive(),
            move || on_split(stack.split()),
        )
    }

    /// Whether the top member still belongs with the current head.
    ///
    /// Sensitive types, stacks without settings, empty stacks and probes that
    /// cannot be built all answer `true`.
    pub fn should_stay_stacked(&self) -> bool {
        let Some(settings) = self.settings.as_ref() else {
            return true;
        };
        if settings.sensitive {
            return true;
        }

        let (head, top) = {
            let inner = self.lock();
            let Some(top) = inner.storage.peek().cloned() else {
                return true;
            };
            (Arc::clone(&inner.head), top)
        };
        let location = head.location();

        let probe_head = match self.ctx.adapter.materialize(&top, self.kind, location, false) {
            Ok(head) => head,
            Err(err) => {
                warn!(
                    target: "stacker::stack",
                    kind = %self.kind,
                    error = %err,
                    "probe materialization failed, keeping stack"
                );
                return true;
            }
        };

        let probe = CreatureStack::probe(
            Arc::clone(&self.ctx),
            probe_head,
            Some(Arc::clone(settings)),
        );
        self.ctx.settings.can_merge(self, &probe, true)
    }

    /// Orders two stacks by which should survive a merge: the greater one.
    ///
    /// With downward stacking enabled the lower of two flying stacks wins;
    /// otherwise the larger stack wins, then the older head.
    pub fn compare(&self, other: &CreatureStack) -> Ordering {
        if std::ptr::eq(self, other) {
            return Ordering::Equal;
        }

        let head = self.head();
        let other_head = other.head();
        if head.id() == other_head.id() {
            return Ordering::Equal;
        }

        if self.ctx.config.stack_flying_downwards && self.is_flying() && other.is_flying() {
            let y = head.location().y;
            let other_y = other_head.location().y;
            match other_y.partial_cmp(&y) {
                Some(Ordering::Equal) | None => {}
                Some(ordering) => return ordering,
            }
        }

        self.size()
            .cmp(&other.size())
            .then_with(|| head.ticks_lived().cmp(&other_head.ticks_lived()))
    }

    /// Current name tag, recomputed only after a mutation.
    pub fn display_name(&self) -> DisplayName {
        let label = self
            .settings
            .as_ref()
            .map(|settings| settings.display_name.clone());

        let (size, head, generation) = {
            let inner = self.lock();
            if let Some(name) = inner.display.cached() {
                return name;
            }
            (
                inner.storage.len() + 1,
                Arc::clone(&inner.head),
                inner.display.generation(),
            )
        };

        let custom_name = head.custom_name();
        let name = derive_display_name(
            DisplayInput {
                size,
                custom_name: custom_name.as_deref(),
                head_dead: head.is_dead(),
                label: label.as_deref(),
            },
            &self.ctx.config.display,
            self.ctx.messages.as_ref(),
        );

        self.lock().display.store(generation, &name);
        name
    }

    /// Forces the next [`display_name`](Self::display_name) to recompute.
    pub fn invalidate_display(&self) {
        self.lock().touch();
    }
}

impl fmt::Debug for CreatureStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (head, size) = {
            let inner = self.lock();
            (Arc::clone(&inner.head), inner.storage.len() + 1)
        };
        f.debug_struct("CreatureStack")
            .field("kind", &self.kind)
            .field("head", &head.id())
            .field("size", &size)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
    use std::sync::{OnceLock, Weak, mpsc};
    use std::time::Duration;

    use super::*;
    use crate::config::StackerConfig;
    use crate::env::{MessageSource, TemplateMessages};
    use crate::sandbox::{ManualDispatcher, Sandbox};
    use crate::settings::{EntityStackSettings, EntityTypeData, MergeConditions, SettingsTable};
    use crate::types::Location;

    fn sandbox() -> Sandbox {
        Sandbox::new(StackerConfig::default(), Arc::new(ManualDispatcher::designated()))
    }

    #[test]
    fn size_counts_head_and_members() {
        let sandbox = sandbox();
        let stack = sandbox.stack_of(EntityKind::Zombie, 1);
        assert_eq!(stack.size(), 1);

        stack.merge_in_bulk(4).unwrap();
        assert_eq!(stack.size(), 5);

        stack.merge_in_bulk(0).unwrap();
        assert_eq!(stack.size(), 5);
    }

    #[test]
    fn merge_in_captures_member() {
        let sandbox = sandbox();
        let stack = sandbox.stack_of(EntityKind::Zombie, 1);
        let member = sandbox.spawn(EntityKind::Zombie);
        member.set_custom_name(Some("Bob".into()));

        let execution = stack.merge_in(member).unwrap();
        assert_eq!(execution, Execution::Inline);
        assert_eq!(stack.size(), 2);

        let split = stack.split().unwrap().expect("member to split");
        assert_eq!(split.size(), 1);
        assert_eq!(stack.head().custom_name().as_deref(), Some("Bob"));
    }

    #[test]
    fn split_promotes_top_member() {
        let sandbox = sandbox();
        let stack = sandbox.stack_of(EntityKind::Zombie, 3);
        let old_head = stack.head_id();

        let leftover = stack.split().unwrap().expect("split result");
        assert_eq!(stack.size(), 2);
        assert_eq!(leftover.size(), 1);
        assert_eq!(leftover.head_id(), old_head);
        assert_ne!(stack.head_id(), old_head);

        assert_eq!(
            sandbox.registry.replaced(),
            vec![(old_head, stack.head_id())]
        );
        assert!(!sandbox.registry.is_suspended());
        assert_eq!(sandbox.registry.suspensions(), 1);
    }

    #[test]
    fn split_of_single_is_absent() {
        let sandbox = sandbox();
        let stack = sandbox.stack_of(EntityKind::Zombie, 1);
        assert!(stack.split().unwrap().is_none());
        assert_eq!(stack.size(), 1);
        assert!(sandbox.registry.replaced().is_empty());
    }

    #[test]
    fn absorbing_split_remainder_restores_size() {
        let sandbox = sandbox();
        let stack = sandbox.stack_of(EntityKind::Skeleton, 4);

        let leftover = stack.split().unwrap().expect("split result");
        assert_eq!(stack.size(), 3);

        stack.absorb(&leftover).unwrap();
        assert_eq!(stack.size(), 4);
    }

    #[test]
    fn failed_split_restores_member() {
        let sandbox = sandbox();
        let stack = sandbox.stack_of(EntityKind::Zombie, 2);
        let head = stack.head_id();

        sandbox.world.fail_materialize(true);
        assert!(matches!(stack.split(), Err(StackError::Materialize { .. })));
        assert_eq!(stack.size(), 2);
        assert_eq!(stack.head_id(), head);
        assert!(!sandbox.registry.is_suspended());
    }

    #[test]
    fn split_copies_size_for_splitting_types() {
        let sandbox = sandbox();
        let head = sandbox.spawn(EntityKind::Slime);
        head.set_size(4);
        let stack = sandbox.stack(head);
        stack.merge_in_bulk(1).unwrap();

        stack.head().set_size(3);
        stack.split().unwrap();
        assert_eq!(stack.head().size(), Some(3));
    }

    #[test]
    fn grown_juvenile_is_block_centered() {
        let sandbox = sandbox();
        let head = sandbox.spawn_at(EntityKind::Cow, Location::new(10.7, 64.0, -3.2));
        let stack = sandbox.stack(head.clone());
        stack.merge_in_bulk(1).unwrap();
        head.set_juvenile(true);

        stack.split().unwrap();
        let location = stack.head().location();
        assert_eq!((location.x, location.z), (10.5, -3.5));
    }

    #[test]
    fn sensitive_split_off_thread_is_rejected() {
        let dispatcher = Arc::new(ManualDispatcher::detached());
        let sandbox = Sandbox::new(StackerConfig::default(), dispatcher.clone());
        let stack = sandbox.stack_of(EntityKind::EnderDragon, 2);

        assert!(matches!(
            stack.split(),
            Err(StackError::RequiresDesignatedThread { operation: "split", .. })
        ));

        let (tx, rx) = std::sync::mpsc::channel();
        let execution = stack.split_with_affinity(move |result| {
            tx.send(result.map(|leftover| leftover.is_some()).ok()).ok();
        });
        assert_eq!(execution, Execution::Resubmitted);
        assert_eq!(stack.size(), 2);

        dispatcher.run_designated();
        assert_eq!(rx.recv().unwrap(), Some(true));
        assert_eq!(stack.size(), 1);
    }

    #[test]
    fn sensitive_merge_off_thread_is_resubmitted() {
        let dispatcher = Arc::new(ManualDispatcher::detached());
        let sandbox = Sandbox::new(StackerConfig::default(), dispatcher.clone());
        let stack = sandbox.stack_of(EntityKind::EnderDragon, 1);
        let member = sandbox.spawn(EntityKind::EnderDragon);

        assert_eq!(stack.merge_in(member).unwrap(), Execution::Resubmitted);
        assert_eq!(stack.size(), 1);
        assert_eq!(dispatcher.pending_designated(), 1);

        dispatcher.run_designated();
        assert_eq!(stack.size(), 2);
    }

    #[test]
    fn absorb_takes_head_and_members() {
        let sandbox = sandbox();
        let stack = sandbox.stack_of(EntityKind::Zombie, 2);
        let donor = sandbox.stack_of(EntityKind::Zombie, 3);

        assert_eq!(stack.absorb(&donor).unwrap(), Execution::Inline);
        assert_eq!(stack.size(), 5);
        assert_eq!(donor.size(), 1);
    }

    #[test]
    fn serialized_merge_preserves_order() {
        let sandbox = sandbox();
        let stack = sandbox.stack_of(EntityKind::Zombie, 1);
        let donor = sandbox.stack_of(EntityKind::Zombie, 1);
        let named = sandbox.spawn(EntityKind::Zombie);
        named.set_custom_name(Some("Top".into()));
        donor.merge_in_bulk(1).unwrap();
        donor.merge_in(named).unwrap();

        let mut moved = VecMemberStorage::new();
        moved.extend(donor.lock().storage.drain_all());
        stack.merge_in_serialized(&mut moved);

        assert!(moved.is_empty());
        assert_eq!(stack.size(), 3);
        stack.split().unwrap();
        assert_eq!(stack.head().custom_name().as_deref(), Some("Top"));
    }

    #[test]
    fn stays_stacked_until_top_member_diverges() {
        let sandbox = sandbox();
        let stack = sandbox.stack_of(EntityKind::Zombie, 1);
        assert!(stack.should_stay_stacked());

        let juvenile = sandbox.spawn(EntityKind::Zombie);
        juvenile.set_juvenile(true);
        stack.merge_in(juvenile).unwrap();
        assert!(!stack.should_stay_stacked());

        stack.split().unwrap();
        stack.merge_in_bulk(1).unwrap();
        assert!(stack.should_stay_stacked());
    }

    #[test]
    fn sensitive_stack_always_stays_stacked() {
        let sandbox = sandbox();
        let stack = sandbox.stack_of(EntityKind::EnderDragon, 1);
        let juvenile = sandbox.spawn(EntityKind::EnderDragon);
        juvenile.set_juvenile(true);
        stack.merge_in(juvenile).unwrap();

        assert!(stack.should_stay_stacked());
    }

    #[test]
    fn failed_probe_keeps_stack() {
        let sandbox = sandbox();
        let stack = sandbox.stack_of(EntityKind::Zombie, 2);
        sandbox.world.fail_materialize(true);
        assert!(stack.should_stay_stacked());
    }

    #[test]
    fn compare_prefers_larger_then_older() {
        let sandbox = sandbox();
        let big = sandbox.stack_of(EntityKind::Zombie, 5);
        let small = sandbox.stack_of(EntityKind::Zombie, 2);
        assert_eq!(big.compare(&small), Ordering::Greater);
        assert_eq!(small.compare(&big), Ordering::Less);
        assert_eq!(big.compare(&big), Ordering::Equal);

        let old = sandbox.stack_of(EntityKind::Zombie, 2);
        sandbox
            .world
            .creature(old.head_id())
            .expect("live head")
            .set_ticks_lived(500);
        assert_eq!(old.compare(&small), Ordering::Greater);
        assert_eq!(small.compare(&old), Ordering::Less);
    }

    #[test]
    fn compare_is_transitive_across_sizes() {
        let sandbox = sandbox();
        let chain: Vec<_> = [1, 3, 7]
            .into_iter()
            .map(|size| sandbox.stack_of(EntityKind::Cow, size))
            .collect();

        assert_eq!(chain[0].compare(&chain[1]), Ordering::Less);
        assert_eq!(chain[1].compare(&chain[2]), Ordering::Less);
        assert_eq!(chain[0].compare(&chain[2]), Ordering::Less);
        assert_eq!(chain[2].compare(&chain[0]), Ordering::Greater);
    }

    #[test]
    fn compare_prefers_lower_flyer_when_enabled() {
        let config = StackerConfig {
            stack_flying_downwards: true,
            ..StackerConfig::default()
        };
        let settings = SettingsTable::new([EntityStackSettings::new(EntityKind::Bat, "Bat")
            .with_type_data(EntityTypeData {
                swimming: false,
                flying: true,
            })
            .with_merge_conditions(MergeConditions::empty())]);
        let sandbox = Sandbox::with_settings(
            config,
            settings,
            Arc::new(ManualDispatcher::designated()),
        );

        let low = sandbox.stack(sandbox.spawn_at(EntityKind::Bat, Location::new(0.0, 10.0, 0.0)));
        let high = sandbox.stack_of(EntityKind::Bat, 9);
        high.head().teleport(Location::new(0.0, 80.0, 0.0));

        assert_eq!(low.compare(&high), Ordering::Greater);
        assert_eq!(high.compare(&low), Ordering::Less);

        // level flyers fall back to size
        high.head().teleport(Location::new(0.0, 10.0, 0.0));
        assert_eq!(low.compare(&high), Ordering::Less);
    }

    #[test]
    fn display_tracks_mutations() {
        let sandbox = sandbox();
        let stack = sandbox.stack_of(EntityKind::Zombie, 1);
        assert_eq!(stack.display_name(), DisplayName::default());

        stack.merge_in_bulk(2).unwrap();
        assert_eq!(stack.display_name().text.as_deref(), Some("3x Zombie"));

        stack.split().unwrap();
        assert_eq!(stack.display_name().text.as_deref(), Some("2x Zombie"));
    }

    /// Message source that reads and grows the stack it is naming.
    struct GrowingMessages {
        stack: OnceLock<Weak<CreatureStack>>,
        grow: AtomicBool,
        templates: TemplateMessages,
    }

    impl MessageSource for GrowingMessages {
        fn message(&self, key: &str, placeholders: &[(&str, &str)]) -> String {
            if let Some(stack) = self.stack.get().and_then(Weak::upgrade) {
                assert!(stack.size() > 0);
                if self.grow.swap(false, AtomicOrdering::SeqCst) {
                    stack.merge_in_bulk(1).unwrap();
                }
            }
            self.templates.message(key, placeholders)
        }
    }

    #[test]
    fn display_is_derived_outside_the_lock() {
        let sandbox = sandbox();
        let messages = Arc::new(GrowingMessages {
            stack: OnceLock::new(),
            grow: AtomicBool::new(true),
            templates: TemplateMessages::default(),
        });
        let ctx = Arc::new(StackContext {
            messages: messages.clone(),
            ..StackContext::clone(&sandbox.context)
        });
        let stack = Arc::new(CreatureStack::new(ctx, sandbox.spawn(EntityKind::Zombie)));
        stack.merge_in_bulk(2).unwrap();
        let _ = messages.stack.set(Arc::downgrade(&stack));

        let (tx, rx) = mpsc::channel();
        let named = Arc::clone(&stack);
        std::thread::spawn(move || {
            let _ = tx.send(named.display_name());
        });
        let first = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(first.text.as_deref(), Some("3x Zombie"));

        // the mutation made while deriving must not leave a stale tag behind
        assert_eq!(stack.display_name().text.as_deref(), Some("4x Zombie"));
    }
}
