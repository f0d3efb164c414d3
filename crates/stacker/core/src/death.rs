//! Death handling: whole-stack kills, partial kills and drop placement.

use std::sync::Arc;

use tracing::{debug, error, info};

use crate::env::{Execution, run_computation, run_on_designated};
use crate::loot::{DropRequest, Drops, DropsObserver};
use crate::stack::{CreatureStack, StackContext};
use crate::types::{ItemStack, Killer, Location};

/// The natural death that triggered a stack kill.
///
/// The head's own drops and experience are taken out of the event and summed
/// into the stack aggregate, so the host must place whatever is left in the
/// event after the kill returns (usually nothing).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DeathEvent {
    pub drops: Vec<ItemStack>,
    pub experience: u32,
}

impl DeathEvent {
    pub fn new(drops: Vec<ItemStack>, experience: u32) -> Self {
        Self { drops, experience }
    }
}

fn saturating_u32(value: usize) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

impl CreatureStack {
    /// Whether the head's death should take the whole stack with it.
    ///
    /// `override_killer` replaces the head's recorded killer for the
    /// privilege check.
    pub fn is_entire_stack_killed_on_death(&self, override_killer: Option<&Killer>) -> bool {
        let death = &self.ctx.config.death;
        let head = self.head();

        if self
            .settings
            .as_ref()
            .is_some_and(|settings| settings.kill_entire_stack_on_death)
        {
            return true;
        }

        if death.kill_entire_stack_when_ai_disabled && head.ai_disabled() {
            return true;
        }

        if let Some(source) = head.last_damage() {
            let cause = source.cause.as_ref();
            if death
                .kill_entire_stack_conditions
                .iter()
                .any(|condition| condition.eq_ignore_ascii_case(cause))
            {
                return true;
            }
        }

        match override_killer {
            Some(killer) => killer.kill_entire_stack,
            None => head.killer().is_some_and(|killer| killer.kill_entire_stack),
        }
    }

    /// Kills every member at once and deregisters the stack.
    pub fn kill_entire_stack(
        self: &Arc<Self>,
        event: Option<&mut DeathEvent>,
        observer: Option<Arc<dyn DropsObserver>>,
    ) {
        let loot = &self.ctx.config.loot;
        let head = self.head();
        let size = self.size();
        let experience = event
            .as_ref()
            .map(|event| event.experience)
            .unwrap_or_else(|| self.ctx.loot_rules.base_experience(head.as_ref()));

        if loot.accurate_items {
            self.behavior().prepare_for_loot(head.as_ref());
            let existing = take_event_drops(event);
            self.drop_partial_stack_loot(size, existing, experience, observer);
        } else if loot.accurate_experience {
            let total = experience.saturating_mul(saturating_u32(size));
            self.place_experience(event, head.location(), total);
        }

        if size > 1 {
            self.record_kills(head.killer(), size - 1);
        }

        self.ctx.registry.deregister(self);
        if !head.is_dead() {
            head.remove();
        }

        info!(
            target: "stacker::death",
            kind = %self.kind,
            head = %head.id(),
            size,
            "killed entire stack"
        );
    }

    /// Kills `amount` members, promoting a new head if any remain.
    ///
    /// Amounts covering the whole stack kill it entirely.
    pub fn kill_partial_stack(
        self: &Arc<Self>,
        event: Option<&mut DeathEvent>,
        amount: usize,
        observer: Option<Arc<dyn DropsObserver>>,
    ) {
        let size = self.size();
        if amount == 0 {
            return;
        }

        if amount == 1 {
            if size == 1 {
                self.ctx.registry.deregister(self);
            } else {
                self.split_after_death();
            }
            return;
        }

        if amount >= size {
            self.kill_entire_stack(event, observer);
            return;
        }

        let loot = &self.ctx.config.loot;
        let head = self.head();
        let experience = event
            .as_ref()
            .map(|event| event.experience)
            .unwrap_or_else(|| self.ctx.loot_rules.base_experience(head.as_ref()));

        if loot.accurate_items {
            let existing = take_event_drops(event);
            self.drop_partial_stack_loot(amount, existing, experience, observer);
        } else if loot.accurate_experience {
            let total = experience.saturating_mul(saturating_u32(amount));
            self.place_experience(event, head.location(), total);
        }

        let popped = self.pop_members(amount - 1);
        self.split_after_death();
        self.behavior().settle(head.as_ref());
        self.record_kills(head.killer(), popped);

        debug!(
            target: "stacker::death",
            kind = %self.kind,
            amount,
            remaining = self.size(),
            "killed part of stack"
        );
    }

    /// Computes drops for `count - 1` stored members and places them together
    /// with `existing` loot and `experience` from the head.
    ///
    /// Members are sampled before this returns; computation runs inline or on
    /// the worker context per configuration, and placement always happens on
    /// the designated thread.
    pub fn drop_partial_stack_loot(
        self: &Arc<Self>,
        count: usize,
        existing: Vec<ItemStack>,
        experience: u32,
        observer: Option<Arc<dyn DropsObserver>>,
    ) -> Execution {
        let plan = self.plan_drops(
            DropRequest::count(count.saturating_sub(1)).with_experience(experience),
        );
        let location = plan.location();
        let ctx = Arc::clone(&self.ctx);

        let task = move || {
            let mut drops = plan.compute(&ctx, observer.as_deref());
            drops.items.extend(existing);
            drops.experience = drops.experience.saturating_add(experience);

            let apply_ctx = Arc::clone(&ctx);
            run_on_designated(ctx.dispatcher.as_ref(), move || {
                apply_drops(&apply_ctx, drops, location);
            });
        };

        // Stored members of sensitive types may only be materialized on the
        // designated thread.
        if self.is_sensitive() {
            run_on_designated(self.ctx.dispatcher.as_ref(), task)
        } else {
            run_computation(
                self.ctx.dispatcher.as_ref(),
                self.ctx.config.loot.compute_async,
                task,
            )
        }
    }

    fn split_after_death(self: &Arc<Self>) {
        let kind = self.kind;
        self.split_with_affinity(move |result| match result {
            Ok(Some(dead)) => {
                debug!(target: "stacker::death", %kind, head = %dead.head_id(), "promoted new head");
            }
            Ok(None) => {}
            Err(err) => {
                error!(target: "stacker::death", %kind, error = %err, "failed to promote new head");
            }
        });
    }

    fn place_experience(&self, event: Option<&mut DeathEvent>, location: Location, total: u32) {
        match event {
            Some(event) => event.experience = total,
            None => {
                let placement = Arc::clone(&self.ctx.placement);
                run_on_designated(self.ctx.dispatcher.as_ref(), move || {
                    placement.spawn_experience(location, total);
                });
            }
        }
    }

    fn record_kills(&self, killer: Option<Killer>, count: usize) {
        if !self.ctx.config.death.track_statistics || count == 0 {
            return;
        }
        if let Some(killer) = killer {
            self.ctx
                .placement
                .record_kills(&killer, self.kind, saturating_u32(count));
        }
    }
}

fn take_event_drops(event: Option<&mut DeathEvent>) -> Vec<ItemStack> {
    match event {
        Some(event) => {
            event.experience = 0;
            std::mem::take(&mut event.drops)
        }
        None => Vec::new(),
    }
}

/// Hands computed drops to placement. Runs on the designated thread.
fn apply_drops(ctx: &StackContext, drops: Drops, location: Location) {
    let Drops { items, experience } = drops;
    if !items.is_empty() {
        ctx.placement.accept_drops(items, location);
    }
    if ctx.config.loot.accurate_experience && experience > 0 {
        ctx.placement.spawn_experience(location, experience);
    }
}
