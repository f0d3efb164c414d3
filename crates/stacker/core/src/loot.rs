//! Aggregated drops for many stack members at once.
//!
//! Computing drops is split in two phases. [`CreatureStack::plan_drops`] is
//! cheap and synchronous: it copies the head's death context, captures the
//! head when it is rolled too, and clones the sampled member snapshots while
//! the stack is locked. [`DropPlan::compute`]
//! does the expensive part (materializing members, rolling loot) and only
//! touches the detached copies, so it may run on any thread and concurrently
//! with further mutations of the stack.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::env::{Creature, CreatureHandle};
use crate::settings::EntityStackSettings;
use crate::stack::{CreatureStack, StackContext};
use crate::storage::MemberSnapshot;
use crate::types::{DamageSource, EntityKind, ItemStack, Killer, Location, multiply_items};

/// Items and experience produced by one or more deaths.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Drops {
    pub items: Vec<ItemStack>,
    pub experience: u32,
}

impl Drops {
    pub fn new(items: Vec<ItemStack>, experience: u32) -> Self {
        Self { items, experience }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty() && self.experience == 0
    }

    /// Total amount of `material` across all item stacks.
    pub fn amount_of(&self, material: &str) -> u64 {
        self.items
            .iter()
            .filter(|item| item.material == material)
            .map(|item| u64::from(item.amount))
            .sum()
    }
}

/// Hook for adjusting drops while they are computed.
///
/// Called from whatever thread runs the computation.
pub trait DropsObserver: Send + Sync {
    /// One loot roll of an adult member, before it is aggregated.
    fn on_member_drops(&self, _member: &dyn Creature, _drops: &mut Drops) {}

    /// The aggregated result, after approximation scaling.
    fn on_stack_drops(&self, _kind: EntityKind, _drops: &mut Drops) {}
}

/// Which members to compute drops for.
#[derive(Clone, Debug, Default)]
pub struct DropRequest {
    /// Stored members to sample, used only when `members` is empty.
    pub count: usize,
    /// Explicit creatures to compute drops for.
    pub members: Vec<CreatureHandle>,
    pub include_head: bool,
    /// Experience granted per adult loot roll.
    pub experience_per_unit: u32,
    pub looting: Option<u32>,
}

impl DropRequest {
    pub fn count(count: usize) -> Self {
        Self {
            count,
            ..Self::default()
        }
    }

    pub fn members(members: Vec<CreatureHandle>) -> Self {
        Self {
            members,
            ..Self::default()
        }
    }

    pub fn with_head(mut self) -> Self {
        self.include_head = true;
        self
    }

    pub fn with_experience(mut self, per_unit: u32) -> Self {
        self.experience_per_unit = per_unit;
        self
    }

    pub fn with_looting(mut self, level: u32) -> Self {
        self.looting = Some(level);
        self
    }
}

enum Sampled {
    Live(CreatureHandle),
    Stored(MemberSnapshot),
}

/// Members and death context captured for a later drop computation.
pub struct DropPlan {
    kind: EntityKind,
    settings: Option<Arc<EntityStackSettings>>,
    location: Location,
    killer: Option<Killer>,
    fire_ticks: i32,
    last_damage: Option<DamageSource>,
    members: Vec<Sampled>,
    multiplier: f64,
    experience_per_unit: u32,
    looting: Option<u32>,
}

impl DropPlan {
    /// Factor applied to the sampled drops to stand in for the full count.
    pub fn multiplier(&self) -> f64 {
        self.multiplier
    }

    /// Number of members that will actually be rolled.
    pub fn sampled(&self) -> usize {
        self.members.len()
    }

    pub fn location(&self) -> Location {
        self.location
    }

    /// Rolls loot for every sampled member and aggregates the result.
    ///
    /// Stored members of sensitive types are materialized here, so for those
    /// the caller must run this on the designated thread.
    pub fn compute(self, ctx: &StackContext, observer: Option<&dyn DropsObserver>) -> Drops {
        let loot = &ctx.config.loot;
        let behavior = self
            .settings
            .as_ref()
            .map(|settings| settings.behavior)
            .unwrap_or_default();
        let bonus_drops = self.bonus_drops(ctx);

        let mut rng = rand::thread_rng();
        let mut total = Drops::default();

        for sampled in &self.members {
            let member = match sampled {
                Sampled::Live(creature) => Arc::clone(creature),
                Sampled::Stored(snapshot) => {
                    match ctx
                        .adapter
                        .materialize(snapshot, self.kind, self.location, false)
                    {
                        Ok(creature) => creature,
                        Err(err) => {
                            warn!(
                                target: "stacker::loot",
                                kind = %self.kind,
                                error = %err,
                                "skipping member that failed to materialize"
                            );
                            continue;
                        }
                    }
                }
            };

            member.set_fire_ticks(self.fire_ticks);
            member.set_last_damage(self.last_damage.clone());
            member.set_killer(self.killer.clone());

            let rolls = behavior.loot_rolls(member.as_ref(), loot.precise_splitting_drops, &mut rng);
            behavior.prepare_for_loot(member.as_ref());

            if !member.is_juvenile() {
                for _ in 0..rolls {
                    let mut drops = self.roll(ctx, member.as_ref(), &bonus_drops);
                    if let Some(observer) = observer {
                        observer.on_member_drops(member.as_ref(), &mut drops);
                    }
                    total.items.append(&mut drops.items);
                    total.experience = total.experience.saturating_add(drops.experience);
                }
            }

            behavior.settle(member.as_ref());
        }

        if self.multiplier > 1.0 {
            total.items = multiply_items(&total.items, self.multiplier);
            total.experience = scale_experience(total.experience, self.multiplier);
        }

        if let Some(observer) = observer {
            observer.on_stack_drops(self.kind, &mut total);
        }

        debug!(
            target: "stacker::loot",
            kind = %self.kind,
            sampled = self.members.len(),
            multiplier = self.multiplier,
            items = total.items.len(),
            experience = total.experience,
            "computed stack drops"
        );

        total
    }

    fn roll(&self, ctx: &StackContext, member: &dyn Creature, bonus_drops: &[ItemStack]) -> Drops {
        let mut items =
            ctx.loot_rules
                .natural_loot(member, self.killer.as_ref(), self.location, self.looting);
        items.extend(bonus_drops.iter().cloned());
        Drops::new(items, self.experience_per_unit)
    }

    /// Type bonus drops plus any killer bonus matching the last damager.
    fn bonus_drops(&self, ctx: &StackContext) -> Vec<ItemStack> {
        let mut bonus = self
            .settings
            .as_ref()
            .map(|settings| settings.bonus_drops.clone())
            .unwrap_or_default();

        if let Some(damager) = self.last_damage.as_ref().and_then(|source| source.damager) {
            bonus.extend(
                ctx.config
                    .loot
                    .killer_bonus_drops
                    .iter()
                    .filter(|bonus| bonus.killers.contains(&damager))
                    .map(|bonus| bonus.item.clone()),
            );
        }

        bonus
    }
}

fn scale_experience(experience: u32, multiplier: f64) -> u32 {
    let scaled = (f64::from(experience) * multiplier).round();
    if scaled >= f64::from(u32::MAX) {
        u32::MAX
    } else {
        scaled.max(0.0) as u32
    }
}

impl CreatureStack {
    /// Samples the members a drop computation will roll.
    ///
    /// `request.count` is clamped to the stack size. Above the approximation
    /// threshold only `approximation_amount` members are sampled and the
    /// result is scaled up by `count / approximation_amount`.
    pub fn plan_drops(&self, request: DropRequest) -> DropPlan {
        let DropRequest {
            count,
            members,
            include_head,
            experience_per_unit,
            looting,
        } = request;
        let loot = &self.ctx.config.loot;

        let use_count = members.is_empty();
        let mut sampled: Vec<Sampled> = members.into_iter().map(Sampled::Live).collect();
        let mut multiplier = 1.0;

        // The head keeps living after its drops are rolled, so it is rolled
        // as a detached copy like any stored member.
        let head = self.head();
        if include_head {
            match self.ctx.adapter.capture(head.as_ref()) {
                Ok(snapshot) => sampled.push(Sampled::Stored(snapshot)),
                Err(err) => warn!(
                    target: "stacker::loot",
                    kind = %self.kind,
                    error = %err,
                    "skipping head that failed to capture"
                ),
            }
        }

        {
            let inner = self.lock();

            if use_count {
                let count = count.min(inner.storage.len() + 1);
                let threshold = loot.approximation_threshold as usize;
                let amount = loot.approximation_amount as usize;

                let limit = if loot.approximation_enabled && count > threshold && amount > 0 {
                    multiplier = count as f64 / amount as f64;
                    amount.saturating_sub(sampled.len())
                } else {
                    count
                };

                inner.storage.for_each_capped(limit, &mut |snapshot: &MemberSnapshot| {
                    sampled.push(Sampled::Stored(snapshot.clone()));
                });
            }
        }

        DropPlan {
            kind: self.kind,
            settings: self.settings.clone(),
            location: head.location(),
            killer: head.killer(),
            fire_ticks: head.fire_ticks(),
            last_damage: head.last_damage(),
            members: sampled,
            multiplier,
            experience_per_unit,
            looting,
        }
    }

    /// Plans and computes drops on the calling thread.
    pub fn compute_drops(&self, request: DropRequest, observer: Option<&dyn DropsObserver>) -> Drops {
        self.plan_drops(request).compute(&self.ctx, observer)
    }
}
