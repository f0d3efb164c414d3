use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, mpsc};
use std::time::{Duration, Instant};

use anyhow::{Context, Result, bail};
use clap::Parser;
use stacker_core::sandbox::{RecordingPlacement, SandboxWorld};
use stacker_core::{
    Creature, CreatureStack, DamageCause, DamageSource, Drops, DropsObserver, EntityKind, Killer,
    Location, StackContext,
};
use stacker_runtime::{InMemoryStackRegistry, StackerRuntime};
use tracing::{info, warn};

const SETTLE_TIMEOUT: Duration = Duration::from_secs(30);
const SIM_KILLER_ID: u64 = 1;

/// Spawn a population, stack it, and kill it off
#[derive(Parser, Debug)]
pub struct Run {
    /// Creature type to spawn
    #[arg(long, default_value = "zombie")]
    pub kind: EntityKind,

    /// Number of creatures to spawn
    #[arg(long, default_value_t = 200)]
    pub population: usize,

    /// Spawn every Nth creature as a juvenile (0 disables)
    #[arg(long, default_value_t = 0)]
    pub juvenile_every: usize,

    /// Members killed by each partial kill
    #[arg(long, default_value_t = 5)]
    pub partial: usize,

    /// Partial kills per stack before the remainder dies at once
    #[arg(long, default_value_t = 2)]
    pub rounds: usize,

    /// Compute loot on the designated thread instead of the worker pool
    #[arg(long)]
    pub sync_loot: bool,

    /// Content directory; shipped content when omitted
    #[arg(long)]
    pub data_dir: Option<PathBuf>,
}

/// Counts finished loot computations and the items they produced.
#[derive(Default)]
struct LootTally {
    computations: AtomicUsize,
    items: AtomicU64,
}

impl DropsObserver for LootTally {
    fn on_stack_drops(&self, _kind: EntityKind, drops: &mut Drops) {
        self.computations.fetch_add(1, Ordering::Relaxed);
        let items: u64 = drops.items.iter().map(|item| u64::from(item.amount)).sum();
        self.items.fetch_add(items, Ordering::Relaxed);
    }
}

impl Run {
    pub fn execute(self) -> Result<()> {
        if self.population == 0 {
            bail!("--population must be at least 1");
        }

        let mut config = super::load_config(self.data_dir.clone())?;
        if self.sync_loot {
            config.stacker.loot.compute_async = false;
        }

        let world = Arc::new(SandboxWorld::new());
        let placement = Arc::new(RecordingPlacement::new());
        let runtime = StackerRuntime::builder()
            .config(config)
            .adapter(world.clone())
            .loot_rules(world.clone())
            .placement(placement.clone())
            .build()?;
        world.watch_dispatcher(runtime.dispatcher().clone());

        let started = Instant::now();
        let stacks = self.populate(&runtime, &world)?;
        let largest = stacks.iter().map(|stack| stack.size()).max().unwrap_or(0);
        info!(
            target: "sim",
            kind = %self.kind,
            population = self.population,
            stacks = stacks.len(),
            largest,
            "population stacked"
        );

        let tally = Arc::new(LootTally::default());
        self.kill_off(&runtime, &world, stacks, &tally)?;

        if !runtime.dispatcher().wait_idle(SETTLE_TIMEOUT) {
            warn!(target: "sim", "loot did not settle before timeout");
        }
        let elapsed = started.elapsed();

        self.report(&world, &placement, &tally, elapsed);
        runtime.shutdown()?;
        Ok(())
    }

    /// Spawns the population on the designated thread, folding every
    /// newcomer into the best stack that accepts it.
    fn populate(
        &self,
        runtime: &StackerRuntime,
        world: &Arc<SandboxWorld>,
    ) -> Result<Vec<Arc<CreatureStack>>> {
        let ctx = Arc::clone(runtime.context());
        let registry = Arc::clone(runtime.registry());
        let world = Arc::clone(world);
        let (kind, population, juvenile_every) = (self.kind, self.population, self.juvenile_every);

        let (tx, rx) = mpsc::channel();
        runtime.run_on_designated_blocking(move || {
            let _ = tx.send(spawn_and_stack(
                &ctx,
                &world,
                &registry,
                kind,
                population,
                juvenile_every,
            ));
        });
        rx.recv().context("designated thread stopped while populating")?
    }

    fn kill_off(
        &self,
        runtime: &StackerRuntime,
        world: &Arc<SandboxWorld>,
        stacks: Vec<Arc<CreatureStack>>,
        tally: &Arc<LootTally>,
    ) -> Result<()> {
        let registry = Arc::clone(runtime.registry());
        let world = Arc::clone(world);
        let observer: Arc<dyn DropsObserver> = tally.clone();
        let (partial, rounds) = (self.partial, self.rounds);

        let finished = runtime.run_on_designated_blocking(move || {
            for stack in stacks {
                kill_stack(&stack, &world, &registry, partial, rounds, &observer);
            }
        });
        if !finished {
            bail!("designated thread stopped while killing");
        }
        Ok(())
    }

    fn report(
        &self,
        world: &SandboxWorld,
        placement: &RecordingPlacement,
        tally: &LootTally,
        elapsed: Duration,
    ) {
        let mut materials: BTreeMap<String, u64> = BTreeMap::new();
        for (items, _) in placement.drops() {
            for item in items {
                *materials.entry(item.material).or_default() += u64::from(item.amount);
            }
        }

        println!("kind:                  {}", self.kind);
        println!("population:            {}", self.population);
        println!("loot computations:     {}", tally.computations.load(Ordering::Relaxed));
        println!("items computed:        {}", tally.items.load(Ordering::Relaxed));
        for (material, amount) in &materials {
            println!("  {material:<20} {amount}");
        }
        println!("experience:            {}", placement.experience());
        println!("materializations:      {}", world.materializations());
        println!("  off designated:      {}", world.materializations_off_designated());
        println!("survivors:             {}", world.live_count(self.kind));
        println!("elapsed:               {elapsed:?}");
    }
}

fn spawn_and_stack(
    ctx: &Arc<StackContext>,
    world: &SandboxWorld,
    registry: &InMemoryStackRegistry,
    kind: EntityKind,
    population: usize,
    juvenile_every: usize,
) -> Result<Vec<Arc<CreatureStack>>> {
    let mut stacks: Vec<Arc<CreatureStack>> = Vec::new();

    for index in 0..population {
        let creature = world.spawn(kind, Location::ORIGIN);
        if juvenile_every > 0 && index % juvenile_every == juvenile_every - 1 {
            creature.set_juvenile(true);
        }
        let candidate = CreatureStack::new(Arc::clone(ctx), creature.clone());

        let target = stacks
            .iter()
            .filter(|stack| ctx.settings.can_merge(stack, &candidate, false))
            .max_by(|a, b| a.compare(b));

        if let Some(stack) = target {
            stack.absorb(&candidate)?;
            creature.remove();
            continue;
        }

        let stack = Arc::new(candidate);
        registry.register(Arc::clone(&stack));
        stacks.push(stack);
    }

    Ok(stacks)
}

fn kill_stack(
    stack: &Arc<CreatureStack>,
    world: &SandboxWorld,
    registry: &InMemoryStackRegistry,
    partial: usize,
    rounds: usize,
    observer: &Arc<dyn DropsObserver>,
) {
    for _ in 0..rounds {
        if !registry.contains(stack.head_id()) {
            return;
        }
        slay_head(stack, world);
        if stack.is_entire_stack_killed_on_death(None) {
            stack.kill_entire_stack(None, Some(Arc::clone(observer)));
            return;
        }
        stack.kill_partial_stack(None, partial.max(1), Some(Arc::clone(observer)));
    }

    if registry.contains(stack.head_id()) {
        slay_head(stack, world);
        stack.kill_entire_stack(None, Some(Arc::clone(observer)));
    }
}

/// Marks the current head as killed by the simulation's player.
fn slay_head(stack: &CreatureStack, world: &SandboxWorld) {
    let head = stack.head();
    head.set_last_damage(Some(DamageSource::new(DamageCause::EntityAttack)));
    head.set_killer(Some(Killer::new(SIM_KILLER_ID, "sim")));
    if let Some(creature) = world.creature(head.id()) {
        creature.kill();
    }
}
