mod common;

use std::sync::Arc;
use std::time::Duration;

use common::harness;
use stacker_core::{Creature, EntityKind, Location, SettingsProvider, StackerConfig};
use stacker_runtime::{RuntimeError, StackerRuntime};

const TIMEOUT: Duration = Duration::from_secs(5);

#[test]
fn entire_stack_loot_is_computed_on_workers_and_placed_on_designated() {
    let h = harness(StackerConfig::default());
    let head = h.world.spawn(EntityKind::Zombie, Location::ORIGIN);
    let head_id = head.id();
    let stack = h.runtime.track(head);
    stack.merge_in_bulk(9).unwrap();

    let killed = Arc::clone(&stack);
    assert!(
        h.runtime
            .run_on_designated_blocking(move || killed.kill_entire_stack(None, None))
    );

    assert!(h.runtime.dispatcher().wait_idle(TIMEOUT));
    assert_eq!(h.placement.amount_of("rotten_flesh"), 9);
    assert_eq!(h.placement.experience(), 50);
    assert!(h.world.materializations_off_designated() > 0);
    assert!(h.world.is_removed(head_id));
    assert!(h.runtime.registry().is_empty());

    h.runtime.shutdown().unwrap();
}

#[test]
fn partial_kill_promotes_a_new_head_and_drops_for_the_killed_members() {
    let h = harness(StackerConfig::default());
    let stack = h
        .runtime
        .track(h.world.spawn(EntityKind::Zombie, Location::ORIGIN));
    stack.merge_in_bulk(9).unwrap();
    let old_head = stack.head_id();

    let killed = Arc::clone(&stack);
    assert!(
        h.runtime
            .run_on_designated_blocking(move || killed.kill_partial_stack(None, 4, None))
    );

    assert_eq!(stack.size(), 6);
    assert_ne!(stack.head_id(), old_head);
    assert!(h.runtime.stack_of(stack.head_id()).is_some());
    assert!(h.runtime.dispatcher().wait_idle(TIMEOUT));
    assert_eq!(h.placement.amount_of("rotten_flesh"), 3);
    assert_eq!(h.placement.experience(), 20);

    h.runtime.shutdown().unwrap();
}

#[test]
fn synchronous_loot_requested_off_thread_moves_to_designated() {
    let mut config = StackerConfig::default();
    config.loot.compute_async = false;
    let h = harness(config);
    let stack = h
        .runtime
        .track(h.world.spawn(EntityKind::Skeleton, Location::ORIGIN));
    stack.merge_in_bulk(2).unwrap();

    stack.kill_entire_stack(None, None);

    assert!(h.runtime.dispatcher().wait_idle(TIMEOUT));
    assert_eq!(h.placement.amount_of("bone"), 2);
    assert_eq!(h.world.materializations_off_designated(), 0);

    h.runtime.shutdown().unwrap();
}

#[test]
fn builder_requires_host_collaborators() {
    let err = StackerRuntime::builder().build().unwrap_err();
    assert!(matches!(err, RuntimeError::MissingCollaborator(_)));
}

#[test]
fn shipped_content_fills_missing_settings() {
    let world = Arc::new(stacker_core::sandbox::SandboxWorld::new());
    let runtime = StackerRuntime::builder()
        .adapter(world.clone())
        .loot_rules(world.clone())
        .placement(Arc::new(stacker_core::sandbox::RecordingPlacement::new()))
        .build()
        .unwrap();

    let dragon = runtime
        .context()
        .settings
        .settings(EntityKind::EnderDragon)
        .unwrap();
    assert!(dragon.sensitive);

    runtime.shutdown().unwrap();
}
