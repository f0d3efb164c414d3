mod common;

use std::sync::Arc;
use std::sync::mpsc;
use std::time::Duration;

use common::harness;
use stacker_core::{Creature, Dispatcher, EntityKind, Execution, Location, StackerConfig};

const TIMEOUT: Duration = Duration::from_secs(5);

#[test]
fn sensitive_split_requested_from_a_worker_runs_on_the_designated_thread() {
    let h = harness(StackerConfig::default());
    let head = h.world.spawn(EntityKind::EnderDragon, Location::ORIGIN);
    let old_head = head.id();
    let stack = h.runtime.track(head);
    stack.merge_in_bulk(2).unwrap();
    assert!(stack.is_sensitive());

    let (exec_tx, exec_rx) = mpsc::channel();
    let (split_tx, split_rx) = mpsc::channel();
    let dispatcher = h.runtime.dispatcher().clone();
    let worker_stack = Arc::clone(&stack);
    h.runtime.dispatcher().dispatch_worker(Box::new(move || {
        let on_designated = dispatcher.is_designated_thread();
        let execution = worker_stack.split_with_affinity(move |result| {
            let split = result.ok().flatten().map(|dead| dead.size());
            let _ = split_tx.send((dispatcher.is_designated_thread(), split));
        });
        let _ = exec_tx.send((on_designated, execution));
    }));

    let (requested_on_designated, execution) = exec_rx.recv_timeout(TIMEOUT).unwrap();
    assert!(!requested_on_designated);
    assert_eq!(execution, Execution::Resubmitted);

    let (split_on_designated, split) = split_rx.recv_timeout(TIMEOUT).unwrap();
    assert!(split_on_designated);
    assert_eq!(split, Some(1));

    assert_eq!(stack.size(), 2);
    assert_eq!(h.world.materializations(), 1);
    assert_eq!(h.world.materializations_off_designated(), 0);

    let registry = h.runtime.registry();
    assert!(!registry.contains(old_head));
    assert!(registry.contains(stack.head_id()));
    assert!(!registry.is_stacking_suspended());

    h.runtime.shutdown().unwrap();
}

#[test]
fn sensitive_merge_from_a_worker_lands_asynchronously() {
    let h = harness(StackerConfig::default());
    let stack = h
        .runtime
        .track(h.world.spawn(EntityKind::EnderDragon, Location::ORIGIN));
    let member = h.world.spawn(EntityKind::EnderDragon, Location::ORIGIN);

    let (tx, rx) = mpsc::channel();
    let worker_stack = Arc::clone(&stack);
    h.runtime.dispatcher().dispatch_worker(Box::new(move || {
        let _ = tx.send(worker_stack.merge_in(member).ok());
    }));

    assert_eq!(rx.recv_timeout(TIMEOUT).unwrap(), Some(Execution::Resubmitted));
    assert!(h.runtime.dispatcher().flush_designated());
    assert_eq!(stack.size(), 2);

    h.runtime.shutdown().unwrap();
}

#[test]
fn ordinary_split_from_a_worker_runs_inline() {
    let h = harness(StackerConfig::default());
    let stack = h
        .runtime
        .track(h.world.spawn(EntityKind::Zombie, Location::ORIGIN));
    stack.merge_in_bulk(1).unwrap();

    let (tx, rx) = mpsc::channel();
    let dispatcher = h.runtime.dispatcher().clone();
    let worker_stack = Arc::clone(&stack);
    h.runtime.dispatcher().dispatch_worker(Box::new(move || {
        let split = worker_stack.split();
        let _ = tx.send((dispatcher.is_designated_thread(), split.is_ok()));
    }));

    assert_eq!(rx.recv_timeout(TIMEOUT).unwrap(), (false, true));
    assert_eq!(stack.size(), 1);
    assert_eq!(h.world.materializations_off_designated(), 1);

    h.runtime.shutdown().unwrap();
}
