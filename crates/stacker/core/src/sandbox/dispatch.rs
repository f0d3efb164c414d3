use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use crate::env::{Dispatcher, Task};

/// Dispatcher whose queues are drained explicitly by the test.
///
/// Whether the caller counts as the designated thread is a flag rather than a
/// thread identity, so a single test thread can play both roles.
#[derive(Default)]
pub struct ManualDispatcher {
    on_designated: AtomicBool,
    designated: Mutex<VecDeque<Task>>,
    worker: Mutex<VecDeque<Task>>,
}

impl ManualDispatcher {
    /// Callers start out on the designated thread.
    pub fn designated() -> Self {
        let dispatcher = Self::default();
        dispatcher.on_designated.store(true, Ordering::SeqCst);
        dispatcher
    }

    /// Callers start out on the worker context.
    pub fn detached() -> Self {
        Self::default()
    }

    pub fn set_on_designated(&self, on_designated: bool) {
        self.on_designated.store(on_designated, Ordering::SeqCst);
    }

    pub fn pending_designated(&self) -> usize {
        self.designated
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn pending_worker(&self) -> usize {
        self.worker.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Runs designated tasks, including ones queued while draining, as the
    /// designated thread. Returns how many ran.
    pub fn run_designated(&self) -> usize {
        self.drain(&self.designated, true)
    }

    /// Runs worker tasks off the designated thread. Returns how many ran.
    pub fn run_worker(&self) -> usize {
        self.drain(&self.worker, false)
    }

    fn drain(&self, queue: &Mutex<VecDeque<Task>>, as_designated: bool) -> usize {
        let previous = self.on_designated.swap(as_designated, Ordering::SeqCst);
        let mut ran = 0;
        loop {
            let next = queue.lock().unwrap_or_else(PoisonError::into_inner).pop_front();
            let Some(task) = next else {
                break;
            };
            task();
            ran += 1;
        }
        self.on_designated.store(previous, Ordering::SeqCst);
        ran
    }
}

impl Dispatcher for ManualDispatcher {
    fn is_designated_thread(&self) -> bool {
        self.on_designated.load(Ordering::SeqCst)
    }

    fn dispatch_designated(&self, task: Task) {
        self.designated
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(task);
    }

    fn dispatch_worker(&self, task: Task) {
        self.worker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(task);
    }
}
