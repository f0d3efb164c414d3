//! Thread-affinity contract.
//!
//! The host simulation has one designated thread that may perform sensitive
//! mutations, and an unbounded worker context for CPU-bound work. The engine
//! never spawns threads itself: it hands boxed tasks to a [`Dispatcher`].

/// Fire-and-forget unit of work.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Routes tasks to the designated thread or to the worker context.
///
/// Implementations must run every task they accept exactly once. A designated
/// thread that stops draining its queue is an environment failure the engine
/// does not try to recover from.
pub trait Dispatcher: Send + Sync {
    /// Whether the calling thread is the designated thread.
    fn is_designated_thread(&self) -> bool;

    /// Queues `task` for the designated thread. Never runs it inline.
    fn dispatch_designated(&self, task: Task);

    /// Queues `task` on the worker context.
    fn dispatch_worker(&self, task: Task);
}

/// Where an affinity-routed task ended up running.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Execution {
    /// Ran on the calling thread before returning.
    Inline,
    /// Queued for the designated thread.
    Resubmitted,
    /// Queued on the worker context.
    Offloaded,
}

/// Runs `task` inline unless it is sensitive and the caller is not the
/// designated thread, in which case it is resubmitted without blocking.
pub fn run_with_affinity<F>(dispatcher: &dyn Dispatcher, sensitive: bool, task: F) -> Execution
where
    F: FnOnce() + Send + 'static,
{
    if sensitive && !dispatcher.is_designated_thread() {
        dispatcher.dispatch_designated(Box::new(task));
        Execution::Resubmitted
    } else {
        task();
        Execution::Inline
    }
}

/// Runs `task` on the designated thread: inline if already there, resubmitted otherwise.
pub fn run_on_designated<F>(dispatcher: &dyn Dispatcher, task: F) -> Execution
where
    F: FnOnce() + Send + 'static,
{
    run_with_affinity(dispatcher, true, task)
}

/// Picks the context for loot computation.
///
/// Async computation started on the designated thread moves to the worker
/// context; sync computation started off it moves to the designated thread.
/// Every other combination runs inline.
pub fn run_computation<F>(dispatcher: &dyn Dispatcher, compute_async: bool, task: F) -> Execution
where
    F: FnOnce() + Send + 'static,
{
    let designated = dispatcher.is_designated_thread();
    if compute_async && designated {
        dispatcher.dispatch_worker(Box::new(task));
        Execution::Offloaded
    } else if !compute_async && !designated {
        dispatcher.dispatch_designated(Box::new(task));
        Execution::Resubmitted
    } else {
        task();
        Execution::Inline
    }
}
