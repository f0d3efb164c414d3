//! Threading model backing the engine's [`Dispatcher`] contract.
//!
//! - [`DesignatedThread`] is a named OS thread draining a FIFO queue; it is
//!   the only thread allowed to perform sensitive mutations.
//! - [`WorkerPool`] is a multi-threaded tokio runtime used for loot
//!   computation.
//!
//! [`RuntimeDispatcher`] combines both and is what the stack context holds.
mod designated;
mod worker;

pub use designated::DesignatedThread;
pub use worker::WorkerPool;

use std::thread;
use std::time::{Duration, Instant};

use stacker_core::{Dispatcher, Task};

use crate::config::RuntimeConfig;
use crate::error::Result;

/// Dispatcher backed by a designated thread and a worker pool.
#[derive(Debug)]
pub struct RuntimeDispatcher {
    designated: DesignatedThread,
    workers: WorkerPool,
}

impl RuntimeDispatcher {
    pub fn start(config: &RuntimeConfig) -> Result<Self> {
        Ok(Self {
            designated: DesignatedThread::spawn(&config.designated_thread_name)?,
            workers: WorkerPool::start(config.worker_threads)?,
        })
    }

    pub fn designated(&self) -> &DesignatedThread {
        &self.designated
    }

    pub fn workers(&self) -> &WorkerPool {
        &self.workers
    }

    /// Blocks until every task queued on the designated thread so far has run.
    ///
    /// Must not be called from the designated thread itself.
    pub fn flush_designated(&self) -> bool {
        self.designated.flush()
    }

    /// Blocks until both contexts are idle: no worker task is running and
    /// the designated queue holds nothing that was queued before the check.
    ///
    /// Returns `false` on timeout, on a closed designated queue, or when
    /// called from the designated thread.
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            if !self.flush_designated() {
                return false;
            }
            if self.workers.in_flight() == 0 {
                // Workers hand results back to the designated thread before
                // they finish, so one more flush settles those.
                if !self.flush_designated() {
                    return false;
                }
                if self.workers.in_flight() == 0 {
                    return true;
                }
            }
            if Instant::now() >= deadline {
                return false;
            }
            thread::sleep(Duration::from_millis(1));
        }
    }

    /// Stops accepting work, then waits for both contexts to drain.
    pub fn shutdown(&self) -> Result<()> {
        self.workers.shutdown();
        self.designated.shutdown()
    }
}

impl Dispatcher for RuntimeDispatcher {
    fn is_designated_thread(&self) -> bool {
        self.designated.is_current()
    }

    fn dispatch_designated(&self, task: Task) {
        self.designated.submit(task);
    }

    fn dispatch_worker(&self, task: Task) {
        self.workers.submit(task);
    }
}
