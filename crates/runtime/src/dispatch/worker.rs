use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use stacker_core::Task;
use tokio::runtime::Runtime;
use tracing::{debug, error};

use crate::error::{Result, RuntimeError};

const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Blocking-task pool for loot computation.
#[derive(Debug)]
pub struct WorkerPool {
    threads: usize,
    in_flight: Arc<AtomicUsize>,
    runtime: Mutex<Option<Runtime>>,
}

struct InFlight(Arc<AtomicUsize>);

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl WorkerPool {
    pub fn start(threads: usize) -> Result<Self> {
        let threads = threads.max(1);
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(threads)
            .max_blocking_threads(threads)
            .thread_name("stacker-worker")
            .enable_all()
            .build()
            .map_err(|source| RuntimeError::RuntimeBuild {
                role: "worker",
                source,
            })?;

        debug!(target: "runtime::dispatch", threads, "worker pool started");

        Ok(Self {
            threads,
            in_flight: Arc::new(AtomicUsize::new(0)),
            runtime: Mutex::new(Some(runtime)),
        })
    }

    pub fn threads(&self) -> usize {
        self.threads
    }

    /// Tasks submitted and not yet finished.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Runs `task` on a pool thread. Tasks submitted after shutdown are
    /// dropped with an error log.
    pub fn submit(&self, task: Task) {
        let runtime = self.runtime.lock().unwrap_or_else(PoisonError::into_inner);
        match runtime.as_ref() {
            Some(runtime) => {
                self.in_flight.fetch_add(1, Ordering::SeqCst);
                let guard = InFlight(Arc::clone(&self.in_flight));
                let _ = runtime.spawn_blocking(move || {
                    let _guard = guard;
                    task();
                });
            }
            None => error!(target: "runtime::dispatch", "worker pool closed, task dropped"),
        }
    }

    /// Waits up to a short grace period for running tasks, then stops the pool.
    pub fn shutdown(&self) {
        let runtime = self
            .runtime
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(runtime) = runtime {
            runtime.shutdown_timeout(SHUTDOWN_GRACE);
            debug!(target: "runtime::dispatch", "worker pool stopped");
        }
    }
}
