use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Mutex, PoisonError, mpsc as std_mpsc};
use std::thread::{self, JoinHandle, ThreadId};

use stacker_core::Task;
use tokio::sync::mpsc;
use tracing::{debug, error};

use crate::error::{Result, RuntimeError};

/// A named thread that runs submitted tasks one at a time, in order.
///
/// The thread drives a current-thread tokio runtime so hosts can later await
/// inside designated work without changing the queue.
#[derive(Debug)]
pub struct DesignatedThread {
    name: String,
    id: ThreadId,
    sender: Mutex<Option<mpsc::UnboundedSender<Task>>>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl DesignatedThread {
    pub fn spawn(name: &str) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|source| RuntimeError::RuntimeBuild {
                role: "designated",
                source,
            })?;

        let (sender, receiver) = mpsc::unbounded_channel::<Task>();
        let handle = thread::Builder::new()
            .name(name.to_owned())
            .spawn(move || runtime.block_on(drain(receiver)))
            .map_err(|source| RuntimeError::ThreadSpawn {
                name: name.to_owned(),
                source,
            })?;

        debug!(target: "runtime::dispatch", thread = name, "designated thread started");

        Ok(Self {
            name: name.to_owned(),
            id: handle.thread().id(),
            sender: Mutex::new(Some(sender)),
            handle: Mutex::new(Some(handle)),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_current(&self) -> bool {
        thread::current().id() == self.id
    }

    /// Queues `task`. Tasks submitted after shutdown are dropped with an error log.
    pub fn submit(&self, task: Task) {
        let sender = self.sender.lock().unwrap_or_else(PoisonError::into_inner);
        let delivered = match sender.as_ref() {
            Some(sender) => sender.send(task).is_ok(),
            None => false,
        };
        if !delivered {
            error!(
                target: "runtime::dispatch",
                thread = %self.name,
                "designated queue closed, task dropped"
            );
        }
    }

    /// Waits for a marker task to run. Returns `false` if the queue is closed
    /// or when called from the designated thread, where waiting would deadlock.
    pub fn flush(&self) -> bool {
        if self.is_current() {
            return false;
        }
        let (done, wait) = std_mpsc::channel();
        self.submit(Box::new(move || {
            let _ = done.send(());
        }));
        wait.recv().is_ok()
    }

    /// Closes the queue and joins the thread once queued tasks have run.
    pub fn shutdown(&self) -> Result<()> {
        self.sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        let handle = self
            .handle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            if self.is_current() {
                return Ok(());
            }
            handle
                .join()
                .map_err(|_| RuntimeError::DesignatedThreadPanicked)?;
            debug!(target: "runtime::dispatch", thread = %self.name, "designated thread stopped");
        }
        Ok(())
    }
}

async fn drain(mut receiver: mpsc::UnboundedReceiver<Task>) {
    while let Some(task) = receiver.recv().await {
        if catch_unwind(AssertUnwindSafe(task)).is_err() {
            error!(target: "runtime::dispatch", "designated task panicked");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    #[test]
    fn tasks_run_in_order_on_the_named_thread() {
        let thread = DesignatedThread::spawn("designated-order").unwrap();
        assert!(!thread.is_current());

        let seen = Arc::new(Mutex::new(Vec::new()));
        for i in 0..5 {
            let seen = Arc::clone(&seen);
            thread.submit(Box::new(move || {
                let name = thread::current().name().map(str::to_owned);
                seen.lock().unwrap().push((i, name));
            }));
        }
        assert!(thread.flush());

        let seen = seen.lock().unwrap();
        let order: Vec<_> = seen.iter().map(|(i, _)| *i).collect();
        assert_eq!(order, vec![0, 1, 2, 3, 4]);
        assert!(
            seen.iter()
                .all(|(_, name)| name.as_deref() == Some("designated-order"))
        );
        drop(seen);
        thread.shutdown().unwrap();
    }

    #[test]
    fn panicking_task_does_not_stop_the_thread() {
        let thread = DesignatedThread::spawn("designated-panic").unwrap();
        thread.submit(Box::new(|| panic!("boom")));

        let ran = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&ran);
        thread.submit(Box::new(move || flag.store(true, Ordering::SeqCst)));

        assert!(thread.flush());
        assert!(ran.load(Ordering::SeqCst));
        thread.shutdown().unwrap();
    }

    #[test]
    fn shutdown_runs_queued_tasks_then_drops_new_ones() {
        let thread = DesignatedThread::spawn("designated-shutdown").unwrap();
        let runs = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&runs);
        thread.submit(Box::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }));
        thread.shutdown().unwrap();
        assert_eq!(runs.load(Ordering::SeqCst), 1);

        let counter = Arc::clone(&runs);
        thread.submit(Box::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }));
        assert!(!thread.flush());
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }
}
