//! Auxiliary tasks: named background threads that run a job on request.
//!
//! A request is a non-blocking `try_send` on a one-slot channel, so the
//! real-time path can ask for work without ever waiting. Requests made while
//! one is already queued coalesce into a single run.

use crate::error::{Error, Result};
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use thread_priority::{ThreadPriority, ThreadPriorityValue};
use tracing::{debug, info};

/// Work executed on an auxiliary task.
pub trait BackgroundJob: Send + 'static {
    /// One unit of work per request.
    fn run(&mut self);

    /// Runs once on the task thread after the last `run`, during shutdown.
    fn finish(&mut self) {}
}

/// Handle for requesting a run. Cheap to clone; never blocks.
#[derive(Debug, Clone)]
pub struct TaskWaker {
    tx: Sender<()>,
}

impl TaskWaker {
    /// Returns false only if the task has exited.
    #[inline]
    pub fn schedule(&self) -> bool {
        match self.tx.try_send(()) {
            Ok(()) | Err(TrySendError::Full(())) => true,
            Err(TrySendError::Disconnected(())) => false,
        }
    }
}

/// A background thread bound to one [`BackgroundJob`].
pub struct AuxiliaryTask {
    name: String,
    waker: TaskWaker,
    shutdown: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl AuxiliaryTask {
    /// Spawns the thread. `priority` is 0-99; failing to apply it is not an
    /// error (it usually needs elevated privileges).
    pub fn spawn<J: BackgroundJob>(name: &str, priority: u8, mut job: J) -> Result<Self> {
        let (tx, rx) = bounded(1);
        let shutdown = Arc::new(AtomicBool::new(false));
        let thread_shutdown = Arc::clone(&shutdown);
        let thread_name = name.to_string();

        let handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                apply_priority(&thread_name, priority);
                task_loop(&rx, &thread_shutdown, &mut job);
                job.finish();
                debug!(task = %thread_name, "auxiliary task exited");
            })
            .map_err(|e| Error::Task(format!("failed to spawn {name}: {e}")))?;

        info!(task = name, priority, "auxiliary task started");

        Ok(Self {
            name: name.to_string(),
            waker: TaskWaker { tx },
            shutdown,
            handle: Some(handle),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn waker(&self) -> TaskWaker {
        self.waker.clone()
    }

    #[inline]
    pub fn schedule(&self) -> bool {
        self.waker.schedule()
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Wakes the thread, waits for it to run its `finish` hook and exit.
    pub fn stop(&mut self) {
        self.shutdown.store(true, Ordering::SeqCst);
        let _ = self.waker.tx.try_send(());

        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::error!(task = %self.name, "auxiliary task panicked");
            }
        }
    }
}

impl Drop for AuxiliaryTask {
    fn drop(&mut self) {
        self.stop();
    }
}

fn task_loop<J: BackgroundJob>(rx: &Receiver<()>, shutdown: &AtomicBool, job: &mut J) {
    while rx.recv().is_ok() {
        if shutdown.load(Ordering::SeqCst) {
            break;
        }
        job.run();
    }
}

fn apply_priority(name: &str, priority: u8) {
    let value = match ThreadPriorityValue::try_from(priority) {
        Ok(value) => value,
        Err(e) => {
            debug!(task = name, priority, "invalid task priority: {e}");
            return;
        }
    };
    if let Err(e) = thread_priority::set_current_thread_priority(ThreadPriority::Crossplatform(value))
    {
        debug!(task = name, priority, "could not raise task priority: {e:?}");
    }
}
