//! How the real-time path asks for background fills.

use crate::aux_task::TaskWaker;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// The two background jobs the controller can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FillTask {
    /// Drain the stable record half to storage.
    Record,
    /// Refill the stable play half from storage.
    Playback,
}

/// Non-blocking request primitive handed to the real-time path.
pub trait FillScheduler: Send {
    fn request(&self, task: FillTask);
}

/// Wakes the auxiliary task that owns each fill.
#[derive(Debug, Clone, Default)]
pub struct ThreadedScheduler {
    record: Option<TaskWaker>,
    playback: Option<TaskWaker>,
}

impl ThreadedScheduler {
    /// A direction without a task (degraded mode) ignores requests.
    pub fn new(record: Option<TaskWaker>, playback: Option<TaskWaker>) -> Self {
        Self { record, playback }
    }
}

impl FillScheduler for ThreadedScheduler {
    #[inline]
    fn request(&self, task: FillTask) {
        let waker = match task {
            FillTask::Record => &self.record,
            FillTask::Playback => &self.playback,
        };
        if let Some(waker) = waker {
            waker.schedule();
        }
    }
}

/// Latches requests for a caller that runs fills itself.
#[derive(Debug, Clone, Default)]
pub struct ManualScheduler {
    record: Arc<AtomicBool>,
    playback: Arc<AtomicBool>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns and clears a pending request.
    pub fn take(&self, task: FillTask) -> bool {
        self.flag(task).swap(false, Ordering::AcqRel)
    }

    pub fn is_pending(&self, task: FillTask) -> bool {
        self.flag(task).load(Ordering::Acquire)
    }

    fn flag(&self, task: FillTask) -> &AtomicBool {
        match task {
            FillTask::Record => &self.record,
            FillTask::Playback => &self.playback,
        }
    }
}

impl FillScheduler for ManualScheduler {
    #[inline]
    fn request(&self, task: FillTask) {
        self.flag(task).store(true, Ordering::Release);
    }
}
