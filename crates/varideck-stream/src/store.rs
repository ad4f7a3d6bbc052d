//! Sample store: double buffers and staging buffers for in-flight audio.
//!
//! All storage is allocated once at setup and never resized.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use varideck_core::{AtomicFlag, SampleSlab};

/// A pair of equally sized interleaved sample buffers.
///
/// One half is active (owned by the real-time path), the other is stable
/// (owned by a background fill). Only the real-time path flips the active
/// index; the flip is the sole ownership transfer. A background task may
/// still be touching the stable half when the real-time path flips back to
/// it (missed deadline); samples are atomics, so that costs a glitch, not
/// memory safety.
#[derive(Debug)]
pub struct DoubleBuffer {
    halves: [SampleSlab; 2],
    /// Valid samples written into each half by its most recent fill.
    lens: [AtomicUsize; 2],
    /// Valid samples written by the most recent fill, whichever half it wrote.
    last_len: AtomicUsize,
    /// false = half 0 active
    active: AtomicFlag,
    /// Fill requests made by the real-time path.
    requested: AtomicU64,
    /// Highest request ticket a finished fill has answered.
    completed: AtomicU64,
    flips: AtomicU64,
}

impl DoubleBuffer {
    pub fn new(capacity_samples: usize) -> Self {
        Self {
            halves: [
                SampleSlab::new(capacity_samples),
                SampleSlab::new(capacity_samples),
            ],
            lens: [AtomicUsize::new(0), AtomicUsize::new(0)],
            last_len: AtomicUsize::new(0),
            active: AtomicFlag::new(false),
            requested: AtomicU64::new(0),
            completed: AtomicU64::new(0),
            flips: AtomicU64::new(0),
        }
    }

    /// Capacity of each half in samples.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.halves[0].len()
    }

    #[inline]
    pub fn active_index(&self) -> usize {
        self.active.get() as usize
    }

    #[inline]
    pub fn stable_index(&self) -> usize {
        self.active_index() ^ 1
    }

    #[inline]
    pub fn half(&self, index: usize) -> &SampleSlab {
        &self.halves[index & 1]
    }

    /// Real-time path only. Returns the newly active index.
    #[inline]
    pub fn flip(&self) -> usize {
        let next = !self.active.get();
        self.active.set(next);
        self.flips.fetch_add(1, Ordering::Relaxed);
        next as usize
    }

    pub fn flip_count(&self) -> u64 {
        self.flips.load(Ordering::Relaxed)
    }

    /// Marks a fill as outstanding. Returns true if the previous one never
    /// finished (missed deadline).
    #[inline]
    pub fn mark_busy(&self) -> bool {
        let previous = self.requested.fetch_add(1, Ordering::AcqRel);
        previous != self.completed.load(Ordering::Acquire)
    }

    /// Taken by a background fill before it touches the stable half; hand it
    /// back to [`complete`](Self::complete) when done.
    #[inline]
    pub fn request_ticket(&self) -> u64 {
        self.requested.load(Ordering::Acquire)
    }

    /// Answers every request up to `ticket`. A request marked after the
    /// ticket was taken stays outstanding.
    #[inline]
    pub fn complete(&self, ticket: u64) {
        self.completed.fetch_max(ticket, Ordering::AcqRel);
    }

    #[inline]
    pub fn is_busy(&self) -> bool {
        let completed = self.completed.load(Ordering::Acquire);
        completed < self.requested.load(Ordering::Acquire)
    }

    /// Records how many valid samples a fill wrote into `index`. An empty
    /// fill is not a buffer and leaves `last_len` at the previous count.
    pub fn publish_len(&self, index: usize, samples: usize) {
        let samples = samples.min(self.capacity());
        self.lens[index & 1].store(samples, Ordering::Release);
        if samples > 0 {
            self.last_len.store(samples, Ordering::Release);
        }
    }

    /// Marks `index` as holding nothing playable while a fill rewrites it.
    /// Leaves `last_len` alone.
    pub fn invalidate(&self, index: usize) {
        self.lens[index & 1].store(0, Ordering::Release);
    }

    #[inline]
    pub fn len(&self, index: usize) -> usize {
        self.lens[index & 1].load(Ordering::Acquire)
    }

    #[inline]
    pub fn last_len(&self) -> usize {
        self.last_len.load(Ordering::Acquire)
    }
}

/// Reusable interleaved scratch buffer owned by one background task.
#[derive(Debug)]
pub struct StagingBuffer {
    samples: Vec<f32>,
    channels: usize,
}

impl StagingBuffer {
    pub fn new(frames: usize, channels: usize) -> Self {
        let channels = channels.max(1);
        Self {
            samples: vec![0.0; frames * channels],
            channels,
        }
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn capacity_frames(&self) -> usize {
        self.samples.len() / self.channels
    }

    /// First `frames` frames (clamped to capacity).
    pub fn frames(&self, frames: usize) -> &[f32] {
        let end = (frames * self.channels).min(self.samples.len());
        &self.samples[..end]
    }

    pub fn frames_mut(&mut self, frames: usize) -> &mut [f32] {
        let end = (frames * self.channels).min(self.samples.len());
        &mut self.samples[..end]
    }
}
