//! I/O statistics for the record and playback paths.
//!
//! Tracks storage throughput, fill counts, deadline misses and fill latency.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use varideck_core::AtomicCounter;

/// I/O metrics shared by the real-time path and both fills.
#[derive(Debug, Default)]
pub struct IOMetrics {
    /// Frames read from the playback file
    frames_read: AtomicU64,
    /// Frames written to the record file
    frames_written: AtomicU64,
    read_ops: AtomicU64,
    write_ops: AtomicU64,
    write_errors: AtomicU64,
    record_fills: AtomicU64,
    playback_fills: AtomicU64,
    /// Bumped by the real-time path; reported by the record fill.
    overruns: AtomicCounter,
    /// Bumped by the real-time path; reported by the playback fill.
    underruns: AtomicCounter,
    last_fill_micros: AtomicU64,
    peak_fill_micros: AtomicU64,
}

impl IOMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn record_read(&self, frames: u64) {
        self.frames_read.fetch_add(frames, Ordering::Relaxed);
        self.read_ops.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_write(&self, frames: u64) {
        self.frames_written.fetch_add(frames, Ordering::Relaxed);
        self.write_ops.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_write_error(&self) {
        self.write_errors.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_overrun(&self) {
        self.overruns.bump();
    }

    #[inline]
    pub fn record_underrun(&self) {
        self.underruns.bump();
    }

    /// Overruns since the last call.
    pub fn take_unreported_overruns(&self) -> u64 {
        self.overruns.take_unreported()
    }

    /// Underruns since the last call.
    pub fn take_unreported_underruns(&self) -> u64 {
        self.underruns.take_unreported()
    }

    pub(crate) fn record_fill(&self, kind: FillKind, elapsed: Duration) {
        match kind {
            FillKind::Record => self.record_fills.fetch_add(1, Ordering::Relaxed),
            FillKind::Playback => self.playback_fills.fetch_add(1, Ordering::Relaxed),
        };
        let micros = elapsed.as_micros().min(u64::MAX as u128) as u64;
        self.last_fill_micros.store(micros, Ordering::Relaxed);
        self.peak_fill_micros.fetch_max(micros, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> IOMetricsSnapshot {
        IOMetricsSnapshot {
            frames_read: self.frames_read.load(Ordering::Relaxed),
            frames_written: self.frames_written.load(Ordering::Relaxed),
            read_ops: self.read_ops.load(Ordering::Relaxed),
            write_ops: self.write_ops.load(Ordering::Relaxed),
            write_errors: self.write_errors.load(Ordering::Relaxed),
            record_fills: self.record_fills.load(Ordering::Relaxed),
            playback_fills: self.playback_fills.load(Ordering::Relaxed),
            overruns: self.overruns.total(),
            underruns: self.underruns.total(),
            last_fill: Duration::from_micros(self.last_fill_micros.load(Ordering::Relaxed)),
            peak_fill: Duration::from_micros(self.peak_fill_micros.load(Ordering::Relaxed)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FillKind {
    Record,
    Playback,
}

/// Point-in-time copy of [`IOMetrics`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IOMetricsSnapshot {
    pub frames_read: u64,
    pub frames_written: u64,
    pub read_ops: u64,
    pub write_ops: u64,
    pub write_errors: u64,
    pub record_fills: u64,
    pub playback_fills: u64,
    pub overruns: u64,
    pub underruns: u64,
    pub last_fill: Duration,
    pub peak_fill: Duration,
}
