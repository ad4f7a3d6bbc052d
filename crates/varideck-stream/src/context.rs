//! The engine context: every buffer and flag the real-time path shares with
//! the two background fills, owned in one place.

use crate::events::{DuplexEvent, EventSender};
use crate::metrics::IOMetrics;
use crate::store::DoubleBuffer;
use crate::varispeed::Varispeed;
use varideck_core::{AtomicFlag, BufferConfig, DuplexConfig};

/// Shared between the real-time callback and both background fills via `Arc`.
#[derive(Debug)]
pub struct DuplexContext {
    record: DoubleBuffer,
    playback: DoubleBuffer,
    varispeed: Varispeed,
    source_exhausted: AtomicFlag,
    playback_finished: AtomicFlag,
    metrics: IOMetrics,
    events: EventSender,
    sample_rate: u32,
    input_channels: usize,
    output_channels: usize,
    buffers: BufferConfig,
}

impl DuplexContext {
    /// Allocates both double buffers at their worst-case size.
    pub fn new(config: &DuplexConfig, events: EventSender) -> Self {
        let buffers = config.buffers;
        let record_samples = buffers.record_frames * config.input_channels;
        let playback_samples = buffers.playback_capacity_frames() * config.output_channels;

        Self {
            record: DoubleBuffer::new(record_samples),
            playback: DoubleBuffer::new(playback_samples),
            varispeed: Varispeed::new(config.varispeed, buffers.max_varispeed),
            source_exhausted: AtomicFlag::new(false),
            playback_finished: AtomicFlag::new(false),
            metrics: IOMetrics::new(),
            events,
            sample_rate: config.sample_rate,
            input_channels: config.input_channels,
            output_channels: config.output_channels,
            buffers,
        }
    }

    #[inline]
    pub fn record(&self) -> &DoubleBuffer {
        &self.record
    }

    #[inline]
    pub fn playback(&self) -> &DoubleBuffer {
        &self.playback
    }

    #[inline]
    pub fn varispeed(&self) -> f64 {
        self.varispeed.ratio()
    }

    /// Safe to call at any time from any thread. Returns the clamped ratio.
    pub fn set_varispeed(&self, ratio: f64) -> f64 {
        self.varispeed.set(ratio)
    }

    pub fn varispeed_range(&self) -> (f64, f64) {
        (self.varispeed.min(), self.varispeed.max())
    }

    #[inline]
    pub fn metrics(&self) -> &IOMetrics {
        &self.metrics
    }

    #[inline]
    pub(crate) fn emit(&self, event: DuplexEvent) {
        self.events.emit(event);
    }

    /// Set by the playback fill once storage has nothing more to give.
    #[inline]
    pub fn is_source_exhausted(&self) -> bool {
        self.source_exhausted.get()
    }

    pub(crate) fn mark_source_exhausted(&self) {
        self.source_exhausted.set(true);
    }

    /// Set by the real-time path once the last played buffer has run out.
    #[inline]
    pub fn is_playback_finished(&self) -> bool {
        self.playback_finished.get()
    }

    /// Returns true the first time it is called.
    pub(crate) fn mark_playback_finished(&self) -> bool {
        !self.playback_finished.swap(true)
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn input_channels(&self) -> usize {
        self.input_channels
    }

    pub fn output_channels(&self) -> usize {
        self.output_channels
    }

    pub fn buffers(&self) -> &BufferConfig {
        &self.buffers
    }
}
