//! Duplex engine configuration.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Resampling algorithm used by both rate converter sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConverterQuality {
    /// Stateful linear interpolation. Exact passthrough at ratio 1.0, no latency.
    #[default]
    Linear,
    /// Cubic polynomial interpolation.
    Cubic,
    /// Quintic polynomial interpolation.
    Quintic,
    /// Septic polynomial interpolation (slowest).
    Septic,
}

/// How the real-time path bounds reads from the active play buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ThresholdMode {
    /// Latch the frame count of the fill that produced the buffer being flipped to.
    PerBuffer,
    /// Use the most recently completed fill's frame count, whichever buffer it wrote.
    /// A fill whose count differs from the one before it (ratio change, short
    /// final read) bounds the half already playing, one cycle early.
    #[default]
    LatestFill,
}

/// Buffer sizing and background task parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BufferConfig {
    /// Frames per record buffer half (default: 2048)
    pub record_frames: usize,
    /// Nominal frames per playback fill at ratio 1.0 (default: 16384)
    pub playback_frames: usize,
    /// Frames per storage read at ratio 1.0 (default: 8192)
    pub read_chunk_frames: usize,
    /// Varispeed ceiling; the ratio is kept in `[1/max, max]` (default: 8.0)
    pub max_varispeed: f64,
    /// Resampling algorithm (default: linear)
    pub converter: ConverterQuality,
    /// Playback exhaustion threshold policy (default: latest fill)
    pub threshold_mode: ThresholdMode,
    /// Background task thread priority, 0-99 (default: 90)
    pub task_priority: u8,
    /// Capacity of the diagnostic event queue (default: 256)
    pub event_capacity: usize,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            record_frames: 2048,
            playback_frames: 16384,
            read_chunk_frames: 8192,
            max_varispeed: 8.0,
            converter: ConverterQuality::Linear,
            threshold_mode: ThresholdMode::LatestFill,
            task_priority: 90,
            event_capacity: 256,
        }
    }
}

impl BufferConfig {
    /// Worst-case frames one playback fill can produce.
    pub fn playback_capacity_frames(&self) -> usize {
        (self.playback_frames as f64 * self.max_varispeed).ceil() as usize
    }

    /// Worst-case frames one record fill can produce.
    pub fn record_resample_capacity_frames(&self) -> usize {
        (self.record_frames as f64 * self.max_varispeed).ceil() as usize
    }

    /// Worst-case frames one storage read can request.
    pub fn read_capacity_frames(&self) -> usize {
        (self.read_chunk_frames as f64 * self.max_varispeed).ceil() as usize
    }

    pub fn validate(&self) -> Result<()> {
        if self.record_frames == 0 || self.playback_frames == 0 || self.read_chunk_frames == 0 {
            return Err(Error::InvalidConfig(format!(
                "buffer sizes must be non-zero (record={}, playback={}, read={})",
                self.record_frames, self.playback_frames, self.read_chunk_frames
            )));
        }
        if !self.max_varispeed.is_finite() || self.max_varispeed < 1.0 {
            return Err(Error::InvalidConfig(format!(
                "max_varispeed {} must be finite and >= 1.0",
                self.max_varispeed
            )));
        }
        // Below this the slowest ratio rounds a fill request down to nothing.
        let smallest = self.record_frames.min(self.playback_frames);
        if (smallest as f64) < self.max_varispeed {
            return Err(Error::InvalidConfig(format!(
                "buffer sizes (record={}, playback={}) must be at least max_varispeed {}",
                self.record_frames, self.playback_frames, self.max_varispeed
            )));
        }
        if self.task_priority > 99 {
            return Err(Error::InvalidConfig(format!(
                "task_priority {} out of range (0-99)",
                self.task_priority
            )));
        }
        if self.event_capacity == 0 {
            return Err(Error::InvalidConfig("event_capacity must be non-zero".into()));
        }
        Ok(())
    }
}

/// Configuration for a record-while-playing session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuplexConfig {
    pub sample_rate: u32,
    pub input_channels: usize,
    pub output_channels: usize,
    /// File to record to. `None` disables the record path.
    pub record_path: Option<PathBuf>,
    /// File to play from. `None` disables the playback path.
    pub playback_path: Option<PathBuf>,
    /// Initial varispeed ratio. 1.0 = normal, 2.0 = double speed.
    pub varispeed: f64,
    #[serde(default)]
    pub buffers: BufferConfig,
}

impl Default for DuplexConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            input_channels: 2,
            output_channels: 2,
            record_path: Some(PathBuf::from("record.wav")),
            playback_path: Some(PathBuf::from("play.wav")),
            varispeed: 1.0,
            buffers: BufferConfig::default(),
        }
    }
}

impl DuplexConfig {
    pub fn validate(&self) -> Result<()> {
        if !(8000..=384_000).contains(&self.sample_rate) {
            return Err(Error::InvalidConfig(format!(
                "sample_rate {} out of range (8000-384000 Hz)",
                self.sample_rate
            )));
        }
        if self.input_channels == 0 || self.output_channels == 0 {
            return Err(Error::InvalidConfig(format!(
                "channel counts must be non-zero (inputs={}, outputs={})",
                self.input_channels, self.output_channels
            )));
        }
        if !self.varispeed.is_finite() || self.varispeed <= 0.0 {
            return Err(Error::InvalidVarispeed(self.varispeed));
        }
        self.buffers.validate()
    }
}
