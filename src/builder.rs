//! Builder for configuring and constructing a `VarideckEngine`.

use crate::{Result, VarideckEngine};
use std::path::PathBuf;
use varideck_core::{BufferConfig, ConverterQuality, DuplexConfig, ThresholdMode};
use varideck_stream::DuplexSystem;

#[cfg(feature = "host")]
use crate::host::{default_device_config, DeviceConfig};

/// Recording and playback are each optional: leave a path unset (or point it
/// at a file that cannot be opened) and that direction is disabled while the
/// other keeps running.
///
/// # Example
///
/// ```no_run
/// use varideck::VarideckEngine;
///
/// let mut engine = VarideckEngine::builder()
///     .sample_rate(48000)
///     .channels(2, 2)
///     .record_path("record.wav")
///     .playback_path("play.wav")
///     .varispeed(1.25)
///     .build()?;
///
/// let renderer = engine.take_renderer();
/// # Ok::<(), varideck::Error>(())
/// ```
pub struct VarideckEngineBuilder {
    config: DuplexConfig,

    #[cfg(feature = "host")]
    device: Option<DeviceConfig>,
}

impl Default for VarideckEngineBuilder {
    fn default() -> Self {
        Self {
            config: DuplexConfig {
                record_path: None,
                playback_path: None,
                ..Default::default()
            },

            #[cfg(feature = "host")]
            device: None,
        }
    }
}

impl VarideckEngineBuilder {
    pub fn config(mut self, config: DuplexConfig) -> Self {
        self.config = config;
        self
    }

    /// Default: 44100
    pub fn sample_rate(mut self, sample_rate: u32) -> Self {
        self.config.sample_rate = sample_rate;
        self
    }

    pub fn channels(mut self, input: usize, output: usize) -> Self {
        self.config.input_channels = input;
        self.config.output_channels = output;
        self
    }

    pub fn record_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.record_path = Some(path.into());
        self
    }

    pub fn playback_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.playback_path = Some(path.into());
        self
    }

    /// Default: 1.0
    pub fn varispeed(mut self, ratio: f64) -> Self {
        self.config.varispeed = ratio;
        self
    }

    pub fn buffers(mut self, buffers: BufferConfig) -> Self {
        self.config.buffers = buffers;
        self
    }

    pub fn converter(mut self, quality: ConverterQuality) -> Self {
        self.config.buffers.converter = quality;
        self
    }

    pub fn threshold_mode(mut self, mode: ThresholdMode) -> Self {
        self.config.buffers.threshold_mode = mode;
        self
    }

    /// Takes sample rate and channel counts from the default audio devices.
    /// With no input device the engine records one channel of silence.
    #[cfg(feature = "host")]
    pub fn use_default_devices(mut self) -> Result<Self> {
        let device = default_device_config()?;
        self.config.sample_rate = device.sample_rate;
        self.config.input_channels = device.input_channels.max(1);
        self.config.output_channels = device.output_channels;
        self.device = Some(device);
        Ok(self)
    }

    /// Opens the files, primes playback and starts the background tasks.
    pub fn build(self) -> Result<VarideckEngine> {
        let system = DuplexSystem::builder().config(self.config).build()?;

        Ok(VarideckEngine::from_parts(
            system,
            #[cfg(feature = "host")]
            self.device,
        ))
    }
}
