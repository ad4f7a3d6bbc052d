//! VarideckEngine: a duplex system plus, with the `host` feature, the audio
//! device streams that drive it.

#[cfg(feature = "host")]
use crate::Result;
use crossbeam_channel::Receiver;
use varideck_stream::{
    DuplexEvent, DuplexRenderer, DuplexSystem, IOMetricsSnapshot, ThreadedScheduler,
};

#[cfg(feature = "host")]
use crate::host::{AudioHost, DeviceConfig};
#[cfg(feature = "host")]
use tracing::info;

/// Records one file while playing another at an adjustable speed.
///
/// Without the `host` feature the engine does not open any device; take the
/// renderer with [`take_renderer`](Self::take_renderer) and call it from your
/// own audio callback.
///
/// # Example
///
/// ```ignore
/// use varideck::prelude::*;
///
/// let mut engine = VarideckEngine::builder()
///     .use_default_devices()?
///     .record_path("record.wav")
///     .playback_path("play.wav")
///     .build()?;
///
/// engine.start()?;
/// engine.set_varispeed(0.5);
/// ```
pub struct VarideckEngine {
    system: DuplexSystem,

    /// Layout of the devices the system was built for
    #[cfg(feature = "host")]
    device: Option<DeviceConfig>,

    /// Running device streams
    #[cfg(feature = "host")]
    host: Option<AudioHost>,
}

impl VarideckEngine {
    pub fn builder() -> crate::VarideckEngineBuilder {
        crate::VarideckEngineBuilder::default()
    }

    pub(crate) fn from_parts(
        system: DuplexSystem,
        #[cfg(feature = "host")] device: Option<DeviceConfig>,
    ) -> Self {
        Self {
            system,
            #[cfg(feature = "host")]
            device,
            #[cfg(feature = "host")]
            host: None,
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.system.context().sample_rate()
    }

    pub fn varispeed(&self) -> f64 {
        self.system.varispeed()
    }

    /// Clamped to the configured range; returns the ratio actually applied.
    pub fn set_varispeed(&self, ratio: f64) -> f64 {
        self.system.set_varispeed(ratio)
    }

    pub fn events(&self) -> &Receiver<DuplexEvent> {
        self.system.events()
    }

    pub fn stats(&self) -> IOMetricsSnapshot {
        self.system.stats()
    }

    pub fn is_recording(&self) -> bool {
        self.system.is_recording()
    }

    pub fn is_playing(&self) -> bool {
        self.system.is_playing()
    }

    pub fn is_playback_finished(&self) -> bool {
        self.system.is_playback_finished()
    }

    /// The real-time entry point, for driving the engine from a custom
    /// callback. Returns `None` once taken or once the engine is started.
    pub fn take_renderer(&mut self) -> Option<DuplexRenderer<ThreadedScheduler>> {
        self.system.take_renderer()
    }

    pub fn system(&self) -> &DuplexSystem {
        &self.system
    }

    /// Opens the device streams and starts rendering.
    #[cfg(feature = "host")]
    pub fn start(&mut self) -> Result<()> {
        if self.host.is_some() {
            return Err(crate::Error::AlreadyStarted);
        }
        // Without a queried device, ask cpal for the layout the system uses.
        let device = self.device.unwrap_or_else(|| {
            let ctx = self.system.context();
            DeviceConfig {
                sample_rate: ctx.sample_rate(),
                input_channels: ctx.input_channels(),
                output_channels: ctx.output_channels(),
            }
        });
        let renderer = self
            .system
            .take_renderer()
            .ok_or(crate::Error::AlreadyStarted)?;
        self.host = Some(AudioHost::start(renderer, device)?);
        Ok(())
    }

    #[cfg(feature = "host")]
    pub fn is_running(&self) -> bool {
        self.host.is_some()
    }

    /// Captured frames dropped because the input ring was full.
    #[cfg(feature = "host")]
    pub fn dropped_input_frames(&self) -> u64 {
        self.host
            .as_ref()
            .map(AudioHost::dropped_input_frames)
            .unwrap_or(0)
    }

    /// Stops the device streams (if running) and closes both files.
    pub fn shutdown(&mut self) {
        #[cfg(feature = "host")]
        if self.host.take().is_some() {
            info!("audio host stopped");
        }
        self.system.shutdown();
    }
}

impl Drop for VarideckEngine {
    fn drop(&mut self) {
        #[cfg(feature = "host")]
        drop(self.host.take());
    }
}
