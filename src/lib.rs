//! # Varideck - Record While Playing, at Any Speed
//!
//! Real-time duplex audio engine: captures the input to a file while playing
//! another file back at an adjustable varispeed ratio.
//!
//! ## Architecture
//!
//! Varideck is an umbrella crate that coordinates:
//! - **varideck-core** - Lock-free primitives, configuration, errors
//! - **varideck-stream** - Double buffers, buffer-swap controller, background
//!   fill tasks, rate converters, WAV storage
//!
//! The audio callback only ever touches the active half of a record and a
//! play double buffer. Background tasks drain and refill the other halves,
//! converting rate on the way, so the callback never blocks on disk.
//!
//! ## Quick Start
//!
//! ```ignore
//! use varideck::prelude::*;
//!
//! let mut engine = VarideckEngine::builder()
//!     .use_default_devices()?
//!     .record_path("record.wav")
//!     .playback_path("play.wav")
//!     .build()?;
//!
//! engine.start()?;
//! engine.set_varispeed(1.5);
//! ```
//!
//! ## Feature Flags
//!
//! - `default` - Engine and offline processing, no device I/O
//! - `host` - Audio device I/O through CPAL

/// Re-export of varideck-core for direct access
pub use varideck_core as core;
/// Re-export of varideck-stream for direct access
pub use varideck_stream as stream;

pub use varideck_core::{BufferConfig, ConverterQuality, DuplexConfig, ThresholdMode};
pub use varideck_stream::{
    DuplexEvent, DuplexRenderer, DuplexSystem, FrameReader, FrameWriter, IOMetricsSnapshot,
    OfflineDuplex, WavFrameReader, WavFrameWriter,
};

pub mod builder;
pub mod engine;
pub mod error;

#[cfg(feature = "host")]
pub mod host;

pub use builder::VarideckEngineBuilder;
pub use engine::VarideckEngine;
pub use error::{Error, Result};

#[cfg(feature = "host")]
pub use host::{default_device_config, AudioHost, DeviceConfig};

/// Everything needed for typical use
pub mod prelude {
    pub use crate::{
        BufferConfig, ConverterQuality, DuplexConfig, DuplexEvent, DuplexSystem, Error,
        OfflineDuplex, ThresholdMode, VarideckEngine, VarideckEngineBuilder,
    };

    #[cfg(feature = "host")]
    pub use crate::DeviceConfig;
}
