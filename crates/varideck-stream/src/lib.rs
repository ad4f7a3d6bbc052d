//! Double-buffered record/playback streaming with varispeed rate conversion.
//!
//! The real-time path ([`DuplexRenderer`]) writes captured frames into one
//! half of a record double buffer and reads output frames from one half of a
//! play double buffer. When a half is used up it flips to the other half and
//! asks a background fill to drain or refill the half it just left. Fills
//! run pull-based rate converter sessions between the buffers and storage,
//! so changing the varispeed ratio changes how many frames each fill moves.
//!
//! ```no_run
//! use varideck_stream::DuplexSystem;
//!
//! let mut system = DuplexSystem::builder()
//!     .sample_rate(48000)
//!     .channels(2, 2)
//!     .record_path(Some("record.wav"))
//!     .playback_path(Some("play.wav"))
//!     .build()?;
//!
//! let mut renderer = system.take_renderer().unwrap();
//! let input = vec![0.0f32; 256 * 2];
//! let mut output = vec![0.0f32; 256 * 2];
//! renderer.render(&input, &mut output);
//!
//! system.set_varispeed(1.5);
//! system.shutdown();
//! # Ok::<(), varideck_stream::Error>(())
//! ```

pub mod aux_task;
pub mod context;
pub mod converter;
pub mod error;
pub mod events;
pub mod fill;
pub mod metrics;
pub mod scheduler;
pub mod storage;
pub mod store;
pub mod swap;
pub mod system;
pub mod varispeed;

pub use aux_task::{AuxiliaryTask, BackgroundJob, TaskWaker};
pub use context::DuplexContext;
pub use converter::{ConverterSession, Pull, PullSource};
pub use error::{Error, Result};
pub use events::{event_channel, DuplexEvent, EventSender};
pub use fill::{PlaybackFill, RecordFill};
pub use metrics::{IOMetrics, IOMetricsSnapshot};
pub use scheduler::{FillScheduler, FillTask, ManualScheduler, ThreadedScheduler};
pub use storage::{FrameReader, FrameWriter, WavFrameReader, WavFrameWriter};
pub use store::{DoubleBuffer, StagingBuffer};
pub use swap::DuplexRenderer;
pub use system::{DuplexSystem, DuplexSystemBuilder, OfflineDuplex};
pub use varispeed::Varispeed;

pub use varideck_core::{BufferConfig, ConverterQuality, DuplexConfig, ThresholdMode};
