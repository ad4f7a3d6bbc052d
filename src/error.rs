//! Centralized error type for the varideck umbrella crate.
//!
//! Wraps all subsystem errors so `?` propagates naturally across crate boundaries.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Core(#[from] varideck_core::Error),

    #[error("Stream: {0}")]
    Stream(#[from] varideck_stream::Error),

    #[cfg(feature = "host")]
    #[error("Audio device not available: {0}")]
    NoDevice(String),

    #[cfg(feature = "host")]
    #[error("Audio device not available")]
    DeviceNotAvailable(#[from] cpal::DefaultStreamConfigError),

    #[cfg(feature = "host")]
    #[error("Failed to build audio stream")]
    BuildStream(#[from] cpal::BuildStreamError),

    #[cfg(feature = "host")]
    #[error("Failed to play audio stream")]
    PlayStream(#[from] cpal::PlayStreamError),

    #[cfg(feature = "host")]
    #[error("Unsupported device sample format: {0}")]
    UnsupportedFormat(String),

    #[error("Engine already started")]
    AlreadyStarted,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
