//! Error types.

use thiserror::Error;

/// Error type.
#[derive(Error, Debug)]
pub enum Error {
    /// Core error (configuration).
    #[error(transparent)]
    Core(#[from] varideck_core::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// WAV read/write error.
    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),

    /// Sample file is not interleaved float PCM.
    #[error("Unsupported sample format: {0}")]
    UnsupportedFormat(String),

    /// Rate converter error.
    #[error("Rate converter error: {0}")]
    Converter(String),

    /// Background task could not be started.
    #[error("Background task error: {0}")]
    Task(String),
}

impl From<rubato::ResamplerConstructionError> for Error {
    fn from(e: rubato::ResamplerConstructionError) -> Self {
        Error::Converter(e.to_string())
    }
}

impl From<rubato::ResampleError> for Error {
    fn from(e: rubato::ResampleError) -> Self {
        Error::Converter(e.to_string())
    }
}

/// Result type.
pub type Result<T> = std::result::Result<T, Error>;
