//! Error types for varideck-core.

use thiserror::Error;

/// Error type for varideck-core operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Invalid varispeed ratio: {0}. Must be finite and positive")]
    InvalidVarispeed(f64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias.
pub type Result<T> = std::result::Result<T, Error>;
