//! Shared building blocks for the Varideck duplex engine.
//!
//! - [`DuplexConfig`] / [`BufferConfig`]: session and buffer configuration
//! - [`SampleSlab`], [`AtomicDouble`], [`AtomicFlag`], [`AtomicCounter`]:
//!   lock-free state the real-time callback shares with background tasks

pub mod config;
pub mod error;
mod lockfree;

pub use config::{BufferConfig, ConverterQuality, DuplexConfig, ThresholdMode};
pub use error::{Error, Result};
pub use lockfree::{AtomicCounter, AtomicDouble, AtomicFlag, SampleSlab};
