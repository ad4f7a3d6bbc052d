//! Background fill tasks.
//!
//! Each fill owns one converter session for its whole life and touches only
//! the stable half of its double buffer. It clears the busy flag when the
//! half is free again, which is how the real-time path tells a late fill
//! from a finished one.

mod playback;
mod record;

pub use playback::{PlaybackFill, PlaybackSource};
pub use record::{RecordFill, RecordSource};
