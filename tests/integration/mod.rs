//! Integration test modules for Varideck
//!
//! - duplex: record/playback paths at unity speed
//! - timing: late background fills
//! - varispeed: ratios away from 1.0
//! - system: threaded sessions and engine lifecycle
//! - properties: proptest invariants

pub mod duplex;
pub mod properties;
pub mod timing;
pub mod varispeed;
