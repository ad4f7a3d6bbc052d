//! Varispeed ratio and the frame counts it implies for each fill.
//!
//! The ratio is read without coordination by the real-time path and both
//! background fills. A fill that races a ratio change uses either the old or
//! the new value for one cycle; that only shifts the frame-count rounding for
//! that fill and is accepted rather than locked against.

use varideck_core::AtomicDouble;

/// Shared, externally adjustable playback speed.
#[derive(Debug)]
pub struct Varispeed {
    ratio: AtomicDouble,
    max: f64,
}

impl Varispeed {
    /// `max` is the varispeed ceiling; the ratio stays within `[1/max, max]`.
    pub fn new(initial: f64, max: f64) -> Self {
        let max = if max.is_finite() { max.max(1.0) } else { 1.0 };
        let initial = if initial.is_finite() && initial > 0.0 {
            initial
        } else {
            1.0
        };
        Self {
            ratio: AtomicDouble::new(clamp_ratio(initial, max)),
            max,
        }
    }

    /// 1.0 = normal, 0.5 = half, 2.0 = double
    #[inline]
    pub fn ratio(&self) -> f64 {
        self.ratio.get_relaxed()
    }

    /// Clamps to the supported range. Non-finite or non-positive values are
    /// ignored. Returns the ratio now in effect.
    pub fn set(&self, ratio: f64) -> f64 {
        if !ratio.is_finite() || ratio <= 0.0 {
            return self.ratio();
        }
        let clamped = clamp_ratio(ratio, self.max);
        self.ratio.set(clamped);
        clamped
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn min(&self) -> f64 {
        1.0 / self.max
    }
}

#[inline]
pub fn clamp_ratio(ratio: f64, max: f64) -> f64 {
    ratio.clamp(1.0 / max, max)
}

/// Resampled frames one record fill asks for: `capacity × ratio`, rounded.
#[inline]
pub fn record_request_frames(capacity: usize, ratio: f64) -> usize {
    (capacity as f64 * ratio).round() as usize
}

/// Resampled frames one playback fill asks for: `capacity ÷ ratio`, rounded.
#[inline]
pub fn playback_request_frames(capacity: usize, ratio: f64) -> usize {
    (capacity as f64 / ratio).round() as usize
}

/// Source frames one storage read asks for, given the playback converter's
/// output/input ratio (`1 / varispeed`). Never zero.
#[inline]
pub fn read_request_frames(chunk: usize, converter_ratio: f64) -> usize {
    ((chunk as f64 * converter_ratio).round() as usize).max(1)
}
