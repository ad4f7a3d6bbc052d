//! Pull-based rate conversion sessions.
//!
//! A [`ConverterSession`] is asked for N output frames at a given ratio
//! (output frames per input frame). It pulls raw interleaved input from its
//! [`PullSource`] only when the kernel runs dry, and keeps all interpolation
//! state between calls so consecutive reads join without discontinuity.

mod linear;
mod poly;

pub use linear::LinearKernel;
pub use poly::PolyKernel;

use crate::error::Result;
use varideck_core::ConverterQuality;

/// Polynomial kernel block size in output frames.
pub const POLY_CHUNK_FRAMES: usize = 256;

/// What a [`PullSource`] hands back when the converter needs more input.
#[derive(Debug, PartialEq)]
pub enum Pull<'a> {
    /// Interleaved frames at the session's channel count.
    Frames(&'a [f32]),
    /// Nothing available right now; the current read returns what it has.
    Pending,
    /// End of stream; remaining state is flushed and nothing follows.
    Exhausted,
}

/// Supplies raw input to a [`ConverterSession`] on demand.
pub trait PullSource: Send {
    /// `ratio` is the conversion ratio of the read in progress, for sources
    /// that size their reads by it.
    fn pull(&mut self, ratio: f64) -> Pull<'_>;
}

/// Interleaved input frames waiting to be converted.
#[derive(Debug)]
pub struct InputFifo {
    samples: Vec<f32>,
    start: usize,
    channels: usize,
}

impl InputFifo {
    pub fn with_capacity(frames: usize, channels: usize) -> Self {
        let channels = channels.max(1);
        Self {
            samples: Vec::with_capacity(frames * channels),
            start: 0,
            channels,
        }
    }

    #[inline]
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Whole frames available.
    #[inline]
    pub fn frames(&self) -> usize {
        (self.samples.len() - self.start) / self.channels
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.frames() == 0
    }

    /// Interleaved samples of the available frames.
    #[inline]
    pub fn as_slice(&self) -> &[f32] {
        &self.samples[self.start..]
    }

    /// Appends interleaved samples. A trailing partial frame is dropped.
    pub fn push(&mut self, samples: &[f32]) {
        let whole = samples.len() - samples.len() % self.channels;
        if self.start > 0 {
            self.samples.drain(..self.start);
            self.start = 0;
        }
        self.samples.extend_from_slice(&samples[..whole]);
    }

    /// Drops up to `frames` frames from the front. Returns how many were dropped.
    pub fn consume(&mut self, frames: usize) -> usize {
        let frames = frames.min(self.frames());
        self.start += frames * self.channels;
        if self.start == self.samples.len() {
            self.samples.clear();
            self.start = 0;
        }
        frames
    }

    pub fn clear(&mut self) {
        self.samples.clear();
        self.start = 0;
    }
}

/// Conversion algorithm behind a session.
#[derive(Debug)]
pub enum ConverterKernel {
    Linear(LinearKernel),
    Poly(PolyKernel),
}

impl ConverterKernel {
    pub fn new(quality: ConverterQuality, channels: usize, max_varispeed: f64) -> Result<Self> {
        Ok(match quality {
            ConverterQuality::Linear => Self::Linear(LinearKernel::new(channels)),
            poly => Self::Poly(PolyKernel::new(
                poly,
                channels,
                max_varispeed,
                POLY_CHUNK_FRAMES,
            )?),
        })
    }

    /// Converts from `fifo` into `out` (interleaved, whole frames). Returns
    /// frames written.
    fn process(
        &mut self,
        fifo: &mut InputFifo,
        ratio: f64,
        out: &mut [f32],
        exhausted: bool,
    ) -> Result<usize> {
        match self {
            Self::Linear(k) => Ok(k.process(fifo, ratio, out, exhausted)),
            Self::Poly(k) => k.process(fifo, ratio, out, exhausted),
        }
    }
}

/// One direction's resampler, bound to its input source for its whole life.
pub struct ConverterSession<S: PullSource> {
    source: S,
    fifo: InputFifo,
    kernel: ConverterKernel,
    exhausted: bool,
}

impl<S: PullSource> ConverterSession<S> {
    /// `fifo_frames` preallocates the input queue; it should cover the
    /// largest chunk the source returns plus a few frames of carry-over.
    pub fn new(
        source: S,
        quality: ConverterQuality,
        channels: usize,
        max_varispeed: f64,
        fifo_frames: usize,
    ) -> Result<Self> {
        Ok(Self {
            source,
            fifo: InputFifo::with_capacity(fifo_frames, channels),
            kernel: ConverterKernel::new(quality, channels, max_varispeed)?,
            exhausted: false,
        })
    }

    pub fn channels(&self) -> usize {
        self.fifo.channels()
    }

    /// Produces up to `frames` frames at `ratio` into `out`. Returns fewer
    /// when the source is pending or exhausted.
    pub fn read(&mut self, ratio: f64, frames: usize, out: &mut [f32]) -> Result<usize> {
        let channels = self.fifo.channels();
        let frames = frames.min(out.len() / channels);
        let mut written = 0;

        loop {
            written += self.kernel.process(
                &mut self.fifo,
                ratio,
                &mut out[written * channels..frames * channels],
                self.exhausted,
            )?;
            if written >= frames || self.exhausted {
                break;
            }
            match self.source.pull(ratio) {
                Pull::Frames(samples) if !samples.is_empty() => self.fifo.push(samples),
                Pull::Frames(_) | Pull::Pending => break,
                Pull::Exhausted => self.exhausted = true,
            }
        }

        Ok(written)
    }

    /// True once the source reported end of stream.
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Input frames queued but not yet converted.
    pub fn queued_frames(&self) -> usize {
        self.fifo.frames()
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }
}
