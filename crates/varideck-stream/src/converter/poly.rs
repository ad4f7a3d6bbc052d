//! Polynomial interpolation via rubato's fixed-output resampler.

use super::InputFifo;
use crate::error::Result;
use rubato::{FastFixedOut, PolynomialDegree, Resampler};
use smallvec::SmallVec;
use std::fmt;
use varideck_core::ConverterQuality;

/// Rubato [`FastFixedOut`] wrapped for pull-driven use.
///
/// Rubato produces whole chunks, so output that does not fit the caller's
/// request is held back and handed out first on the next call. Once the
/// input is exhausted the kernel pads with silence to flush its delay line,
/// but stops at the number of frames the consumed input corresponds to.
pub struct PolyKernel {
    resampler: FastFixedOut<f32>,
    channels: usize,
    ratio: f64,
    planar_in: SmallVec<[Vec<f32>; 8]>,
    planar_out: SmallVec<[Vec<f32>; 8]>,
    /// Interleaved output not yet handed out
    pending: Vec<f32>,
    pending_pos: usize,
    /// Output frames the consumed input corresponds to
    expected_out: f64,
    emitted: u64,
}

impl PolyKernel {
    pub fn new(
        quality: ConverterQuality,
        channels: usize,
        max_varispeed: f64,
        chunk_frames: usize,
    ) -> Result<Self> {
        let channels = channels.max(1);
        let degree = match quality {
            ConverterQuality::Septic => PolynomialDegree::Septic,
            ConverterQuality::Quintic => PolynomialDegree::Quintic,
            ConverterQuality::Cubic | ConverterQuality::Linear => PolynomialDegree::Cubic,
        };
        // Headroom so a ratio exactly at the ceiling is never rejected.
        let relative = max_varispeed.max(1.0) * 1.01;
        let resampler = FastFixedOut::<f32>::new(1.0, relative, degree, chunk_frames, channels)?;

        let in_max = resampler.input_frames_max();
        let out_max = resampler.output_frames_max();
        let planar_in = (0..channels).map(|_| Vec::with_capacity(in_max)).collect();
        let planar_out = (0..channels).map(|_| vec![0.0; out_max]).collect();

        Ok(Self {
            resampler,
            channels,
            ratio: 1.0,
            planar_in,
            planar_out,
            pending: Vec::with_capacity(out_max * channels),
            pending_pos: 0,
            expected_out: 0.0,
            emitted: 0,
        })
    }

    fn flush_budget(&self) -> u64 {
        (self.expected_out.round() as u64).saturating_sub(self.emitted)
    }

    pub fn process(
        &mut self,
        fifo: &mut InputFifo,
        ratio: f64,
        out: &mut [f32],
        exhausted: bool,
    ) -> Result<usize> {
        if (ratio - self.ratio).abs() > f64::EPSILON {
            self.resampler.set_resample_ratio(ratio, false)?;
            self.ratio = ratio;
        }

        let ch = self.channels;
        let wanted = out.len() / ch;
        let mut written = 0;

        loop {
            let pending_frames = (self.pending.len() - self.pending_pos) / ch;
            if pending_frames > 0 {
                let mut take = pending_frames.min(wanted - written);
                if exhausted {
                    take = take.min(self.flush_budget() as usize);
                }
                let src = &self.pending[self.pending_pos..self.pending_pos + take * ch];
                out[written * ch..(written + take) * ch].copy_from_slice(src);
                self.pending_pos += take * ch;
                self.emitted += take as u64;
                written += take;
            }
            if written == wanted {
                break;
            }
            if exhausted && self.flush_budget() == 0 {
                self.pending.clear();
                self.pending_pos = 0;
                break;
            }

            let needed = self.resampler.input_frames_next();
            let available = fifo.frames();
            if available < needed && !exhausted {
                break;
            }

            let real = available.min(needed);
            let input = fifo.as_slice();
            for (c, channel) in self.planar_in.iter_mut().enumerate() {
                channel.clear();
                channel.extend((0..real).map(|i| input[i * ch + c]));
                channel.resize(needed, 0.0);
            }
            fifo.consume(real);
            self.expected_out += real as f64 * self.ratio;

            let (_, produced) =
                self.resampler
                    .process_into_buffer(&self.planar_in[..], &mut self.planar_out[..], None)?;

            self.pending.clear();
            self.pending_pos = 0;
            for i in 0..produced {
                for channel in &self.planar_out {
                    self.pending.push(channel[i]);
                }
            }
        }

        Ok(written)
    }
}

impl fmt::Debug for PolyKernel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PolyKernel")
            .field("channels", &self.channels)
            .field("ratio", &self.ratio)
            .field("pending_frames", &((self.pending.len() - self.pending_pos) / self.channels))
            .field("emitted", &self.emitted)
            .finish()
    }
}
