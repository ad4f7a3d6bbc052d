//! Stateful linear interpolation.

use super::InputFifo;

/// Linear interpolator that carries its fractional read position between
/// calls. At ratio 1.0 the position never leaves a whole frame, so output is
/// the input unchanged.
#[derive(Debug, Clone)]
pub struct LinearKernel {
    channels: usize,
    /// Position between fifo frame 0 and frame 1, in `[0, 1)`.
    frac: f64,
    /// Frames the position has moved past that were not yet in the fifo.
    skip: usize,
}

impl LinearKernel {
    pub fn new(channels: usize) -> Self {
        Self {
            channels: channels.max(1),
            frac: 0.0,
            skip: 0,
        }
    }

    /// Writes up to `out.len() / channels` frames. With `exhausted` set the
    /// last input frame is held instead of waiting for its successor.
    pub fn process(
        &mut self,
        fifo: &mut InputFifo,
        ratio: f64,
        out: &mut [f32],
        exhausted: bool,
    ) -> usize {
        let ch = self.channels;
        let wanted = out.len() / ch;
        let step = 1.0 / ratio;
        let mut written = 0;

        while written < wanted {
            if self.skip > 0 {
                self.skip -= fifo.consume(self.skip);
                if self.skip > 0 {
                    break;
                }
            }

            let available = fifo.frames();
            let needed = if self.frac > 0.0 { 2 } else { 1 };
            if available == 0 || (available < needed && !exhausted) {
                break;
            }

            let input = fifo.as_slice();
            let frame = &mut out[written * ch..(written + 1) * ch];
            if available >= 2 && self.frac > 0.0 {
                let t = self.frac as f32;
                for (c, sample) in frame.iter_mut().enumerate() {
                    let cur = input[c];
                    *sample = cur + (input[ch + c] - cur) * t;
                }
            } else {
                frame.copy_from_slice(&input[..ch]);
            }
            written += 1;

            self.frac += step;
            let advance = self.frac.floor();
            self.frac -= advance;
            let advance = advance as usize;
            if advance > 0 {
                self.skip = advance - fifo.consume(advance);
            }
        }

        written
    }
}
