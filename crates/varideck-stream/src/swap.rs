//! Buffer-swap controller: the per-frame work of the real-time path.
//!
//! Everything here is bounded and non-blocking: no allocation, no locks, no
//! I/O, no logging. Deadline misses become counter bumps and events; fills
//! are requested through a [`FillScheduler`] and never waited on.

use crate::context::DuplexContext;
use crate::events::DuplexEvent;
use crate::scheduler::{FillScheduler, FillTask};
use std::sync::Arc;
use varideck_core::ThresholdMode;

/// Real-time side of a duplex session. Owns the read/write pointers.
pub struct DuplexRenderer<S: FillScheduler> {
    ctx: Arc<DuplexContext>,
    scheduler: S,
    record_enabled: bool,
    playback_enabled: bool,
    threshold_mode: ThresholdMode,
    input_channels: usize,
    output_channels: usize,
    /// Samples written into the active record half.
    rec_ptr: usize,
    /// Samples read from the active play half.
    play_ptr: usize,
    /// Samples the active play half holds, latched at the flip.
    play_threshold: usize,
    /// Set by the first flip; until then nothing is playing.
    play_started: bool,
    /// Waiting for a fill of the next play half; silence meanwhile.
    play_stalled: bool,
    /// Source exhausted and last buffer played.
    play_drained: bool,
    frames_rendered: u64,
}

impl<S: FillScheduler> DuplexRenderer<S> {
    /// A disabled direction is skipped entirely (degraded mode): no input is
    /// stored, or silence is output.
    pub fn new(
        ctx: Arc<DuplexContext>,
        scheduler: S,
        record_enabled: bool,
        playback_enabled: bool,
    ) -> Self {
        let threshold_mode = ctx.buffers().threshold_mode;
        let input_channels = ctx.input_channels();
        let output_channels = ctx.output_channels();
        Self {
            ctx,
            scheduler,
            record_enabled,
            playback_enabled,
            threshold_mode,
            input_channels,
            output_channels,
            rec_ptr: 0,
            play_ptr: 0,
            play_threshold: 0,
            play_started: false,
            play_stalled: false,
            play_drained: false,
            frames_rendered: 0,
        }
    }

    pub fn context(&self) -> &Arc<DuplexContext> {
        &self.ctx
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered
    }

    pub fn is_playback_drained(&self) -> bool {
        self.play_drained
    }

    /// Processes one block. `input` is interleaved at the input channel
    /// count (missing frames are recorded as silence); `output` is filled
    /// interleaved at the output channel count and decides the block length.
    /// A trailing partial frame is silenced.
    pub fn render(&mut self, input: &[f32], output: &mut [f32]) {
        let in_ch = self.input_channels;
        let out_ch = self.output_channels;
        let frames = output.len() / out_ch;
        output[frames * out_ch..].fill(0.0);

        for frame in 0..frames {
            if self.record_enabled {
                let start = frame * in_ch;
                let captured = input.get(start..start + in_ch);
                self.record_frame(captured);
            }

            let out = &mut output[frame * out_ch..(frame + 1) * out_ch];
            if self.playback_enabled {
                self.play_frame(out);
            } else {
                out.fill(0.0);
            }
        }

        self.frames_rendered += frames as u64;
    }

    #[inline]
    fn record_frame(&mut self, captured: Option<&[f32]>) {
        let record = self.ctx.record();
        if self.rec_ptr >= record.capacity() {
            record.flip();
            if record.mark_busy() {
                self.ctx.metrics().record_overrun();
                self.ctx.emit(DuplexEvent::Overrun);
            }
            self.scheduler.request(FillTask::Record);
            self.rec_ptr = 0;
        }

        let half = record.half(record.active_index());
        match captured {
            Some(samples) => {
                half.write_from(self.rec_ptr, samples);
            }
            None => {
                for c in 0..self.input_channels {
                    half.store(self.rec_ptr + c, 0.0);
                }
            }
        }
        self.rec_ptr += self.input_channels;
    }

    #[inline]
    fn play_frame(&mut self, out: &mut [f32]) {
        if self.play_drained {
            out.fill(0.0);
            return;
        }
        // Zero before the first flip so the first frame takes the primed half.
        let threshold = match self.threshold_mode {
            _ if !self.play_started => 0,
            ThresholdMode::PerBuffer => self.play_threshold,
            ThresholdMode::LatestFill => self.ctx.playback().last_len(),
        };
        if self.play_ptr >= threshold && !self.advance_playback() {
            out.fill(0.0);
            return;
        }

        let playback = self.ctx.playback();
        playback
            .half(playback.active_index())
            .read_into(self.play_ptr, out);
        self.play_ptr += self.output_channels;
    }

    /// Flips to the next play half if it holds audio. Returns false when
    /// there is nothing to play yet (stall) or ever again (drained).
    fn advance_playback(&mut self) -> bool {
        let playback = self.ctx.playback();
        let next = playback.stable_index();
        let len = playback.len(next);

        if len == 0 {
            if playback.is_busy() {
                if !self.play_stalled {
                    self.play_stalled = true;
                    self.ctx.metrics().record_underrun();
                    self.ctx.emit(DuplexEvent::Underrun);
                }
            } else if self.ctx.is_source_exhausted() {
                self.play_drained = true;
                if self.ctx.mark_playback_finished() {
                    self.ctx.emit(DuplexEvent::PlaybackEnded);
                }
            } else {
                // The last fill came back empty without reaching the end.
                playback.mark_busy();
                self.scheduler.request(FillTask::Playback);
            }
            return false;
        }

        let was_stalled = std::mem::take(&mut self.play_stalled);
        playback.flip();
        // The half just left is spent until its next fill publishes.
        playback.invalidate(next ^ 1);
        if playback.mark_busy() && !was_stalled {
            self.ctx.metrics().record_underrun();
            self.ctx.emit(DuplexEvent::Underrun);
        }
        self.scheduler.request(FillTask::Playback);

        self.play_ptr = 0;
        self.play_threshold = len;
        self.play_started = true;
        true
    }
}
