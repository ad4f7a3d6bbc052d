//! Playback fill: refills the stable play half from storage through the
//! playback converter.

use crate::aux_task::BackgroundJob;
use crate::context::DuplexContext;
use crate::converter::{ConverterSession, Pull, PullSource};
use crate::error::Result;
use crate::metrics::FillKind;
use crate::storage::FrameReader;
use crate::store::StagingBuffer;
use crate::varispeed::{playback_request_frames, read_request_frames};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Reads raw frames from storage into the read staging buffer on demand.
pub struct PlaybackSource {
    ctx: Arc<DuplexContext>,
    reader: Box<dyn FrameReader>,
    staging: StagingBuffer,
    chunk_frames: usize,
}

impl PlaybackSource {
    pub fn new(ctx: Arc<DuplexContext>, reader: Box<dyn FrameReader>) -> Self {
        let buffers = *ctx.buffers();
        let channels = reader.channels();
        Self {
            ctx,
            reader,
            staging: StagingBuffer::new(buffers.read_capacity_frames(), channels),
            chunk_frames: buffers.read_chunk_frames,
        }
    }

    pub fn channels(&self) -> usize {
        self.staging.channels()
    }
}

impl PullSource for PlaybackSource {
    fn pull(&mut self, ratio: f64) -> Pull<'_> {
        let frames =
            read_request_frames(self.chunk_frames, ratio).min(self.staging.capacity_frames());
        match self.reader.read_frames(self.staging.frames_mut(frames)) {
            Ok(0) => Pull::Exhausted,
            Ok(read) => {
                self.ctx.metrics().record_read(read as u64);
                Pull::Frames(self.staging.frames(read))
            }
            Err(e) => {
                warn!(error = %e, "playback read failed; ending stream");
                Pull::Exhausted
            }
        }
    }
}

/// Background job that keeps the play buffer supplied.
pub struct PlaybackFill {
    ctx: Arc<DuplexContext>,
    session: ConverterSession<PlaybackSource>,
    converted: StagingBuffer,
    file_channels: usize,
    output_channels: usize,
}

impl PlaybackFill {
    pub fn new(ctx: Arc<DuplexContext>, reader: Box<dyn FrameReader>) -> Result<Self> {
        let buffers = *ctx.buffers();
        let file_channels = reader.channels().max(1);
        let output_channels = ctx.output_channels();
        let session = ConverterSession::new(
            PlaybackSource::new(Arc::clone(&ctx), reader),
            buffers.converter,
            file_channels,
            buffers.max_varispeed,
            buffers.read_capacity_frames() + 16,
        )?;
        Ok(Self {
            ctx,
            session,
            converted: StagingBuffer::new(buffers.playback_capacity_frames(), file_channels),
            file_channels,
            output_channels,
        })
    }

    pub fn file_channels(&self) -> usize {
        self.file_channels
    }

    /// Refills the stable play half. Returns the frames it now holds.
    pub fn fill(&mut self) -> usize {
        let start = Instant::now();
        let metrics = self.ctx.metrics();

        let underruns = metrics.take_unreported_underruns();
        if underruns > 0 {
            warn!(underruns, "play buffer underrun: fill still running at flip");
        }

        let playback = self.ctx.playback();
        let ticket = playback.request_ticket();
        let target = playback.stable_index();
        let speed = self.ctx.varispeed();
        let wanted = playback_request_frames(self.ctx.buffers().playback_frames, speed)
            .min(self.converted.capacity_frames())
            .min(playback.capacity() / self.output_channels);

        let produced = match self
            .session
            .read(1.0 / speed, wanted, self.converted.frames_mut(wanted))
        {
            Ok(n) => n,
            Err(e) => {
                error!(error = %e, "playback conversion failed");
                0
            }
        };

        let half = playback.half(target);
        let src = self.converted.frames(produced);
        let (fc, oc) = (self.file_channels, self.output_channels);
        for frame in 0..produced {
            for c in 0..oc {
                half.store(frame * oc + c, src[frame * fc + c % fc]);
            }
        }

        if self.session.is_exhausted() && !self.ctx.is_source_exhausted() {
            info!(last_fill = produced, "playback source exhausted");
            self.ctx.mark_source_exhausted();
        }
        playback.publish_len(target, produced * oc);
        playback.complete(ticket);

        metrics.record_fill(FillKind::Playback, start.elapsed());
        produced
    }
}

impl BackgroundJob for PlaybackFill {
    fn run(&mut self) {
        let frames = self.fill();
        debug!(frames, "playback fill");
    }

    fn finish(&mut self) {
        info!("closing playback stream");
    }
}
