//! Record fill: drains the stable record half through the record converter
//! into storage.

use crate::aux_task::BackgroundJob;
use crate::context::DuplexContext;
use crate::converter::{ConverterSession, Pull, PullSource};
use crate::error::Result;
use crate::events::DuplexEvent;
use crate::metrics::FillKind;
use crate::storage::FrameWriter;
use crate::store::StagingBuffer;
use crate::varispeed::record_request_frames;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Hands the converter one record half per fill, then `Pending`.
pub struct RecordSource {
    ctx: Arc<DuplexContext>,
    staging: StagingBuffer,
    armed: Option<usize>,
}

impl RecordSource {
    pub fn new(ctx: Arc<DuplexContext>) -> Self {
        let frames = ctx.buffers().record_frames;
        let channels = ctx.input_channels();
        Self {
            ctx,
            staging: StagingBuffer::new(frames, channels),
            armed: None,
        }
    }

    /// Makes record half `index` the next chunk handed out.
    pub fn arm(&mut self, index: usize) {
        self.armed = Some(index);
    }

    pub fn is_armed(&self) -> bool {
        self.armed.is_some()
    }
}

impl PullSource for RecordSource {
    fn pull(&mut self, _ratio: f64) -> Pull<'_> {
        let Some(index) = self.armed.take() else {
            return Pull::Pending;
        };
        let frames = self.staging.capacity_frames();
        let copied = self
            .ctx
            .record()
            .half(index)
            .read_into(0, self.staging.frames_mut(frames));
        Pull::Frames(&self.staging.frames(frames)[..copied])
    }
}

/// Background job that writes recorded audio to storage.
pub struct RecordFill {
    ctx: Arc<DuplexContext>,
    session: ConverterSession<RecordSource>,
    output: StagingBuffer,
    writer: Option<Box<dyn FrameWriter>>,
}

impl RecordFill {
    pub fn new(ctx: Arc<DuplexContext>, writer: Box<dyn FrameWriter>) -> Result<Self> {
        let buffers = *ctx.buffers();
        let channels = ctx.input_channels();
        let session = ConverterSession::new(
            RecordSource::new(Arc::clone(&ctx)),
            buffers.converter,
            channels,
            buffers.max_varispeed,
            buffers.record_frames + 16,
        )?;
        Ok(Self {
            ctx,
            session,
            output: StagingBuffer::new(buffers.record_resample_capacity_frames() + 1, channels),
            writer: Some(writer),
        })
    }

    /// Drains the stable record half. Returns the resampled frames written.
    pub fn fill(&mut self) -> usize {
        let start = Instant::now();
        let ctx = Arc::clone(&self.ctx);
        let metrics = ctx.metrics();

        let overruns = metrics.take_unreported_overruns();
        if overruns > 0 {
            warn!(overruns, "record buffer overrun: previous drain still running at flip");
        }

        let record = ctx.record();
        let ticket = record.request_ticket();
        let ratio = ctx.varispeed();
        let capacity_frames = ctx.buffers().record_frames;
        let limit = self.output.capacity_frames();
        let wanted = record_request_frames(capacity_frames, ratio).min(limit);

        self.session.source_mut().arm(record.stable_index());
        let mut produced = self.convert(ratio, 0, wanted);
        if self.session.source().is_armed() {
            // Carry-over alone satisfied the request; take the half anyway.
            produced = self.convert(ratio, produced, limit);
        }
        record.complete(ticket);

        if produced > 0 {
            self.store(produced);
        }

        metrics.record_fill(FillKind::Record, start.elapsed());
        produced
    }

    fn convert(&mut self, ratio: f64, offset: usize, frames: usize) -> usize {
        let channels = self.output.channels();
        let out = &mut self.output.frames_mut(frames)[offset * channels..];
        match self.session.read(ratio, frames - offset, out) {
            Ok(n) => offset + n,
            Err(e) => {
                error!(error = %e, "record conversion failed; buffer dropped");
                offset
            }
        }
    }

    fn store(&mut self, frames: usize) {
        let Some(writer) = self.writer.as_mut() else {
            return;
        };
        let metrics = self.ctx.metrics();
        match writer.write_frames(self.output.frames(frames)) {
            Ok(()) => metrics.record_write(frames as u64),
            Err(e) => {
                warn!(error = %e, frames, "record write failed; buffer lost");
                metrics.record_write_error();
                self.ctx.emit(DuplexEvent::WriteFailed { frames });
            }
        }
    }

    /// Finalizes the record stream. Further fills convert but write nothing.
    pub fn close(&mut self) {
        if let Some(mut writer) = self.writer.take() {
            info!("closing record stream");
            if let Err(e) = writer.finalize() {
                error!(error = %e, "failed to finalize record stream");
            }
        }
    }
}

impl BackgroundJob for RecordFill {
    fn run(&mut self) {
        let frames = self.fill();
        debug!(frames, "record fill");
    }

    fn finish(&mut self) {
        self.close();
    }
}
