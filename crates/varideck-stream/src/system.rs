//! Duplex system: setup, background tasks and teardown around the
//! real-time renderer.

use crate::aux_task::AuxiliaryTask;
use crate::context::DuplexContext;
use crate::error::Result;
use crate::events::{event_channel, DuplexEvent};
use crate::fill::{PlaybackFill, RecordFill};
use crate::metrics::IOMetricsSnapshot;
use crate::scheduler::{FillTask, ManualScheduler, ThreadedScheduler};
use crate::storage::{FrameReader, FrameWriter, WavFrameReader, WavFrameWriter};
use crate::swap::DuplexRenderer;
use crossbeam_channel::Receiver;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};
use varideck_core::{BufferConfig, ConverterQuality, DuplexConfig, ThresholdMode};

/// Record-while-playing session driven by background threads.
///
/// Hand the renderer to the audio callback with [`take_renderer`]; everything
/// else here is safe to use from a control thread.
///
/// [`take_renderer`]: DuplexSystem::take_renderer
pub struct DuplexSystem {
    ctx: Arc<DuplexContext>,
    events: Receiver<DuplexEvent>,
    renderer: Option<DuplexRenderer<ThreadedScheduler>>,
    record_task: Option<AuxiliaryTask>,
    playback_task: Option<AuxiliaryTask>,
    recording: bool,
    playing: bool,
}

impl DuplexSystem {
    pub fn builder() -> DuplexSystemBuilder {
        DuplexSystemBuilder::default()
    }

    /// The real-time half. Returns `None` once taken.
    pub fn take_renderer(&mut self) -> Option<DuplexRenderer<ThreadedScheduler>> {
        self.renderer.take()
    }

    pub fn context(&self) -> &Arc<DuplexContext> {
        &self.ctx
    }

    pub fn varispeed(&self) -> f64 {
        self.ctx.varispeed()
    }

    /// Takes effect at the next fill in each direction. Returns the clamped ratio.
    pub fn set_varispeed(&self, ratio: f64) -> f64 {
        self.ctx.set_varispeed(ratio)
    }

    pub fn events(&self) -> &Receiver<DuplexEvent> {
        &self.events
    }

    pub fn stats(&self) -> IOMetricsSnapshot {
        self.ctx.metrics().snapshot()
    }

    /// False when the record file could not be opened.
    pub fn is_recording(&self) -> bool {
        self.recording
    }

    /// False when the playback file could not be opened.
    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn is_playback_finished(&self) -> bool {
        self.ctx.is_playback_finished()
    }

    /// Stops both background tasks and closes the files. Idempotent.
    pub fn shutdown(&mut self) {
        if self.record_task.is_none() && self.playback_task.is_none() {
            return;
        }
        info!("closing sound files");
        if let Some(mut task) = self.record_task.take() {
            task.stop();
        }
        if let Some(mut task) = self.playback_task.take() {
            task.stop();
        }
        let stats = self.stats();
        info!(
            frames_written = stats.frames_written,
            frames_read = stats.frames_read,
            overruns = stats.overruns,
            underruns = stats.underruns,
            "duplex session closed"
        );
    }
}

impl Drop for DuplexSystem {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Record-while-playing session with no threads: fills run inline right
/// after each rendered block, or when the caller asks.
pub struct OfflineDuplex {
    ctx: Arc<DuplexContext>,
    events: Receiver<DuplexEvent>,
    renderer: DuplexRenderer<ManualScheduler>,
    scheduler: ManualScheduler,
    record: Option<RecordFill>,
    playback: Option<PlaybackFill>,
}

impl OfflineDuplex {
    /// Renders one block, then runs every fill it requested.
    pub fn process(&mut self, input: &[f32], output: &mut [f32]) {
        self.renderer.render(input, output);
        self.run_pending_fills();
    }

    /// Renders one block and leaves requested fills pending, as if the
    /// background tasks were late.
    pub fn render_only(&mut self, input: &[f32], output: &mut [f32]) {
        self.renderer.render(input, output);
    }

    pub fn is_pending(&self, task: FillTask) -> bool {
        self.scheduler.is_pending(task)
    }

    /// Runs one requested fill. Returns false if none was pending.
    pub fn run_fill(&mut self, task: FillTask) -> bool {
        if !self.scheduler.take(task) {
            return false;
        }
        match task {
            FillTask::Record => {
                if let Some(fill) = self.record.as_mut() {
                    fill.fill();
                }
            }
            FillTask::Playback => {
                if let Some(fill) = self.playback.as_mut() {
                    fill.fill();
                }
            }
        }
        true
    }

    pub fn run_pending_fills(&mut self) {
        self.run_fill(FillTask::Record);
        self.run_fill(FillTask::Playback);
    }

    pub fn context(&self) -> &Arc<DuplexContext> {
        &self.ctx
    }

    pub fn set_varispeed(&self, ratio: f64) -> f64 {
        self.ctx.set_varispeed(ratio)
    }

    pub fn events(&self) -> &Receiver<DuplexEvent> {
        &self.events
    }

    pub fn stats(&self) -> IOMetricsSnapshot {
        self.ctx.metrics().snapshot()
    }

    pub fn is_recording(&self) -> bool {
        self.record.is_some()
    }

    pub fn is_playing(&self) -> bool {
        self.playback.is_some()
    }

    pub fn is_playback_finished(&self) -> bool {
        self.ctx.is_playback_finished()
    }

    /// Closes the record stream. Audio still in the active record half has
    /// not reached a fill and is not written.
    pub fn finish(&mut self) {
        if let Some(fill) = self.record.as_mut() {
            fill.close();
        }
    }
}

impl Drop for OfflineDuplex {
    fn drop(&mut self) {
        self.finish();
    }
}

/// Builder for [`DuplexSystem`] and [`OfflineDuplex`].
#[derive(Default)]
pub struct DuplexSystemBuilder {
    config: DuplexConfig,
    writer: Option<Box<dyn FrameWriter>>,
    reader: Option<Box<dyn FrameReader>>,
}

impl DuplexSystemBuilder {
    pub fn config(mut self, config: DuplexConfig) -> Self {
        self.config = config;
        self
    }

    pub fn sample_rate(mut self, sample_rate: u32) -> Self {
        self.config.sample_rate = sample_rate;
        self
    }

    pub fn channels(mut self, input: usize, output: usize) -> Self {
        self.config.input_channels = input;
        self.config.output_channels = output;
        self
    }

    /// `None` disables recording.
    pub fn record_path(mut self, path: Option<impl Into<PathBuf>>) -> Self {
        self.config.record_path = path.map(Into::into);
        self
    }

    /// `None` disables playback.
    pub fn playback_path(mut self, path: Option<impl Into<PathBuf>>) -> Self {
        self.config.playback_path = path.map(Into::into);
        self
    }

    /// Records into `writer` instead of a file at `record_path`.
    pub fn record_writer(mut self, writer: Box<dyn FrameWriter>) -> Self {
        self.writer = Some(writer);
        self
    }

    /// Plays from `reader` instead of a file at `playback_path`.
    pub fn playback_reader(mut self, reader: Box<dyn FrameReader>) -> Self {
        self.reader = Some(reader);
        self
    }

    pub fn varispeed(mut self, ratio: f64) -> Self {
        self.config.varispeed = ratio;
        self
    }

    pub fn buffers(mut self, buffers: BufferConfig) -> Self {
        self.config.buffers = buffers;
        self
    }

    pub fn converter(mut self, quality: ConverterQuality) -> Self {
        self.config.buffers.converter = quality;
        self
    }

    pub fn threshold_mode(mut self, mode: ThresholdMode) -> Self {
        self.config.buffers.threshold_mode = mode;
        self
    }

    /// Opens the streams, primes playback and starts both background tasks.
    pub fn build(self) -> Result<DuplexSystem> {
        let priority = self.config.buffers.task_priority;
        let prepared = self.prepare()?;

        let record_task = prepared
            .record
            .map(|fill| AuxiliaryTask::spawn("varideck-record", priority, fill))
            .transpose()?;
        let playback_task = prepared
            .playback
            .map(|fill| AuxiliaryTask::spawn("varideck-playback", priority, fill))
            .transpose()?;

        let scheduler = ThreadedScheduler::new(
            record_task.as_ref().map(AuxiliaryTask::waker),
            playback_task.as_ref().map(AuxiliaryTask::waker),
        );
        let recording = record_task.is_some();
        let playing = playback_task.is_some();
        let renderer =
            DuplexRenderer::new(Arc::clone(&prepared.ctx), scheduler, recording, playing);

        Ok(DuplexSystem {
            ctx: prepared.ctx,
            events: prepared.events,
            renderer: Some(renderer),
            record_task,
            playback_task,
            recording,
            playing,
        })
    }

    /// Opens the streams and primes playback; fills run on the caller's thread.
    pub fn build_offline(self) -> Result<OfflineDuplex> {
        let prepared = self.prepare()?;
        let scheduler = ManualScheduler::new();
        let renderer = DuplexRenderer::new(
            Arc::clone(&prepared.ctx),
            scheduler.clone(),
            prepared.record.is_some(),
            prepared.playback.is_some(),
        );

        Ok(OfflineDuplex {
            ctx: prepared.ctx,
            events: prepared.events,
            renderer,
            scheduler,
            record: prepared.record,
            playback: prepared.playback,
        })
    }

    fn prepare(self) -> Result<Prepared> {
        self.config.validate()?;
        let config = self.config;

        let (events_tx, events) = event_channel(config.buffers.event_capacity);
        let ctx = Arc::new(DuplexContext::new(&config, events_tx));

        let writer = self.writer.or_else(|| open_writer(&config));
        let reader = self.reader.or_else(|| open_reader(&config));

        let record = writer
            .map(|w| RecordFill::new(Arc::clone(&ctx), w))
            .transpose()?;
        let mut playback = reader
            .map(|r| PlaybackFill::new(Arc::clone(&ctx), r))
            .transpose()?;

        if let Some(fill) = playback.as_mut() {
            let primed = fill.fill();
            info!(frames = primed, "play buffer primed");
        }

        info!(
            sample_rate = config.sample_rate,
            input_channels = config.input_channels,
            output_channels = config.output_channels,
            varispeed = ctx.varispeed(),
            recording = record.is_some(),
            playing = playback.is_some(),
            "duplex session ready"
        );

        Ok(Prepared {
            ctx,
            events,
            record,
            playback,
        })
    }
}

struct Prepared {
    ctx: Arc<DuplexContext>,
    events: Receiver<DuplexEvent>,
    record: Option<RecordFill>,
    playback: Option<PlaybackFill>,
}

fn open_writer(config: &DuplexConfig) -> Option<Box<dyn FrameWriter>> {
    let path = config.record_path.as_ref()?;
    match WavFrameWriter::create(path, config.sample_rate, config.input_channels) {
        Ok(writer) => {
            info!(path = %path.display(), channels = config.input_channels, "record file opened");
            Some(Box::new(writer))
        }
        Err(e) => {
            error!(path = %path.display(), error = %e, "could not open record file; recording disabled");
            None
        }
    }
}

fn open_reader(config: &DuplexConfig) -> Option<Box<dyn FrameReader>> {
    let path = config.playback_path.as_ref()?;
    match WavFrameReader::open(path) {
        Ok(reader) => {
            info!(
                path = %path.display(),
                channels = reader.channels(),
                sample_rate = reader.sample_rate(),
                "playback file opened"
            );
            if reader.sample_rate() != config.sample_rate {
                warn!(
                    file_rate = reader.sample_rate(),
                    device_rate = config.sample_rate,
                    "playback file rate differs from device rate; played without conversion"
                );
            }
            Some(Box::new(reader))
        }
        Err(e) => {
            error!(path = %path.display(), error = %e, "could not open playback file; playback disabled");
            None
        }
    }
}
