//! CPAL audio host: drives a [`DuplexRenderer`] from the default devices.
//!
//! The input stream pushes captured frames into a ring buffer; the output
//! stream pops one block of input, renders, and converts to the device
//! sample format. Only whole frames cross the ring, so a full ring or a
//! frame still being pushed never shifts the channel alignment.

use crate::{Error, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, SizedSample};
use ringbuf::{traits::*, HeapCons, HeapProd, HeapRb};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{info, warn};
use varideck_stream::{DuplexRenderer, ThreadedScheduler};

/// Frames rendered per inner block; larger device buffers are split.
const MAX_BLOCK_FRAMES: usize = 4096;

/// Seconds of captured audio the input ring can hold.
const INPUT_RING_SECONDS: usize = 1;

/// Sample rate and channel layout of the default devices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceConfig {
    pub sample_rate: u32,
    /// Zero when no input device is available.
    pub input_channels: usize,
    pub output_channels: usize,
}

/// Queries the default output device (and input device, if any).
pub fn default_device_config() -> Result<DeviceConfig> {
    let host = cpal::default_host();
    let output = host
        .default_output_device()
        .ok_or_else(|| Error::NoDevice("no output device".into()))?;
    let output_config = output.default_output_config()?;

    let input_channels = match host.default_input_device() {
        Some(device) => match device.default_input_config() {
            Ok(config) => config.channels() as usize,
            Err(e) => {
                warn!(error = %e, "default input device unusable");
                0
            }
        },
        None => 0,
    };

    Ok(DeviceConfig {
        sample_rate: output_config.sample_rate().0,
        input_channels,
        output_channels: output_config.channels() as usize,
    })
}

/// Wrapper to hold a `cpal::Stream` in a `Send` context.
///
/// `cpal::Stream` is `!Send` due to platform internals. The handle is only
/// kept alive and dropped; it is never used from another thread.
struct StreamHandle(#[allow(dead_code)] cpal::Stream);

// SAFETY: the stream is never accessed after construction; it is only
// dropped, by whoever owns the engine.
unsafe impl Send for StreamHandle {}

/// Running device streams. Dropping it stops audio.
pub struct AudioHost {
    _input: Option<StreamHandle>,
    _output: StreamHandle,
    dropped_input: Arc<AtomicU64>,
    config: DeviceConfig,
}

impl AudioHost {
    /// Starts the streams. `config` must describe the layout the renderer
    /// was built for.
    pub fn start(
        renderer: DuplexRenderer<ThreadedScheduler>,
        config: DeviceConfig,
    ) -> Result<Self> {
        let host = cpal::default_host();
        let output = host
            .default_output_device()
            .ok_or_else(|| Error::NoDevice("no output device".into()))?;
        let output_format = output.default_output_config()?.sample_format();

        let stream_config = |channels: usize| cpal::StreamConfig {
            channels: channels as u16,
            sample_rate: cpal::SampleRate(config.sample_rate),
            buffer_size: cpal::BufferSize::Default,
        };

        let ring = HeapRb::<f32>::new(
            (config.sample_rate as usize * INPUT_RING_SECONDS * config.input_channels).max(1),
        );
        let (producer, consumer) = ring.split();
        let dropped_input = Arc::new(AtomicU64::new(0));

        let input = match (host.default_input_device(), config.input_channels) {
            (Some(device), channels) if channels > 0 => {
                let format = device.default_input_config()?.sample_format();
                let cfg = stream_config(channels);
                let dropped = Arc::clone(&dropped_input);
                let stream = match format {
                    cpal::SampleFormat::F32 => {
                        build_input::<f32>(&device, &cfg, producer, dropped)?
                    }
                    cpal::SampleFormat::I16 => {
                        build_input::<i16>(&device, &cfg, producer, dropped)?
                    }
                    cpal::SampleFormat::U16 => {
                        build_input::<u16>(&device, &cfg, producer, dropped)?
                    }
                    format => return Err(Error::UnsupportedFormat(format!("{format:?}"))),
                };
                stream.play()?;
                Some(StreamHandle(stream))
            }
            _ => {
                warn!("no input device; recording silence");
                None
            }
        };

        let cfg = stream_config(config.output_channels);
        let stream = match output_format {
            cpal::SampleFormat::F32 => {
                build_output::<f32>(&output, &cfg, renderer, consumer, config)?
            }
            cpal::SampleFormat::I16 => {
                build_output::<i16>(&output, &cfg, renderer, consumer, config)?
            }
            cpal::SampleFormat::U16 => {
                build_output::<u16>(&output, &cfg, renderer, consumer, config)?
            }
            format => return Err(Error::UnsupportedFormat(format!("{format:?}"))),
        };
        stream.play()?;

        info!(
            sample_rate = config.sample_rate,
            input_channels = config.input_channels,
            output_channels = config.output_channels,
            "audio host started"
        );

        Ok(Self {
            _input: input,
            _output: StreamHandle(stream),
            dropped_input,
            config,
        })
    }

    pub fn config(&self) -> DeviceConfig {
        self.config
    }

    /// Captured frames lost because the ring was full.
    pub fn dropped_input_frames(&self) -> u64 {
        self.dropped_input.load(Ordering::Relaxed)
    }
}

fn build_input<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    mut producer: HeapProd<f32>,
    dropped: Arc<AtomicU64>,
) -> Result<cpal::Stream>
where
    T: SizedSample,
    f32: FromSample<T>,
{
    let channels = config.channels as usize;
    let stream = device.build_input_stream(
        config,
        move |data: &[T], _: &cpal::InputCallbackInfo| {
            let lost = push_frames(&mut producer, data, channels);
            if lost > 0 {
                dropped.fetch_add(lost, Ordering::Relaxed);
            }
        },
        |_err| {
            // Audio stream error - cannot log from callback
        },
        None,
    )?;
    Ok(stream)
}

fn build_output<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    mut renderer: DuplexRenderer<ThreadedScheduler>,
    mut consumer: HeapCons<f32>,
    layout: DeviceConfig,
) -> Result<cpal::Stream>
where
    T: SizedSample + FromSample<f32>,
{
    let in_ch = layout.input_channels;
    let out_ch = layout.output_channels;
    let mut input = vec![0.0f32; MAX_BLOCK_FRAMES * in_ch];
    let mut output = vec![0.0f32; MAX_BLOCK_FRAMES * out_ch];

    let stream = device.build_output_stream(
        config,
        move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
            let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                for block in data.chunks_mut(MAX_BLOCK_FRAMES * out_ch) {
                    let frames = block.len() / out_ch;
                    let captured = pop_frames(&mut consumer, &mut input[..frames * in_ch], in_ch);

                    renderer.render(&input[..captured], &mut output[..frames * out_ch]);

                    for (dst, &src) in block.iter_mut().zip(&output[..frames * out_ch]) {
                        *dst = T::from_sample(src);
                    }
                }
            }));

            if result.is_err() {
                // Panic in callback - output silence
                for sample in data.iter_mut() {
                    *sample = T::from_sample(0.0);
                }
            }
        },
        |_err| {
            // Audio stream error - cannot log from callback
        },
        None,
    )?;
    Ok(stream)
}

/// Pushes `data` one whole frame at a time. A frame that does not fit is
/// dropped entirely. Returns the frames dropped.
fn push_frames<T>(producer: &mut HeapProd<f32>, data: &[T], channels: usize) -> u64
where
    T: Copy,
    f32: FromSample<T>,
{
    if channels == 0 {
        return 0;
    }
    let mut dropped = 0;
    for frame in data.chunks_exact(channels) {
        if producer.vacant_len() < channels {
            dropped += 1;
            continue;
        }
        for &sample in frame {
            // Cannot fail: room for the whole frame was checked above.
            let _ = producer.try_push(f32::from_sample(sample));
        }
    }
    dropped
}

/// Pops the whole frames queued, at most as many as `buffer` holds.
/// Returns the samples popped, always a multiple of `channels`.
fn pop_frames(consumer: &mut HeapCons<f32>, buffer: &mut [f32], channels: usize) -> usize {
    if channels == 0 {
        return 0;
    }
    let queued = consumer.occupied_len() / channels * channels;
    let room = buffer.len() / channels * channels;
    consumer.pop_slice(&mut buffer[..queued.min(room)])
}
