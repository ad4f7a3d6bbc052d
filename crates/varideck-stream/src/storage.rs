//! Sample file storage: interleaved 32-bit float WAV via hound.

use crate::error::{Error, Result};
use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// Sink for recorded audio.
pub trait FrameWriter: Send {
    /// Appends interleaved samples.
    fn write_frames(&mut self, samples: &[f32]) -> Result<()>;

    /// Flushes and closes the stream. Writes after this are errors.
    fn finalize(&mut self) -> Result<()>;
}

/// Source of audio to play back.
pub trait FrameReader: Send {
    fn channels(&self) -> usize;

    fn sample_rate(&self) -> u32;

    /// Fills `out` with whole interleaved frames. Returns frames read; 0 at
    /// end of stream.
    fn read_frames(&mut self, out: &mut [f32]) -> Result<usize>;
}

/// Float WAV recorder at the device channel count and rate.
pub struct WavFrameWriter {
    writer: Option<WavWriter<BufWriter<File>>>,
    channels: usize,
}

impl WavFrameWriter {
    pub fn create(path: &Path, sample_rate: u32, channels: usize) -> Result<Self> {
        let spec = WavSpec {
            channels: channels as u16,
            sample_rate,
            bits_per_sample: 32,
            sample_format: SampleFormat::Float,
        };
        let file = File::create(path)?;
        let writer = WavWriter::new(BufWriter::new(file), spec)?;
        Ok(Self {
            writer: Some(writer),
            channels,
        })
    }

    pub fn channels(&self) -> usize {
        self.channels
    }
}

impl FrameWriter for WavFrameWriter {
    fn write_frames(&mut self, samples: &[f32]) -> Result<()> {
        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| Error::Io(std::io::Error::other("record stream already closed")))?;
        for &sample in samples {
            writer.write_sample(sample)?;
        }
        Ok(())
    }

    fn finalize(&mut self) -> Result<()> {
        match self.writer.take() {
            Some(writer) => Ok(writer.finalize()?),
            None => Ok(()),
        }
    }
}

/// Float WAV player. The channel count comes from the file header.
pub struct WavFrameReader {
    reader: WavReader<BufReader<File>>,
    channels: usize,
    sample_rate: u32,
}

impl WavFrameReader {
    pub fn open(path: &Path) -> Result<Self> {
        let reader = WavReader::open(path)?;
        let spec = reader.spec();
        if spec.sample_format != SampleFormat::Float || spec.bits_per_sample != 32 {
            return Err(Error::UnsupportedFormat(format!(
                "{}: {:?} {}-bit (expected 32-bit float)",
                path.display(),
                spec.sample_format,
                spec.bits_per_sample
            )));
        }
        Ok(Self {
            reader,
            channels: spec.channels.max(1) as usize,
            sample_rate: spec.sample_rate,
        })
    }
}

impl FrameReader for WavFrameReader {
    fn channels(&self) -> usize {
        self.channels
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn read_frames(&mut self, out: &mut [f32]) -> Result<usize> {
        let whole = out.len() - out.len() % self.channels;
        let mut read = 0;
        for (slot, sample) in out[..whole].iter_mut().zip(self.reader.samples::<f32>()) {
            *slot = sample?;
            read += 1;
        }
        Ok(read / self.channels)
    }
}
