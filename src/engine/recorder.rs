//! WAV file recorder
//!
//! Writes the engine's stereo output to disk as 32-bit float WAV.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use anyhow::{Context, Result};
use hound::{SampleFormat, WavSpec, WavWriter};

const CHANNELS: u16 = 2;

pub struct Recorder {
    writer: WavWriter<BufWriter<File>>,
    sample_rate: u32,
    frames_written: u64,
}

impl Recorder {
    pub fn new(path: &Path, sample_rate: u32) -> Result<Self> {
        let spec = WavSpec {
            channels: CHANNELS,
            sample_rate,
            bits_per_sample: 32,
            sample_format: SampleFormat::Float,
        };

        let writer = WavWriter::create(path, spec)
            .with_context(|| format!("failed to create WAV file: {:?}", path))?;

        Ok(Self {
            writer,
            sample_rate,
            frames_written: 0,
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    pub fn duration_secs(&self) -> f64 {
        self.frames_written as f64 / self.sample_rate as f64
    }

    /// Write one stereo frame.
    pub fn write_frame(&mut self, frame: [f32; 2]) -> Result<()> {
        for sample in frame {
            self.writer
                .write_sample(sample)
                .context("failed to write sample")?;
        }
        self.frames_written += 1;
        Ok(())
    }

    /// Write an interleaved stereo buffer.
    pub fn write_interleaved(&mut self, buffer: &[f32]) -> Result<()> {
        for &sample in buffer {
            self.writer
                .write_sample(sample)
                .context("failed to write sample")?;
        }
        self.frames_written += buffer.len() as u64 / CHANNELS as u64;
        Ok(())
    }

    /// Close the file and write the header. Must be called for a valid WAV.
    pub fn finalize(self) -> Result<()> {
        self.writer.finalize().context("failed to finalize WAV file")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_recorder_counts_frames() {
        let file = NamedTempFile::new().unwrap();
        let mut recorder = Recorder::new(file.path(), 44100).unwrap();

        recorder.write_frame([0.5, -0.5]).unwrap();
        recorder.write_frame([0.1, 0.1]).unwrap();
        assert_eq!(recorder.frames_written(), 2);

        recorder.write_interleaved(&[0.0, 0.0, 0.25, 0.25]).unwrap();
        assert_eq!(recorder.frames_written(), 4);
    }

    #[test]
    fn test_recorder_duration() {
        let file = NamedTempFile::new().unwrap();
        let mut recorder = Recorder::new(file.path(), 1000).unwrap();
        for _ in 0..500 {
            recorder.write_frame([0.0, 0.0]).unwrap();
        }
        assert!((recorder.duration_secs() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_recorder_produces_valid_stereo_wav() {
        let file = NamedTempFile::new().unwrap();
        let path = file.path().to_path_buf();

        {
            let mut recorder = Recorder::new(&path, 44100).unwrap();
            for i in 0..1000 {
                let t = i as f32 / 1000.0;
                let sample = (t * std::f32::consts::PI * 2.0).sin();
                recorder.write_frame([sample, -sample]).unwrap();
            }
            recorder.finalize().unwrap();
        }

        let reader = hound::WavReader::open(&path).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.channels, 2);
        assert_eq!(spec.sample_rate, 44100);
        assert_eq!(spec.sample_format, SampleFormat::Float);

        let samples: Vec<f32> = reader.into_samples().map(|s| s.unwrap()).collect();
        assert_eq!(samples.len(), 2000);
        // Left and right are mirrored.
        assert!((samples[100] + samples[101]).abs() < 1e-6);
    }
}
