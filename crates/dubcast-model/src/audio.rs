//! A minimal mono PCM buffer shared by the synthesizer and mixer, backed by
//! `hound` for reading and writing the WAV files the filesystem layout
//! names (`tts/segments/<utt_id>.wav`, `audio/{source,vocals,accompaniment,mix}.wav`).

use std::io::Cursor;
use std::path::Path;

use dubcast_foundation::error::ModelError;

#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    pub sample_rate: u32,
    pub samples: Vec<f32>,
}

impl AudioBuffer {
    pub fn silent(sample_rate: u32, duration_ms: u64) -> Self {
        let count = ((sample_rate as u64) * duration_ms / 1000) as usize;
        Self {
            sample_rate,
            samples: vec![0.0; count],
        }
    }

    pub fn duration_ms(&self) -> u64 {
        if self.sample_rate == 0 {
            return 0;
        }
        (self.samples.len() as u64) * 1000 / (self.sample_rate as u64)
    }

    pub fn read_wav(path: &Path) -> Result<Self, ModelError> {
        let reader = hound::WavReader::open(path)
            .map_err(|e| ModelError::InvalidSequence(format!("cannot read wav {path:?}: {e}")))?;
        Self::from_reader(reader)
    }

    pub fn read_wav_bytes(bytes: &[u8]) -> Result<Self, ModelError> {
        let reader = hound::WavReader::new(Cursor::new(bytes))
            .map_err(|e| ModelError::InvalidSequence(format!("cannot parse wav bytes: {e}")))?;
        Self::from_reader(reader)
    }

    fn from_reader<R: std::io::Read>(mut reader: hound::WavReader<R>) -> Result<Self, ModelError> {
        let spec = reader.spec();
        let samples: Vec<f32> = match spec.sample_format {
            hound::SampleFormat::Float => reader
                .samples::<f32>()
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| ModelError::InvalidSequence(e.to_string()))?,
            hound::SampleFormat::Int => reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / i32::MAX as f32))
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| ModelError::InvalidSequence(e.to_string()))?,
        };
        // Collapse to mono by averaging channels, since every artifact in
        // the filesystem layout is a single-track file.
        let channels = spec.channels.max(1) as usize;
        let mono: Vec<f32> = samples
            .chunks(channels)
            .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
            .collect();
        Ok(Self {
            sample_rate: spec.sample_rate,
            samples: mono,
        })
    }

    pub fn write_wav(&self, path: &Path) -> Result<(), ModelError> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: self.sample_rate,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };
        let mut writer = hound::WavWriter::create(path, spec)
            .map_err(|e| ModelError::InvalidSequence(format!("cannot create wav {path:?}: {e}")))?;
        for sample in &self.samples {
            writer
                .write_sample(*sample)
                .map_err(|e| ModelError::InvalidSequence(e.to_string()))?;
        }
        writer
            .finalize()
            .map_err(|e| ModelError::InvalidSequence(e.to_string()))?;
        Ok(())
    }

    /// Trims leading and trailing samples whose absolute amplitude stays
    /// below `threshold` for at least one sample — the synthesizer's
    /// "trim silence from both ends" step.
    pub fn trim_silence(&self, threshold: f32) -> Self {
        let first_loud = self.samples.iter().position(|s| s.abs() > threshold);
        let Some(first_loud) = first_loud else {
            return Self {
                sample_rate: self.sample_rate,
                samples: Vec::new(),
            };
        };
        let last_loud = self
            .samples
            .iter()
            .rposition(|s| s.abs() > threshold)
            .unwrap_or(first_loud);

        Self {
            sample_rate: self.sample_rate,
            samples: self.samples[first_loud..=last_loud].to_vec(),
        }
    }
}
