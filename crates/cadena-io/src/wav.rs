//! WAV file reading and writing.
//!
//! Samples are kept interleaved: a chain's source is played and rendered
//! with its own channel layout, so nothing here mixes channels down.

use std::path::Path;

use cadena_core::{AudioFormat, LoadError, SourceBuffer, SourceLoader};
use hound::{SampleFormat, WavReader, WavWriter};

use crate::{Error, Result};

/// WAV file specification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavSpec {
    /// Number of audio channels.
    pub channels: u16,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Bit depth per sample. 32 means IEEE float, anything else integer PCM.
    pub bits_per_sample: u16,
}

impl WavSpec {
    /// 32-bit float output matching `format`.
    pub fn float(format: AudioFormat) -> Self {
        Self {
            channels: format.channels,
            sample_rate: format.sample_rate,
            bits_per_sample: 32,
        }
    }

    /// The channel layout and rate as an engine format.
    pub fn audio_format(&self) -> AudioFormat {
        AudioFormat {
            sample_rate: self.sample_rate,
            channels: self.channels,
        }
    }
}

impl Default for WavSpec {
    fn default() -> Self {
        Self::float(AudioFormat::default())
    }
}

impl From<hound::WavSpec> for WavSpec {
    fn from(spec: hound::WavSpec) -> Self {
        Self {
            channels: spec.channels,
            sample_rate: spec.sample_rate,
            bits_per_sample: spec.bits_per_sample,
        }
    }
}

impl From<WavSpec> for hound::WavSpec {
    fn from(spec: WavSpec) -> Self {
        hound::WavSpec {
            channels: spec.channels,
            sample_rate: spec.sample_rate,
            bits_per_sample: spec.bits_per_sample,
            sample_format: if spec.bits_per_sample == 32 {
                SampleFormat::Float
            } else {
                SampleFormat::Int
            },
        }
    }
}

/// Reads a WAV file as interleaved f32 samples in -1.0..=1.0.
pub fn read_wav<P: AsRef<Path>>(path: P) -> Result<(Vec<f32>, WavSpec)> {
    let reader = WavReader::open(path)?;
    let header = reader.spec();
    let spec = WavSpec::from(header);

    if spec.channels == 0 {
        return Err(Error::UnsupportedFormat("zero channels".into()));
    }

    let samples = match header.sample_format {
        SampleFormat::Float => reader
            .into_samples::<f32>()
            .collect::<std::result::Result<Vec<_>, _>>()?,
        SampleFormat::Int => {
            let bits = spec.bits_per_sample;
            if bits == 0 || bits > 32 {
                return Err(Error::UnsupportedFormat(format!("{bits}-bit PCM")));
            }
            let full_scale = (1i64 << (bits - 1)) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 / full_scale))
                .collect::<std::result::Result<Vec<_>, _>>()?
        }
    };

    Ok((samples, spec))
}

/// Writes interleaved samples to a WAV file.
pub fn write_wav<P: AsRef<Path>>(path: P, samples: &[f32], spec: WavSpec) -> Result<()> {
    let mut writer = WavWriter::create(path, hound::WavSpec::from(spec))?;

    if spec.bits_per_sample == 32 {
        for &sample in samples {
            writer.write_sample(sample)?;
        }
    } else {
        let bits = spec.bits_per_sample;
        if bits == 0 || bits > 32 {
            return Err(Error::UnsupportedFormat(format!("{bits}-bit PCM")));
        }
        let full_scale = ((1i64 << (bits - 1)) - 1) as f32;
        for &sample in samples {
            writer.write_sample((sample.clamp(-1.0, 1.0) * full_scale) as i32)?;
        }
    }

    writer.finalize()?;
    Ok(())
}

/// Decodes WAV files into chain sources.
#[derive(Debug, Clone, Copy, Default)]
pub struct WavLoader;

impl SourceLoader for WavLoader {
    fn load(&self, path: &Path) -> std::result::Result<SourceBuffer, LoadError> {
        let (samples, spec) = read_wav(path)?;
        tracing::info!(
            "loaded {}: {} ch, {} Hz, {} frames",
            path.display(),
            spec.channels,
            spec.sample_rate,
            samples.len() / usize::from(spec.channels)
        );
        Ok(SourceBuffer::new(path, spec.audio_format(), samples))
    }
}
