//! WAV render output.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use cadena_core::{AudioFormat, LoadError, RenderSink};
use hound::WavWriter;

use crate::wav::WavSpec;
use crate::{Error, Result};

/// Streams rendered chunks into a 32-bit float WAV file.
///
/// The file is created up front. [`finish`](RenderSink::finish) finalizes
/// the header; [`abort`](RenderSink::abort) closes and deletes the file.
pub struct WavSink {
    path: PathBuf,
    writer: Option<WavWriter<BufWriter<File>>>,
    samples_written: u64,
}

impl WavSink {
    /// Creates `path` for output in `format`.
    pub fn create(path: impl Into<PathBuf>, format: AudioFormat) -> Result<Self> {
        let path = path.into();
        if format.channels == 0 {
            return Err(Error::UnsupportedFormat("zero channels".into()));
        }
        let writer = WavWriter::create(&path, hound::WavSpec::from(WavSpec::float(format)))?;
        Ok(Self {
            path,
            writer: Some(writer),
            samples_written: 0,
        })
    }

    /// The output file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Interleaved samples written so far.
    pub fn samples_written(&self) -> u64 {
        self.samples_written
    }

    fn writer(&mut self) -> Result<&mut WavWriter<BufWriter<File>>> {
        self.writer
            .as_mut()
            .ok_or_else(|| Error::Closed(self.path.clone()))
    }
}

impl RenderSink for WavSink {
    fn write(&mut self, samples: &[f32]) -> std::result::Result<(), LoadError> {
        let writer = self.writer()?;
        for &sample in samples {
            writer.write_sample(sample).map_err(Error::from)?;
        }
        self.samples_written += samples.len() as u64;
        Ok(())
    }

    fn finish(&mut self) -> std::result::Result<PathBuf, LoadError> {
        let writer = self
            .writer
            .take()
            .ok_or_else(|| Error::Closed(self.path.clone()))?;
        writer.finalize().map_err(Error::from)?;
        Ok(self.path.clone())
    }

    fn abort(&mut self) {
        let Some(writer) = self.writer.take() else {
            return;
        };
        drop(writer);
        match std::fs::remove_file(&self.path) {
            Ok(()) => tracing::debug!("discarded partial render {}", self.path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!("could not remove {}: {e}", self.path.display()),
        }
    }
}

impl std::fmt::Debug for WavSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WavSink")
            .field("path", &self.path)
            .field("open", &self.writer.is_some())
            .field("samples_written", &self.samples_written)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wav::read_wav;

    #[test]
    fn finish_produces_readable_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.wav");

        let mut sink = WavSink::create(&path, AudioFormat::default()).unwrap();
        sink.write(&[0.1, 0.2, 0.3, 0.4]).unwrap();
        sink.write(&[0.5, 0.6]).unwrap();
        assert_eq!(sink.finish().unwrap(), path);

        let (samples, spec) = read_wav(&path).unwrap();
        assert_eq!(spec.channels, 2);
        assert_eq!(samples, vec![0.1, 0.2, 0.3, 0.4, 0.5, 0.6]);
    }

    #[test]
    fn abort_deletes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("partial.wav");

        let mut sink = WavSink::create(&path, AudioFormat::default()).unwrap();
        sink.write(&[0.0; 8]).unwrap();
        assert!(path.exists());
        sink.abort();
        assert!(!path.exists());
    }

    #[test]
    fn closed_sink_rejects_writes() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = WavSink::create(dir.path().join("a.wav"), AudioFormat::default()).unwrap();
        sink.finish().unwrap();
        assert!(sink.write(&[0.0, 0.0]).is_err());
        assert!(sink.finish().is_err());
        // Already finalized; abort must not delete a finished render.
        sink.abort();
        assert!(dir.path().join("a.wav").exists());
    }
}
