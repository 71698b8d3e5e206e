// src/recorder.rs
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::drivers::PipelineError;

/// Append-only raw sample log: one decimal value per line, flushed per write.
pub struct SampleLog {
    writer: BufWriter<File>,
    path: PathBuf,
    written: u64,
}

impl SampleLog {
    pub fn open(path: &Path) -> Result<Self, PipelineError> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(PipelineError::Log)?;
        log::info!("💾 Logging samples to {}", path.display());
        Ok(Self {
            writer: BufWriter::new(file),
            path: path.to_path_buf(),
            written: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn written(&self) -> u64 {
        self.written
    }

    pub fn write_sample(&mut self, value: f64) -> Result<(), PipelineError> {
        writeln!(self.writer, "{}", value).map_err(PipelineError::Log)?;
        self.writer.flush().map_err(PipelineError::Log)?;
        self.written += 1;
        Ok(())
    }
}

impl Drop for SampleLog {
    fn drop(&mut self) {
        self.writer.flush().ok();
        log::info!("💾 Sample log closed ({} samples written).", self.written);
    }
}
