//! Newline-delimited JSON sink.
//!
//! One line per accepted article, flushed after every write so a crashed run
//! keeps everything written before the crash.
//!
//! # Modes
//!
//! - [`SinkMode::Fresh`]: truncate the destination when the run starts
//! - [`SinkMode::Append`]: keep earlier runs' lines and append after them

use crate::error::PipelineError;
use crate::utils::ensure_parent_dir;
use clap::ValueEnum;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{error, info, instrument};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SinkMode {
    /// Truncate the output file at run start.
    Fresh,
    /// Append to whatever the output file already holds.
    Append,
}

/// Which record shape the run writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Full classified records.
    Record,
    /// URL, publish date and a text preview for inspecting the crawl.
    Debug,
}

#[derive(Debug)]
pub struct RecordSink {
    file: File,
    path: PathBuf,
    written: u64,
}

impl RecordSink {
    /// Open the destination in the requested mode.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Io`] if the file or its parent directory
    /// cannot be created. Callers treat this as fatal.
    #[instrument(level = "info", skip_all, fields(path = %path.as_ref().display(), ?mode))]
    pub async fn open(path: impl AsRef<Path>, mode: SinkMode) -> Result<Self, PipelineError> {
        let path = path.as_ref().to_path_buf();
        ensure_parent_dir(&path).await?;

        let mut options = OpenOptions::new();
        options.create(true);
        match mode {
            SinkMode::Fresh => options.write(true).truncate(true),
            SinkMode::Append => options.append(true),
        };
        let file = options.open(&path).await.map_err(|e| {
            error!(path = %path.display(), error = %e, "Output file is not writable");
            PipelineError::Io(e)
        })?;

        info!("Opened record sink");
        Ok(RecordSink {
            file,
            path,
            written: 0,
        })
    }

    /// Serialize `item` as one line and flush it to disk.
    pub async fn write<T: Serialize>(&mut self, item: &T) -> Result<(), PipelineError> {
        let mut line = serde_json::to_vec(item)?;
        line.push(b'\n');
        self.file.write_all(&line).await?;
        self.file.flush().await?;
        self.file.sync_data().await?;
        self.written += 1;
        Ok(())
    }

    pub fn written(&self) -> u64 {
        self.written
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
