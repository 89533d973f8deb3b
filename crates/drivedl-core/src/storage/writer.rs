//! Sequential chunk writer for the temp download file.

use anyhow::{Context, Result};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Writer for one download. Chunks are appended in arrival order.
pub struct StorageWriter {
    file: File,
    temp_path: PathBuf,
    final_path: PathBuf,
    bytes_written: u64,
}

impl StorageWriter {
    /// Create (or truncate) the temp file for `final_path`.
    pub fn create(final_path: &Path) -> Result<Self> {
        let temp_path = super::temp_path(final_path);
        let file = File::options()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&temp_path)
            .with_context(|| format!("failed to create temp file: {}", temp_path.display()))?;
        tracing::debug!("writing to {}", temp_path.display());
        Ok(StorageWriter {
            file,
            temp_path,
            final_path: final_path.to_path_buf(),
            bytes_written: 0,
        })
    }

    /// Append one body chunk.
    pub fn write_chunk(&mut self, data: &[u8]) -> Result<()> {
        self.file
            .write_all(data)
            .with_context(|| format!("write to {} failed", self.temp_path.display()))?;
        self.bytes_written += data.len() as u64;
        Ok(())
    }

    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Sync to disk and rename the temp file onto the final path.
    /// Returns the number of bytes written. On failure the temp file is removed.
    pub fn finalize(self) -> Result<u64> {
        if let Err(e) = self.file.sync_all().context("storage sync failed") {
            self.discard();
            return Err(e);
        }
        let StorageWriter {
            file,
            temp_path,
            final_path,
            bytes_written,
        } = self;
        drop(file);

        if let Err(e) = std::fs::rename(&temp_path, &final_path) {
            let _ = std::fs::remove_file(&temp_path);
            return Err(e).with_context(|| {
                format!(
                    "failed to rename {} to {}",
                    temp_path.display(),
                    final_path.display()
                )
            });
        }
        Ok(bytes_written)
    }

    /// Drop the file and delete the temp path (best effort).
    pub fn discard(self) {
        let StorageWriter { file, temp_path, .. } = self;
        drop(file);
        if let Err(e) = std::fs::remove_file(&temp_path) {
            tracing::debug!("could not remove {}: {}", temp_path.display(), e);
        }
    }
}
