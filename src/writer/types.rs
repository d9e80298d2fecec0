//! Writer output types

use crate::error::Result;
use std::path::Path;
use tempfile::NamedTempFile;

/// Result of writing one chunk
#[derive(Debug)]
pub enum ChunkOutcome {
    /// Rows were written to a compressed file
    Staged(StagedFile),
    /// Nothing to load
    Empty,
}

impl ChunkOutcome {
    /// True for [`ChunkOutcome::Empty`]
    pub fn is_empty(&self) -> bool {
        matches!(self, ChunkOutcome::Empty)
    }
}

/// A finished gzip staging file; removed from disk when dropped
#[derive(Debug)]
pub struct StagedFile {
    /// Temp file handle
    file: NamedTempFile,
    /// Rows written
    rows: usize,
    /// Records dropped (malformed or no matching columns)
    skipped: usize,
    /// Compressed size in bytes
    size: u64,
}

impl StagedFile {
    pub(crate) fn new(file: NamedTempFile, rows: usize, skipped: usize) -> Result<Self> {
        file.as_file().sync_all()?;
        let size = file.as_file().metadata()?.len();
        Ok(Self {
            file,
            rows,
            skipped,
            size,
        })
    }

    /// Location on disk
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Rows written
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Records dropped
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Compressed size in bytes
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Read the compressed contents
    pub async fn read(&self) -> Result<Vec<u8>> {
        Ok(tokio::fs::read(self.path()).await?)
    }
}
