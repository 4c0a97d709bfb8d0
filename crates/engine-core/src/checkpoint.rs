use crate::error::CheckpointError;
use connectors::file::TableWriter;
use model::records::output::OutputTable;
use std::{
    ffi::OsString,
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};
use tracing::{debug, info};

const WORKING_SUFFIX: &str = ".tmp";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckpointStatus {
    Written,
    /// Content matched the previous checkpoint; nothing was written.
    Unchanged,
}

/// Persists the output table to a working file next to the final artifact.
///
/// Every checkpoint writes the full table, never a delta. The final path is
/// only touched by [`CheckpointWriter::finalize`], which renames the working
/// file over it.
pub struct CheckpointWriter {
    writer: Arc<dyn TableWriter>,
    final_path: PathBuf,
    working_path: PathBuf,
    last_digest: Option<blake3::Hash>,
    writes: u64,
}

impl CheckpointWriter {
    pub fn new(writer: Arc<dyn TableWriter>, final_path: impl Into<PathBuf>) -> Self {
        let final_path = final_path.into();
        let working_path = working_path_for(&final_path);
        CheckpointWriter {
            writer,
            final_path,
            working_path,
            last_digest: None,
            writes: 0,
        }
    }

    pub fn final_path(&self) -> &Path {
        &self.final_path
    }

    pub fn working_path(&self) -> &Path {
        &self.working_path
    }

    /// Number of checkpoints that actually hit the disk.
    pub fn writes(&self) -> u64 {
        self.writes
    }

    pub fn checkpoint(&mut self, table: &OutputTable) -> Result<CheckpointStatus, CheckpointError> {
        let digest = digest(table);
        if self.last_digest == Some(digest) {
            debug!(path = %self.working_path.display(), "checkpoint unchanged, skipping write");
            return Ok(CheckpointStatus::Unchanged);
        }

        self.writer
            .write(&self.working_path, table.headers(), table.rows())
            .map_err(|source| CheckpointError::Write {
                path: self.working_path.clone(),
                source,
            })?;

        self.last_digest = Some(digest);
        self.writes += 1;
        debug!(
            path = %self.working_path.display(),
            rows_written = table.rows_written(),
            "checkpoint saved"
        );
        Ok(CheckpointStatus::Written)
    }

    /// Writes the current table and promotes the working file to the final path.
    pub fn finalize(mut self, table: &OutputTable) -> Result<PathBuf, CheckpointError> {
        self.checkpoint(table)?;

        fs::rename(&self.working_path, &self.final_path).map_err(|source| {
            CheckpointError::Promote {
                from: self.working_path.clone(),
                to: self.final_path.clone(),
                source,
            }
        })?;

        info!(path = %self.final_path.display(), rows = table.len(), "output saved");
        Ok(self.final_path)
    }
}

/// `out/data.csv` -> `out/data.csv.tmp`.
pub fn working_path_for(final_path: &Path) -> PathBuf {
    let mut name: OsString = final_path.as_os_str().to_owned();
    name.push(WORKING_SUFFIX);
    PathBuf::from(name)
}

fn digest(table: &OutputTable) -> blake3::Hash {
    let mut hasher = blake3::Hasher::new();
    for row in std::iter::once(table.headers()).chain(table.rows().iter().map(Vec::as_slice)) {
        hasher.update(&(row.len() as u64).to_le_bytes());
        for cell in row {
            hasher.update(&(cell.len() as u64).to_le_bytes());
            hasher.update(cell.as_bytes());
        }
    }
    hasher.finalize()
}
