use crate::{MinifyError, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Suffix of the per-file snapshot written after every accepted removal.
pub const WORKING_SUFFIX: &str = ".working";

/// Receives the best-known content of a file after each accepted removal.
pub trait SnapshotSink: Send + Sync {
    fn persist(&self, name: &str, content: &str) -> Result<()>;
}

/// Writes `<out_dir>/<name>.working`.
#[derive(Debug, Clone)]
pub struct WorkingCopySink {
    out_dir: PathBuf,
}

impl WorkingCopySink {
    pub fn new(out_dir: impl AsRef<Path>) -> Self {
        Self {
            out_dir: out_dir.as_ref().to_path_buf(),
        }
    }

    pub fn snapshot_path(&self, name: &str) -> PathBuf {
        self.out_dir.join(format!("{name}{WORKING_SUFFIX}"))
    }
}

impl SnapshotSink for WorkingCopySink {
    fn persist(&self, name: &str, content: &str) -> Result<()> {
        fs::create_dir_all(&self.out_dir)
            .map_err(|err| MinifyError::write_failed(&self.out_dir, err))?;
        let path = self.snapshot_path(name);
        fs::write(&path, content).map_err(|err| MinifyError::write_failed(path, err))
    }
}
