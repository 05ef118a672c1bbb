use crate::{MinifyError, Result, SourceSet};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const WORKSPACE_PREFIX: &str = "minify";

/// Scratch directory holding the file set currently offered to the verifier.
///
/// Only one attempt runs at a time, so the directory needs no locking. It is
/// removed when the workspace is dropped.
#[derive(Debug)]
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    /// Create a fresh scratch directory under the system temp dir.
    pub fn create() -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix(WORKSPACE_PREFIX)
            .tempdir()?;
        log::debug!("workspace at {}", dir.path().display());
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Rewrite every file of `sources`, with `name` replaced by `content`.
    pub fn materialize_with(&self, sources: &SourceSet, name: &str, content: &str) -> Result<()> {
        if sources.get(name).is_none() {
            return Err(MinifyError::UnknownFile(name.to_string()));
        }
        for (file, original) in sources.iter() {
            let text = if file == name { content } else { original };
            self.write(file, text)?;
        }
        Ok(())
    }

    /// Rewrite every file of `sources` verbatim.
    pub fn materialize(&self, sources: &SourceSet) -> Result<()> {
        for (file, content) in sources.iter() {
            self.write(file, content)?;
        }
        Ok(())
    }

    fn write(&self, file: &str, content: &str) -> Result<()> {
        let path: PathBuf = self.dir.path().join(file);
        fs::write(&path, content).map_err(|err| MinifyError::write_failed(path, err))
    }
}
