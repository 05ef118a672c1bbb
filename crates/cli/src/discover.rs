use anyhow::{bail, Context as AnyhowContext, Result};
use minify_core::SourceSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Walk up from `start` to the nearest directory holding a regular file named
/// `marker`. The filesystem root itself is not considered.
pub fn find_root(start: &Path, marker: &str) -> Result<PathBuf> {
    let start = if start.is_absolute() {
        start.to_path_buf()
    } else {
        std::env::current_dir()
            .context("failed to resolve current directory")?
            .join(start)
    };

    for dir in start.ancestors().filter(|dir| dir.parent().is_some()) {
        if dir.join(marker).is_file() {
            log::debug!("project root: {}", dir.display());
            return Ok(dir.to_path_buf());
        }
    }

    bail!(
        "no {marker} found in {} or any parent directory",
        start.display()
    )
}

/// Load every regular file directly inside `dir` whose bytes contain `header`.
/// Symlinks are followed, so a link to a regular file counts as one.
pub fn collect_sources(dir: &Path, header: &str) -> Result<SourceSet> {
    let entries =
        fs::read_dir(dir).with_context(|| format!("failed to list {}", dir.display()))?;

    let mut sources = SourceSet::new();
    for entry in entries {
        let entry = entry.with_context(|| format!("failed to list {}", dir.display()))?;
        let path = entry.path();
        let metadata =
            fs::metadata(&path).with_context(|| format!("failed to stat {}", path.display()))?;
        if !metadata.is_file() {
            continue;
        }

        let bytes = fs::read(&path).with_context(|| format!("failed to read {}", path.display()))?;
        if !contains(&bytes, header.as_bytes()) {
            continue;
        }

        let name = entry.file_name().to_string_lossy().into_owned();
        let content = String::from_utf8(bytes)
            .with_context(|| format!("{} is not valid UTF-8", path.display()))?;
        sources.insert(name, content);
    }

    if sources.is_empty() {
        bail!(
            "no files with header {header:?} found in {}",
            dir.display()
        );
    }

    log::info!("found {} files with header {header:?}", sources.len());
    Ok(sources)
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    needle.is_empty() || haystack.windows(needle.len()).any(|window| window == needle)
}
