use std::path::PathBuf;
use thiserror::Error;

/// Result type for reduction operations
pub type Result<T> = std::result::Result<T, MinifyError>;

/// Errors that abort a reduction run.
///
/// A candidate rejected by the verifier is not an error; it is reported as a
/// [`crate::Verdict`].
#[derive(Error, Debug)]
pub enum MinifyError {
    /// IO error occurred
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Writing a workspace or output file failed
    #[error("failed to write {}: {source}", .path.display())]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The verifier process could not be started
    #[error("failed to start verifier `{program}`: {source}")]
    SpawnFailed {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// User-supplied candidate pattern did not compile
    #[error("Invalid candidate pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    /// Chop target outside the file
    #[error("line {index} is out of range (file has {len} lines)")]
    LineOutOfRange { index: usize, len: usize },

    /// File is not part of the source set
    #[error("unknown source file: {0}")]
    UnknownFile(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Configuration file could not be parsed
    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),
}

impl MinifyError {
    /// Create an invalid config error
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    pub(crate) fn write_failed(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::WriteFailed {
            path: path.into(),
            source,
        }
    }
}
