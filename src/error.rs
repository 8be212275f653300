//! Error kinds for every pipeline stage.

use std::path::{Path, PathBuf};

/// Result alias used across the library.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Fatal errors. Every variant is raised before the target file is written.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A module source file could not be read or its block structure never closes.
    /// `line` is 0 when the problem is not tied to a line.
    #[error("{}: {message}", location(path, *line))]
    Extraction {
        path: PathBuf,
        line: usize,
        message: String,
    },

    /// The target file's marker pair is malformed.
    #[error("{}: {message}", path.display())]
    Merge { path: PathBuf, message: String },

    /// A configuration value is invalid, conflicting or unsupported.
    #[error("{key}: {message}")]
    Config { key: String, message: String },

    /// A replacement rule's pattern does not compile.
    #[error("replace rule #{index}: invalid pattern `{pattern}`: {source}")]
    Pattern {
        index: usize,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn location(path: &Path, line: usize) -> String {
    if line == 0 {
        path.display().to_string()
    } else {
        format!("{}:{line}", path.display())
    }
}

impl Error {
    pub(crate) fn config(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Config {
            key: key.into(),
            message: message.into(),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Name of the pipeline stage that raised the error.
    pub fn stage(&self) -> &'static str {
        match self {
            Self::Extraction { .. } => "extraction",
            Self::Merge { .. } => "merge",
            Self::Config { .. } => "configuration",
            Self::Pattern { .. } => "substitution",
            Self::Io { .. } => "output",
        }
    }

    /// Structural errors come from the inputs (source files, target markers)
    /// rather than from the configuration.
    pub fn is_structural(&self) -> bool {
        matches!(self, Self::Extraction { .. } | Self::Merge { .. })
    }
}
