use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur when reading or exporting a notebook.
#[derive(Debug, Error)]
pub enum NotebookError {
  /// The notebook file could not be read from disk.
  #[error("failed to read notebook `{path}`: {source}")]
  Read {
    path:   PathBuf,
    #[source]
    source: std::io::Error,
  },

  /// The notebook file is not valid nbformat JSON.
  #[error("failed to parse notebook `{path}`: {source}")]
  Parse {
    path:   PathBuf,
    #[source]
    source: serde_json::Error,
  },

  /// In-memory notebook JSON is invalid.
  #[error("invalid notebook JSON: {0}")]
  Json(#[from] serde_json::Error),

  /// Only nbformat 4 is understood.
  #[error("unsupported notebook format {major}.{minor}, expected nbformat 4")]
  UnsupportedFormat { major: u32, minor: u32 },
}
