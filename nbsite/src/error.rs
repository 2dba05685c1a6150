use std::{io, path::PathBuf};

use nbsite_config::ConfigError;
use nbsite_html::HtmlError;
use nbsite_notebook::NotebookError;
use thiserror::Error;

/// Errors raised while building a page.
///
/// Page-level variants name the offending source so a failed build points
/// at the document to fix.
#[derive(Debug, Error)]
pub enum PluginError {
  #[error("invalid page structure in `{src_uri}`: {source}")]
  Html {
    src_uri: String,
    #[source]
    source:  HtmlError,
  },

  #[error("failed to convert notebook `{src_uri}`: {source}")]
  Notebook {
    src_uri: String,
    #[source]
    source:  NotebookError,
  },

  #[error("Configuration error: {0}")]
  Config(#[from] ConfigError),

  #[error("I/O error on `{path}`: {source}")]
  Io {
    path:   PathBuf,
    #[source]
    source: io::Error,
  },
}

impl PluginError {
  /// Attach the page's `src_uri` to a structural error.
  pub fn html(src_uri: &str, source: HtmlError) -> Self {
    Self::Html {
      src_uri: src_uri.to_string(),
      source,
    }
  }

  /// Attach the page's `src_uri` to a notebook error.
  pub fn notebook(src_uri: &str, source: NotebookError) -> Self {
    Self::Notebook {
      src_uri: src_uri.to_string(),
      source,
    }
  }

  pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
    Self::Io {
      path: path.into(),
      source,
    }
  }
}
