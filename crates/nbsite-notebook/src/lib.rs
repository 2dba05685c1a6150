//! `nbsite-notebook`.
//!
//! Reads Jupyter notebooks (nbformat 4) and exports them as standalone HTML
//! documents using the JupyterLab class vocabulary, so that the page
//! pipeline in `nbsite-html` can pick the result apart.
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//!
//! use nbsite_notebook::{LabExporter, NotebookExporter};
//!
//! let export = LabExporter::new().export(Path::new("analysis.ipynb")).unwrap();
//! println!("{}: {} bytes", export.resources.title, export.html.len());
//! ```

pub mod error;
mod export;
mod model;
pub mod render;

pub use error::NotebookError;
pub use export::{Export, LabExporter, NotebookExporter, Resources};
pub use model::{
  Cell,
  KernelSpec,
  LanguageInfo,
  MimeBundle,
  Notebook,
  NotebookMetadata,
  Output,
  RawCellMetadata,
  Text,
  mime_text,
};
