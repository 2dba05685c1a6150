//! Whole-notebook export to a standalone HTML document.
use std::path::Path;

use html_escape::{encode_double_quoted_attribute, encode_text};
use log::debug;
use serde::Serialize;

use crate::{
  error::NotebookError,
  model::{Cell, Notebook},
  render::{count_label, render_markdown, render_output},
};

/// Exported HTML plus what the exporter learned about the notebook.
#[derive(Debug, Clone)]
pub struct Export {
  /// A complete HTML document.
  pub html:      String,
  pub resources: Resources,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Resources {
  /// Notebook title, from its metadata or else its file name.
  pub title:            String,
  /// Kernel language, if the notebook records one.
  pub language:         Option<String>,
  /// Extension of the exported file, including the dot.
  pub output_extension: String,
}

/// Converts a notebook file into an HTML document.
///
/// This is the seam to the notebook renderer. [`LabExporter`] is the
/// built-in implementation; anything producing a full HTML document with
/// the same cell classes can stand in for it.
pub trait NotebookExporter {
  /// Export the notebook at `path`.
  ///
  /// # Errors
  ///
  /// Returns an error if the notebook cannot be read or parsed.
  fn export(&self, path: &Path) -> Result<Export, NotebookError>;
}

/// Renders notebooks with the JupyterLab class vocabulary (`jp-Cell`,
/// `jp-MarkdownCell`, `jp-RenderedHTMLCommon`, ...).
#[derive(Debug, Clone, Default)]
pub struct LabExporter {
  exclude_input: bool,
}

impl LabExporter {
  #[must_use]
  pub fn new() -> Self {
    Self::default()
  }

  /// Leave code cell sources out of the page and keep only their outputs.
  #[must_use]
  pub const fn with_exclude_input(mut self, exclude_input: bool) -> Self {
    self.exclude_input = exclude_input;
    self
  }

  /// Render an already parsed notebook.
  #[must_use]
  pub fn export_notebook(&self, notebook: &Notebook, title: &str) -> Export {
    let language = notebook.language().unwrap_or("python");

    let mut cells = String::new();
    for cell in &notebook.cells {
      cells.push_str(&self.render_cell(cell, language));
    }

    let html = format!(
      "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<meta \
       name=\"viewport\" content=\"width=device-width, \
       initial-scale=1.0\">\n<title>{}</title>\n</head>\n<body \
       class=\"jp-Notebook\" data-jp-theme-light=\"true\" \
       data-jp-theme-name=\"JupyterLab Light\">\n<main>\n{cells}</main>\n</\
       body>\n</html>\n",
      encode_text(title)
    );

    Export {
      html,
      resources: Resources {
        title:            title.to_string(),
        language:         notebook.language().map(str::to_string),
        output_extension: ".html".to_string(),
      },
    }
  }

  fn render_cell(&self, cell: &Cell, language: &str) -> String {
    let id_attr = cell
      .id()
      .map(|id| {
        format!(" id=\"cell-id={}\"", encode_double_quoted_attribute(id))
      })
      .unwrap_or_default();

    match cell {
      Cell::Markdown { source, .. } => {
        format!(
          "<div class=\"jp-Cell jp-MarkdownCell jp-Notebook-cell\"{id_attr}>\n<div \
           class=\"jp-Cell-inputWrapper\">\n<div class=\"jp-InputArea \
           jp-Cell-inputArea\">\n<div class=\"jp-InputPrompt \
           jp-InputArea-prompt\"></div>\n<div class=\"jp-RenderedHTMLCommon \
           jp-RenderedMarkdown jp-MarkdownOutput\" \
           data-mime-type=\"text/markdown\">\n{}\n</div>\n</div>\n</div>\n</\
           div>\n",
          render_markdown(source.as_str())
        )
      },
      Cell::Code {
        source,
        execution_count,
        outputs,
        ..
      } => {
        let input = if self.exclude_input {
          String::new()
        } else {
          format!(
            "<div class=\"jp-Cell-inputWrapper\">\n<div class=\"jp-InputArea \
             jp-Cell-inputArea\">\n<div class=\"jp-InputPrompt \
             jp-InputArea-prompt\">In&nbsp;[{}]:</div>\n<div \
             class=\"jp-CodeMirrorEditor jp-Editor jp-InputArea-editor\" \
             data-type=\"inline\">\n<div class=\"highlight \
             hl-{}\"><pre><span></span>{}</pre></div>\n</div>\n</div>\n</div>\n",
            count_label(*execution_count),
            encode_double_quoted_attribute(language),
            encode_text(source.as_str())
          )
        };

        let rendered: String = outputs.iter().filter_map(render_output).collect();
        let output = if rendered.is_empty() {
          String::new()
        } else {
          format!(
            "<div class=\"jp-Cell-outputWrapper\">\n<div class=\"jp-OutputArea \
             jp-Cell-outputArea\">\n{rendered}</div>\n</div>\n"
          )
        };

        format!(
          "<div class=\"jp-Cell jp-CodeCell jp-Notebook-cell\"{id_attr}>\n{input}{output}</div>\n"
        )
      },
      Cell::Raw {
        source, metadata, ..
      } => {
        match metadata.format.as_deref() {
          Some("text/html") => {
            format!(
              "<div class=\"jp-Cell jp-RawCell jp-Notebook-cell\"{id_attr}>\n{}\n</div>\n",
              source.as_str()
            )
          },
          _ => String::new(),
        }
      },
    }
  }
}

impl NotebookExporter for LabExporter {
  fn export(&self, path: &Path) -> Result<Export, NotebookError> {
    let notebook = Notebook::from_path(path)?;
    let title = notebook
      .metadata
      .title
      .clone()
      .filter(|title| !title.trim().is_empty())
      .or_else(|| {
        path
          .file_stem()
          .map(|stem| stem.to_string_lossy().into_owned())
      })
      .unwrap_or_default();

    debug!(
      "Exporting notebook {} ({} cells)",
      path.display(),
      notebook.cells.len()
    );
    Ok(self.export_notebook(&notebook, &title))
  }
}
