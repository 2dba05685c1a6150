//! Serde model of the nbformat v4 JSON schema.
//!
//! Only the parts the exporter renders are modelled. Unknown fields are
//! ignored so notebooks written by newer front-ends still load.
use std::{fs, path::Path};

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;

use crate::error::NotebookError;

/// A parsed notebook.
#[derive(Debug, Clone, Deserialize)]
pub struct Notebook {
  pub nbformat:       u32,
  #[serde(default)]
  pub nbformat_minor: u32,
  #[serde(default)]
  pub metadata:       NotebookMetadata,
  #[serde(default)]
  pub cells:          Vec<Cell>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NotebookMetadata {
  #[serde(default)]
  pub title:         Option<String>,
  #[serde(default)]
  pub kernelspec:    Option<KernelSpec>,
  #[serde(default)]
  pub language_info: Option<LanguageInfo>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct KernelSpec {
  #[serde(default)]
  pub name:         String,
  #[serde(default)]
  pub display_name: Option<String>,
  #[serde(default)]
  pub language:     Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LanguageInfo {
  #[serde(default)]
  pub name: String,
}

/// Multi-line text, stored either as one string or as a list of lines.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "MultilineRepr")]
pub struct Text(pub String);

#[derive(Deserialize)]
#[serde(untagged)]
enum MultilineRepr {
  One(String),
  Lines(Vec<String>),
}

impl From<MultilineRepr> for Text {
  fn from(repr: MultilineRepr) -> Self {
    match repr {
      MultilineRepr::One(text) => Self(text),
      MultilineRepr::Lines(lines) => Self(lines.concat()),
    }
  }
}

impl Text {
  #[must_use]
  pub fn as_str(&self) -> &str {
    &self.0
  }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawCellMetadata {
  /// Target mime type of a raw cell, e.g. `text/html`.
  #[serde(default)]
  pub format: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "cell_type", rename_all = "lowercase")]
pub enum Cell {
  Markdown {
    #[serde(default)]
    id:     Option<String>,
    #[serde(default)]
    source: Text,
  },
  Code {
    #[serde(default)]
    id:              Option<String>,
    #[serde(default)]
    source:          Text,
    #[serde(default)]
    execution_count: Option<u32>,
    #[serde(default)]
    outputs:         Vec<Output>,
  },
  Raw {
    #[serde(default)]
    id:       Option<String>,
    #[serde(default)]
    source:   Text,
    #[serde(default)]
    metadata: RawCellMetadata,
  },
}

impl Cell {
  #[must_use]
  pub fn id(&self) -> Option<&str> {
    match self {
      Self::Markdown { id, .. } | Self::Code { id, .. } | Self::Raw { id, .. } => {
        id.as_deref()
      },
    }
  }
}

/// Mime type to payload. Text payloads use the same string-or-lines
/// encoding as cell sources.
pub type MimeBundle = IndexMap<String, Value>;

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "output_type", rename_all = "snake_case")]
pub enum Output {
  Stream {
    #[serde(default)]
    name: String,
    #[serde(default)]
    text: Text,
  },
  DisplayData {
    #[serde(default)]
    data: MimeBundle,
  },
  ExecuteResult {
    #[serde(default)]
    execution_count: Option<u32>,
    #[serde(default)]
    data:            MimeBundle,
  },
  Error {
    #[serde(default)]
    ename:     String,
    #[serde(default)]
    evalue:    String,
    #[serde(default)]
    traceback: Vec<String>,
  },
}

/// Text of a mime bundle entry, if it is textual.
#[must_use]
pub fn mime_text(value: &Value) -> Option<String> {
  match value {
    Value::String(text) => Some(text.clone()),
    Value::Array(lines) => {
      lines
        .iter()
        .map(|line| line.as_str())
        .collect::<Option<Vec<_>>>()
        .map(|lines| lines.concat())
    },
    _ => None,
  }
}

impl Notebook {
  /// Read and parse the notebook at `path`.
  ///
  /// # Errors
  ///
  /// Returns [`NotebookError::Read`] if the file cannot be read,
  /// [`NotebookError::Parse`] if it is not notebook JSON, and
  /// [`NotebookError::UnsupportedFormat`] for anything but nbformat 4.
  pub fn from_path(path: impl AsRef<Path>) -> Result<Self, NotebookError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|source| {
      NotebookError::Read {
        path: path.to_path_buf(),
        source,
      }
    })?;

    Self::from_json(&content).map_err(|err| {
      match err {
        NotebookError::Json(source) => {
          NotebookError::Parse {
            path: path.to_path_buf(),
            source,
          }
        },
        other => other,
      }
    })
  }

  /// Parse notebook JSON.
  ///
  /// # Errors
  ///
  /// Returns [`NotebookError::Json`] for invalid JSON and
  /// [`NotebookError::UnsupportedFormat`] for anything but nbformat 4.
  pub fn from_json(json: &str) -> Result<Self, NotebookError> {
    let notebook: Self = serde_json::from_str(json)?;
    if notebook.nbformat != 4 {
      return Err(NotebookError::UnsupportedFormat {
        major: notebook.nbformat,
        minor: notebook.nbformat_minor,
      });
    }
    Ok(notebook)
  }

  /// Language of the code cells, used for highlighting classes.
  #[must_use]
  pub fn language(&self) -> Option<&str> {
    self
      .metadata
      .language_info
      .as_ref()
      .map(|info| info.name.as_str())
      .filter(|name| !name.is_empty())
      .or_else(|| {
        self
          .metadata
          .kernelspec
          .as_ref()
          .and_then(|spec| spec.language.as_deref())
      })
  }
}
