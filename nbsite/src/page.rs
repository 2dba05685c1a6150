//! The page object threaded through the build hooks.
use std::fs;

use indexmap::IndexMap;
use nbsite_html::{Meta, TocNode};
use nbsite_notebook::render::render_markdown;
use serde::Serialize;
use serde_json::Value;

use crate::{error::PluginError, files::SourceFile};

/// Page metadata key recording where the page came from.
pub const SOURCE_KIND_KEY: &str = "source_kind";

/// Value of [`SOURCE_KIND_KEY`] for pages converted from notebooks.
pub const NOTEBOOK_SOURCE_KIND: &str = "ipynb";

/// Metadata attached to a page, in document order.
pub type PageMeta = IndexMap<String, Value>;

/// Where a page's markdown comes from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceLoader {
  /// Read from the page's source file.
  #[default]
  Filesystem,
  /// Already set by a plugin; reading the source file is skipped.
  Provided,
}

#[derive(Debug)]
pub struct Page {
  pub file:     Box<dyn SourceFile>,
  pub title:    Option<String>,
  /// Page source. For provided sources this is HTML already.
  pub markdown: Option<String>,
  /// Rendered HTML, once the page went through the content hooks.
  pub content:  Option<String>,
  pub meta:     PageMeta,
  pub toc:      Vec<TocNode>,
  pub source:   SourceLoader,
}

impl Page {
  #[must_use]
  pub fn new(file: Box<dyn SourceFile>) -> Self {
    Self {
      file,
      title: None,
      markdown: None,
      content: None,
      meta: PageMeta::new(),
      toc: Vec::new(),
      source: SourceLoader::Filesystem,
    }
  }

  #[must_use]
  pub fn is_notebook(&self) -> bool {
    self.file.is_notebook()
  }

  /// Load the markdown from disk, unless a plugin provided it.
  ///
  /// # Errors
  ///
  /// Returns [`PluginError::Io`] if the source file cannot be read.
  pub fn read_source(&mut self) -> Result<(), PluginError> {
    if self.source == SourceLoader::Provided {
      return Ok(());
    }

    let path = self.file.abs_src_path();
    let markdown = fs::read_to_string(path)
      .map_err(|source| PluginError::io(path, source))?;
    self.markdown = Some(markdown);
    Ok(())
  }

  /// Render the page source to HTML.
  ///
  /// Provided sources are HTML and pass through untouched.
  #[must_use]
  pub fn render(&self) -> String {
    let markdown = self.markdown.as_deref().unwrap_or_default();
    match self.source {
      SourceLoader::Provided => markdown.to_string(),
      SourceLoader::Filesystem => render_markdown(markdown),
    }
  }

  /// Summary of the built page, for reporting.
  #[must_use]
  pub fn report(&self) -> PageReport<'_> {
    PageReport {
      src_uri:  self.file.src_uri(),
      dest_uri: self.file.dest_uri(),
      url:      self.file.url(),
      title:    self.title.as_deref(),
      meta:     &self.meta,
      toc:      &self.toc,
      content:  self.content.as_deref(),
    }
  }
}

/// Metadata of a converted notebook: the extracted values plus the
/// provenance marker.
#[must_use]
pub fn notebook_meta(meta: &Meta) -> PageMeta {
  let mut page_meta: PageMeta = meta
    .iter()
    .map(|(key, values)| {
      let values = values.iter().cloned().map(Value::String).collect();
      (key.clone(), Value::Array(values))
    })
    .collect();
  page_meta.insert(
    SOURCE_KIND_KEY.to_string(),
    Value::String(NOTEBOOK_SOURCE_KIND.to_string()),
  );
  page_meta
}

/// Serializable view of a built page.
#[derive(Debug, Serialize)]
pub struct PageReport<'a> {
  pub src_uri:  &'a str,
  pub dest_uri: &'a str,
  pub url:      &'a str,
  pub title:    Option<&'a str>,
  pub meta:     &'a PageMeta,
  pub toc:      &'a [TocNode],
  pub content:  Option<&'a str>,
}
