//! Body and metadata extraction for exported notebooks.
//!
//! A notebook may open with a markdown cell holding a block delimited by two
//! horizontal rules:
//!
//! ```markdown
//! # Title
//!
//! ---
//!
//! Owner:
//!
//! - Alice
//! - Bob
//!
//! ---
//! ```
//!
//! Each paragraph in that block is a key and the list following it holds
//! the values. The whole cell is removed from the page once parsed.
use std::sync::LazyLock;

use indexmap::IndexMap;
use kuchikikiki::{NodeRef, parse_html};
use log::{debug, error, warn};
use regex::Regex;
use tendril::TendrilSink;

use crate::{
  canonical::{HtmlDocument, Shape, canonicalized},
  dom,
  error::HtmlError,
};

/// Metadata parsed from a notebook, in document order.
pub type Meta = IndexMap<String, Vec<String>>;

/// Selector of the rendered content of a markdown cell in the exporter's
/// output.
pub const MARKDOWN_CELL_SELECTOR: &str =
  ".jp-Cell.jp-MarkdownCell .jp-RenderedHTMLCommon";

static HR_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"(?s)<hr\b[^>]*>(.*?)<hr\b[^>]*>").unwrap_or_else(|e| {
    error!("Failed to compile HR_BLOCK regex: {e}");
    dom::never_matching_regex()
  })
});

/// Serialize the `<body>` element of a complete HTML document.
///
/// # Errors
///
/// Returns [`HtmlError::MissingBody`] if the document has no body, which
/// only happens for frameset documents.
pub fn extract_body(html: &str) -> Result<String, HtmlError> {
  let document = parse_html().one(html);
  let body =
    dom::find_element(&document, "body").ok_or(HtmlError::MissingBody)?;
  Ok(dom::serialize(&body))
}

/// Strip the metadata cell from `body_html` and return its contents.
///
/// The returned HTML is the canonical form of the input, minus the first
/// rendered markdown cell when that cell carries a metadata block. Without
/// such a block the canonical input comes back with an empty [`Meta`].
#[must_use]
pub fn extract_meta(body_html: &str) -> (String, Meta) {
  canonicalized(body_html, |document| strip_meta_cell(document.root()))
}

fn strip_meta_cell(root: &NodeRef) -> Meta {
  let Ok(cell) = root.select_first(MARKDOWN_CELL_SELECTOR) else {
    return Meta::new();
  };
  let cell = cell.as_node().clone();

  let cell_html = dom::serialize(&cell);
  let Some(block) = HR_BLOCK.captures(&cell_html).and_then(|caps| caps.get(1))
  else {
    return Meta::new();
  };

  let meta = parse_meta_block(block.as_str().trim());
  cell.detach();
  debug!("Extracted {} metadata key(s) from the first cell", meta.len());
  meta
}

/// Parse the key/value pairs of a metadata block.
///
/// Keys are the first text of each `<p>`, without surrounding colons.
/// Values are the texts of the `<li>` items in the nearest `<ul>` following
/// that paragraph.
#[must_use]
pub fn parse_meta_block(block_html: &str) -> Meta {
  let document = HtmlDocument::parse_as(block_html, Shape::Fragment);
  let mut meta = Meta::new();

  for paragraph in document
    .root()
    .descendants()
    .filter(|node| dom::is_element(node, "p"))
  {
    let Some(key) = paragraph
      .children()
      .find_map(|child| child.as_text().map(|text| text.borrow().clone()))
    else {
      continue;
    };
    let key = key.trim().trim_matches(':').trim().to_string();
    if key.is_empty() {
      continue;
    }

    let Some(list) = paragraph
      .following_siblings()
      .find(|sibling| dom::is_element(sibling, "ul"))
    else {
      warn!("Metadata key '{key}' has no value list, skipping");
      continue;
    };

    let values = list
      .descendants()
      .filter(|node| dom::is_element(node, "li"))
      .map(|item| dom::direct_text(&item).trim().to_string())
      .filter(|value| !value.is_empty())
      .collect();

    meta.insert(key, values);
  }

  meta
}
