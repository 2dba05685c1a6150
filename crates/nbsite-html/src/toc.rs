//! Table of contents from rendered headings.
//!
//! Headings are picked out of the final page HTML, then folded into an
//! outline. A page must open with exactly one `<h1>`; everything else nests
//! below it.
use std::sync::LazyLock;

use log::{error, trace};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{dom, error::HtmlError};

static HEADING_OPEN: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r#"(?i)<h([1-6])(?:\s+id="([^"]*)")?\s*>"#).unwrap_or_else(|e| {
    error!("Failed to compile HEADING_OPEN regex: {e}");
    dom::never_matching_regex()
  })
});

static TAG: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"<[^>]+>").unwrap_or_else(|e| {
    error!("Failed to compile TAG regex: {e}");
    dom::never_matching_regex()
  })
});

/// Glyphs appended to headings by permalink extensions.
const ANCHOR_GLYPHS: &[char] = &['¶'];

/// A heading found in the page, before folding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadingRecord {
  /// Heading level (1-6).
  pub level: u8,
  /// The heading's `id`, empty when it has none.
  pub id:    String,
  /// Plain heading text.
  pub name:  String,
}

/// A node of the page outline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TocNode {
  /// Heading level (1-6), 0 for the synthetic root.
  pub level:    u8,
  /// The heading's `id`, empty when it has none.
  pub id:       String,
  /// Plain heading text.
  pub name:     String,
  /// Headings nested directly below this one, in page order.
  pub children: Vec<Self>,
}

impl TocNode {
  fn root() -> Self {
    Self {
      level:    0,
      id:       String::new(),
      name:     String::new(),
      children: Vec::new(),
    }
  }
}

impl From<HeadingRecord> for TocNode {
  fn from(record: HeadingRecord) -> Self {
    Self {
      level:    record.level,
      id:       record.id,
      name:     record.name,
      children: Vec::new(),
    }
  }
}

/// Find every `<h1>` to `<h6>` element of `html`, in document order.
///
/// Only opening tags carrying nothing but an optional `id` are recognized,
/// which is what the markdown and notebook renderers emit. The closing tag
/// must be of the same level.
#[must_use]
pub fn scan_headings(html: &str) -> Vec<HeadingRecord> {
  // ASCII lowercasing keeps byte offsets intact
  let lowered = html.to_ascii_lowercase();
  let mut records = Vec::new();
  let mut position = 0;

  while let Some(caps) = HEADING_OPEN.captures_at(html, position) {
    let (Some(open), Some(level)) = (caps.get(0), caps.get(1)) else {
      break;
    };
    let level = level.as_str().parse::<u8>().unwrap_or(1);
    let close = format!("</h{level}>");

    let Some(offset) = lowered[open.end()..].find(&close) else {
      position = open.end();
      continue;
    };

    let inner = &html[open.end()..open.end() + offset];
    records.push(HeadingRecord {
      level,
      id: caps
        .get(2)
        .map(|id| id.as_str().to_string())
        .unwrap_or_default(),
      name: clean_heading_text(inner),
    });
    position = open.end() + offset + close.len();
  }

  records
}

/// Strip tags, collapse whitespace and drop trailing permalink glyphs.
fn clean_heading_text(inner: &str) -> String {
  let text = TAG.replace_all(inner, "");
  let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
  text.trim_end_matches(ANCHOR_GLYPHS).trim_end().to_string()
}

/// Fold a flat heading sequence into an outline.
///
/// # Errors
///
/// Returns [`HtmlError::TopLevelHeading`] unless the outline has exactly one
/// top-level node and that node is an `<h1>`.
pub fn fold_toc<I>(records: I) -> Result<Vec<TocNode>, HtmlError>
where
  I: IntoIterator<Item = HeadingRecord>,
{
  let mut stack = vec![TocNode::root()];

  for record in records {
    while stack.len() > 1
      && stack.last().is_some_and(|top| top.level >= record.level)
    {
      close_top(&mut stack);
    }
    trace!("TOC: {} '{}' at depth {}", record.level, record.name, stack.len());
    stack.push(TocNode::from(record));
  }

  while stack.len() > 1 {
    close_top(&mut stack);
  }

  let children = stack.pop().map(|root| root.children).unwrap_or_default();
  match children.as_slice() {
    [only] if only.level == 1 => Ok(children),
    _ => {
      Err(HtmlError::TopLevelHeading {
        count:       children.len(),
        first_level: children.first().map(|node| node.level),
      })
    },
  }
}

/// Pop the innermost open node and attach it to its parent.
fn close_top(stack: &mut Vec<TocNode>) {
  if stack.len() < 2 {
    return;
  }
  if let Some(node) = stack.pop()
    && let Some(parent) = stack.last_mut()
  {
    parent.children.push(node);
  }
}

/// Build the outline of a rendered page.
///
/// # Errors
///
/// Returns [`HtmlError::TopLevelHeading`] when the page does not open with
/// exactly one `<h1>`, including when it has no headings at all.
pub fn build_toc(html: &str) -> Result<Vec<TocNode>, HtmlError> {
  fold_toc(scan_headings(html))
}

#[cfg(test)]
mod tests {
  #![allow(clippy::unwrap_used, reason = "Tests can unwrap")]

  use super::*;

  fn record(level: u8, name: &str) -> HeadingRecord {
    HeadingRecord {
      level,
      id: String::new(),
      name: name.to_string(),
    }
  }

  fn names(nodes: &[TocNode]) -> Vec<&str> {
    nodes.iter().map(|node| node.name.as_str()).collect()
  }

  #[test]
  fn test_fold_nested_outline() {
    let toc = fold_toc([
      record(1, "A"),
      record(2, "B"),
      record(3, "C"),
      record(2, "D"),
    ])
    .unwrap();

    assert_eq!(names(&toc), ["A"]);
    let a = &toc[0];
    assert_eq!(names(&a.children), ["B", "D"]);
    assert_eq!(names(&a.children[0].children), ["C"]);
    assert!(a.children[1].children.is_empty());
  }

  #[test]
  fn test_fold_skipped_levels_nest_under_nearest() {
    let toc = fold_toc([record(1, "A"), record(3, "B"), record(2, "C")])
      .unwrap();
    assert_eq!(names(&toc[0].children), ["B", "C"]);
    assert_eq!(toc[0].children[0].level, 3);
  }

  #[test]
  fn test_fold_two_h1_fails() {
    let err = fold_toc([
      record(1, "A"),
      record(2, "B"),
      record(2, "C"),
      record(3, "D"),
      record(1, "E"),
    ])
    .unwrap_err();
    assert_eq!(err, HtmlError::TopLevelHeading {
      count:       2,
      first_level: Some(1),
    });
  }

  #[test]
  fn test_fold_empty_fails() {
    let err = fold_toc(Vec::new()).unwrap_err();
    assert_eq!(err, HtmlError::TopLevelHeading {
      count:       0,
      first_level: None,
    });
  }

  #[test]
  fn test_fold_without_h1_fails() {
    let err = fold_toc([record(2, "A"), record(3, "B")]).unwrap_err();
    assert_eq!(err, HtmlError::TopLevelHeading {
      count:       1,
      first_level: Some(2),
    });
  }

  #[test]
  fn test_scan_headings() {
    let html = r##"<h1 id="Intro">Intro<a class="anchor-link" href="#Intro">¶</a></h1>
<p>text</p>
<H2>Second
  <code>part</code></H2>
<h3 class="x">ignored</h3>
<h4 id="">empty id</h4>"##;

    let records = scan_headings(html);
    assert_eq!(records, vec![
      HeadingRecord {
        level: 1,
        id:    "Intro".to_string(),
        name:  "Intro".to_string(),
      },
      HeadingRecord {
        level: 2,
        id:    String::new(),
        name:  "Second part".to_string(),
      },
      HeadingRecord {
        level: 4,
        id:    String::new(),
        name:  "empty id".to_string(),
      },
    ]);
  }

  #[test]
  fn test_scan_requires_matching_close_level() {
    let records = scan_headings("<h2>open</h3> still</h2><h1>next</h1>");
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].name, "open still");
    assert_eq!(records[1].name, "next");
  }

  #[test]
  fn test_scan_unclosed_heading_is_skipped() {
    let records = scan_headings("<h2>never closed <h1>T</h1>");
    assert_eq!(records, vec![record(1, "T")]);
  }

  #[test]
  fn test_build_toc() {
    let html = r#"<h1 id="a">A</h1><h2 id="b">B</h2><h3 id="c">C</h3><h2 id="d">D</h2>"#;
    let toc = build_toc(html).unwrap();
    assert_eq!(toc.len(), 1);
    assert_eq!(toc[0].id, "a");
    assert_eq!(toc[0].children[0].children[0].id, "c");
    assert_eq!(toc[0].children[1].id, "d");
  }

  #[test]
  fn test_build_toc_without_headings_fails() {
    assert!(build_toc("<p>no headings</p>").is_err());
  }

  #[test]
  fn test_toc_serializes_as_nested_objects() {
    let toc = build_toc("<h1 id=\"t\">T</h1>").unwrap();
    let json = serde_json::to_value(&toc).unwrap();
    assert_eq!(
      json,
      serde_json::json!([
        { "level": 1, "id": "t", "name": "T", "children": [] }
      ])
    );
  }
}
