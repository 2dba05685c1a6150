use thiserror::Error;

/// Structural problems in a source document.
///
/// Malformed markup is never an error here: html5ever repairs it. These
/// variants mean the document is missing a piece the page build relies on,
/// which is an authoring mistake and aborts the page.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HtmlError {
  /// The document has no `<body>` element, e.g. a frameset document.
  #[error("document has no <body> element")]
  MissingBody,

  /// The outline does not open with exactly one level-1 heading.
  #[error(
    "document should start with an h1 element and have precisely one h1 \
     element (found {count} top-level heading(s){})",
    describe_level(*.first_level)
  )]
  TopLevelHeading {
    count:       usize,
    first_level: Option<u8>,
  },
}

fn describe_level(level: Option<u8>) -> String {
  level.map_or_else(String::new, |level| format!(", first at level {level}"))
}
