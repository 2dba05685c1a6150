//! Canonical HTML serialization.
//!
//! Every transformation in this crate goes through [`HtmlDocument`]: parse
//! once with html5ever's recovery rules, mutate the tree, serialize once.
//! The serialized form is deterministic, so running the text through
//! [`canonicalize`] a second time yields the same bytes.
//!
//! A leading byte order mark, XML declaration or other processing
//! instruction is kept verbatim in front of the serialized tree. The HTML
//! parser would otherwise drop the mark and turn the instructions into
//! comments.
use kuchikikiki::{NodeRef, parse_fragment, parse_html};
use markup5ever::{QualName, local_name, ns};
use tendril::TendrilSink;

use crate::dom;

/// The granularity of an HTML input, preserved across reserialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
  /// A complete document starting with a doctype or `<html>`, possibly after
  /// comments and a prolog.
  Document,
  /// A standalone `<body>` element, as produced by
  /// [`extract_body`](crate::extract_body).
  Body,
  /// Anything else: parsed as the children of a `<body>` element.
  Fragment,
}

impl Shape {
  /// Guess the shape of `html` from its leading markup.
  ///
  /// The prolog and any comments before the first tag are skipped.
  #[must_use]
  pub fn detect(html: &str) -> Self {
    let (_, markup) = split_prolog(html);
    let prefix: String = skip_comments(markup)
      .chars()
      .take(9)
      .collect::<String>()
      .to_ascii_lowercase();

    if prefix.starts_with("<!doctype") || prefix.starts_with("<html") {
      Self::Document
    } else if prefix.starts_with("<body") {
      Self::Body
    } else {
      Self::Fragment
    }
  }
}

/// Split `html` after its prolog: a byte order mark, processing
/// instructions such as `<?xml ...?>`, and the whitespace around them.
fn split_prolog(html: &str) -> (&str, &str) {
  let mut rest = html.strip_prefix('\u{feff}').unwrap_or(html);
  loop {
    let trimmed = rest.trim_start();
    let instruction = trimmed
      .strip_prefix("<?")
      .and_then(|body| body.find("?>").map(|end| &body[end + 2..]));
    match instruction {
      Some(after) => rest = after,
      None => {
        rest = trimmed;
        break;
      },
    }
  }
  html.split_at(html.len() - rest.len())
}

fn skip_comments(mut html: &str) -> &str {
  loop {
    html = html.trim_start();
    let comment = html
      .strip_prefix("<!--")
      .and_then(|body| body.find("-->").map(|end| &body[end + 3..]));
    match comment {
      Some(after) => html = after,
      None => return html,
    }
  }
}

/// A parsed HTML tree together with the shape it was parsed from.
#[derive(Debug, Clone)]
pub struct HtmlDocument {
  root:   NodeRef,
  shape:  Shape,
  prolog: String,
}

impl HtmlDocument {
  /// Parse `html`, detecting its [`Shape`].
  ///
  /// Parsing never fails. Broken markup is repaired following the HTML5
  /// tree construction rules.
  #[must_use]
  pub fn parse(html: &str) -> Self {
    Self::parse_as(html, Shape::detect(html))
  }

  /// Parse `html` with an explicit shape.
  #[must_use]
  pub fn parse_as(html: &str, shape: Shape) -> Self {
    let (prolog, markup) = split_prolog(html);
    let root = match shape {
      Shape::Document | Shape::Body => parse_html().one(markup),
      Shape::Fragment => {
        let context = QualName::new(None, ns!(html), local_name!("body"));
        parse_fragment(context, Vec::new()).one(markup)
      },
    };

    Self {
      root,
      shape,
      prolog: prolog.to_string(),
    }
  }

  /// The document node of the parsed tree.
  #[must_use]
  pub const fn root(&self) -> &NodeRef {
    &self.root
  }

  #[must_use]
  pub const fn shape(&self) -> Shape {
    self.shape
  }

  /// Serialize the tree back to text in the shape it was parsed from.
  #[must_use]
  pub fn to_html(&self) -> String {
    let tree: String = match self.shape {
      Shape::Document => dom::serialize(&self.root),
      Shape::Body => {
        // Comments ahead of <body> end up before the <html> element
        let comments = self
          .root
          .children()
          .filter(|child| child.as_comment().is_some())
          .map(|comment| dom::serialize(&comment));
        let body = dom::find_element(&self.root, "body")
          .map(|body| dom::serialize(&body));
        comments.chain(body).collect()
      },
      // Fragment parsing wraps the nodes in a synthetic <html> element
      Shape::Fragment => {
        self
          .root
          .first_child()
          .map(|html| {
            html.children().map(|child| dom::serialize(&child)).collect()
          })
          .unwrap_or_default()
      },
    };
    format!("{}{tree}", self.prolog)
  }
}

/// Reserialize `html` into its canonical form.
#[must_use]
pub fn canonicalize(html: &str) -> String {
  if html.is_empty() {
    return String::new();
  }
  HtmlDocument::parse(html).to_html()
}

/// Run `transform` over the parsed tree of `html` and serialize the result.
///
/// This is the "canonicalize, then transform" stage every rewrite in this
/// crate is built from. The value returned by `transform` is passed back
/// alongside the HTML.
pub fn canonicalized<T, F>(html: &str, transform: F) -> (String, T)
where
  F: FnOnce(&HtmlDocument) -> T,
{
  let document = HtmlDocument::parse(html);
  let value = transform(&document);
  (document.to_html(), value)
}
