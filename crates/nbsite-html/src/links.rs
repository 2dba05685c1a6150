//! External link rewriting.
//!
//! Anchors pointing outside of the site get `target="_blank"` so they open
//! in a new browsing context. The anchors are patched in the parsed tree,
//! so two anchors with identical markup are each rewritten in place instead
//! of being matched by text.
use kuchikikiki::NodeRef;
use log::debug;

use crate::{canonical::canonicalized, dom};

/// Class carried by the theme's "edit this page" style buttons, which keep
/// their default target.
pub const CONTENT_BUTTON_CLASS: &str = "md-content__button";

/// Rewrites external anchors of an HTML document.
#[derive(Debug, Clone)]
pub struct LinkRewriter {
  button_class: String,
  target:       String,
  noopener:     bool,
}

impl Default for LinkRewriter {
  fn default() -> Self {
    Self {
      button_class: CONTENT_BUTTON_CLASS.to_string(),
      target:       "_blank".to_string(),
      noopener:     false,
    }
  }
}

impl LinkRewriter {
  #[must_use]
  pub fn new() -> Self {
    Self::default()
  }

  /// Anchors whose `class` contains this marker are left alone.
  #[must_use]
  pub fn with_button_class(mut self, class: impl Into<String>) -> Self {
    self.button_class = class.into();
    self
  }

  /// Value written to the `target` attribute.
  #[must_use]
  pub fn with_target(mut self, target: impl Into<String>) -> Self {
    self.target = target.into();
    self
  }

  /// Also add `noopener` to the `rel` attribute of rewritten anchors.
  #[must_use]
  pub const fn with_noopener(mut self, noopener: bool) -> Self {
    self.noopener = noopener;
    self
  }

  /// Whether `node` is an anchor this rewriter applies to.
  ///
  /// An anchor qualifies when its `href` contains `//`, its `class` does not
  /// contain the button marker, and it wraps no image.
  #[must_use]
  pub fn is_external_anchor(&self, node: &NodeRef) -> bool {
    if !dom::is_element(node, "a") {
      return false;
    }

    let is_absolute = dom::attribute(node, "href")
      .is_some_and(|href| href.contains("//"));
    if !is_absolute {
      return false;
    }

    let is_button = dom::attribute(node, "class")
      .is_some_and(|class| class.contains(self.button_class.as_str()));
    if is_button {
      return false;
    }

    !node.descendants().any(|child| dom::is_element(&child, "img"))
  }

  /// Rewrite every external anchor of `html`.
  ///
  /// The result is the canonical form of `html` with only the selected
  /// anchors' attributes changed. Running it again changes nothing.
  #[must_use]
  pub fn rewrite(&self, html: &str) -> String {
    self.rewrite_counted(html).0
  }

  /// Like [`rewrite`](Self::rewrite), also returning how many anchors had an
  /// attribute changed.
  ///
  /// A count of zero means only canonicalization touched the text.
  #[must_use]
  pub fn rewrite_counted(&self, html: &str) -> (String, usize) {
    if html.is_empty() {
      return (String::new(), 0);
    }

    let (rewritten, count) =
      canonicalized(html, |document| self.patch(document.root()));
    debug!("Opened {count} external link(s) in a new browsing context");
    (rewritten, count)
  }

  fn patch(&self, root: &NodeRef) -> usize {
    // Collect first, attribute borrows must not overlap the traversal
    let anchors: Vec<NodeRef> = root
      .descendants()
      .filter(|node| self.is_external_anchor(node))
      .collect();

    let mut changed = 0;
    for anchor in &anchors {
      let Some(element) = anchor.as_element() else {
        continue;
      };
      let mut attributes = element.attributes.borrow_mut();
      let mut touched = attributes.get("target") != Some(self.target.as_str());
      attributes.insert("target", self.target.clone());

      if self.noopener {
        let rel = attributes.get("rel").unwrap_or_default().to_string();
        if !rel.split_whitespace().any(|token| token == "noopener") {
          let rel = if rel.trim().is_empty() {
            "noopener".to_string()
          } else {
            format!("{} noopener", rel.trim())
          };
          attributes.insert("rel", rel);
          touched = true;
        }
      }

      if touched {
        changed += 1;
      }
    }

    changed
  }
}

/// Open every external link of `html` in a new browsing context, using the
/// default [`LinkRewriter`].
#[must_use]
pub fn rewrite_external_links(html: &str) -> String {
  LinkRewriter::default().rewrite(html)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::canonicalize;

  #[test]
  fn test_external_link_gets_target() {
    let html = rewrite_external_links(
      r#"<p>See <a href="https://example.com">example</a>.</p>"#,
    );
    assert!(html.starts_with("<p>See <a "));
    assert!(html.ends_with(">example</a>.</p>"));
    assert_eq!(html.matches(r#"target="_blank""#).count(), 1);
    assert!(html.contains(r#"href="https://example.com""#));
  }

  #[test]
  fn test_relative_links_untouched() {
    let input = r##"<a href="../other/">other</a><a href="#top">top</a>"##;
    assert_eq!(rewrite_external_links(input), canonicalize(input));
  }

  #[test]
  fn test_protocol_relative_and_embedded_slashes_match() {
    let html = rewrite_external_links(
      r#"<a href="//cdn.example.com/x">a</a><a href="/go?u=http://x">b</a>"#,
    );
    assert_eq!(html.matches(r#"target="_blank""#).count(), 2);
  }

  #[test]
  fn test_image_link_untouched() {
    let input = r#"<a href="https://x.com"><img src="i.png"></a>"#;
    assert_eq!(rewrite_external_links(input), input);
  }

  #[test]
  fn test_nested_image_link_untouched() {
    let input = r#"<a href="https://x.com"><span><img src="i.png"></span></a>"#;
    assert_eq!(rewrite_external_links(input), canonicalize(input));
  }

  #[test]
  fn test_button_link_untouched() {
    let input = r#"<a href="https://x.com" class="md-content__button">L</a>"#;
    assert_eq!(rewrite_external_links(input), canonicalize(input));
    assert!(!rewrite_external_links(input).contains("target"));
  }

  #[test]
  fn test_button_class_is_substring_match() {
    let input =
      r#"<a href="https://x.com" class="md-button md-content__button--edit">L</a>"#;
    assert!(!rewrite_external_links(input).contains("target"));
  }

  #[test]
  fn test_existing_target_is_overwritten() {
    let html =
      rewrite_external_links(r#"<a href="https://x.com" target="_self">x</a>"#);
    assert_eq!(html.matches("target=").count(), 1);
    assert!(html.contains(r#"target="_blank""#));
  }

  #[test]
  fn test_rewrite_is_idempotent() {
    let input = r#"<div><a href="https://a.org">a</a><a href="b.html">b</a></div>"#;
    let once = rewrite_external_links(input);
    assert_eq!(rewrite_external_links(&once), once);
  }

  #[test]
  fn test_identical_anchors_are_all_rewritten() {
    let input = r#"<ul>
<li><a href="https://same.org">same</a></li>
<li><a href="https://same.org">same</a></li>
<li><a href="https://same.org">same</a></li>
</ul>"#;
    let html = rewrite_external_links(input);
    assert_eq!(html.matches(r#"target="_blank""#).count(), 3);
  }

  #[test]
  fn test_mixed_identical_anchors_only_patch_matches() {
    // The image anchor shares its opening tag with the plain one
    let input = r#"<a href="https://x.com"><img src="i.png"></a><a href="https://x.com">t</a>"#;
    let html = rewrite_external_links(input);
    assert!(html.starts_with(r#"<a href="https://x.com"><img src="i.png"></a>"#));
    assert_eq!(html.matches(r#"target="_blank""#).count(), 1);
  }

  #[test]
  fn test_full_document_shape_is_kept() {
    let html = rewrite_external_links(
      "<!DOCTYPE html><html><head></head><body><a \
       href=\"https://x.com\">x</a></body></html>",
    );
    assert!(html.starts_with("<!DOCTYPE html><html><head></head><body>"));
    assert!(html.contains(r#"target="_blank""#));
  }

  #[test]
  fn test_custom_rewriter() {
    let rewriter = LinkRewriter::new()
      .with_button_class("keep-me")
      .with_target("_new")
      .with_noopener(true);

    let html = rewriter.rewrite(
      r#"<a href="https://a.org" rel="external">a</a><a href="https://b.org" class="keep-me">b</a>"#,
    );
    assert_eq!(html.matches(r#"target="_new""#).count(), 1);
    assert!(html.contains(r#"rel="external noopener""#));

    let again = rewriter.rewrite(&html);
    assert_eq!(again, html);
  }

  #[test]
  fn test_predicate_ignores_non_anchors() {
    let document = crate::HtmlDocument::parse(r#"<link href="https://x.com">"#);
    let rewriter = LinkRewriter::default();
    assert!(
      !document
        .root()
        .descendants()
        .any(|node| rewriter.is_external_anchor(&node))
    );
  }

  #[test]
  fn test_rewrite_counts_changed_anchors() {
    let rewriter = LinkRewriter::new();
    let input = r#"<a href="https://a.org">a</a><a href="https://b.org" target="_blank">b</a><a href="c.html">c</a>"#;
    let (html, count) = rewriter.rewrite_counted(input);
    assert_eq!(count, 1);
    assert_eq!(rewriter.rewrite_counted(&html).1, 0);
  }

  #[test]
  fn test_count_is_zero_for_non_canonical_relative_links() {
    let input = "<!doctype html><html lang=en><body><a href=../x/>x</a>";
    let (html, count) = LinkRewriter::new().rewrite_counted(input);
    assert_eq!(count, 0);
    assert_ne!(html, input);
  }

  #[test]
  fn test_noopener_counts_as_change() {
    let rewriter = LinkRewriter::new().with_noopener(true);
    let (_, count) =
      rewriter.rewrite_counted(r#"<a href="https://a.org" target="_blank">a</a>"#);
    assert_eq!(count, 1);
  }

  #[test]
  fn test_leading_comment_document_only_changes_anchor() {
    let input = "<!-- generated --><!DOCTYPE html><html><head><title>T</title>\
                 </head><body><p><a href=\"https://x.com\">x</a></p></body></html>";
    let html = rewrite_external_links(input);
    assert_eq!(
      html,
      "<!-- generated --><!DOCTYPE html><html><head><title>T</title></head>\
       <body><p><a href=\"https://x.com\" target=\"_blank\">x</a></p></body></html>"
    );
  }

  #[test]
  fn test_xml_declaration_and_bom_survive_rewrite() {
    let input = "\u{feff}<?xml version=\"1.0\"?>\n<html><head></head><body>\
                 <a href=\"https://x.com\">x</a></body></html>";
    let html = rewrite_external_links(input);
    assert!(html.starts_with("\u{feff}<?xml version=\"1.0\"?>\n<html><head></head><body>"));
    assert!(html.contains(r#"target="_blank""#));
  }

  #[test]
  fn test_empty_input() {
    assert_eq!(rewrite_external_links(""), "");
  }
}
