//! # nbsite-html
//!
//! The HTML side of nbsite. Every transformation here is a pure function
//! over text: the input is parsed with html5ever (through `kuchikikiki`),
//! changed in the tree, and serialized once.
//!
//! - [`canonicalize`] reserializes HTML into a stable textual form
//! - [`rewrite_external_links`] opens external links in a new browsing
//!   context
//! - [`extract_body`] and [`extract_meta`] turn an exported notebook into a
//!   page body plus its metadata block
//! - [`build_toc`] folds the headings of a page into an outline
//!
//! ```rust
//! use nbsite_html::rewrite_external_links;
//!
//! let html = rewrite_external_links(r#"<p><a href="https://nixos.org">Nix</a></p>"#);
//! assert!(html.contains(r#"target="_blank""#));
//! ```

pub mod canonical;
mod dom;
pub mod error;
pub mod links;
pub mod meta;
pub mod toc;

pub use canonical::{HtmlDocument, Shape, canonicalize, canonicalized};
pub use error::HtmlError;
pub use links::{CONTENT_BUTTON_CLASS, LinkRewriter, rewrite_external_links};
pub use meta::{
  MARKDOWN_CELL_SELECTOR,
  Meta,
  extract_body,
  extract_meta,
  parse_meta_block,
};
pub use toc::{HeadingRecord, TocNode, build_toc, fold_toc, scan_headings};
