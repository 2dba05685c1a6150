//! Rendering of individual cells and outputs to HTML.
use std::sync::LazyLock;

use comrak::{markdown_to_html, options::Options};
use html_escape::{encode_double_quoted_attribute, encode_text};
use kuchikikiki::{Attribute, ExpandedName, NodeRef};
use markup5ever::{QualName, local_name, ns};
use nbsite_html::canonicalized;
use regex::Regex;

use crate::model::{MimeBundle, Output, mime_text};

static ANSI_ESCAPE: LazyLock<Option<Regex>> = LazyLock::new(|| {
  Regex::new(r"\x1b\[[0-9;]*[A-Za-z]")
    .inspect_err(|e| log::error!("Failed to compile ANSI_ESCAPE regex: {e}"))
    .ok()
});

/// Mime types rendered from a display bundle, in order of preference.
const MIME_PREFERENCE: &[&str] = &[
  "text/html",
  "image/svg+xml",
  "image/png",
  "image/jpeg",
  "text/markdown",
  "text/latex",
  "text/plain",
];

/// Render notebook markdown to HTML.
///
/// Headings get an `id` derived from their text and a trailing `¶`
/// permalink, matching the JupyterLab export.
#[must_use]
pub fn render_markdown(source: &str) -> String {
  let mut options = Options::default();
  options.extension.table = true;
  options.extension.strikethrough = true;
  options.extension.tasklist = true;
  options.extension.autolink = true;
  options.extension.footnotes = true;
  options.render.r#unsafe = true;

  let html = markdown_to_html(source, &options);
  let (html, ()) =
    canonicalized(&html, |document| add_heading_anchors(document.root()));
  html
}

/// Anchor id for a heading: its text with whitespace runs turned into `-`.
#[must_use]
pub fn heading_anchor(text: &str) -> String {
  text.split_whitespace().collect::<Vec<_>>().join("-")
}

fn add_heading_anchors(root: &NodeRef) {
  let headings: Vec<NodeRef> = root
    .descendants()
    .filter(|node| {
      node.as_element().is_some_and(|element| {
        matches!(
          element.name.local.as_ref(),
          "h1" | "h2" | "h3" | "h4" | "h5" | "h6"
        )
      })
    })
    .collect();

  for heading in headings {
    let Some(element) = heading.as_element() else {
      continue;
    };

    let existing = element
      .attributes
      .borrow()
      .get("id")
      .map(std::string::ToString::to_string);
    let id = match existing {
      Some(id) => id,
      None => {
        let id = heading_anchor(&heading.text_contents());
        if id.is_empty() {
          continue;
        }
        element.attributes.borrow_mut().insert("id", id.clone());
        id
      },
    };

    let link = NodeRef::new_element(
      QualName::new(None, ns!(html), local_name!("a")),
      vec![
        (ExpandedName::new("", "class"), Attribute {
          prefix: None,
          value:  "anchor-link".into(),
        }),
        (ExpandedName::new("", "href"), Attribute {
          prefix: None,
          value:  format!("#{id}"),
        }),
      ],
    );
    link.append(NodeRef::new_text("¶"));
    heading.append(link);
  }
}

/// Remove terminal color codes from traceback lines.
#[must_use]
pub fn strip_ansi(text: &str) -> String {
  match ANSI_ESCAPE.as_ref() {
    Some(re) => re.replace_all(text, "").into_owned(),
    None => text.to_string(),
  }
}

/// Wrap escaped text in a `<pre>` block.
fn pre(text: &str) -> String {
  format!("<pre>{}</pre>", encode_text(text))
}

/// Render the preferred representation of a mime bundle.
///
/// Returns the mime type used and its HTML, or `None` if nothing in the
/// bundle can be displayed.
#[must_use]
pub fn render_bundle(data: &MimeBundle) -> Option<(&'static str, String)> {
  MIME_PREFERENCE.iter().find_map(|&mime| {
    let value = data.get(mime)?;
    let text = mime_text(value)?;
    let html = match mime {
      "text/html" | "image/svg+xml" => text,
      "image/png" | "image/jpeg" => {
        let payload: String =
          text.chars().filter(|c| !c.is_whitespace()).collect();
        format!(
          "<img src=\"data:{mime};base64,{}\">",
          encode_double_quoted_attribute(&payload)
        )
      },
      "text/markdown" => render_markdown(&text),
      _ => pre(&text),
    };
    Some((mime, html))
  })
}

/// Render one output of a code cell, prompt included.
#[must_use]
pub fn render_output(output: &Output) -> Option<String> {
  let (extra_class, prompt, mime, body) = match output {
    Output::Stream { name, text } => {
      let class = if name == "stderr" {
        " jp-OutputArea-stderr"
      } else {
        ""
      };
      (class, String::new(), "text/plain", pre(text.as_str()))
    },
    Output::DisplayData { data } => {
      let (mime, body) = render_bundle(data)?;
      ("", String::new(), mime, body)
    },
    Output::ExecuteResult {
      execution_count,
      data,
    } => {
      let (mime, body) = render_bundle(data)?;
      let prompt = format!("Out[{}]:", count_label(*execution_count));
      (" jp-OutputArea-executeResult", prompt, mime, body)
    },
    Output::Error {
      ename,
      evalue,
      traceback,
    } => {
      let text = if traceback.is_empty() {
        format!("{ename}: {evalue}")
      } else {
        strip_ansi(&traceback.join("\n"))
      };
      (
        " jp-OutputArea-error",
        String::new(),
        "application/vnd.jupyter.stderr",
        pre(&text),
      )
    },
  };

  let rendered_class = match mime {
    "text/html" | "text/markdown" => "jp-RenderedHTMLCommon jp-RenderedHTML",
    "image/png" | "image/jpeg" => "jp-RenderedImage",
    "image/svg+xml" => "jp-RenderedSVG",
    _ => "jp-RenderedText",
  };

  Some(format!(
    "<div class=\"jp-OutputArea-child{extra_class}\">\n<div class=\"jp-OutputPrompt \
     jp-OutputArea-prompt\">{prompt}</div>\n<div class=\"{rendered_class} \
     jp-OutputArea-output\" data-mime-type=\"{mime}\">\n{body}\n</div>\n</div>\n"
  ))
}

/// `In [n]:` style counter, blank for cells that never ran.
#[must_use]
pub fn count_label(execution_count: Option<u32>) -> String {
  execution_count.map_or_else(|| " ".to_string(), |count| count.to_string())
}

#[cfg(test)]
mod tests {
  #![allow(clippy::unwrap_used, reason = "Tests can unwrap")]

  use serde_json::json;

  use super::*;
  use crate::model::Text;

  #[test]
  fn test_markdown_headings_get_anchors() {
    let html = render_markdown("# Data Analysis\n\nSome *text*.\n\n## Part 2\n");
    assert!(html.contains(
      "<h1 id=\"Data-Analysis\">Data Analysis<a class=\"anchor-link\" \
       href=\"#Data-Analysis\">¶</a></h1>"
    ));
    assert!(html.contains("<h2 id=\"Part-2\">"));
    assert!(html.contains("<em>text</em>"));
  }

  #[test]
  fn test_markdown_rules_and_lists() {
    let html = render_markdown("---\n\nOwner:\n\n- Alice\n- Bob\n\n---\n");
    assert_eq!(html.matches("<hr>").count(), 2);
    assert!(html.contains("<p>Owner:</p>"));
    assert!(html.contains("<li>Alice</li>"));
  }

  #[test]
  fn test_markdown_keeps_raw_html() {
    let html = render_markdown("<div class=\"note\">hi</div>\n");
    assert!(html.contains("<div class=\"note\">hi</div>"));
  }

  #[test]
  fn test_strip_ansi() {
    assert_eq!(strip_ansi("\x1b[0;31mValueError\x1b[0m: bad"), "ValueError: bad");
  }

  #[test]
  fn test_bundle_prefers_html() {
    let data: MimeBundle = [
      ("text/plain".to_string(), json!("<DataFrame>")),
      ("text/html".to_string(), json!(["<table>", "</table>"])),
    ]
    .into_iter()
    .collect();
    let (mime, html) = render_bundle(&data).unwrap();
    assert_eq!(mime, "text/html");
    assert_eq!(html, "<table></table>");
  }

  #[test]
  fn test_bundle_image_and_plain() {
    let data: MimeBundle =
      [("image/png".to_string(), json!("iVBOR\nw0KG"))].into_iter().collect();
    let (_, html) = render_bundle(&data).unwrap();
    assert_eq!(html, "<img src=\"data:image/png;base64,iVBORw0KG\">");

    let data: MimeBundle =
      [("text/plain".to_string(), json!("1 < 2"))].into_iter().collect();
    let (_, html) = render_bundle(&data).unwrap();
    assert_eq!(html, "<pre>1 &lt; 2</pre>");

    assert!(render_bundle(&MimeBundle::new()).is_none());
  }

  #[test]
  fn test_render_outputs() {
    let stream = Output::Stream {
      name: "stderr".to_string(),
      text: Text("warning\n".to_string()),
    };
    let html = render_output(&stream).unwrap();
    assert!(html.contains("jp-OutputArea-stderr"));
    assert!(html.contains("<pre>warning\n</pre>"));

    let result = Output::ExecuteResult {
      execution_count: Some(7),
      data:            [("text/plain".to_string(), json!("42"))]
        .into_iter()
        .collect(),
    };
    let html = render_output(&result).unwrap();
    assert!(html.contains("Out[7]:"));

    let error = Output::Error {
      ename:     "ZeroDivisionError".to_string(),
      evalue:    "division by zero".to_string(),
      traceback: Vec::new(),
    };
    let html = render_output(&error).unwrap();
    assert!(html.contains("ZeroDivisionError: division by zero"));

    let empty = Output::DisplayData {
      data: MimeBundle::new(),
    };
    assert!(render_output(&empty).is_none());
  }
}
