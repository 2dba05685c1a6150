//! Small helpers over `kuchikikiki` nodes shared by the transformations.
use kuchikikiki::NodeRef;

/// Whether `node` is an element with the given local name.
pub fn is_element(node: &NodeRef, name: &str) -> bool {
  node
    .as_element()
    .is_some_and(|element| element.name.local.as_ref() == name)
}

/// Value of attribute `name` on `node`, if it is an element carrying it.
pub fn attribute(node: &NodeRef, name: &str) -> Option<String> {
  node.as_element().and_then(|element| {
    element
      .attributes
      .borrow()
      .get(name)
      .map(std::string::ToString::to_string)
  })
}

/// First descendant element named `name`, in document order.
pub fn find_element(root: &NodeRef, name: &str) -> Option<NodeRef> {
  root.descendants().find(|node| is_element(node, name))
}

/// Concatenation of the text nodes that are direct children of `node`.
pub fn direct_text(node: &NodeRef) -> String {
  node
    .children()
    .filter_map(|child| child.as_text().map(|text| text.borrow().clone()))
    .collect()
}

/// Serialize `node` (itself included) to a string.
pub fn serialize(node: &NodeRef) -> String {
  let mut out = Vec::new();
  node.serialize(&mut out).ok();
  String::from_utf8(out).unwrap_or_default()
}

/// A regex that matches nothing, used when a static pattern fails to
/// compile.
///
/// # Panics
///
/// Panics if the fallback pattern `r"^\b$"` fails to compile, which never
/// happens.
#[allow(clippy::unwrap_used, reason = "Literal fallback pattern")]
pub fn never_matching_regex() -> regex::Regex {
  regex::Regex::new(r"[^\s\S]")
    .unwrap_or_else(|_| regex::Regex::new(r"^\b$").unwrap())
}
