use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// The parts of the host site's configuration the plugin depends on.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SiteConfig {
  /// Directory holding the documentation sources.
  pub docs_dir: PathBuf,

  /// Directory the built site is written to.
  pub site_dir: PathBuf,

  /// Emit `page/index.html` with a `page/` URL instead of `page.html`.
  pub use_directory_urls: bool,
}

impl Default for SiteConfig {
  fn default() -> Self {
    Self {
      docs_dir:           PathBuf::from("docs"),
      site_dir:           PathBuf::from("site"),
      use_directory_urls: true,
    }
  }
}
