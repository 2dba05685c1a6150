use serde::{Deserialize, Serialize};

/// Options of the notebook/link plugin.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PluginConfig {
  /// Open external links of every page in a new browsing context.
  pub external_link_target_blank: bool,

  /// Treat `.ipynb` files as documentation pages and convert them.
  pub convert_ipynb: bool,
}

impl Default for PluginConfig {
  fn default() -> Self {
    Self {
      external_link_target_blank: true,
      convert_ipynb:              true,
    }
  }
}

#[cfg(test)]
mod tests {
  #![allow(clippy::unwrap_used, reason = "Tests can unwrap")]

  use super::*;

  #[test]
  fn test_defaults_enable_everything() {
    let config = PluginConfig::default();
    assert!(config.external_link_target_blank);
    assert!(config.convert_ipynb);
  }

  #[test]
  fn test_partial_toml_keeps_defaults() {
    let config: PluginConfig = toml::from_str("convert_ipynb = false").unwrap();
    assert!(config.external_link_target_blank);
    assert!(!config.convert_ipynb);
  }
}
