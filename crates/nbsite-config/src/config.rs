use std::{
  fs,
  path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{error::ConfigError, plugin::PluginConfig, site::SiteConfig};

/// Configuration for nbsite.
///
/// Loaded from one or more TOML or JSON files. Files are layered key by
/// key, so a later file only overrides the options it actually sets.
///
/// ```toml
/// [site]
/// docs_dir = "docs"
/// use_directory_urls = false
///
/// [plugin]
/// convert_ipynb = true
/// external_link_target_blank = true
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
  /// Host site settings.
  pub site: SiteConfig,

  /// Plugin settings.
  pub plugin: PluginConfig,
}

/// File names probed, in order, when no config file is given.
const CONFIG_FILENAMES: &[&str] = &[
  "nbsite.toml",
  "nbsite.json",
  ".nbsite.toml",
  ".nbsite.json",
  ".config/nbsite.toml",
  ".config/nbsite.json",
];

impl Config {
  /// Load a single configuration file.
  ///
  /// # Errors
  ///
  /// Returns an error if the file cannot be read, has an unsupported
  /// extension, or does not parse.
  pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
    let layer = read_layer(path.as_ref())?;
    serde_json::from_value(layer).map_err(ConfigError::from)
  }

  /// Load and layer `config_files` in order, then apply `KEY=VALUE`
  /// overrides.
  ///
  /// Without config files, the first of the conventional file names found
  /// in the current directory is used. If there is none, defaults apply.
  ///
  /// # Errors
  ///
  /// Returns an error if any file fails to load or an override is invalid.
  pub fn load(
    config_files: &[PathBuf],
    config_overrides: &[String],
  ) -> Result<Self, ConfigError> {
    let files = if config_files.is_empty() {
      Self::find_config_file().into_iter().collect()
    } else {
      config_files.to_vec()
    };

    let mut merged = Value::Object(Map::new());
    for path in &files {
      let layer = read_layer(path).map_err(|e| {
        ConfigError::Config(format!(
          "Failed to load config from {}: {}",
          path.display(),
          e
        ))
      })?;
      merge_values(&mut merged, layer);
    }

    if files.len() > 1 {
      log::info!("Loaded and merged {} config files", files.len());
    } else if let Some(path) = files.first() {
      log::debug!("Using config file: {}", path.display());
    }

    let mut config: Self = serde_json::from_value(merged)?;
    config.apply_overrides(config_overrides)?;
    Ok(config)
  }

  /// Look for a config file with a conventional name in the current
  /// directory.
  #[must_use]
  pub fn find_config_file() -> Option<PathBuf> {
    let current_dir = std::env::current_dir().ok()?;
    CONFIG_FILENAMES
      .iter()
      .map(|name| current_dir.join(name))
      .find(|path| path.is_file())
  }

  /// Apply configuration overrides from `KEY=VALUE` strings.
  ///
  /// # Errors
  ///
  /// Returns an error if an override is not in `KEY=VALUE` form, names an
  /// unknown key, or carries a value of the wrong type.
  pub fn apply_overrides(
    &mut self,
    overrides: &[String],
  ) -> Result<(), ConfigError> {
    for override_str in overrides {
      let (key, value) = override_str.split_once('=').ok_or_else(|| {
        ConfigError::Config(format!(
          "Invalid config override format: '{override_str}'. Expected \
           KEY=VALUE"
        ))
      })?;

      self.apply_override(key.trim(), value.trim())?;
    }

    Ok(())
  }

  /// Apply a single override. Plugin keys may omit the `plugin.` prefix.
  ///
  /// # Errors
  ///
  /// Returns an error for unknown keys and unparsable booleans.
  pub fn apply_override(
    &mut self,
    key: &str,
    value: &str,
  ) -> Result<(), ConfigError> {
    match key {
      "site.docs_dir" => self.site.docs_dir = PathBuf::from(value),
      "site.site_dir" => self.site.site_dir = PathBuf::from(value),
      "site.use_directory_urls" => {
        self.site.use_directory_urls = parse_bool(key, value)?;
      },
      "plugin.external_link_target_blank" | "external_link_target_blank" => {
        self.plugin.external_link_target_blank = parse_bool(key, value)?;
      },
      "plugin.convert_ipynb" | "convert_ipynb" => {
        self.plugin.convert_ipynb = parse_bool(key, value)?;
      },
      _ => {
        return Err(ConfigError::Config(format!(
          "Unknown configuration key: '{key}'"
        )));
      },
    }

    Ok(())
  }
}

/// Read a config file into a JSON value, whatever its format.
fn read_layer(path: &Path) -> Result<Value, ConfigError> {
  let content = fs::read_to_string(path).map_err(|e| {
    ConfigError::Config(format!(
      "Failed to read config file: {}: {}",
      path.display(),
      e
    ))
  })?;

  match path
    .extension()
    .and_then(|ext| ext.to_str())
    .map(str::to_lowercase)
    .as_deref()
  {
    Some("json") => {
      serde_json::from_str(&content).map_err(|e| {
        ConfigError::Config(format!(
          "Failed to parse JSON config from {}: {}",
          path.display(),
          e
        ))
      })
    },
    Some("toml") => {
      let table: toml::Table = toml::from_str(&content).map_err(|e| {
        ConfigError::Config(format!(
          "Failed to parse TOML config from {}: {}",
          path.display(),
          e
        ))
      })?;
      serde_json::to_value(table).map_err(ConfigError::from)
    },
    Some(_) => {
      Err(ConfigError::Config(format!(
        "Unsupported config file format: {}",
        path.display()
      )))
    },
    None => {
      Err(ConfigError::Config(format!(
        "Config file has no extension: {}",
        path.display()
      )))
    },
  }
}

/// Recursively merge `overlay` into `base`. Objects merge key by key, any
/// other value replaces what was there.
fn merge_values(base: &mut Value, overlay: Value) {
  match (base, overlay) {
    (Value::Object(base), Value::Object(overlay)) => {
      for (key, value) in overlay {
        merge_values(base.entry(key).or_insert(Value::Null), value);
      }
    },
    (base, overlay) => *base = overlay,
  }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
  match value.to_ascii_lowercase().as_str() {
    "true" | "yes" | "on" | "1" => Ok(true),
    "false" | "no" | "off" | "0" => Ok(false),
    _ => {
      Err(ConfigError::Config(format!(
        "Invalid boolean for '{key}': '{value}'"
      )))
    },
  }
}
