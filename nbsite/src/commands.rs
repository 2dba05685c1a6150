//! What the `nbsite` subcommands do.
use std::{
  fs,
  path::{Path, PathBuf},
};

use log::{debug, info, warn};
use nbsite_config::{Config, ConfigError, SiteConfig};
use nbsite_html::LinkRewriter;
use nbsite_notebook::LabExporter;
use rayon::prelude::*;
use walkdir::WalkDir;

use crate::{
  error::PluginError,
  files::{File, Files, uri_from_path},
  page::Page,
  plugin::{NotebookPlugin, PluginHost},
};

/// Site settings and `src_uri` for a notebook given on the command line.
///
/// A notebook outside the configured docs directory is treated as the only
/// file of a site rooted at its parent directory.
fn locate(site: &SiteConfig, path: &Path) -> (SiteConfig, String) {
  if let Ok(relative) = path.strip_prefix(&site.docs_dir) {
    return (site.clone(), uri_from_path(relative));
  }

  let mut site = site.clone();
  site.docs_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
  let src_uri = path
    .file_name()
    .map(|name| name.to_string_lossy().into_owned())
    .unwrap_or_default();
  (site, src_uri)
}

/// Take the notebook at `path` through the whole page lifecycle.
///
/// # Errors
///
/// Returns an error if notebook conversion is disabled, the notebook cannot
/// be exported, or the resulting page is malformed.
pub fn build_notebook_page(
  config: &Config,
  path: &Path,
  exclude_input: bool,
) -> Result<Page, PluginError> {
  let (site, src_uri) = locate(&config.site, path);
  let exporter = LabExporter::new().with_exclude_input(exclude_input);
  let host = PluginHost::new(site).with_plugin(NotebookPlugin::with_exporter(
    config.plugin.clone(),
    exporter,
  ));

  let mut files = Files::new();
  files.push(File::new(&src_uri, host.site()));
  let mut files = host.run_files(files)?;

  let file = files
    .take(&src_uri)
    .filter(|file| file.is_documentation_page())
    .ok_or_else(|| {
      ConfigError::Config(format!(
        "{src_uri} is not a documentation page; is convert_ipynb disabled?"
      ))
    })?;

  host.build_page(file)
}

/// HTML files named by `paths`, walking directories recursively.
///
/// # Errors
///
/// Returns [`PluginError::Io`] if a path does not exist. Unreadable entries
/// inside directories are logged and skipped.
pub fn collect_html_files(
  paths: &[PathBuf],
) -> Result<Vec<PathBuf>, PluginError> {
  let mut files = Vec::new();

  for path in paths {
    let metadata =
      fs::metadata(path).map_err(|source| PluginError::io(path, source))?;
    if !metadata.is_dir() {
      files.push(path.clone());
      continue;
    }

    for result in WalkDir::new(path).follow_links(true) {
      let entry = match result {
        Ok(entry) => entry,
        Err(e) => {
          warn!("Skipping unreadable directory entry: {e}");
          continue;
        },
      };

      let is_html = entry
        .path()
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
          ext.eq_ignore_ascii_case("html") || ext.eq_ignore_ascii_case("htm")
        });
      if entry.file_type().is_file() && is_html {
        files.push(entry.into_path());
      }
    }
  }

  Ok(files)
}

/// Rewrite the external links of one HTML file in place.
///
/// Returns whether the file changed. Files without an anchor to rewrite are
/// left untouched, even when their markup is not canonical.
///
/// # Errors
///
/// Returns [`PluginError::Io`] if the file cannot be read or written.
pub fn rewrite_file(
  path: &Path,
  rewriter: &LinkRewriter,
) -> Result<bool, PluginError> {
  let html =
    fs::read_to_string(path).map_err(|source| PluginError::io(path, source))?;
  let (rewritten, anchors) = rewriter.rewrite_counted(&html);
  if anchors == 0 {
    return Ok(false);
  }

  fs::write(path, rewritten).map_err(|source| PluginError::io(path, source))?;
  debug!("Rewrote {}", path.display());
  Ok(true)
}

/// Rewrite every HTML file under `paths` in parallel.
///
/// Returns the number of files that changed.
///
/// # Errors
///
/// Returns the first I/O error encountered.
pub fn rewrite_paths(
  paths: &[PathBuf],
  rewriter: &LinkRewriter,
) -> Result<usize, PluginError> {
  let files = collect_html_files(paths)?;
  let changed: Vec<bool> = files
    .par_iter()
    .map(|path| rewrite_file(path, rewriter))
    .collect::<Result<_, _>>()?;

  let changed = changed.into_iter().filter(|changed| *changed).count();
  info!("Rewrote {changed} of {} HTML file(s)", files.len());
  Ok(changed)
}
