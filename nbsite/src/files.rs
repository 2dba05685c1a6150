//! Source file descriptors as the host site generator sees them.
//!
//! A [`File`] is classified by its extension: markdown sources are
//! documentation pages, HTML sources are static pages and everything else is
//! a media file copied as is. Notebooks fall in the last group until
//! [`PageFile`] wraps them.
use std::{
  fmt,
  path::{Path, PathBuf},
};

use nbsite_config::SiteConfig;
use walkdir::WalkDir;

use crate::error::PluginError;

/// Extension of notebook sources, dot included.
pub const NOTEBOOK_EXTENSION: &str = ".ipynb";

const DOCUMENTATION_EXTENSIONS: &[&str] =
  &["md", "markdown", "mdown", "mkdn", "mkd"];
const STATIC_PAGE_EXTENSIONS: &[&str] = &["html", "htm", "xml"];
const JAVASCRIPT_EXTENSIONS: &[&str] = &["js", "mjs", "javascript"];

/// A file of the documentation tree.
///
/// Paths ending in `_uri` are relative and always `/`-separated.
pub trait SourceFile: fmt::Debug {
  /// Path of the source relative to the docs directory.
  fn src_uri(&self) -> &str;
  fn abs_src_path(&self) -> &Path;
  /// Path of the output relative to the site directory.
  fn dest_uri(&self) -> &str;
  /// URL of the output relative to the site root.
  fn url(&self) -> &str;
  fn abs_dest_path(&self) -> &Path;
  /// File stem, with `README` reported as `index`.
  fn name(&self) -> &str;
  fn is_documentation_page(&self) -> bool;
  fn is_static_page(&self) -> bool;
  fn is_media_file(&self) -> bool;
  fn is_javascript(&self) -> bool;
  fn is_css(&self) -> bool;

  /// Whether the source is a notebook.
  fn is_notebook(&self) -> bool {
    self.src_uri().ends_with(NOTEBOOK_EXTENSION)
  }
}

impl<F: SourceFile + ?Sized> SourceFile for Box<F> {
  fn src_uri(&self) -> &str {
    (**self).src_uri()
  }

  fn abs_src_path(&self) -> &Path {
    (**self).abs_src_path()
  }

  fn dest_uri(&self) -> &str {
    (**self).dest_uri()
  }

  fn url(&self) -> &str {
    (**self).url()
  }

  fn abs_dest_path(&self) -> &Path {
    (**self).abs_dest_path()
  }

  fn name(&self) -> &str {
    (**self).name()
  }

  fn is_documentation_page(&self) -> bool {
    (**self).is_documentation_page()
  }

  fn is_static_page(&self) -> bool {
    (**self).is_static_page()
  }

  fn is_media_file(&self) -> bool {
    (**self).is_media_file()
  }

  fn is_javascript(&self) -> bool {
    (**self).is_javascript()
  }

  fn is_css(&self) -> bool {
    (**self).is_css()
  }

  fn is_notebook(&self) -> bool {
    (**self).is_notebook()
  }
}

/// Split `src_uri` into its parent directory and file name.
fn split_uri(uri: &str) -> (&str, &str) {
  uri.rsplit_once('/').unwrap_or(("", uri))
}

fn extension(uri: &str) -> Option<String> {
  let (_, file_name) = split_uri(uri);
  file_name
    .rsplit_once('.')
    .filter(|(stem, _)| !stem.is_empty())
    .map(|(_, ext)| ext.to_ascii_lowercase())
}

fn has_extension(uri: &str, extensions: &[&str]) -> bool {
  extension(uri).is_some_and(|ext| extensions.contains(&ext.as_str()))
}

/// `/`-separated form of a relative path.
#[must_use]
pub fn uri_from_path(relative: &Path) -> String {
  relative
    .components()
    .map(|component| component.as_os_str().to_string_lossy())
    .collect::<Vec<_>>()
    .join("/")
}

/// The `name` of a source file: its stem, with `README` read as `index`.
#[must_use]
pub fn page_name(src_uri: &str) -> String {
  let (_, file_name) = split_uri(src_uri);
  let stem = match file_name.rsplit_once('.') {
    Some((stem, _)) if !stem.is_empty() => stem,
    _ => file_name,
  };
  if stem == "README" {
    "index".to_string()
  } else {
    stem.to_string()
  }
}

/// Destination of a page rendered from `src_uri`.
///
/// With directory URLs `a/b.md` becomes `a/b/index.html`; without them it
/// becomes `a/b.html`. Index pages are `a/index.html` either way.
#[must_use]
pub fn page_dest_uri(src_uri: &str, use_directory_urls: bool) -> String {
  let (parent, _) = split_uri(src_uri);
  let name = page_name(src_uri);
  let dest = if !use_directory_urls || name == "index" {
    format!("{name}.html")
  } else {
    format!("{name}/index.html")
  };

  if parent.is_empty() {
    dest
  } else {
    format!("{parent}/{dest}")
  }
}

/// URL of the output at `dest_uri`.
///
/// With directory URLs an `index.html` is addressed by its directory, and
/// the root index by `./`.
#[must_use]
pub fn dest_url(dest_uri: &str, use_directory_urls: bool) -> String {
  let (parent, file_name) = split_uri(dest_uri);
  if use_directory_urls && file_name == "index.html" {
    if parent.is_empty() {
      "./".to_string()
    } else {
      format!("{parent}/")
    }
  } else {
    dest_uri.to_string()
  }
}

/// A file discovered in the docs directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct File {
  src_uri:       String,
  abs_src_path:  PathBuf,
  dest_uri:      String,
  url:           String,
  abs_dest_path: PathBuf,
  name:          String,
}

impl File {
  /// Describe the source at `src_uri`, relative to the site's docs
  /// directory.
  #[must_use]
  pub fn new(src_uri: &str, site: &SiteConfig) -> Self {
    let src_uri = src_uri.replace('\\', "/");
    let dest_uri = if has_extension(&src_uri, DOCUMENTATION_EXTENSIONS) {
      page_dest_uri(&src_uri, site.use_directory_urls)
    } else {
      src_uri.clone()
    };

    Self {
      abs_src_path: site.docs_dir.join(&src_uri),
      abs_dest_path: site.site_dir.join(&dest_uri),
      url: dest_url(&dest_uri, site.use_directory_urls),
      name: page_name(&src_uri),
      dest_uri,
      src_uri,
    }
  }
}

impl SourceFile for File {
  fn src_uri(&self) -> &str {
    &self.src_uri
  }

  fn abs_src_path(&self) -> &Path {
    &self.abs_src_path
  }

  fn dest_uri(&self) -> &str {
    &self.dest_uri
  }

  fn url(&self) -> &str {
    &self.url
  }

  fn abs_dest_path(&self) -> &Path {
    &self.abs_dest_path
  }

  fn name(&self) -> &str {
    &self.name
  }

  fn is_documentation_page(&self) -> bool {
    has_extension(&self.src_uri, DOCUMENTATION_EXTENSIONS)
  }

  fn is_static_page(&self) -> bool {
    has_extension(&self.src_uri, STATIC_PAGE_EXTENSIONS)
  }

  fn is_media_file(&self) -> bool {
    !(self.is_documentation_page() || self.is_static_page())
  }

  fn is_javascript(&self) -> bool {
    has_extension(&self.src_uri, JAVASCRIPT_EXTENSIONS)
  }

  fn is_css(&self) -> bool {
    has_extension(&self.src_uri, &["css"])
  }
}

/// Presents any source file as a documentation page.
///
/// The destination, URL and output path follow the page layout of the site;
/// every other question is answered by the wrapped file.
#[derive(Debug, Clone)]
pub struct PageFile<F> {
  inner:         F,
  dest_uri:      String,
  url:           String,
  abs_dest_path: PathBuf,
}

impl<F: SourceFile> PageFile<F> {
  #[must_use]
  pub fn new(inner: F, site: &SiteConfig) -> Self {
    let dest_uri = page_dest_uri(inner.src_uri(), site.use_directory_urls);
    Self {
      url: dest_url(&dest_uri, site.use_directory_urls),
      abs_dest_path: site.site_dir.join(&dest_uri),
      dest_uri,
      inner,
    }
  }

  #[must_use]
  pub const fn inner(&self) -> &F {
    &self.inner
  }

  pub fn into_inner(self) -> F {
    self.inner
  }
}

impl<F: SourceFile> SourceFile for PageFile<F> {
  fn dest_uri(&self) -> &str {
    &self.dest_uri
  }

  fn url(&self) -> &str {
    &self.url
  }

  fn abs_dest_path(&self) -> &Path {
    &self.abs_dest_path
  }

  fn is_documentation_page(&self) -> bool {
    true
  }

  fn src_uri(&self) -> &str {
    self.inner.src_uri()
  }

  fn abs_src_path(&self) -> &Path {
    self.inner.abs_src_path()
  }

  fn name(&self) -> &str {
    self.inner.name()
  }

  fn is_static_page(&self) -> bool {
    self.inner.is_static_page()
  }

  fn is_media_file(&self) -> bool {
    self.inner.is_media_file()
  }

  fn is_javascript(&self) -> bool {
    self.inner.is_javascript()
  }

  fn is_css(&self) -> bool {
    self.inner.is_css()
  }

  fn is_notebook(&self) -> bool {
    self.inner.is_notebook()
  }
}

/// The ordered set of files of a site.
#[derive(Debug, Default)]
pub struct Files {
  files: Vec<Box<dyn SourceFile>>,
}

impl Files {
  #[must_use]
  pub const fn new() -> Self {
    Self { files: Vec::new() }
  }

  /// Collect every file under the site's docs directory, sorted by
  /// `src_uri`. Hidden files and directories are left out.
  ///
  /// # Errors
  ///
  /// Returns [`PluginError::Io`] if the docs directory cannot be read.
  /// Unreadable entries below it are logged and skipped.
  pub fn discover(site: &SiteConfig) -> Result<Self, PluginError> {
    let docs_dir = &site.docs_dir;
    let mut iter = WalkDir::new(docs_dir)
      .follow_links(true)
      .sort_by_file_name()
      .into_iter()
      .filter_entry(|entry| {
        entry.depth() == 0
          || !entry.file_name().to_string_lossy().starts_with('.')
      })
      .peekable();

    if matches!(iter.peek(), Some(Err(_)))
      && let Some(Err(e)) = iter.next()
    {
      return Err(PluginError::Io {
        path:   docs_dir.clone(),
        source: e.into(),
      });
    }

    let mut files = Self::new();
    for result in iter {
      let entry = match result {
        Ok(entry) => entry,
        Err(e) => {
          log::warn!("Skipping unreadable entry in docs directory: {e}");
          continue;
        },
      };
      if entry.file_type().is_dir() {
        continue;
      }

      let Ok(relative) = entry.path().strip_prefix(docs_dir) else {
        continue;
      };
      files.push(File::new(&uri_from_path(relative), site));
    }

    log::debug!(
      "Discovered {} file(s) in {}",
      files.len(),
      docs_dir.display()
    );
    Ok(files)
  }

  pub fn push(&mut self, file: impl SourceFile + 'static) {
    self.files.push(Box::new(file));
  }

  #[must_use]
  pub const fn len(&self) -> usize {
    self.files.len()
  }

  #[must_use]
  pub const fn is_empty(&self) -> bool {
    self.files.is_empty()
  }

  pub fn iter(&self) -> impl Iterator<Item = &dyn SourceFile> {
    self.files.iter().map(|file| &**file)
  }

  /// The file with the given `src_uri`, if any.
  #[must_use]
  pub fn get(&self, src_uri: &str) -> Option<&dyn SourceFile> {
    self.iter().find(|file| file.src_uri() == src_uri)
  }

  /// Remove and return the file with the given `src_uri`.
  pub fn take(&mut self, src_uri: &str) -> Option<Box<dyn SourceFile>> {
    let index = self
      .files
      .iter()
      .position(|file| file.src_uri() == src_uri)?;
    Some(self.files.remove(index))
  }

  pub fn documentation_pages(&self) -> impl Iterator<Item = &dyn SourceFile> {
    self.iter().filter(|file| file.is_documentation_page())
  }
}

impl FromIterator<Box<dyn SourceFile>> for Files {
  fn from_iter<T: IntoIterator<Item = Box<dyn SourceFile>>>(iter: T) -> Self {
    Self {
      files: iter.into_iter().collect(),
    }
  }
}

impl IntoIterator for Files {
  type IntoIter = std::vec::IntoIter<Box<dyn SourceFile>>;
  type Item = Box<dyn SourceFile>;

  fn into_iter(self) -> Self::IntoIter {
    self.files.into_iter()
  }
}
