//! Build hooks and their dispatch.
//!
//! The host drives every page through the same lifecycle:
//!
//! 1. [`Plugin::on_files`] once, over all files of the site
//! 2. [`Plugin::on_page_read_source`] before the page source is loaded
//! 3. [`Plugin::on_page_content`] with the rendered HTML of the page
//!
//! For each event, plugins run in ascending [`Plugin::priority`] order, so a
//! plugin that must see the final HTML declares a priority above
//! [`DEFAULT_PRIORITY`]. Ties keep registration order.
use log::{debug, trace};
use nbsite_config::{PluginConfig, SiteConfig};
use nbsite_html::{LinkRewriter, build_toc, extract_body, extract_meta};
use nbsite_notebook::{LabExporter, NotebookExporter};

use crate::{
  error::PluginError,
  files::{Files, PageFile, SourceFile},
  page::{Page, SourceLoader, notebook_meta},
};

/// Lifecycle events a plugin can hook into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Event {
  Files,
  PageReadSource,
  PageContent,
}

/// Priority of hooks that do not ask for one.
pub const DEFAULT_PRIORITY: i32 = 0;

/// Priority of [`NotebookPlugin`]'s content hook. It runs after hooks at the
/// default priority, which may still change the page.
pub const PAGE_CONTENT_PRIORITY: i32 = 50;

pub trait Plugin {
  fn name(&self) -> &'static str;

  /// Position of this plugin's hook for `event` among all plugins.
  fn priority(&self, _event: Event) -> i32 {
    DEFAULT_PRIORITY
  }

  /// Inspect or replace the files of the site. Must return the files in
  /// order.
  ///
  /// # Errors
  ///
  /// Implementations fail the build by returning an error.
  fn on_files(
    &self,
    files: Files,
    _site: &SiteConfig,
  ) -> Result<Files, PluginError> {
    Ok(files)
  }

  /// Prepare a page before its source is read.
  ///
  /// # Errors
  ///
  /// Implementations fail the page by returning an error.
  fn on_page_read_source(
    &self,
    _page: &mut Page,
    _site: &SiteConfig,
  ) -> Result<(), PluginError> {
    Ok(())
  }

  /// Transform the rendered HTML of a page.
  ///
  /// # Errors
  ///
  /// Implementations fail the page by returning an error.
  fn on_page_content(
    &self,
    html: String,
    _page: &mut Page,
    _site: &SiteConfig,
  ) -> Result<String, PluginError> {
    Ok(html)
  }
}

/// Runs the registered plugins for each lifecycle event.
pub struct PluginHost {
  site:    SiteConfig,
  plugins: Vec<Box<dyn Plugin>>,
}

impl PluginHost {
  #[must_use]
  pub const fn new(site: SiteConfig) -> Self {
    Self {
      site,
      plugins: Vec::new(),
    }
  }

  /// Register a plugin. Registration order breaks priority ties.
  #[must_use]
  pub fn with_plugin(mut self, plugin: impl Plugin + 'static) -> Self {
    self.plugins.push(Box::new(plugin));
    self
  }

  #[must_use]
  pub const fn site(&self) -> &SiteConfig {
    &self.site
  }

  /// Plugins in the order their hooks run for `event`.
  fn ordered(&self, event: Event) -> Vec<&dyn Plugin> {
    let mut plugins: Vec<&dyn Plugin> =
      self.plugins.iter().map(|plugin| &**plugin).collect();
    plugins.sort_by_key(|plugin| plugin.priority(event));
    trace!(
      "{event:?} hooks: {:?}",
      plugins.iter().map(|plugin| plugin.name()).collect::<Vec<_>>()
    );
    plugins
  }

  /// # Errors
  ///
  /// Returns the first error raised by a plugin.
  pub fn run_files(&self, files: Files) -> Result<Files, PluginError> {
    self
      .ordered(Event::Files)
      .into_iter()
      .try_fold(files, |files, plugin| plugin.on_files(files, &self.site))
  }

  /// # Errors
  ///
  /// Returns the first error raised by a plugin.
  pub fn run_page_read_source(
    &self,
    page: &mut Page,
  ) -> Result<(), PluginError> {
    for plugin in self.ordered(Event::PageReadSource) {
      plugin.on_page_read_source(page, &self.site)?;
    }
    Ok(())
  }

  /// # Errors
  ///
  /// Returns the first error raised by a plugin.
  pub fn run_page_content(
    &self,
    html: String,
    page: &mut Page,
  ) -> Result<String, PluginError> {
    self
      .ordered(Event::PageContent)
      .into_iter()
      .try_fold(html, |html, plugin| {
        plugin.on_page_content(html, page, &self.site)
      })
  }

  /// Take one file through the page lifecycle: read-source hooks, source
  /// loading, rendering and content hooks.
  ///
  /// # Errors
  ///
  /// Returns the first error raised by a hook, or an I/O error if the source
  /// cannot be read.
  pub fn build_page(
    &self,
    file: Box<dyn SourceFile>,
  ) -> Result<Page, PluginError> {
    let mut page = Page::new(file);
    self.run_page_read_source(&mut page)?;
    page.read_source()?;

    let html = page.render();
    let html = self.run_page_content(html, &mut page)?;
    page.content = Some(html);

    debug!("Built page {}", page.file.src_uri());
    Ok(page)
  }
}

/// Converts notebooks into pages and opens external links in a new
/// browsing context.
pub struct NotebookPlugin<E = LabExporter> {
  config:   PluginConfig,
  exporter: E,
  rewriter: LinkRewriter,
}

impl NotebookPlugin<LabExporter> {
  #[must_use]
  pub fn new(config: PluginConfig) -> Self {
    Self::with_exporter(config, LabExporter::new())
  }
}

impl<E: NotebookExporter> NotebookPlugin<E> {
  #[must_use]
  pub fn with_exporter(config: PluginConfig, exporter: E) -> Self {
    Self {
      config,
      exporter,
      rewriter: LinkRewriter::new(),
    }
  }

  /// Use `rewriter` for external links instead of the default one.
  #[must_use]
  pub fn with_rewriter(mut self, rewriter: LinkRewriter) -> Self {
    self.rewriter = rewriter;
    self
  }
}

impl<E: NotebookExporter> Plugin for NotebookPlugin<E> {
  fn name(&self) -> &'static str {
    "nbsite"
  }

  fn priority(&self, event: Event) -> i32 {
    match event {
      Event::PageContent => PAGE_CONTENT_PRIORITY,
      Event::Files | Event::PageReadSource => DEFAULT_PRIORITY,
    }
  }

  fn on_files(
    &self,
    files: Files,
    site: &SiteConfig,
  ) -> Result<Files, PluginError> {
    if !self.config.convert_ipynb {
      return Ok(files);
    }

    Ok(
      files
        .into_iter()
        .map(|file| {
          if file.is_notebook() {
            trace!("Treating {} as a page", file.src_uri());
            Box::new(PageFile::new(file, site)) as Box<dyn SourceFile>
          } else {
            file
          }
        })
        .collect(),
    )
  }

  fn on_page_read_source(
    &self,
    page: &mut Page,
    _site: &SiteConfig,
  ) -> Result<(), PluginError> {
    if !self.config.convert_ipynb || !page.is_notebook() {
      return Ok(());
    }

    let src_uri = page.file.src_uri().to_string();
    page.source = SourceLoader::Provided;

    let export = self
      .exporter
      .export(page.file.abs_src_path())
      .map_err(|e| PluginError::notebook(&src_uri, e))?;
    let body =
      extract_body(&export.html).map_err(|e| PluginError::html(&src_uri, e))?;
    let (markdown, meta) = extract_meta(&body);

    page.title = meta
      .iter()
      .find(|(key, _)| key.eq_ignore_ascii_case("title"))
      .and_then(|(_, values)| values.first().cloned())
      .or(Some(export.resources.title));
    page.meta = notebook_meta(&meta);
    page.markdown = Some(markdown);

    debug!(
      "Converted notebook {src_uri} ({} metadata key(s))",
      meta.len()
    );
    Ok(())
  }

  fn on_page_content(
    &self,
    html: String,
    page: &mut Page,
    _site: &SiteConfig,
  ) -> Result<String, PluginError> {
    let html = if self.config.external_link_target_blank {
      self.rewriter.rewrite(&html)
    } else {
      html
    };

    if page.is_notebook() {
      page.toc = build_toc(&html)
        .map_err(|e| PluginError::html(page.file.src_uri(), e))?;
    }

    Ok(html)
  }
}

#[cfg(test)]
mod tests {
  #![allow(clippy::unwrap_used, reason = "Tests can unwrap")]

  use std::{
    cell::RefCell,
    path::{Path, PathBuf},
    rc::Rc,
  };

  use nbsite_notebook::{Export, NotebookError, Resources};

  use super::*;
  use crate::files::File;

  /// Exporter returning a fixed document, whatever the path.
  struct FixedExporter(&'static str);

  impl NotebookExporter for FixedExporter {
    fn export(&self, path: &Path) -> Result<Export, NotebookError> {
      Ok(Export {
        html:      self.0.to_string(),
        resources: Resources {
          title:            path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default(),
          language:         None,
          output_extension: ".html".to_string(),
        },
      })
    }
  }

  const EXPORTED: &str = r#"<!DOCTYPE html><html><head><title>x</title></head>
<body class="jp-Notebook"><main>
<div class="jp-Cell jp-MarkdownCell"><div class="jp-RenderedHTMLCommon">
<hr><p>Owner:</p><ul><li>Alice</li></ul><hr>
</div></div>
<div class="jp-Cell jp-MarkdownCell"><div class="jp-RenderedHTMLCommon">
<h1 id="Report">Report</h1><p><a href="https://example.org">data</a></p>
<h2 id="Method">Method</h2>
</div></div>
</main></body></html>"#;

  fn site() -> SiteConfig {
    SiteConfig {
      docs_dir: PathBuf::from("/docs"),
      site_dir: PathBuf::from("/site"),
      use_directory_urls: true,
    }
  }

  fn notebook_page(src_uri: &str) -> Page {
    let site = site();
    Page::new(Box::new(PageFile::new(File::new(src_uri, &site), &site)))
  }

  /// Records the order hooks run in and tags the HTML it sees.
  struct Recorder {
    label:    &'static str,
    priority: i32,
    log:      Rc<RefCell<Vec<&'static str>>>,
  }

  impl Plugin for Recorder {
    fn name(&self) -> &'static str {
      self.label
    }

    fn priority(&self, _event: Event) -> i32 {
      self.priority
    }

    fn on_page_content(
      &self,
      html: String,
      _page: &mut Page,
      _site: &SiteConfig,
    ) -> Result<String, PluginError> {
      self.log.borrow_mut().push(self.label);
      Ok(format!("{html}[{}]", self.label))
    }
  }

  #[test]
  fn test_hooks_run_in_ascending_priority() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let recorder = |label, priority| {
      Recorder {
        label,
        priority,
        log: Rc::clone(&log),
      }
    };
    let host = PluginHost::new(site())
      .with_plugin(recorder("late", PAGE_CONTENT_PRIORITY))
      .with_plugin(recorder("default-a", DEFAULT_PRIORITY))
      .with_plugin(recorder("early", -50))
      .with_plugin(recorder("default-b", DEFAULT_PRIORITY));

    let mut page = notebook_page("a.ipynb");
    let html = host.run_page_content(String::new(), &mut page).unwrap();

    assert_eq!(*log.borrow(), ["early", "default-a", "default-b", "late"]);
    assert_eq!(html, "[early][default-a][default-b][late]");
  }

  #[test]
  fn test_notebook_plugin_priorities() {
    let plugin = NotebookPlugin::new(PluginConfig::default());
    assert_eq!(plugin.priority(Event::PageContent), PAGE_CONTENT_PRIORITY);
    assert_eq!(plugin.priority(Event::Files), DEFAULT_PRIORITY);
    assert!(PAGE_CONTENT_PRIORITY > DEFAULT_PRIORITY);
  }

  #[test]
  fn test_on_files_wraps_notebooks_only() {
    let site = site();
    let mut files = Files::new();
    files.push(File::new("index.md", &site));
    files.push(File::new("nb/report.ipynb", &site));
    files.push(File::new("img/plot.png", &site));

    let plugin = NotebookPlugin::new(PluginConfig::default());
    let files = plugin.on_files(files, &site).unwrap();

    let uris: Vec<_> = files.iter().map(|file| file.src_uri()).collect();
    assert_eq!(uris, ["index.md", "nb/report.ipynb", "img/plot.png"]);

    let notebook = files.get("nb/report.ipynb").unwrap();
    assert!(notebook.is_documentation_page());
    assert_eq!(notebook.url(), "nb/report/");
    assert!(!files.get("img/plot.png").unwrap().is_documentation_page());
  }

  #[test]
  fn test_on_files_disabled() {
    let site = site();
    let mut files = Files::new();
    files.push(File::new("nb/report.ipynb", &site));

    let plugin = NotebookPlugin::new(PluginConfig {
      convert_ipynb: false,
      ..PluginConfig::default()
    });
    let files = plugin.on_files(files, &site).unwrap();
    assert!(!files.get("nb/report.ipynb").unwrap().is_documentation_page());
  }

  #[test]
  fn test_read_source_converts_notebook() {
    let plugin = NotebookPlugin::with_exporter(
      PluginConfig::default(),
      FixedExporter(EXPORTED),
    );
    let mut page = notebook_page("nb/report.ipynb");
    plugin.on_page_read_source(&mut page, &site()).unwrap();

    assert_eq!(page.source, SourceLoader::Provided);
    assert_eq!(page.title.as_deref(), Some("report"));
    assert_eq!(page.meta["Owner"], serde_json::json!(["Alice"]));
    assert_eq!(page.meta["source_kind"], serde_json::json!("ipynb"));

    let markdown = page.markdown.as_deref().unwrap();
    assert!(markdown.starts_with("<body"));
    assert!(!markdown.contains("Owner"));
    assert!(markdown.contains("<h1 id=\"Report\">"));
  }

  #[test]
  fn test_title_meta_names_the_page() {
    let plugin = NotebookPlugin::with_exporter(
      PluginConfig::default(),
      FixedExporter(
        r#"<html><body><div class="jp-Cell jp-MarkdownCell"><div class="jp-RenderedHTMLCommon"><hr><p>Title:</p><ul><li>Quarterly</li></ul><hr></div></div></body></html>"#,
      ),
    );
    let mut page = notebook_page("nb/report.ipynb");
    plugin.on_page_read_source(&mut page, &site()).unwrap();
    assert_eq!(page.title.as_deref(), Some("Quarterly"));
  }

  #[test]
  fn test_markdown_pages_are_left_alone() {
    let plugin = NotebookPlugin::with_exporter(
      PluginConfig::default(),
      FixedExporter(EXPORTED),
    );
    let mut page = Page::new(Box::new(File::new("index.md", &site())));
    plugin.on_page_read_source(&mut page, &site()).unwrap();
    assert_eq!(page.source, SourceLoader::Filesystem);
    assert!(page.markdown.is_none());

    let html = plugin
      .on_page_content("<h2>a</h2>".to_string(), &mut page, &site())
      .unwrap();
    assert_eq!(html, "<h2>a</h2>");
    assert!(page.toc.is_empty());
  }

  #[test]
  fn test_content_hook_rewrites_and_rebuilds_toc() {
    let plugin = NotebookPlugin::new(PluginConfig::default());
    let mut page = notebook_page("nb/report.ipynb");
    let html = plugin
      .on_page_content(
        r#"<h1 id="Report">Report</h1><p><a href="https://example.org">x</a></p><h2 id="Method">Method</h2>"#
          .to_string(),
        &mut page,
        &site(),
      )
      .unwrap();

    assert!(html.contains(r#"target="_blank""#));
    assert_eq!(page.toc.len(), 1);
    assert_eq!(page.toc[0].name, "Report");
    assert_eq!(page.toc[0].children[0].id, "Method");
  }

  #[test]
  fn test_content_hook_without_rewriting() {
    let plugin = NotebookPlugin::new(PluginConfig {
      external_link_target_blank: false,
      ..PluginConfig::default()
    });
    let mut page = Page::new(Box::new(File::new("index.md", &site())));
    let html = r#"<p><a href="https://example.org">x</a></p>"#;
    let out = plugin
      .on_page_content(html.to_string(), &mut page, &site())
      .unwrap();
    assert_eq!(out, html);
  }

  #[test]
  fn test_second_h1_fails_with_src_uri() {
    let plugin = NotebookPlugin::new(PluginConfig::default());
    let mut page = notebook_page("nb/twice.ipynb");
    let err = plugin
      .on_page_content("<h1>A</h1><h1>B</h1>".to_string(), &mut page, &site())
      .unwrap_err();
    assert!(matches!(err, PluginError::Html { ref src_uri, .. } if src_uri == "nb/twice.ipynb"));
    assert!(err.to_string().contains("nb/twice.ipynb"));
  }
}
