//! # nbsite
//!
//! Build hooks for static documentation sites that turn Jupyter notebooks
//! into pages and open external links in a new browsing context.
//!
//! A [`PluginHost`] runs the registered [`Plugin`]s at each step of a page's
//! lifecycle. [`NotebookPlugin`] is the plugin this crate provides:
//!
//! - notebook files are wrapped in a [`PageFile`] so the site treats them as
//!   documentation pages
//! - before a notebook page is read, the notebook is exported to HTML and
//!   its body and metadata block become the page source and metadata
//! - once the page is rendered, external links get `target="_blank"` and
//!   the table of contents is rebuilt from the final HTML
//!
//! ```no_run
//! use nbsite::{File, Files, NotebookPlugin, PluginHost};
//! use nbsite_config::Config;
//!
//! let config = Config::default();
//! let host = PluginHost::new(config.site.clone())
//!   .with_plugin(NotebookPlugin::new(config.plugin.clone()));
//!
//! let mut files = Files::new();
//! files.push(File::new("analysis.ipynb", host.site()));
//! let mut files = host.run_files(files).unwrap();
//!
//! let file = files.take("analysis.ipynb").unwrap();
//! let page = host.build_page(file).unwrap();
//! println!("{:?}", page.title);
//! ```

pub mod cli;
pub mod commands;
pub mod error;
pub mod files;
pub mod page;
pub mod plugin;

pub use error::PluginError;
pub use files::{File, Files, PageFile, SourceFile};
pub use page::{Page, PageMeta, SourceLoader};
pub use plugin::{
  DEFAULT_PRIORITY,
  Event,
  NotebookPlugin,
  PAGE_CONTENT_PRIORITY,
  Plugin,
  PluginHost,
};
