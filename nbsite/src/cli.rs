use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Command line interface for nbsite
#[derive(Parser, Debug)]
#[command(
  author,
  version,
  about = "nbsite: notebook pages and external links for documentation sites"
)]
pub struct Cli {
  /// Subcommand to execute (see [`Commands`])
  #[command(subcommand)]
  pub command: Commands,

  /// Enable verbose debug logging
  #[arg(short, long)]
  pub verbose: bool,

  /// Path to configuration file(s) (TOML or JSON, can be specified multiple
  /// times). Multiple files are merged in order, with later files overriding
  /// earlier ones
  #[arg(short = 'c', long = "config-file", action = clap::ArgAction::Append)]
  pub config_files: Vec<PathBuf>,

  /// Override configuration values (KEY=VALUE format, can be used multiple
  /// times)
  #[arg(long = "config", action = clap::ArgAction::Append)]
  pub config_overrides: Vec<String>,
}

/// All supported subcommands for the nbsite CLI.
#[derive(Subcommand, Debug)]
pub enum Commands {
  /// Build a page from a notebook and print it as JSON.
  Page {
    /// Path to the `.ipynb` file.
    notebook: PathBuf,

    /// Leave code cell sources out of the page.
    #[arg(long)]
    exclude_input: bool,
  },

  /// Open external links in a new tab, rewriting HTML files in place.
  Rewrite {
    /// HTML files or directories to walk for them.
    #[arg(required = true)]
    paths: Vec<PathBuf>,

    /// Also add `rel="noopener"` to rewritten links.
    #[arg(long)]
    noopener: bool,
  },
}

impl Cli {
  /// Parse command line arguments into a [`Cli`] struct.
  #[must_use]
  pub fn parse_args() -> Self {
    Self::parse()
  }
}
