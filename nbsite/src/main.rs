use color_eyre::eyre::{Context, Result};
use log::{LevelFilter, info};
use nbsite::{
  cli::{Cli, Commands},
  commands,
};
use nbsite_config::Config;
use nbsite_html::LinkRewriter;

fn main() -> Result<()> {
  color_eyre::install()?;

  // Parse command line arguments
  let cli = Cli::parse_args();

  // Initialize logging first so we can log during command handling
  env_logger::Builder::new()
    .filter_level(if cli.verbose {
      LevelFilter::Debug
    } else {
      LevelFilter::Info
    })
    .write_style(env_logger::WriteStyle::Always)
    .init();

  let config = Config::load(&cli.config_files, &cli.config_overrides)
    .wrap_err("Failed to load configuration")?;

  match &cli.command {
    Commands::Page {
      notebook,
      exclude_input,
    } => {
      let page =
        commands::build_notebook_page(&config, notebook, *exclude_input)
          .wrap_err_with(|| {
            format!("Failed to build page from {}", notebook.display())
          })?;
      println!("{}", serde_json::to_string_pretty(&page.report())?);
    },

    Commands::Rewrite { paths, noopener } => {
      if !config.plugin.external_link_target_blank {
        info!("external_link_target_blank is disabled, nothing to rewrite");
        return Ok(());
      }

      let rewriter = LinkRewriter::new().with_noopener(*noopener);
      commands::rewrite_paths(paths, &rewriter)
        .wrap_err("Failed to rewrite external links")?;
    },
  }

  Ok(())
}
