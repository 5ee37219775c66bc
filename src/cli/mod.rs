pub mod commands;
pub mod logging;
pub mod types;

use std::path::Path;
use std::process;
use std::sync::Arc;

use clap::Parser;
use log::error;
use regex::Regex;

use crate::config::Config;
use crate::errors::SiteError;
use types::{Cli, Commands};

/// Run the command-line interface.
pub async fn run() {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);

    let config = match build_config(&cli) {
        Ok(config) => Arc::new(config),
        Err(failure) => {
            error!("{failure}");
            process::exit(1);
        }
    };
    config.log_debug();

    let result = match &cli.command {
        Commands::Build { .. } => commands::build::run(&config).await,
        Commands::Live { .. } => commands::live::run(&config).await,
        Commands::Validate { .. } => commands::validate::run(&config).await,
    };

    if let Err(failure) = result {
        error!("{failure:#}");
        process::exit(1);
    }
}

/// Assemble the shared site config from CLI arguments and environment.
fn build_config(cli: &Cli) -> Result<Config, SiteError> {
    let (host, port, live, debug_pages) = match &cli.command {
        Commands::Build { host, include_debug } => (host.clone(), 8000, false, *include_debug),
        // Debug pages are included by default while developing
        Commands::Live { host, port, exclude_debug } => (host.clone(), *port, true, !*exclude_debug),
        Commands::Validate { .. } => ("localhost".to_string(), 8000, false, false),
    };

    let (dead_links, allowed_links) = match &cli.command {
        Commands::Validate { dead_links, allowed_links } => {
            let mut patterns = Vec::new();
            for pattern in allowed_links {
                patterns.push(Regex::new(pattern).map_err(|source| SiteError::AllowedLink {
                    pattern: pattern.clone(),
                    source,
                })?);
            }
            (*dead_links, patterns)
        }
        _ => (false, Vec::new()),
    };

    // The output root is only created for commands that write into it;
    // validating dead links against a never-built site must fail instead.
    let output = if matches!(cli.command, Commands::Validate { .. }) {
        Config::absolutize(&cli.output)?
    } else {
        Config::ensure_directory(&cli.output)?
    };

    Ok(Config {
        base: Config::absolutize(Path::new("."))?,
        templates: Config::ensure_directory(&cli.templates)?,
        pages: Config::ensure_directory(&cli.pages)?,
        static_dir: Config::ensure_directory(&cli.static_dir)?,
        output,
        default_template: cli.default_template.clone(),
        blog_posts_per_page: cli.blog_posts_per_page,
        host,
        port,
        live,
        debug_pages,
        dead_links,
        allowed_links,
        locale: cli.locale.clone(),
        site_name: cli.site_name.clone(),
    })
}
