use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Main CLI parser structure
#[derive(Parser)]
#[command(name = "weft")]
#[command(about = "Markdown static site generator with live rebuild and validation", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Template files to use when rendering
    #[arg(short, long, value_name = "PATH", env = "WEFT_TEMPLATES", default_value = "./templates")]
    pub templates: PathBuf,

    /// Markdown pages to render into site pages via templates
    #[arg(short, long, value_name = "PATH", env = "WEFT_PAGES", default_value = "./pages")]
    pub pages: PathBuf,

    /// Static files required to fully display the rendered site
    #[arg(short, long = "static", value_name = "PATH", env = "WEFT_STATIC", default_value = "./static")]
    pub static_dir: PathBuf,

    /// Rendered file output location
    #[arg(short, long, value_name = "PATH", env = "WEFT_OUTPUT", default_value = "./output")]
    pub output: PathBuf,

    /// Template name used when a page selects none
    #[arg(long, value_name = "NAME", env = "WEFT_DEFAULT_TEMPLATE", default_value = "default.html")]
    pub default_template: String,

    /// Number of posts shown per blog index page
    #[arg(long, value_name = "N", env = "WEFT_BLOG_POSTS_PER_PAGE", default_value_t = 5)]
    pub blog_posts_per_page: usize,

    /// The name for this site, used in Open Graph tags
    #[arg(long, value_name = "NAME", env = "WEFT_SITE_NAME")]
    pub site_name: Option<String>,

    /// The locale of this website, used in Open Graph tags
    #[arg(long, value_name = "LOCALE", env = "WEFT_LOCALE")]
    pub locale: Option<String>,

    /// Enable verbose logging output
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

/// Subcommands for the CLI
#[derive(Subcommand)]
pub enum Commands {
    /// Build a fully rendered site and then exit
    #[command(alias = "b")]
    Build {
        /// Hostname the site will be hosted under
        #[arg(long, value_name = "HOST", default_value = "localhost")]
        host: String,

        /// Include debug pages that would normally be excluded
        #[arg(long, default_value_t = false)]
        include_debug: bool,
    },

    /// Build and serve the site locally, rebuilding on changes
    #[command(alias = "dev")]
    Live {
        /// Hostname to listen at
        #[arg(long, value_name = "HOST", default_value = "localhost")]
        host: String,

        /// Port number to listen on
        #[arg(short = 'P', long, value_name = "PORT", default_value_t = 8000)]
        port: u16,

        /// Exclude debug pages that would normally be included
        #[arg(long, default_value_t = false)]
        exclude_debug: bool,
    },

    /// Validate source files for semantic errors
    Validate {
        /// Check the built site for dead links
        #[arg(long, default_value_t = false)]
        dead_links: bool,

        /// Regex pattern for a link that is explicitly allowed
        #[arg(long = "allow-link", value_name = "PATTERN")]
        allowed_links: Vec<String>,
    },
}
