use std::fs;
use std::path::{Path, PathBuf};

use log::debug;
use regex::Regex;

use crate::errors::SiteError;

/// Site configuration. Created once at process start from the CLI layer and
/// shared read-only (behind an `Arc`) by every concurrent pipeline task.
#[derive(Debug, Clone)]
pub struct Config {
    /// Invocation root, used to shorten paths in log output.
    pub base: PathBuf,
    pub templates: PathBuf,
    pub pages: PathBuf,
    pub static_dir: PathBuf,
    pub output: PathBuf,

    /// Template name used when a page selects none.
    pub default_template: String,
    pub blog_posts_per_page: usize,

    pub host: String,
    pub port: u16,
    /// Live/dev mode. Controls the base URL scheme: pages link to
    /// `http://host:port` while live, `https://host` otherwise.
    pub live: bool,

    /// Whether debug pages are included in this build.
    pub debug_pages: bool,

    /// Whether the validator checks the built site for dead links.
    pub dead_links: bool,
    /// Links matching any of these patterns are never flagged.
    pub allowed_links: Vec<Regex>,

    /// Open Graph defaults.
    pub locale: Option<String>,
    pub site_name: Option<String>,
}

impl Config {
    /// The base URL every absolute page URL is joined against.
    pub fn base_url(&self) -> String {
        if self.live {
            format!("http://{}:{}", self.host, self.port)
        } else {
            format!("https://{}", self.host)
        }
    }

    /// Render a path relative to the invocation root for log lines. Paths
    /// outside the root are shown unmodified.
    pub fn display_path(&self, path: &Path) -> String {
        match path.strip_prefix(&self.base) {
            Ok(relative) => format!("./{}", relative.display()),
            Err(_) => path.display().to_string(),
        }
    }

    pub fn is_link_allowed(&self, link: &str) -> bool {
        self.allowed_links.iter().any(|pattern| pattern.is_match(link))
    }

    /// Absolutize a configured path and make sure it is a directory,
    /// creating it when absent. An existing non-directory is rejected.
    pub fn ensure_directory(path: &Path) -> Result<PathBuf, SiteError> {
        let path = Self::absolutize(path)?;
        if path.exists() {
            if !path.is_dir() {
                return Err(SiteError::Config(format!(
                    "{} is a file, expected directory",
                    path.display()
                )));
            }
        } else {
            fs::create_dir_all(&path).map_err(|e| {
                SiteError::Config(format!("cannot create directory {}: {e}", path.display()))
            })?;
        }
        Ok(path)
    }

    /// Absolutize a path lexically, without touching the filesystem.
    pub fn absolutize(path: &Path) -> Result<PathBuf, SiteError> {
        if path.is_absolute() {
            return Ok(path.to_path_buf());
        }
        let cwd = std::env::current_dir()
            .map_err(|e| SiteError::Config(format!("cannot determine working directory: {e}")))?;
        Ok(cwd.join(path))
    }

    /// Echo every configuration value at debug level.
    pub fn log_debug(&self) {
        debug!("config.base = {}", self.base.display());
        debug!("config.templates = {}", self.templates.display());
        debug!("config.pages = {}", self.pages.display());
        debug!("config.static = {}", self.static_dir.display());
        debug!("config.output = {}", self.output.display());
        debug!("config.default_template = {}", self.default_template);
        debug!("config.blog_posts_per_page = {}", self.blog_posts_per_page);
        debug!("config.host = {}", self.host);
        debug!("config.port = {}", self.port);
        debug!("config.live = {}", self.live);
        debug!("config.debug_pages = {}", self.debug_pages);
        debug!("config.dead_links = {}", self.dead_links);
        let patterns: Vec<&str> = self.allowed_links.iter().map(|p| p.as_str()).collect();
        debug!("config.allowed_links = {patterns:?}");
        debug!("config.locale = {:?}", self.locale);
        debug!("config.site_name = {:?}", self.site_name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support;

    #[test]
    fn ensure_directory_creates_missing_directories() {
        let tmp = tempfile::tempdir().unwrap();
        let target = tmp.path().join("a").join("b");

        let created = Config::ensure_directory(&target).unwrap();

        assert_eq!(created, target);
        assert!(target.is_dir());
    }

    #[test]
    fn ensure_directory_rejects_existing_files() {
        let tmp = tempfile::tempdir().unwrap();
        let target = tmp.path().join("not-a-dir");
        fs::write(&target, "x").unwrap();

        assert!(matches!(
            Config::ensure_directory(&target),
            Err(SiteError::Config(_))
        ));
    }

    #[test]
    fn base_url_scheme_follows_live_mode() {
        let tmp = tempfile::tempdir().unwrap();
        let config = test_support::config_at(tmp.path());
        assert_eq!(config.base_url(), "https://localhost");

        let mut live = (*config).clone();
        live.live = true;
        assert_eq!(live.base_url(), "http://localhost:8000");
    }

    #[test]
    fn display_path_is_relative_to_the_base() {
        let tmp = tempfile::tempdir().unwrap();
        let config = test_support::config_at(tmp.path());

        let inside = config.pages.join("index.md");
        assert_eq!(
            config.display_path(&inside),
            "./pages/index.md".to_string()
        );
        assert_eq!(config.display_path(Path::new("/elsewhere/x")), "/elsewhere/x");
    }
}
