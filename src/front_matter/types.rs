use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

use crate::config::Config;
use crate::errors::ContentError;

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// The page type selects the render strategy used for a page. `default` has
/// no special meaning; `blog_index` pages aggregate and paginate their
/// sibling posts; `debug` pages are only rendered when debug pages are
/// enabled for the build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageType {
    #[default]
    Default,
    BlogPost,
    BlogIndex,
    Debug,
}

impl PageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PageType::Default => "default",
            PageType::BlogPost => "blog_post",
            PageType::BlogIndex => "blog_index",
            PageType::Debug => "debug",
        }
    }
}

/// Page Open Graph details extracted from markdown front matter. Missing
/// values are backfilled from the page front matter and the site config by
/// [`PageFrontmatter::open_graph`].
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OpenGraphFrontmatter {
    /// The og:title for this page, defaults to the page title.
    pub title: Option<String>,

    /// The og:image for this page, made absolute against the base URL.
    pub image: Option<String>,

    /// The og:description for this page, defaults to the page subtitle.
    pub description: Option<String>,

    /// The og:url for this page, defaults to the computed page URL.
    pub url: Option<String>,

    /// The og:type for this page.
    #[serde(rename = "type", default = "default_og_type")]
    pub og_type: String,

    /// The og:locale for this page, defaults to the locale in config.
    pub locale: Option<String>,

    /// The og:site_name for this page, defaults to the site name in config.
    pub site_name: Option<String>,
}

fn default_og_type() -> String {
    "website".to_string()
}

impl Default for OpenGraphFrontmatter {
    fn default() -> Self {
        Self {
            title: None,
            image: None,
            description: None,
            url: None,
            og_type: default_og_type(),
            locale: None,
            site_name: None,
        }
    }
}

/// Page details extracted from markdown front matter content.
///
/// Parsing is strict: an unrecognised field is a hard error so typos fail
/// the page instead of being silently dropped. Instances go through a
/// two-phase init: serde parse first, then [`bind`](Self::bind) attaches
/// the site config the path and URL derivations need.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PageFrontmatter {
    /// The name of the template to use when rendering this file.
    ///
    /// The template is chosen from the following ordered options:
    /// 1. The `template` front matter property.
    /// 2. A template name from the page type, `"{type}.html"`.
    /// 3. The configured default template name.
    pub template: Option<String>,

    /// The path under which the page is served in the output. If this path
    /// does not end in `.html` it has `index.html` appended so it works as
    /// expected in browsers.
    pub path: Option<String>,

    /// The title for this page.
    pub title: Option<String>,

    /// The subtitle for this page.
    pub subtitle: Option<String>,

    /// The meta description for this page.
    pub description: Option<String>,

    /// Classification tags for this page's content.
    #[serde(default)]
    pub tags: Vec<String>,

    /// The original publication date for this page.
    pub date: Option<NaiveDate>,

    /// Open Graph details, partially auto populated.
    pub og: Option<OpenGraphFrontmatter>,

    /// Arbitrary values that can be set per page with no further validation
    /// or prescribed semantic meaning. It depends on the template how these
    /// values are used.
    pub meta: Option<serde_yaml::Mapping>,

    #[serde(rename = "type", default)]
    pub page_type: PageType,

    /// Mark this page for local preview only, not included in the regular
    /// build.
    #[serde(default)]
    pub debug: bool,

    // Populated by the loader, never set from front matter.
    #[serde(skip)]
    pub source_file: PathBuf,
    #[serde(skip)]
    config: Option<Arc<Config>>,
}

impl PageFrontmatter {
    /// Attach the site config and backfill the computed Open Graph
    /// defaults. Must be called before any of the path derivations.
    pub fn bind(&mut self, config: Arc<Config>) -> Result<(), ContentError> {
        self.config = Some(config);
        self.og = Some(self.open_graph()?);
        Ok(())
    }

    fn config(&self) -> Result<&Config, ContentError> {
        self.config.as_deref().ok_or_else(|| ContentError::Unbound {
            file: self.source_file.clone(),
        })
    }

    pub fn is_debug(&self) -> bool {
        self.debug || self.page_type == PageType::Debug
    }

    /// Ordered template name candidates for rendering this page.
    pub fn template_names(&self, config: &Config) -> Vec<String> {
        let mut names = Vec::new();
        if let Some(template) = &self.template {
            names.push(template.clone());
        }
        names.push(format!("{}.html", self.page_type.as_str()));
        names.push(config.default_template.clone());
        names
    }

    /// Determine the output path to write rendered page content into.
    ///
    /// With a `path` override the page lands verbatim under the output
    /// root. Otherwise pages get pretty URLs: `index.md` maps onto its
    /// directory's own `index.html`, any other `name.md` onto
    /// `name/index.html`. Whitespace in path segments is replaced with
    /// underscores.
    pub fn output_path(&self) -> Result<PathBuf, ContentError> {
        let config = self.config()?;

        let relative = if let Some(overridden) = &self.path {
            let trimmed = overridden.strip_prefix('/').unwrap_or(overridden);
            let mut relative = PathBuf::from(trimmed);
            if !trimmed.ends_with(".html") {
                relative.push("index.html");
            }
            relative
        } else {
            let parent = self.source_file.parent().unwrap_or_else(|| Path::new(""));
            let mut relative = parent
                .strip_prefix(&config.pages)
                .map_err(|_| ContentError::OutsidePagesRoot {
                    file: self.source_file.clone(),
                    root: config.pages.clone(),
                })?
                .to_path_buf();
            let name = self
                .source_file
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default();
            if name != "index.md" {
                relative.push(name.strip_suffix(".md").unwrap_or(&name));
            }
            relative.push("index.html");
            relative
        };

        let normalized: PathBuf = relative
            .components()
            .map(|part| {
                WHITESPACE
                    .replace_all(&part.as_os_str().to_string_lossy(), "_")
                    .into_owned()
            })
            .collect();

        Ok(config.output.join(normalized))
    }

    /// The site relative URL path for this page, with the trailing
    /// `index.html` stripped.
    pub fn page_path(&self) -> Result<String, ContentError> {
        let config = self.config()?;
        let output = self.output_path()?;
        let relative = output.strip_prefix(&config.output).unwrap_or(&output);

        let mut path = format!("/{}", relative.display());
        if let Some(stripped) = path.strip_suffix("index.html") {
            path.truncate(stripped.len());
        }
        Ok(path)
    }

    /// The fully qualified URL for this page.
    pub fn page_url(&self) -> Result<String, ContentError> {
        Ok(format!("{}{}", self.config()?.base_url(), self.page_path()?))
    }

    /// The Open Graph front matter for this page with default values
    /// applied. The values actually provided in the source file remain
    /// unmodified in `og`; defaulting happens on a derived copy.
    pub fn open_graph(&self) -> Result<OpenGraphFrontmatter, ContentError> {
        let config = self.config()?;
        let mut og = self.og.clone().unwrap_or_default();

        // Make the OG image URL fully qualified if it isn't already
        if let Some(image) = og.image.as_deref() {
            if !image.starts_with("http://") && !image.starts_with("https://") {
                let absolute = if image.starts_with('/') {
                    format!("{}{}", config.base_url(), image)
                } else {
                    format!("{}/{}", config.base_url(), image)
                };
                og.image = Some(absolute);
            }
        }

        if og.title.is_none() {
            og.title = self.title.clone();
        }
        if og.description.is_none() {
            og.description = self.subtitle.clone();
        }
        if og.url.is_none() {
            og.url = Some(self.page_url()?);
        }
        if og.locale.is_none() {
            og.locale = config.locale.clone();
        }
        if og.site_name.is_none() {
            og.site_name = config.site_name.clone();
        }

        Ok(og)
    }

    /// Whether validation for a named field is enabled. Pages can opt out
    /// of individual checks with `meta.validation.<field>: false`.
    pub fn validation_enabled(&self, field: &str) -> bool {
        self.meta
            .as_ref()
            .and_then(|meta| meta.get("validation"))
            .and_then(|validation| validation.as_mapping())
            .and_then(|validation| validation.get(field))
            .and_then(|value| value.as_bool())
            .unwrap_or(true)
    }

    /// Analyse the front matter values for semantic correctness, above and
    /// beyond what parsing enforces. Returns human readable problems aimed
    /// at determining whether a page is likely to cause build issues.
    pub fn validate_frontmatter(&self) -> Vec<String> {
        let mut problems = Vec::new();

        if self.title.as_deref().unwrap_or("").is_empty() && self.validation_enabled("title") {
            problems.push("no title set".to_string());
        }
        if self.subtitle.as_deref().unwrap_or("").is_empty() && self.validation_enabled("subtitle") {
            problems.push("no subtitle set".to_string());
        }
        if self.description.as_deref().unwrap_or("").is_empty()
            && self.validation_enabled("description")
        {
            problems.push("no description set".to_string());
        }

        if self.page_type == PageType::BlogIndex
            && self.source_file.file_name().map_or(true, |name| name != "index.md")
        {
            problems.push("type set to 'blog_index' but file not named `index.md`".to_string());
        }

        problems
    }
}
