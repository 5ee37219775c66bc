use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors raised while reading and parsing a single Markdown source file.
#[derive(Debug, Error)]
pub enum ContentError {
    #[error("failed to read {}: {source}", .file.display())]
    Read {
        file: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("unterminated front matter block in {}", .file.display())]
    UnterminatedFrontMatter { file: PathBuf },

    #[error("invalid front matter in {}: {source}", .file.display())]
    Parse {
        file: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("front matter for {} is not bound to a site config", .file.display())]
    Unbound { file: PathBuf },

    #[error("{} is outside the pages root {}", .file.display(), .root.display())]
    OutsidePagesRoot { file: PathBuf, root: PathBuf },
}

/// Failure at one stage of transforming a single source file. Always names
/// the offending file and chains the underlying cause.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("reading {} failed: {source}", .file.display())]
    Load {
        file: PathBuf,
        #[source]
        source: ContentError,
    },

    #[error("resolving output path for {} failed: {source}", .file.display())]
    OutputPath {
        file: PathBuf,
        #[source]
        source: ContentError,
    },

    #[error("rendering template for {} failed: {source}", .file.display())]
    Template {
        file: PathBuf,
        #[source]
        source: liquid::Error,
    },

    #[error("writing rendered page {} to {} failed: {source}", .file.display(), .output.display())]
    Write {
        file: PathBuf,
        output: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("copying static file {} to {} failed: {source}", .file.display(), .output.display())]
    Copy {
        file: PathBuf,
        output: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("static file {} is outside the static root", .file.display())]
    OutsideStaticRoot { file: PathBuf },

    #[error("blog index {} failed to load post {}: {source}", .file.display(), .post.display())]
    PostLoad {
        file: PathBuf,
        post: PathBuf,
        #[source]
        source: ContentError,
    },

    #[error("blog index {} cannot include {}: post has no date", .file.display(), .post.display())]
    MissingPostDate { file: PathBuf, post: PathBuf },

    #[error("clearing output directory {} failed: {source}", .path.display())]
    Clear {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("template engine setup failed: {source}")]
    Engine {
        #[source]
        source: liquid::Error,
    },
}

/// Precondition and configuration violations, as opposed to defects in the
/// site content itself.
#[derive(Debug, Error)]
pub enum SiteError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid --allow-link pattern '{pattern}': {source}")]
    AllowedLink {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("site must be built before it can be validated for dead links")]
    SiteNotBuilt,

    #[error("HTTP client setup failed: {source}")]
    HttpClient {
        #[source]
        source: reqwest::Error,
    },

    #[error("dev server failed: {source}")]
    Server {
        #[source]
        source: io::Error,
    },
}

/// A single validation finding. Not an error type in the `Result` sense:
/// findings are accumulated and reported, never raised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub file: PathBuf,
    pub message: String,
    pub line: Option<usize>,
    pub column: Option<usize>,
}

impl ValidationError {
    pub fn new(file: &Path, message: impl Into<String>) -> Self {
        Self {
            file: file.to_path_buf(),
            message: message.into(),
            line: None,
            column: None,
        }
    }

    pub fn at(mut self, line: usize, column: usize) -> Self {
        self.line = Some(line);
        self.column = Some(column);
        self
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.file.display())?;
        if let Some(line) = self.line {
            write!(f, ":{line}")?;
            if let Some(column) = self.column {
                write!(f, ":{column}")?;
            }
        }
        write!(f, ": {}", self.message)
    }
}
