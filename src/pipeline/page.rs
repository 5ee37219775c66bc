use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use log::debug;

use crate::config::Config;
use crate::errors::PipelineError;
use crate::front_matter::{self, PageFrontmatter, PageType};
use crate::markdown;
use crate::template::{self, TemplateContext, TemplateRenderer};
use crate::utils;

use super::blog;

/// Render one Markdown source file into the output tree, dispatching on
/// its page type. Returns the primary output path, or `None` when the
/// page was skipped.
pub async fn render_page(
    config: &Arc<Config>,
    renderer: &TemplateRenderer,
    path: &Path,
) -> Result<Option<PathBuf>, PipelineError> {
    let (body, frontmatter) =
        front_matter::load_markdown(config, path).map_err(|source| PipelineError::Load {
            file: path.to_path_buf(),
            source,
        })?;

    if frontmatter.is_debug() && !config.debug_pages {
        debug!("skipping debug page {}", config.display_path(path));
        return Ok(None);
    }

    match frontmatter.page_type {
        PageType::BlogIndex => blog::render_blog_index(config, renderer, path, &body, frontmatter)
            .await
            .map(Some),
        _ => render_default(config, renderer, path, &body, frontmatter)
            .await
            .map(Some),
    }
}

/// The `default` render strategy: render the body, merge it into one
/// template, write one file.
async fn render_default(
    config: &Arc<Config>,
    renderer: &TemplateRenderer,
    path: &Path,
    body: &str,
    frontmatter: PageFrontmatter,
) -> Result<PathBuf, PipelineError> {
    let context = TemplateContext {
        content: markdown::render(body),
        rendered_at: Utc::now(),
        modified_at: utils::modified_at(path),
        git_ref: utils::git::current_ref(path),
        frontmatter,
    };

    let names = context.frontmatter.template_names(config);
    let html = renderer
        .render(&names, &template::page_globals(&context))
        .map_err(|source| PipelineError::Template {
            file: path.to_path_buf(),
            source,
        })?;

    let output = context
        .frontmatter
        .output_path()
        .map_err(|source| PipelineError::OutputPath {
            file: path.to_path_buf(),
            source,
        })?;
    write_output(config, path, &output, &html).await?;

    Ok(output)
}

/// Write rendered HTML, creating parent directories as needed.
pub(crate) async fn write_output(
    config: &Config,
    source_file: &Path,
    output: &Path,
    html: &str,
) -> Result<(), PipelineError> {
    let write = async {
        if let Some(parent) = output.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(output, html).await
    };
    write.await.map_err(|source| PipelineError::Write {
        file: source_file.to_path_buf(),
        output: output.to_path_buf(),
        source,
    })?;

    debug!(
        "rendered {} to {}",
        config.display_path(source_file),
        config.display_path(output)
    );
    Ok(())
}
