use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use log::debug;

use crate::config::Config;
use crate::errors::PipelineError;
use crate::front_matter::{self, PageFrontmatter};
use crate::markdown;
use crate::template::{self, BlogIndexContext, BlogPostInfo, TemplateContext, TemplateRenderer};
use crate::utils;

use super::{discovery, page};

const NO_PARAGRAPHS_PREVIEW: &str = "This page has no paragraphs, please add some content!";

/// The `blog_index` render strategy.
///
/// Aggregates every sibling post under the index's directory, paginates
/// them newest first, and writes page 1 at the index's natural output path
/// plus numbered pages under `_/<n>/`. `_/1/` is a redirect stub back to
/// the canonical first page so the numbered scheme is complete. Any
/// failure aborts only this index's render.
pub async fn render_blog_index(
    config: &Arc<Config>,
    renderer: &TemplateRenderer,
    index: &Path,
    body: &str,
    frontmatter: PageFrontmatter,
) -> Result<PathBuf, PipelineError> {
    let posts = find_posts(config, index).await?;

    let root_output = frontmatter
        .output_path()
        .map_err(|source| PipelineError::OutputPath {
            file: index.to_path_buf(),
            source,
        })?;
    let blog_root = root_output
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| config.output.clone());
    let names = frontmatter.template_names(config);

    let context = TemplateContext {
        content: markdown::render(body),
        rendered_at: Utc::now(),
        modified_at: utils::modified_at(index),
        git_ref: utils::git::current_ref(index),
        frontmatter,
    };

    let page_size = config.blog_posts_per_page.max(1);
    let max_pages = posts.len().div_ceil(page_size);

    for (chunk_index, chunk) in posts.chunks(page_size).enumerate() {
        let current_page = chunk_index + 1;
        let globals = template::blog_globals(&BlogIndexContext {
            base: &context,
            posts: chunk,
            current_page,
            max_pages,
        });
        let html = renderer
            .render(&names, &globals)
            .map_err(|source| PipelineError::Template {
                file: index.to_path_buf(),
                source,
            })?;

        if current_page == 1 {
            page::write_output(config, index, &root_output, &html).await?;
            // The numbered slot for page 1 redirects to the canonical page
            let stub_path = blog_root.join("_").join("1").join("index.html");
            page::write_output(config, index, &stub_path, &redirect_stub(config, &blog_root)).await?;
        } else {
            let output = blog_root
                .join("_")
                .join(current_page.to_string())
                .join("index.html");
            page::write_output(config, index, &output, &html).await?;
        }

        debug!(
            "wrote blog index page {current_page}/{max_pages} for {}",
            config.display_path(index)
        );
    }

    Ok(root_output)
}

/// Collect every sibling post of a blog index, sorted by date descending.
///
/// A candidate without a date fails the whole index render. Debug posts
/// are skipped unless debug pages are enabled for this build.
async fn find_posts(
    config: &Arc<Config>,
    index: &Path,
) -> Result<Vec<BlogPostInfo>, PipelineError> {
    let search_root = index.parent().map(Path::to_path_buf).unwrap_or_default();

    let mut posts = Vec::new();
    for candidate in discovery::find_markdown(&search_root) {
        if candidate.as_path() == index {
            continue;
        }

        let (body, frontmatter) = front_matter::load_markdown(config, &candidate).map_err(
            |source| PipelineError::PostLoad {
                file: index.to_path_buf(),
                post: candidate.clone(),
                source,
            },
        )?;

        if frontmatter.date.is_none() {
            return Err(PipelineError::MissingPostDate {
                file: index.to_path_buf(),
                post: candidate,
            });
        }
        if frontmatter.is_debug() && !config.debug_pages {
            debug!("skipping debug blog post {}", config.display_path(&candidate));
            continue;
        }

        let preview = markdown::first_paragraph_text(&markdown::render(&body))
            .unwrap_or_else(|| NO_PARAGRAPHS_PREVIEW.to_string());
        posts.push(BlogPostInfo {
            frontmatter,
            preview,
        });
    }

    posts.sort_by(|a, b| b.frontmatter.date.cmp(&a.frontmatter.date));
    Ok(posts)
}

/// A minimal document redirecting the numbered page-1 slot to the
/// canonical blog index page.
fn redirect_stub(config: &Config, blog_root: &Path) -> String {
    let target = blog_root.strip_prefix(&config.output).unwrap_or(blog_root);
    format!(
        "<html><head><meta http-equiv=\"refresh\" content=\"0; url=/{}\"/></head></html>",
        target.display()
    )
}
