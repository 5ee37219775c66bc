mod blog;
pub mod discovery;
mod page;
mod static_files;

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::future::join_all;
use log::{error, info};

use crate::config::Config;
use crate::errors::PipelineError;
use crate::template::TemplateRenderer;

/// Outcome of one full pipeline run.
#[derive(Debug, Default)]
pub struct BuildReport {
    /// Pages rendered successfully.
    pub pages: usize,
    /// Static files copied successfully.
    pub static_files: usize,
    /// Pages skipped (debug pages outside debug builds).
    pub skipped: usize,
    /// Per-file failures. These never cancel sibling tasks.
    pub failures: Vec<PipelineError>,
    pub duration: Duration,
}

/// Run the full build pipeline.
///
/// Clears and recreates the output root (every build is from scratch),
/// then fans every discovered Markdown and static file out to its own
/// concurrent task. All tasks run to completion; per-file failures are
/// collected into the report rather than aborting the build. Only a
/// failure to clear the output tree is fatal.
pub async fn run_pipeline(config: &Arc<Config>) -> Result<BuildReport, PipelineError> {
    let start = Instant::now();

    clear_output(config)?;
    let renderer = Arc::new(
        TemplateRenderer::new(&config.templates)
            .map_err(|source| PipelineError::Engine { source })?,
    );

    let mut page_tasks = Vec::new();
    for path in discovery::find_markdown(&config.pages) {
        let config = Arc::clone(config);
        let renderer = Arc::clone(&renderer);
        page_tasks.push(tokio::spawn(async move {
            page::render_page(&config, &renderer, &path).await
        }));
    }

    let mut static_tasks = Vec::new();
    for path in discovery::find_static(&config.static_dir) {
        let config = Arc::clone(config);
        static_tasks.push(tokio::spawn(async move {
            static_files::copy_static(&config, &path).await
        }));
    }

    let mut report = BuildReport::default();

    for result in join_all(page_tasks).await {
        match result {
            Ok(Ok(Some(_))) => report.pages += 1,
            Ok(Ok(None)) => report.skipped += 1,
            Ok(Err(failure)) => report.failures.push(failure),
            Err(join_error) => error!("render task panicked: {join_error}"),
        }
    }
    for result in join_all(static_tasks).await {
        match result {
            Ok(Ok(_)) => report.static_files += 1,
            Ok(Err(failure)) => report.failures.push(failure),
            Err(join_error) => error!("copy task panicked: {join_error}"),
        }
    }

    report.duration = start.elapsed();
    for failure in &report.failures {
        error!("{failure}");
    }
    info!(
        "site built in {:.2?}: {} pages, {} static files, {} skipped, {} failed",
        report.duration,
        report.pages,
        report.static_files,
        report.skipped,
        report.failures.len()
    );

    Ok(report)
}

/// Delete and recreate the output root. Failure here is fatal to the
/// whole build; nothing can proceed without a clean target.
fn clear_output(config: &Config) -> Result<(), PipelineError> {
    if config.output.exists() {
        std::fs::remove_dir_all(&config.output).map_err(|source| PipelineError::Clear {
            path: config.output.clone(),
            source,
        })?;
    }
    std::fs::create_dir_all(&config.output).map_err(|source| PipelineError::Clear {
        path: config.output.clone(),
        source,
    })
}
