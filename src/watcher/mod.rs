use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, error, info};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::{mpsc, watch};

use crate::config::Config;
use crate::errors::PipelineError;
use crate::pipeline::{self, BuildReport};

/// How long the event channel must stay quiet before a burst of
/// filesystem events is considered settled.
const DEBOUNCE_WINDOW: Duration = Duration::from_millis(100);

/// Start watching the pages, templates, and static roots for changes.
///
/// Create, modify, and remove events are forwarded into the returned
/// channel. The returned watcher must be kept alive for events to keep
/// flowing.
pub fn watch_roots(config: &Config) -> notify::Result<(RecommendedWatcher, mpsc::Receiver<()>)> {
    let (tx, rx) = mpsc::channel(64);

    let mut watcher = notify::recommended_watcher(move |result: notify::Result<Event>| {
        match result {
            Ok(event) => match event.kind {
                EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_) => {
                    // A full channel already guarantees a rebuild is due
                    let _ = tx.try_send(());
                }
                _ => {}
            },
            Err(e) => error!("watch error: {e}"),
        }
    })?;

    for root in [&config.pages, &config.templates, &config.static_dir] {
        watcher.watch(root, RecursiveMode::Recursive)?;
        info!("watching {} for changes", config.display_path(root));
    }

    Ok((watcher, rx))
}

/// Serializes pipeline reruns under a stream of filesystem events.
///
/// Bursts of events arriving within the debounce window coalesce into a
/// single rebuild, and at most one rebuild is ever in flight: events that
/// arrive mid-build buffer in the channel and trigger one follow-up run.
/// Rebuild failures are logged; the watch loop survives them and keeps
/// serving the previously built output.
pub struct RebuildCoordinator {
    config: Arc<Config>,
    events: mpsc::Receiver<()>,
    debounce: Duration,
}

impl RebuildCoordinator {
    pub fn new(config: Arc<Config>, events: mpsc::Receiver<()>) -> Self {
        Self {
            config,
            events,
            debounce: DEBOUNCE_WINDOW,
        }
    }

    /// Run until the shutdown signal flips or the event source closes.
    /// An in-flight rebuild is cancelled at its next await point when the
    /// signal arrives.
    pub async fn run(self, shutdown: watch::Receiver<bool>) {
        let config = Arc::clone(&self.config);
        self.run_with(shutdown, move || {
            let config = Arc::clone(&config);
            async move { pipeline::run_pipeline(&config).await }
        })
        .await;
    }

    async fn run_with<F, Fut>(mut self, mut shutdown: watch::Receiver<bool>, mut rebuild: F)
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<BuildReport, PipelineError>>,
    {
        loop {
            tokio::select! {
                _ = shutdown.changed() => break,
                event = self.events.recv() => {
                    if event.is_none() {
                        break;
                    }
                    self.settle().await;

                    info!("change detected, rebuilding site");
                    tokio::select! {
                        _ = shutdown.changed() => {
                            debug!("rebuild cancelled by shutdown");
                            break;
                        }
                        result = rebuild() => {
                            if let Err(failure) = result {
                                error!("rebuild failed: {failure}");
                            }
                        }
                    }
                }
            }
        }
    }

    /// Drain events until the channel stays quiet for one debounce window.
    async fn settle(&mut self) {
        loop {
            match tokio::time::timeout(self.debounce, self.events.recv()).await {
                Ok(Some(())) => continue,
                Ok(None) => break,
                Err(_) => break,
            }
        }
    }
}
