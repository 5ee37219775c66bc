use std::sync::Arc;

use anyhow::Result;
use log::error;
use tokio::signal;
use tokio::sync::watch;

use crate::config::Config;
use crate::pipeline;
use crate::server;
use crate::watcher::{self, RebuildCoordinator};

/// Live CLI command handler; build, serve locally, and rebuild on change.
///
/// A failed initial build is logged but does not stop the watcher: the
/// site rebuilds on the next change instead.
pub async fn run(config: &Arc<Config>) -> Result<()> {
    if let Err(failure) = pipeline::run_pipeline(config).await {
        error!("initial build failed: {failure}");
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            let _ = shutdown_tx.send(true);
        }
    });

    // The watcher must stay alive for events to keep flowing
    let (_watcher, events) = watcher::watch_roots(config)?;
    let coordinator = RebuildCoordinator::new(Arc::clone(config), events);

    let (served, ()) = tokio::join!(
        server::serve(Arc::clone(config), shutdown_rx.clone()),
        coordinator.run(shutdown_rx),
    );
    served?;

    Ok(())
}
