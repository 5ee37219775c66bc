use std::sync::Arc;

use anyhow::Result;

use crate::config::Config;
use crate::pipeline;

/// Build CLI command handler; build the site once and exit.
pub async fn run(config: &Arc<Config>) -> Result<()> {
    pipeline::run_pipeline(config).await?;
    Ok(())
}
