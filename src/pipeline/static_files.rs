use std::path::{Path, PathBuf};

use log::debug;

use crate::config::Config;
use crate::errors::PipelineError;

/// Copy a static asset into the mirrored relative location under the
/// output root, creating parent directories as needed.
pub async fn copy_static(config: &Config, path: &Path) -> Result<PathBuf, PipelineError> {
    let relative = path
        .strip_prefix(&config.static_dir)
        .map_err(|_| PipelineError::OutsideStaticRoot {
            file: path.to_path_buf(),
        })?;
    let output = config.output.join(relative);

    let copy = async {
        if let Some(parent) = output.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::copy(path, &output).await.map(|_| ())
    };
    copy.await.map_err(|source| PipelineError::Copy {
        file: path.to_path_buf(),
        output: output.clone(),
        source,
    })?;

    debug!(
        "copied {} to {}",
        config.display_path(path),
        config.display_path(&output)
    );
    Ok(output)
}
