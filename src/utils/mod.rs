pub mod git;

use std::path::Path;

use chrono::{DateTime, Utc};

/// The last-modified time of a file, falling back to now when the
/// filesystem cannot provide one.
pub fn modified_at(path: &Path) -> DateTime<Utc> {
    std::fs::metadata(path)
        .and_then(|metadata| metadata.modified())
        .map(DateTime::<Utc>::from)
        .unwrap_or_else(|_| Utc::now())
}
