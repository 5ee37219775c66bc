use std::path::{Path, PathBuf};

use walkdir::WalkDir;

/// Lazily yield every Markdown file under `root`.
///
/// Paths come back in filesystem walk order; callers must not depend on
/// any particular ordering. Each call performs a fresh walk.
pub fn find_markdown(root: &Path) -> impl Iterator<Item = PathBuf> {
    find_files(root).filter(|path| {
        path.file_name()
            .map_or(false, |name| name.to_string_lossy().ends_with(".md"))
    })
}

/// Lazily yield every file under `root`, regardless of extension.
pub fn find_static(root: &Path) -> impl Iterator<Item = PathBuf> {
    find_files(root)
}

fn find_files(root: &Path) -> impl Iterator<Item = PathBuf> {
    WalkDir::new(root)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
}
