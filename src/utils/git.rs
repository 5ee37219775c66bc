use std::fs;
use std::path::Path;

use log::debug;

/// Resolve the current git commit id for a file by walking up to the
/// nearest `.git` directory and following `HEAD`. Returns `None` when the
/// file is not inside a repository.
pub fn current_ref(path: &Path) -> Option<String> {
    let git_dir = path.ancestors().find_map(|dir| {
        let candidate = dir.join(".git");
        candidate.is_dir().then_some(candidate)
    })?;

    let head = fs::read_to_string(git_dir.join("HEAD")).ok()?;
    let head = head.trim();

    // A detached HEAD holds the commit id directly
    let Some(reference) = head.strip_prefix("ref: ") else {
        return Some(head.to_string());
    };

    if let Ok(commit) = fs::read_to_string(git_dir.join(reference)) {
        return Some(commit.trim().to_string());
    }

    debug!(
        "no loose ref at {}, trying packed-refs",
        git_dir.join(reference).display()
    );
    let packed = fs::read_to_string(git_dir.join("packed-refs")).ok()?;
    for line in packed.lines() {
        if line.starts_with('#') {
            continue;
        }
        if let Some((commit, name)) = line.split_once(' ') {
            if name == reference {
                return Some(commit.to_string());
            }
        }
    }

    None
}
