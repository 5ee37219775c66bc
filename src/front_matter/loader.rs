use std::fs;
use std::path::Path;
use std::sync::Arc;

use crate::config::Config;
use crate::errors::ContentError;

use super::types::PageFrontmatter;

/// Read a Markdown source file and split delimiter-bounded YAML front
/// matter from the body text.
///
/// The body is returned unrendered. The front matter is parsed strictly
/// and bound to the site config, with Open Graph defaults backfilled. A
/// file without a front matter block yields an all-defaults front matter.
pub fn load_markdown(
    config: &Arc<Config>,
    path: &Path,
) -> Result<(String, PageFrontmatter), ContentError> {
    let text = fs::read_to_string(path).map_err(|source| ContentError::Read {
        file: path.to_path_buf(),
        source,
    })?;

    let (yaml, body) = split_front_matter(&text).ok_or_else(|| {
        ContentError::UnterminatedFrontMatter {
            file: path.to_path_buf(),
        }
    })?;

    let mut frontmatter = parse_front_matter(path, &yaml)?;
    frontmatter.source_file = path.to_path_buf();
    frontmatter.bind(Arc::clone(config))?;

    Ok((body, frontmatter))
}

/// Split a source file into its YAML front matter and body text.
///
/// A front matter block opens when the file has more than two lines and
/// the first is exactly `---`; the next `---` or `...` line closes it.
/// Returns `None` when a block opens but never closes.
fn split_front_matter(text: &str) -> Option<(String, String)> {
    let lines: Vec<&str> = text.lines().collect();

    if lines.len() > 2 && lines[0] == "---" {
        let close = lines
            .iter()
            .enumerate()
            .skip(1)
            .find(|(_, line)| **line == "---" || **line == "...")
            .map(|(index, _)| index)?;

        let yaml = lines[1..close].join("\n");
        let body = lines[close + 1..].join("\n");
        return Some((yaml, body));
    }

    Some((String::new(), text.to_string()))
}

fn parse_front_matter(path: &Path, yaml: &str) -> Result<PageFrontmatter, ContentError> {
    // An absent or empty block still yields a fully defaulted front matter
    let yaml = if yaml.trim().is_empty() { "{}" } else { yaml };
    serde_yaml::from_str(yaml).map_err(|source| ContentError::Parse {
        file: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::front_matter::PageType;
    use crate::test_support;
    use chrono::NaiveDate;

    fn load(config: &Arc<Config>, name: &str, text: &str) -> Result<(String, PageFrontmatter), ContentError> {
        let path = config.pages.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, text).unwrap();
        load_markdown(config, &path)
    }

    #[test]
    fn splits_front_matter_from_body() {
        let tmp = tempfile::tempdir().unwrap();
        let config = test_support::config_at(tmp.path());

        let (body, fm) = load(
            &config,
            "post.md",
            "---\ntitle: First\ndate: 2024-03-01\ntags: [a, b]\ntype: blog_post\n---\n# Heading\n\nText.",
        )
        .unwrap();

        assert_eq!(body, "# Heading\n\nText.");
        assert_eq!(fm.title.as_deref(), Some("First"));
        assert_eq!(fm.date, NaiveDate::from_ymd_opt(2024, 3, 1));
        assert_eq!(fm.tags, vec!["a", "b"]);
        assert_eq!(fm.page_type, PageType::BlogPost);
        // Open Graph defaults are backfilled at bind time
        assert_eq!(fm.og.as_ref().unwrap().title.as_deref(), Some("First"));
    }

    #[test]
    fn dots_close_a_front_matter_block_too() {
        let tmp = tempfile::tempdir().unwrap();
        let config = test_support::config_at(tmp.path());

        let (body, fm) = load(&config, "a.md", "---\ntitle: Dots\n...\nBody here.").unwrap();

        assert_eq!(fm.title.as_deref(), Some("Dots"));
        assert_eq!(body, "Body here.");
    }

    #[test]
    fn files_without_front_matter_are_all_body() {
        let tmp = tempfile::tempdir().unwrap();
        let config = test_support::config_at(tmp.path());

        let (body, fm) = load(&config, "plain.md", "# Just markdown\n\nNo metadata.").unwrap();

        assert_eq!(body, "# Just markdown\n\nNo metadata.");
        assert!(fm.title.is_none());
        assert_eq!(fm.page_type, PageType::Default);
        assert!(fm.tags.is_empty());
    }

    #[test]
    fn an_empty_block_yields_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let config = test_support::config_at(tmp.path());

        let (body, fm) = load(&config, "empty.md", "---\n---\nBody.").unwrap();

        assert!(fm.title.is_none());
        assert_eq!(body, "Body.");
    }

    #[test]
    fn unknown_fields_are_a_hard_error() {
        let tmp = tempfile::tempdir().unwrap();
        let config = test_support::config_at(tmp.path());

        let result = load(&config, "typo.md", "---\ntitel: Oops\n---\nBody.");

        assert!(matches!(result, Err(ContentError::Parse { .. })));
    }

    #[test]
    fn an_unclosed_block_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let config = test_support::config_at(tmp.path());

        let result = load(&config, "open.md", "---\ntitle: Never closed\nBody text.\n");

        assert!(matches!(
            result,
            Err(ContentError::UnterminatedFrontMatter { .. })
        ));
    }

    #[test]
    fn meta_values_pass_through_opaquely() {
        let tmp = tempfile::tempdir().unwrap();
        let config = test_support::config_at(tmp.path());

        let (_, fm) = load(
            &config,
            "meta.md",
            "---\nmeta:\n  banner: wide\n  order: 3\n---\nBody.",
        )
        .unwrap();

        let meta = fm.meta.unwrap();
        assert_eq!(meta.get("banner").and_then(|v| v.as_str()), Some("wide"));
        assert_eq!(meta.get("order").and_then(|v| v.as_i64()), Some(3));
    }
}
