use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::StatusCode;
use tokio::sync::{mpsc, Mutex};

use crate::config::Config;
use crate::errors::{SiteError, ValidationError};
use crate::front_matter;
use crate::pipeline::discovery;

static ANCHOR_HREF: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"<a\s[^>]*?href=["']([^"']*)["']"#).unwrap());

/// Site validation logic.
///
/// Runs two independent validation streams concurrently and merges their
/// findings as they are discovered: structural checks over the Markdown
/// sources, and (opt-in) dead-link detection over the rendered output.
pub struct Validator {
    config: Arc<Config>,
    client: reqwest::Client,
    /// HEAD results per literal URL string, for the duration of one run.
    /// The lock is held across the request so concurrent checks of the
    /// same URL collapse into a single round trip.
    link_cache: Mutex<HashMap<String, Option<StatusCode>>>,
}

enum LinkKind {
    External,
    Internal,
    Mailto,
    Skipped,
}

impl Validator {
    pub fn new(config: Arc<Config>) -> Result<Self, SiteError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .map_err(|source| SiteError::HttpClient { source })?;

        Ok(Self {
            config,
            client,
            link_cache: Mutex::new(HashMap::new()),
        })
    }

    /// Start every configured validation stream. The returned channel
    /// yields findings as they are discovered and closes once all streams
    /// are exhausted.
    ///
    /// Checking dead links against a site that has never been built is a
    /// precondition violation, not a finding, and fails eagerly.
    pub fn validate(self: &Arc<Self>) -> Result<mpsc::Receiver<ValidationError>, SiteError> {
        if self.config.dead_links && !self.config.output.is_dir() {
            return Err(SiteError::SiteNotBuilt);
        }

        let (tx, rx) = mpsc::channel(256);

        let validator = Arc::clone(self);
        let markdown_tx = tx.clone();
        tokio::spawn(async move { validator.validate_markdown(markdown_tx).await });

        if self.config.dead_links {
            let validator = Arc::clone(self);
            tokio::spawn(async move { validator.validate_dead_links(tx).await });
        }

        Ok(rx)
    }

    /// Re-load every source page and report structural problems: pages
    /// that fail to load at all, empty pages, and front matter findings.
    async fn validate_markdown(&self, tx: mpsc::Sender<ValidationError>) {
        for page in discovery::find_markdown(&self.config.pages) {
            let (body, frontmatter) = match front_matter::load_markdown(&self.config, &page) {
                Ok(loaded) => loaded,
                Err(failure) => {
                    let finding = ValidationError::new(&page, format!("frontmatter: {failure}"));
                    if tx.send(finding).await.is_err() {
                        return;
                    }
                    continue;
                }
            };

            if body.trim().is_empty() && frontmatter.validation_enabled("content") {
                let finding = ValidationError::new(&page, "content: page is empty");
                if tx.send(finding).await.is_err() {
                    return;
                }
            }
            for problem in frontmatter.validate_frontmatter() {
                let finding = ValidationError::new(&page, format!("frontmatter: {problem}"));
                if tx.send(finding).await.is_err() {
                    return;
                }
            }
        }
    }

    /// Crawl every generated HTML file concurrently, checking each anchor.
    async fn validate_dead_links(self: Arc<Self>, tx: mpsc::Sender<ValidationError>) {
        let html_files: Vec<PathBuf> = discovery::find_static(&self.config.output)
            .filter(|path| path.extension().map_or(false, |ext| ext == "html"))
            .collect();

        for path in html_files {
            let validator = Arc::clone(&self);
            let tx = tx.clone();
            tokio::spawn(async move { validator.check_file_links(&path, tx).await });
        }
    }

    async fn check_file_links(&self, path: &Path, tx: mpsc::Sender<ValidationError>) {
        let content = match tokio::fs::read_to_string(path).await {
            Ok(content) => content,
            Err(failure) => {
                debug!("skipping unreadable output file {}: {failure}", path.display());
                return;
            }
        };

        for capture in ANCHOR_HREF.captures_iter(&content) {
            let Some(href) = capture.get(1) else { continue };
            let link = href.as_str();

            // No link, or a link that is explicitly allowed: skip it
            if link.is_empty() || self.config.is_link_allowed(link) {
                continue;
            }

            let offset = capture.get(0).map_or(href.start(), |tag| tag.start());
            let (line, column) = position_of(&content, offset);

            let finding = match classify(link) {
                LinkKind::External => self.check_web_link(path, link, line, column).await,
                LinkKind::Internal => self.check_site_link(path, link, line, column),
                LinkKind::Mailto => check_mailto(path, link, line, column),
                LinkKind::Skipped => None,
            };
            if let Some(finding) = finding {
                if tx.send(finding).await.is_err() {
                    return;
                }
            }
        }
    }

    /// Validate a link to an external site with an HTTP HEAD request,
    /// consulting the shared response cache first.
    async fn check_web_link(
        &self,
        file: &Path,
        link: &str,
        line: usize,
        column: usize,
    ) -> Option<ValidationError> {
        let status = {
            let mut cache = self.link_cache.lock().await;
            match cache.get(link) {
                Some(status) => *status,
                None => {
                    let status = match self.client.head(link).send().await {
                        Ok(response) => Some(response.status()),
                        Err(failure) => {
                            debug!("HEAD {link} failed: {failure}");
                            None
                        }
                    };
                    cache.insert(link.to_string(), status);
                    status
                }
            }
        };

        match status {
            Some(status) if status.is_success() => None,
            Some(status) => Some(
                ValidationError::new(file, format!("dead link: {link}: HTTP {}", status.as_u16()))
                    .at(line, column),
            ),
            None => Some(
                ValidationError::new(file, format!("dead link: {link}: no response"))
                    .at(line, column),
            ),
        }
    }

    /// Validate a link to another page on this site by resolving it
    /// against the output tree with the same pretty-URL convention pages
    /// are written with.
    fn check_site_link(
        &self,
        file: &Path,
        link: &str,
        line: usize,
        column: usize,
    ) -> Option<ValidationError> {
        let bare = link.split(['#', '?']).next().unwrap_or(link);
        if bare.is_empty() {
            return None;
        }

        let trimmed = bare.trim_start_matches('/').trim_end_matches('/');
        let mut target = trimmed.to_string();
        let last_segment = trimmed.rsplit('/').next().unwrap_or(trimmed);
        if !last_segment.contains('.') {
            if target.is_empty() {
                target.push_str("index.html");
            } else {
                target.push_str("/index.html");
            }
        }

        let resolved = if bare.starts_with('.') {
            file.parent().unwrap_or_else(|| Path::new("")).join(&target)
        } else {
            self.config.output.join(&target)
        };

        if resolved.is_file() {
            return None;
        }
        Some(
            ValidationError::new(
                file,
                format!("dead link: {link}: expected to find {}", resolved.display()),
            )
            .at(line, column),
        )
    }
}

fn classify(link: &str) -> LinkKind {
    if link.starts_with('#') {
        return LinkKind::Skipped;
    }
    match reqwest::Url::parse(link) {
        Ok(url) if url.host_str().is_some() => LinkKind::External,
        Ok(url) if url.scheme() == "mailto" => LinkKind::Mailto,
        // tel:, javascript:, data: and other scheme-only links
        Ok(_) => LinkKind::Skipped,
        Err(_) => LinkKind::Internal,
    }
}

/// A `mailto:` link is checked only for exactly one `@` in its address.
fn check_mailto(file: &Path, link: &str, line: usize, column: usize) -> Option<ValidationError> {
    let address = link.strip_prefix("mailto:").unwrap_or(link);
    if address.split('@').count() == 2 {
        return None;
    }
    Some(ValidationError::new(file, format!("invalid email: {link}")).at(line, column))
}

/// 1-based line and column of a byte offset in `content`.
fn position_of(content: &str, offset: usize) -> (usize, usize) {
    let before = &content[..offset];
    let line = before.matches('\n').count() + 1;
    let column = offset - before.rfind('\n').map_or(0, |newline| newline + 1) + 1;
    (line, column)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support;
    use std::fs;
    use std::sync::atomic::{AtomicUsize, Ordering};

    async fn collect(validator: &Arc<Validator>) -> Vec<ValidationError> {
        let mut rx = validator.validate().unwrap();
        let mut findings = Vec::new();
        while let Some(finding) = rx.recv().await {
            findings.push(finding);
        }
        findings
    }

    fn validator_with(config: Config) -> Arc<Validator> {
        Arc::new(Validator::new(Arc::new(config)).unwrap())
    }

    /// Minimal HTTP responder that answers every request with 200 and
    /// counts how many requests it served.
    async fn spawn_head_counter() -> (String, Arc<AtomicUsize>) {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = format!("http://{}", listener.local_addr().unwrap());
        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);

        tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else {
                    break;
                };
                let counter = Arc::clone(&counter);
                tokio::spawn(async move {
                    let mut buffer = [0u8; 1024];
                    if matches!(socket.read(&mut buffer).await, Ok(n) if n > 0) {
                        counter.fetch_add(1, Ordering::SeqCst);
                        let _ = socket
                            .write_all(
                                b"HTTP/1.1 200 OK\r\ncontent-length: 0\r\nconnection: close\r\n\r\n",
                            )
                            .await;
                    }
                });
            }
        });

        (address, count)
    }

    #[tokio::test]
    async fn markdown_validation_reports_structural_problems() {
        let tmp = tempfile::tempdir().unwrap();
        let config = test_support::config_at(tmp.path());
        fs::write(
            config.pages.join("incomplete.md"),
            "---\ntitle: Here\n---\nBody text.",
        )
        .unwrap();
        fs::write(config.pages.join("empty.md"), "---\ntitle: T\nsubtitle: S\ndescription: D\n---\n").unwrap();

        let findings = collect(&validator_with((*config).clone())).await;
        let messages: Vec<&str> = findings.iter().map(|f| f.message.as_str()).collect();

        assert!(messages.contains(&"frontmatter: no subtitle set"));
        assert!(messages.contains(&"frontmatter: no description set"));
        assert!(messages.contains(&"content: page is empty"));
        assert!(!messages.contains(&"frontmatter: no title set"));
    }

    #[tokio::test]
    async fn unparseable_pages_are_findings_not_crashes() {
        let tmp = tempfile::tempdir().unwrap();
        let config = test_support::config_at(tmp.path());
        fs::write(config.pages.join("broken.md"), "---\nbogus_key: 1\n---\nBody.").unwrap();

        let findings = collect(&validator_with((*config).clone())).await;

        assert_eq!(findings.len(), 1);
        assert!(findings[0].message.starts_with("frontmatter:"));
    }

    #[tokio::test]
    async fn dead_link_validation_requires_a_built_site() {
        let tmp = tempfile::tempdir().unwrap();
        let config = test_support::config_at(tmp.path());
        fs::remove_dir_all(&config.output).unwrap();

        let mut config = (*config).clone();
        config.dead_links = true;

        let validator = validator_with(config);
        assert!(matches!(validator.validate(), Err(SiteError::SiteNotBuilt)));
    }

    #[tokio::test]
    async fn internal_links_resolve_with_the_pretty_url_convention() {
        let tmp = tempfile::tempdir().unwrap();
        let mut config = (*test_support::config_at(tmp.path())).clone();
        config.dead_links = true;

        fs::create_dir_all(config.output.join("about")).unwrap();
        fs::write(config.output.join("about").join("index.html"), "ok").unwrap();
        fs::write(config.output.join("style.css"), "").unwrap();
        fs::write(
            config.output.join("index.html"),
            "<a href=\"/about/\">a</a>\n<a href=\"/style.css\">c</a>\n<a href=\"/missing/\">m</a>\n<a href=\"/missing/\">again</a>",
        )
        .unwrap();

        let findings = collect(&validator_with(config)).await;

        // The dead link is reported once per occurrence, the live ones never
        assert_eq!(findings.len(), 2);
        for finding in &findings {
            assert!(finding.message.starts_with("dead link: /missing/"));
            assert!(finding.line.is_some());
        }
        let lines: Vec<usize> = findings.iter().filter_map(|f| f.line).collect();
        assert!(lines.contains(&3) && lines.contains(&4));
    }

    #[tokio::test]
    async fn mailto_addresses_need_exactly_one_at_sign() {
        let tmp = tempfile::tempdir().unwrap();
        let mut config = (*test_support::config_at(tmp.path())).clone();
        config.dead_links = true;

        fs::write(
            config.output.join("index.html"),
            "<a href=\"mailto:a@example.com\">ok</a><a href=\"mailto:nope\">bad</a><a href=\"mailto:a@b@c\">worse</a>",
        )
        .unwrap();

        let findings = collect(&validator_with(config)).await;

        assert_eq!(findings.len(), 2);
        assert!(findings.iter().all(|f| f.message.starts_with("invalid email:")));
    }

    #[tokio::test]
    async fn allowed_links_are_never_reported() {
        let tmp = tempfile::tempdir().unwrap();
        let mut config = (*test_support::config_at(tmp.path())).clone();
        config.dead_links = true;
        config.allowed_links = vec![Regex::new("^https://skip\\.example/").unwrap()];

        fs::write(
            config.output.join("index.html"),
            "<a href=\"https://skip.example/broken\">x</a>",
        )
        .unwrap();

        let findings = collect(&validator_with(config)).await;
        assert!(findings.is_empty());
    }

    #[tokio::test]
    async fn fragment_and_scheme_only_links_are_skipped() {
        let tmp = tempfile::tempdir().unwrap();
        let mut config = (*test_support::config_at(tmp.path())).clone();
        config.dead_links = true;

        fs::write(
            config.output.join("index.html"),
            "<a href=\"#section\">s</a><a href=\"tel:+1234\">t</a><a href=\"javascript:void(0)\">j</a>",
        )
        .unwrap();

        let findings = collect(&validator_with(config)).await;
        assert!(findings.is_empty());
    }

    #[tokio::test]
    async fn repeated_external_links_cost_one_request() {
        let tmp = tempfile::tempdir().unwrap();
        let mut config = (*test_support::config_at(tmp.path())).clone();
        config.dead_links = true;

        let (address, requests) = spawn_head_counter().await;
        fs::write(
            config.output.join("index.html"),
            format!("<a href=\"{address}/page\">one</a><a href=\"{address}/page\">two</a>"),
        )
        .unwrap();

        let findings = collect(&validator_with(config)).await;

        assert!(findings.is_empty());
        assert_eq!(requests.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unreachable_external_links_are_dead() {
        let tmp = tempfile::tempdir().unwrap();
        let mut config = (*test_support::config_at(tmp.path())).clone();
        config.dead_links = true;

        // A port nothing listens on
        fs::write(
            config.output.join("index.html"),
            "<a href=\"http://127.0.0.1:1/\">gone</a>",
        )
        .unwrap();

        let findings = collect(&validator_with(config)).await;

        assert_eq!(findings.len(), 1);
        assert!(findings[0].message.ends_with("no response"));
    }

    #[test]
    fn positions_are_one_based() {
        let content = "line one\n<a href=\"x\">";
        assert_eq!(position_of(content, 0), (1, 1));
        assert_eq!(position_of(content, 9), (2, 1));
    }
}
