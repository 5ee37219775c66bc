use comrak::Options;
use once_cell::sync::Lazy;
use regex::Regex;

static FIRST_PARAGRAPH: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<p[^>]*>(.*?)</p>").unwrap());
static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").unwrap());

/// Comrak options for the fixed extension set every page is rendered with.
fn render_options<'a>() -> Options<'a> {
    let mut options = Options::default();

    options.extension.table = true;
    options.extension.strikethrough = true;
    options.extension.tasklist = true;
    options.extension.autolink = true;

    // Render options
    options.render.hardbreaks = true;
    options.render.unsafe_ = true; // Allow raw HTML in source pages

    options
}

/// Render Markdown content to HTML.
pub fn render(content: &str) -> String {
    if content.trim().is_empty() {
        return String::new();
    }
    comrak::markdown_to_html(content, &render_options())
}

/// Extract the plain text of the first `<p>` element of rendered HTML,
/// used for blog post previews. Returns `None` when there is no paragraph.
pub fn first_paragraph_text(html: &str) -> Option<String> {
    let captured = FIRST_PARAGRAPH.captures(html)?;
    let inner = TAG.replace_all(captured.get(1)?.as_str(), "");
    Some(html_escape::decode_html_entities(inner.as_ref()).trim().to_string())
}
