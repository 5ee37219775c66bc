use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use liquid::model::Value;
use liquid::Object;

use crate::front_matter::{OpenGraphFrontmatter, PageFrontmatter};

/// Template context for rendering `default` type pages. Templates see it
/// rooted under the `context` variable.
pub struct TemplateContext {
    /// Pre-rendered page content as HTML.
    pub content: String,
    /// Page front matter.
    pub frontmatter: PageFrontmatter,
    /// The date and time the page is being rendered at.
    pub rendered_at: DateTime<Utc>,
    /// The date and time the page source was last modified.
    pub modified_at: DateTime<Utc>,
    /// The git commit id for the source tree, when it is in a repository.
    pub git_ref: Option<String>,
}

/// One blog post entry on a blog index page.
pub struct BlogPostInfo {
    pub frontmatter: PageFrontmatter,
    pub preview: String,
}

/// Template context for one page of a `blog_index` render.
pub struct BlogIndexContext<'a> {
    pub base: &'a TemplateContext,
    pub posts: &'a [BlogPostInfo],
    pub current_page: usize,
    pub max_pages: usize,
}

/// Render named templates from a templates directory in a persistent
/// liquid environment.
pub struct TemplateRenderer {
    templates: PathBuf,
    parser: liquid::Parser,
}

impl TemplateRenderer {
    pub fn new(templates: &Path) -> Result<Self, liquid::Error> {
        let parser = liquid::ParserBuilder::with_stdlib().build()?;
        Ok(Self {
            templates: templates.to_path_buf(),
            parser,
        })
    }

    /// Render the first of `names` that exists as a template file, with
    /// the provided globals. The rendered HTML is tidied before returning.
    pub fn render(&self, names: &[String], globals: &Object) -> Result<String, liquid::Error> {
        for name in names {
            let path = self.templates.join(name);
            if path.is_file() {
                let template = self.parser.parse_file(&path)?;
                return Ok(tidy_html(&template.render(globals)?));
            }
        }
        Err(liquid::Error::with_msg(format!(
            "no template found, tried: {}",
            names.join(", ")
        )))
    }
}

/// Globals for a `default` page render.
pub fn page_globals(context: &TemplateContext) -> Object {
    let mut root = Object::new();
    root.insert("context".into(), Value::Object(context_object(context)));
    root
}

/// Globals for one page of a `blog_index` render.
pub fn blog_globals(context: &BlogIndexContext<'_>) -> Object {
    let mut object = context_object(context.base);

    let posts = context
        .posts
        .iter()
        .map(|post| {
            let mut entry = Object::new();
            entry.insert(
                "frontmatter".into(),
                Value::Object(frontmatter_object(&post.frontmatter)),
            );
            entry.insert("preview".into(), Value::scalar(post.preview.clone()));
            Value::Object(entry)
        })
        .collect();

    object.insert("posts".into(), Value::Array(posts));
    object.insert("current_page".into(), Value::scalar(context.current_page as i64));
    object.insert("max_pages".into(), Value::scalar(context.max_pages as i64));

    let mut root = Object::new();
    root.insert("context".into(), Value::Object(object));
    root
}

fn context_object(context: &TemplateContext) -> Object {
    let mut object = Object::new();
    object.insert("content".into(), Value::scalar(context.content.clone()));
    object.insert(
        "frontmatter".into(),
        Value::Object(frontmatter_object(&context.frontmatter)),
    );
    object.insert(
        "rendered_at".into(),
        Value::scalar(context.rendered_at.to_rfc3339()),
    );
    object.insert(
        "modified_at".into(),
        Value::scalar(context.modified_at.to_rfc3339()),
    );
    if let Some(git_ref) = &context.git_ref {
        object.insert("git_ref".into(), Value::scalar(git_ref.clone()));
    }
    object
}

/// Front matter properties as template values, with unset values omitted.
fn frontmatter_object(frontmatter: &PageFrontmatter) -> Object {
    let mut object = Object::new();

    if let Some(title) = &frontmatter.title {
        object.insert("title".into(), Value::scalar(title.clone()));
    }
    if let Some(subtitle) = &frontmatter.subtitle {
        object.insert("subtitle".into(), Value::scalar(subtitle.clone()));
    }
    if let Some(description) = &frontmatter.description {
        object.insert("description".into(), Value::scalar(description.clone()));
    }
    object.insert(
        "tags".into(),
        Value::Array(
            frontmatter
                .tags
                .iter()
                .map(|tag| Value::scalar(tag.clone()))
                .collect(),
        ),
    );
    if let Some(date) = frontmatter.date {
        object.insert("date".into(), Value::scalar(date.to_string()));
    }
    object.insert("type".into(), Value::scalar(frontmatter.page_type.as_str()));
    if let Ok(url) = frontmatter.page_url() {
        object.insert("url".into(), Value::scalar(url));
    }
    if let Some(og) = &frontmatter.og {
        object.insert("og".into(), Value::Object(open_graph_object(og)));
    }
    if let Some(meta) = &frontmatter.meta {
        object.insert(
            "meta".into(),
            yaml_to_liquid(serde_yaml::Value::Mapping(meta.clone())),
        );
    }

    object
}

fn open_graph_object(og: &OpenGraphFrontmatter) -> Object {
    let mut object = Object::new();
    if let Some(title) = &og.title {
        object.insert("title".into(), Value::scalar(title.clone()));
    }
    if let Some(image) = &og.image {
        object.insert("image".into(), Value::scalar(image.clone()));
    }
    if let Some(description) = &og.description {
        object.insert("description".into(), Value::scalar(description.clone()));
    }
    if let Some(url) = &og.url {
        object.insert("url".into(), Value::scalar(url.clone()));
    }
    object.insert("type".into(), Value::scalar(og.og_type.clone()));
    if let Some(locale) = &og.locale {
        object.insert("locale".into(), Value::scalar(locale.clone()));
    }
    if let Some(site_name) = &og.site_name {
        object.insert("site_name".into(), Value::scalar(site_name.clone()));
    }
    object
}

/// Convert a YAML value to a liquid value, for the opaque `meta` bag.
fn yaml_to_liquid(yaml: serde_yaml::Value) -> Value {
    match yaml {
        serde_yaml::Value::Null => Value::Nil,
        serde_yaml::Value::Bool(value) => Value::scalar(value),
        serde_yaml::Value::Number(number) => {
            if let Some(int) = number.as_i64() {
                Value::scalar(int)
            } else if let Some(float) = number.as_f64() {
                Value::scalar(float)
            } else {
                Value::scalar(number.to_string())
            }
        }
        serde_yaml::Value::String(value) => Value::scalar(value),
        serde_yaml::Value::Sequence(items) => {
            Value::Array(items.into_iter().map(yaml_to_liquid).collect())
        }
        serde_yaml::Value::Mapping(mapping) => {
            let mut object = Object::new();
            for (key, value) in mapping {
                if let serde_yaml::Value::String(key) = key {
                    object.insert(key.into(), yaml_to_liquid(value));
                }
            }
            Value::Object(object)
        }
        serde_yaml::Value::Tagged(tagged) => yaml_to_liquid(tagged.value),
    }
}

/// Simple transformations to make output content tidier: trailing
/// whitespace is stripped and whitespace-only lines are removed.
pub fn tidy_html(content: &str) -> String {
    content
        .lines()
        .map(str::trim_end)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::front_matter::load_markdown;
    use crate::test_support;
    use std::fs;

    #[test]
    fn tidy_html_removes_blank_lines_and_trailing_whitespace() {
        let input = "<h1>Hi</h1>   \n\n\n<p>Text</p>\n   \n<p>More</p>  ";
        assert_eq!(tidy_html(input), "<h1>Hi</h1>\n<p>Text</p>\n<p>More</p>");
    }

    #[test]
    fn renders_the_first_existing_template() {
        let tmp = tempfile::tempdir().unwrap();
        let config = test_support::config_at(tmp.path());
        fs::write(config.templates.join("default.html"), "default: {{ context.content }}").unwrap();
        fs::write(config.templates.join("special.html"), "special: {{ context.content }}").unwrap();

        let page = config.pages.join("index.md");
        fs::write(&page, "body").unwrap();
        let (_, frontmatter) = load_markdown(&config, &page).unwrap();

        let context = TemplateContext {
            content: "<p>x</p>".to_string(),
            frontmatter,
            rendered_at: Utc::now(),
            modified_at: Utc::now(),
            git_ref: None,
        };
        let renderer = TemplateRenderer::new(&config.templates).unwrap();

        let names = vec!["missing.html".to_string(), "special.html".to_string()];
        let html = renderer.render(&names, &page_globals(&context)).unwrap();
        assert_eq!(html, "special: <p>x</p>");
    }

    #[test]
    fn rendering_fails_when_no_template_exists() {
        let tmp = tempfile::tempdir().unwrap();
        let config = test_support::config_at(tmp.path());
        let renderer = TemplateRenderer::new(&config.templates).unwrap();

        let result = renderer.render(&["nope.html".to_string()], &Object::new());
        assert!(result.is_err());
    }

    #[test]
    fn frontmatter_values_are_visible_to_templates() {
        let tmp = tempfile::tempdir().unwrap();
        let config = test_support::config_at(tmp.path());
        fs::write(
            config.templates.join("default.html"),
            "{{ context.frontmatter.title }} [{{ context.frontmatter.meta.banner }}] {{ context.frontmatter.og.url }}",
        )
        .unwrap();

        let page = config.pages.join("about.md");
        fs::write(&page, "---\ntitle: About\nmeta:\n  banner: wide\n---\nBody.").unwrap();
        let (body, frontmatter) = load_markdown(&config, &page).unwrap();

        let context = TemplateContext {
            content: crate::markdown::render(&body),
            frontmatter,
            rendered_at: Utc::now(),
            modified_at: Utc::now(),
            git_ref: None,
        };
        let renderer = TemplateRenderer::new(&config.templates).unwrap();

        let html = renderer
            .render(&["default.html".to_string()], &page_globals(&context))
            .unwrap();
        assert_eq!(html, "About [wide] https://localhost/about/");
    }

    #[test]
    fn yaml_meta_converts_recursively() {
        let yaml: serde_yaml::Value =
            serde_yaml::from_str("items: [1, two]\nnested:\n  flag: true").unwrap();

        let Value::Object(object) = yaml_to_liquid(yaml) else {
            panic!("expected an object");
        };
        let Some(Value::Array(items)) = object.get("items") else {
            panic!("expected an array");
        };
        assert_eq!(items.len(), 2);
        assert!(matches!(object.get("nested"), Some(Value::Object(_))));
    }
}
