use std::path::Path;
use std::sync::Arc;

use crate::config::Config;

/// Build a config rooted at a temporary directory, creating the standard
/// source and output roots underneath it.
pub fn config_at(root: &Path) -> Arc<Config> {
    let templates = root.join("templates");
    let pages = root.join("pages");
    let static_dir = root.join("static");
    let output = root.join("output");
    for dir in [&templates, &pages, &static_dir, &output] {
        std::fs::create_dir_all(dir).unwrap();
    }

    Arc::new(Config {
        base: root.to_path_buf(),
        templates,
        pages,
        static_dir,
        output,
        default_template: "default.html".to_string(),
        blog_posts_per_page: 5,
        host: "localhost".to_string(),
        port: 8000,
        live: false,
        debug_pages: false,
        dead_links: false,
        allowed_links: Vec::new(),
        locale: None,
        site_name: None,
    })
}
