mod loader;
mod types;

pub use loader::load_markdown;
pub use types::{OpenGraphFrontmatter, PageFrontmatter, PageType};
