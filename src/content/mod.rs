//! Content module - markdown rendering, metadata and content enumeration

mod comrak;
mod data;
mod frontmatter;
mod highlight;
mod item;
pub mod loader;
mod markdown;
mod metadata;

use std::sync::Arc;

pub use self::comrak::ComrakRenderer;
pub use data::load_data;
pub use frontmatter::FrontMatter;
pub use highlight::Highlighter;
pub use item::ContentItem;
pub use loader::ContentLoader;
pub use markdown::{content_path_for_slug, MarkdownRenderer, PulldownRenderer, RenderedBody};
pub use metadata::{coerce_draft, ContextMap, Metadata};

use crate::config::RendererKind;
use crate::Site;

/// Build the markdown renderer the site is configured for
pub fn renderer_for(site: &Site) -> Arc<dyn MarkdownRenderer> {
    tracing::debug!("Using {:?} markdown renderer", site.config.markdown_renderer);
    match site.config.markdown_renderer {
        RendererKind::Pulldown => Arc::new(PulldownRenderer::new(site)),
        RendererKind::Comrak => Arc::new(ComrakRenderer::new(site)),
    }
}
