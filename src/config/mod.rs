//! Configuration module

mod site;

pub use site::HighlightConfig;
pub use site::MarkdownExtension;
pub use site::RendererKind;
pub use site::SiteConfig;
pub use site::ViewCacheConfig;
