//! A rendered content file

use std::path::PathBuf;

use super::Metadata;

/// One markdown file from the content directory
#[derive(Debug, Clone)]
pub struct ContentItem {
    /// Path below the content directory without the `.md` extension
    pub slug: String,
    pub path: PathBuf,
    /// URL the item is served at
    pub relative_url: String,
    pub html: String,
    pub metadata: Metadata,
}

impl ContentItem {
    pub fn new(slug: String, path: PathBuf, html: String, metadata: Metadata) -> Self {
        let relative_url = relative_url(&slug);
        Self {
            slug,
            path,
            relative_url,
            html,
            metadata,
        }
    }

    pub fn is_draft(&self) -> bool {
        self.metadata.draft
    }
}

/// `blog/index` serves at `/blog`, the root index at `/`
pub fn relative_url(slug: &str) -> String {
    let trimmed = if slug == "index" {
        ""
    } else {
        slug.strip_suffix("/index").unwrap_or(slug)
    };
    format!("/{}", trimmed.trim_start_matches('/'))
}
