//! URL path resolution
//!
//! A request path resolves to a markdown file under the content directory or
//! to a template under the templates directory, in this order:
//!
//! 1. `content/<slug>.md`
//! 2. `content/<slug>/index.md`
//! 3. `templates/<slug>.html`, then `templates/<slug>/index.html`
//! 4. wildcard templates, most specific first: for `/a/b/c` that is
//!    `a/b/*.html`, `a/*/*.html`, then `*/*/*.html`

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::helpers::path_segments;
use crate::Site;

/// What a request path resolved to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// A markdown file; `slug` keys the view cache
    Content { slug: String, path: PathBuf },
    /// A template, named relative to the templates directory
    Template { name: String },
}

/// Resolves request paths against a site's directories
pub struct Locator<'a> {
    content_dir: &'a Path,
    templates_dir: &'a Path,
}

impl<'a> Locator<'a> {
    pub fn new(site: &'a Site) -> Self {
        Self {
            content_dir: &site.content_dir,
            templates_dir: &site.templates_dir,
        }
    }

    /// Resolve a URL path
    pub fn resolve(&self, path: &str) -> Result<Resolution> {
        let segments = path_segments(path)?;

        if let Some(resolution) = self.find_content(&segments) {
            tracing::debug!("Resolved {} to content {:?}", path, resolution);
            return Ok(resolution);
        }

        if let Some(name) = self.find_template(&segments) {
            tracing::debug!("Resolved {} to template {}", path, name);
            return Ok(Resolution::Template { name });
        }

        for name in wildcard_candidates(&segments) {
            if self.templates_dir.join(&name).is_file() {
                tracing::debug!("Resolved {} to wildcard template {}", path, name);
                return Ok(Resolution::Template { name });
            }
        }

        Err(Error::NotFound(path.to_string()))
    }

    fn find_content(&self, segments: &[&str]) -> Option<Resolution> {
        if segments.is_empty() {
            let index = self.content_dir.join("index.md");
            return index.is_file().then(|| Resolution::Content {
                slug: "index".to_string(),
                path: index,
            });
        }

        let slug = segments.join("/");
        let base = join_segments(self.content_dir, segments);

        let file = base.with_file_name(format!("{}.md", segments[segments.len() - 1]));
        if file.is_file() {
            return Some(Resolution::Content { slug, path: file });
        }

        let index = base.join("index.md");
        if index.is_file() {
            return Some(Resolution::Content {
                slug: format!("{}/index", slug),
                path: index,
            });
        }

        None
    }

    fn find_template(&self, segments: &[&str]) -> Option<String> {
        let slug = segments.join("/");
        let candidates = if slug.is_empty() {
            vec!["index.html".to_string()]
        } else {
            vec![format!("{}.html", slug), format!("{}/index.html", slug)]
        };

        candidates
            .into_iter()
            .find(|name| self.templates_dir.join(name).is_file())
    }
}

fn join_segments(root: &Path, segments: &[&str]) -> PathBuf {
    segments
        .iter()
        .fold(root.to_path_buf(), |path, segment| path.join(segment))
}

/// Wildcard template names for a path, most specific first
///
/// Each candidate has exactly as many segments as the path, so `*.html` only
/// ever answers single-segment paths.
pub fn wildcard_candidates(segments: &[&str]) -> Vec<String> {
    let n = segments.len();
    (0..n)
        .rev()
        .map(|k| {
            let mut parts: Vec<&str> = segments[..k].to_vec();
            parts.extend(std::iter::repeat("*").take(n - k));
            format!("{}.html", parts.join("/"))
        })
        .collect()
}
