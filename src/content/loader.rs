//! Content loader - enumerates and renders markdown under the content directory

use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use super::{ContentItem, ContextMap, MarkdownRenderer};
use crate::error::{Error, Result};
use crate::helpers::{is_slug_excluded, path_segments};
use crate::Site;

/// Loads content from the content directory
pub struct ContentLoader<'a> {
    site: &'a Site,
    renderer: &'a dyn MarkdownRenderer,
}

impl<'a> ContentLoader<'a> {
    pub fn new(site: &'a Site, renderer: &'a dyn MarkdownRenderer) -> Self {
        Self { site, renderer }
    }

    /// All markdown files below the content directory, or below one of its
    /// subdirectories, in path order
    pub fn content_paths(&self, directory: Option<&str>) -> Result<Vec<PathBuf>> {
        let dir = self.content_subdir(directory.unwrap_or(""))?;

        let paths = WalkDir::new(&dir)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .map(|entry| entry.into_path())
            .filter(|path| path.is_file() && is_markdown_file(path))
            .collect();

        Ok(paths)
    }

    /// Render every content file
    ///
    /// Files that fail to render are logged and skipped.
    pub fn content_items(&self, skip_drafts: bool) -> Result<Vec<ContentItem>> {
        let mut items = Vec::new();

        for path in self.content_paths(None)? {
            let Some(slug) = self.slug_for(&path) else {
                continue;
            };

            match self.renderer.render_path(&path) {
                Ok((html, metadata)) => {
                    if skip_drafts && metadata.draft {
                        tracing::debug!("Skipping draft {}", slug);
                        continue;
                    }
                    items.push(ContentItem::new(slug, path, html, metadata));
                }
                Err(e) => {
                    tracing::warn!("Failed to render {:?}: {}", path, e);
                }
            }
        }

        Ok(items)
    }

    /// Metadata for the markdown files directly inside `directory`
    ///
    /// `index.md` is skipped, as is any slug named in the comma-separated
    /// `exclude` list. Each mapping carries a `slug` key unless front-matter
    /// already set one.
    pub fn directory_contents(
        &self,
        directory: &str,
        exclude: Option<&str>,
    ) -> Result<Vec<ContextMap>> {
        let directory = directory.trim().trim_matches('/');
        let dir = self.content_subdir(directory)?;

        let mut files: Vec<PathBuf> = fs::read_dir(&dir)?
            .filter_map(|e| e.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file() && is_markdown_file(path))
            .filter(|path| path.file_name().map_or(false, |name| name != "index.md"))
            .collect();
        files.sort();

        let mut contents = Vec::with_capacity(files.len());
        for path in files {
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let slug = if directory.is_empty() {
                stem.to_string()
            } else {
                format!("{}/{}", directory, stem)
            };

            if is_slug_excluded(&slug, exclude) {
                continue;
            }

            let (_, metadata) = self.renderer.render_path(&path)?;
            let mut context = metadata.into_context();
            context
                .entry("slug")
                .or_insert_with(|| serde_json::Value::String(slug));
            contents.push(context);
        }

        Ok(contents)
    }

    /// Slug for a file below the content directory
    pub fn slug_for(&self, path: &Path) -> Option<String> {
        let relative = path.strip_prefix(&self.site.content_dir).ok()?;
        let relative = relative.with_extension("");
        let segments: Vec<&str> = relative
            .components()
            .map(|c| c.as_os_str().to_str())
            .collect::<Option<_>>()?;
        Some(segments.join("/"))
    }

    fn content_subdir(&self, directory: &str) -> Result<PathBuf> {
        let dir = path_segments(directory)?
            .iter()
            .fold(self.site.content_dir.clone(), |path, segment| {
                path.join(segment)
            });

        if !dir.is_dir() {
            return Err(Error::NotFound(format!(
                "Directory does not exist: {}",
                dir.display()
            )));
        }

        Ok(dir)
    }
}

/// Check if a file is a markdown file
fn is_markdown_file(path: &Path) -> bool {
    path.extension().map_or(false, |ext| ext == "md")
}
