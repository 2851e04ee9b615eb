//! markpage: Markdown content served through Tera templates
//!
//! URL paths resolve to Markdown files under the content directory or to
//! templates (with `*` wildcard fallbacks). Markdown is rendered to HTML with
//! front-matter metadata and composed into a template context, optionally
//! cached per slug.

pub mod cache;
pub mod commands;
pub mod config;
pub mod content;
pub mod error;
pub mod helpers;
pub mod locator;
pub mod server;
pub mod templates;
pub mod view;

#[cfg(test)]
pub(crate) mod test_support;

pub use error::{Error, Result};

use std::path::{Path, PathBuf};

/// Name of the configuration file in the base directory
pub const CONFIG_FILE: &str = "_config.yml";

/// A content site rooted at a base directory
#[derive(Debug, Clone)]
pub struct Site {
    /// Site configuration
    pub config: config::SiteConfig,
    /// Base directory
    pub base_dir: PathBuf,
    /// Markdown content directory
    pub content_dir: PathBuf,
    /// JSON/JSON5 data directory
    pub data_dir: PathBuf,
    /// Template directory
    pub templates_dir: PathBuf,
}

impl Site {
    /// Create a site from a directory, reading `_config.yml` when present
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        let config_path = base_dir.join(CONFIG_FILE);

        let config = if config_path.exists() {
            config::SiteConfig::load(&config_path)?
        } else {
            config::SiteConfig::default()
        };

        Ok(Self::with_config(base_dir, config))
    }

    /// Create a site from an explicit configuration
    pub fn with_config<P: AsRef<Path>>(base_dir: P, config: config::SiteConfig) -> Self {
        let base_dir = base_dir.as_ref().to_path_buf();
        let content_dir = base_dir.join(&config.content_dir);
        let data_dir = base_dir.join(&config.data_dir);
        let templates_dir = base_dir.join(&config.templates_dir);

        Self {
            config,
            base_dir,
            content_dir,
            data_dir,
            templates_dir,
        }
    }
}
