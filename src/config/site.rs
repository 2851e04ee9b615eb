//! Site configuration (_config.yml)

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::error::{Error, Result};

/// Main site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    // Site
    pub title: String,
    pub url: String,

    // Directory
    pub content_dir: String,
    pub data_dir: String,
    pub templates_dir: String,

    // Markdown
    pub markdown_renderer: RendererKind,
    pub markdown_extensions: Vec<MarkdownExtension>,
    #[serde(default)]
    pub highlight: HighlightConfig,

    // Caching
    #[serde(default)]
    pub view_cache: ViewCacheConfig,

    // Data
    pub data_json5: bool,

    /// Reload templates on every request
    pub debug: bool,

    // Store any additional fields
    #[serde(flatten)]
    pub extra: HashMap<String, serde_yaml::Value>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "markpage".to_string(),
            url: "http://localhost".to_string(),

            content_dir: "content".to_string(),
            data_dir: "data".to_string(),
            templates_dir: "templates".to_string(),

            markdown_renderer: RendererKind::default(),
            markdown_extensions: MarkdownExtension::defaults(),
            highlight: HighlightConfig::default(),

            view_cache: ViewCacheConfig::default(),

            data_json5: false,
            debug: false,
            extra: HashMap::new(),
        }
    }
}

impl SiteConfig {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::parse(&content)
    }

    /// Parse configuration from YAML text
    pub fn parse(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: SiteConfig = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        for (name, dir) in [
            ("content_dir", &self.content_dir),
            ("data_dir", &self.data_dir),
            ("templates_dir", &self.templates_dir),
        ] {
            if dir.trim().is_empty() {
                return Err(Error::Config(format!("{} must not be empty", name)));
            }
        }
        if self.view_cache.seconds > ViewCacheConfig::MAX_SECONDS {
            return Err(Error::Config(format!(
                "view_cache.seconds must be at most {}",
                ViewCacheConfig::MAX_SECONDS
            )));
        }
        Ok(())
    }

    /// Whether a markdown extension is enabled
    pub fn has_extension(&self, extension: MarkdownExtension) -> bool {
        self.markdown_extensions.contains(&extension)
    }
}

/// Markdown rendering strategy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RendererKind {
    #[default]
    Pulldown,
    Comrak,
}

/// Optional markdown features
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MarkdownExtension {
    /// Table of contents HTML in the `toc` metadata key
    Toc,
    /// Front-matter block at the top of the file
    Metadata,
    /// Slug ids on headings
    HeaderIds,
    Tables,
    Strikethrough,
    Footnotes,
    TaskLists,
    SmartPunctuation,
    /// Syntax highlighting for fenced code blocks
    Highlight,
}

impl MarkdownExtension {
    /// Extensions enabled when the config does not name any
    pub fn defaults() -> Vec<Self> {
        vec![
            Self::Toc,
            Self::Metadata,
            Self::HeaderIds,
            Self::Tables,
            Self::Strikethrough,
            Self::Footnotes,
            Self::TaskLists,
        ]
    }
}

/// Syntax highlighting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HighlightConfig {
    pub theme: String,
    pub line_number: bool,
}

impl Default for HighlightConfig {
    fn default() -> Self {
        Self {
            theme: "base16-ocean.dark".to_string(),
            line_number: false,
        }
    }
}

/// View cache configuration; zero seconds disables caching
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewCacheConfig {
    pub seconds: u64,
}

impl ViewCacheConfig {
    /// Longest allowed cache lifetime, one year
    pub const MAX_SECONDS: u64 = 365 * 24 * 60 * 60;

    pub fn is_enabled(&self) -> bool {
        self.seconds > 0
    }
}
