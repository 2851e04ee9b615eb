//! Tera templates for pages and markdown bodies
//!
//! Templates are every `*.html` file under the site's templates directory,
//! named by their path relative to it. A built-in `content.html` renders a
//! page's `content` when front-matter names no template; a site can override
//! it.

mod functions;

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tera::{Context, Tera};
use walkdir::WalkDir;

use crate::content::{ContextMap, MarkdownRenderer};
use crate::error::Result;
use crate::helpers::{parent, unescape_template_tags};
use crate::Site;

/// Template used for content without a `template` front-matter key
pub const CONTENT_TEMPLATE: &str = "content.html";

const BUILTIN_CONTENT: &str = "{{ content }}\n";

/// Template renderer for one site
#[derive(Clone)]
pub struct TemplateRenderer {
    shared: Arc<Shared>,
}

/// State every render pass starts from
pub(crate) struct Shared {
    pub(crate) tera: Tera,
    pub(crate) site: Arc<Site>,
    pub(crate) renderer: Arc<dyn MarkdownRenderer>,
}

impl TemplateRenderer {
    /// Load the built-in templates, then every template in the site
    pub fn load(site: Arc<Site>, renderer: Arc<dyn MarkdownRenderer>) -> Result<Self> {
        let mut tera = Tera::default();

        // Output is HTML built from trusted content files
        tera.autoescape_on(vec![]);

        let mut templates = vec![(CONTENT_TEMPLATE.to_string(), BUILTIN_CONTENT.to_string())];
        templates.extend(site_templates(&site.templates_dir)?);
        tracing::debug!("Loaded {} templates", templates.len());
        tera.add_raw_templates(templates)?;

        tera.register_filter("parent", parent_filter);

        Ok(Self {
            shared: Arc::new(Shared {
                tera,
                site,
                renderer,
            }),
        })
    }

    /// Whether a template with this name is loaded
    pub fn has_template(&self, name: &str) -> bool {
        self.shared.tera.get_template_names().any(|n| n == name)
    }

    /// Render a named template
    pub fn render(&self, name: &str, context: &ContextMap) -> Result<String> {
        let tera = functions::render_pass(&self.shared, context, Some(name), 0);
        let context = Context::from_serialize(context)?;
        Ok(tera.render(name, &context)?)
    }

    /// Render template source, such as a markdown body, against a context
    ///
    /// Escaped characters inside template tags are restored first.
    pub fn render_str(&self, source: &str, context: &ContextMap) -> Result<String> {
        let mut tera = functions::render_pass(&self.shared, context, None, 0);
        let context = Context::from_serialize(context)?;
        Ok(tera.render_str(&unescape_template_tags(source), &context)?)
    }
}

/// `*.html` files below `dir`, named by relative path
fn site_templates(dir: &Path) -> Result<Vec<(String, String)>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut templates = Vec::new();
    for entry in WalkDir::new(dir)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if !path.is_file() || path.extension().map_or(true, |ext| ext != "html") {
            continue;
        }
        let Some(name) = template_name(dir, path) else {
            continue;
        };
        templates.push((name, fs::read_to_string(path)?));
    }

    Ok(templates)
}

fn template_name(dir: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(dir).ok()?;
    let parts: Vec<&str> = relative
        .components()
        .map(|c| c.as_os_str().to_str())
        .collect::<Option<_>>()?;
    Some(parts.join("/"))
}

/// Tera filter: the directory above a path
///
/// Accepts a path string or an object with a `path` key, such as `request`.
fn parent_filter(
    value: &tera::Value,
    _args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    let path = match value {
        tera::Value::String(s) => s.as_str(),
        tera::Value::Object(map) => map
            .get("path")
            .and_then(tera::Value::as_str)
            .ok_or_else(|| tera::Error::msg("parent filter requires an object with a `path`"))?,
        _ => return Err(tera::Error::msg("parent filter requires a path")),
    };

    parent(path)
        .map(tera::Value::String)
        .map_err(|e| tera::Error::msg(e.to_string()))
}
