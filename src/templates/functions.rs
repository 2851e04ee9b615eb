//! Template helpers that need the render context
//!
//! Tera functions and filters only see their arguments, so each render pass
//! registers fresh instances holding the pass's context: `include_md`,
//! `directory_contents` and the `to_html` filter.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tera::{Context, Function, Tera, Value};

use super::Shared;
use crate::content::{ContentLoader, ContextMap, Metadata};
use crate::helpers::unescape_template_tags;

/// Markdown included from markdown stops nesting here
const MAX_DEPTH: usize = 8;

/// A copy of the loaded templates with the context-bound helpers registered
pub(crate) fn render_pass(
    shared: &Arc<Shared>,
    context: &ContextMap,
    origin: Option<&str>,
    depth: usize,
) -> Tera {
    let mut tera = shared.tera.clone();

    tera.register_function(
        "include_md",
        IncludeMarkdown {
            shared: Arc::clone(shared),
            context: context.clone(),
            origin_dir: origin.map(origin_dir).unwrap_or_default(),
            depth,
            resolved: Mutex::new(HashMap::new()),
        },
    );
    tera.register_function(
        "directory_contents",
        DirectoryContents {
            shared: Arc::clone(shared),
            request_path: request_path(context),
        },
    );
    tera.register_filter(
        "to_html",
        ToHtml {
            shared: Arc::clone(shared),
            request: context.get("request").cloned(),
            depth,
        },
    );

    tera
}

fn request_path(context: &ContextMap) -> String {
    context
        .get("request")
        .and_then(|request| request.get("path"))
        .and_then(Value::as_str)
        .unwrap_or("/")
        .to_string()
}

/// Directory part of a template name: `docs/page.html` -> `docs`
fn origin_dir(name: &str) -> String {
    name.rsplit_once('/')
        .map(|(dir, _)| dir.to_string())
        .unwrap_or_default()
}

/// Resolve `.` and `..` in a template-relative path
///
/// `None` when the path climbs above the templates directory.
fn normalize(path: &str) -> Option<String> {
    let mut parts = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                parts.pop()?;
            }
            segment => parts.push(segment),
        }
    }
    Some(parts.join("/"))
}

/// Render markdown HTML as a template against `context` one level deeper
fn render_markdown_html(
    shared: &Arc<Shared>,
    html: &str,
    context: &ContextMap,
    origin: Option<&str>,
    depth: usize,
) -> tera::Result<String> {
    if depth >= MAX_DEPTH {
        return Err(tera::Error::msg("markdown includes nested too deeply"));
    }
    let mut tera = render_pass(shared, context, origin, depth + 1);
    tera.render_str(&unescape_template_tags(html), &Context::from_serialize(context)?)
}

/// `include_md(path="...")`: render a markdown file from the templates
/// directory with the surrounding context
struct IncludeMarkdown {
    shared: Arc<Shared>,
    context: ContextMap,
    origin_dir: String,
    depth: usize,
    resolved: Mutex<HashMap<String, (PathBuf, String, Metadata)>>,
}

impl IncludeMarkdown {
    /// Template-relative name, with `./` and `../` relative to the page
    /// template's directory
    fn template_name(&self, path: &str) -> tera::Result<String> {
        let joined = if path.starts_with("./") || path.starts_with("../") {
            format!("{}/{}", self.origin_dir, path)
        } else {
            path.to_string()
        };

        normalize(&joined)
            .filter(|name| !name.is_empty())
            .ok_or_else(|| tera::Error::msg(format!("include_md: invalid path {:?}", path)))
    }

    fn find(&self, name: &str) -> tera::Result<PathBuf> {
        let templates_dir = &self.shared.site.templates_dir;
        [name.to_string(), format!("{}.md", name)]
            .into_iter()
            .map(|candidate| templates_dir.join(candidate))
            .find(|candidate| candidate.is_file())
            .ok_or_else(|| tera::Error::msg(format!("include_md: template not found: {}", name)))
    }

    fn load(&self, path: &str) -> tera::Result<(PathBuf, String, Metadata)> {
        let name = self.template_name(path)?;

        if let Ok(resolved) = self.resolved.lock() {
            if let Some(hit) = resolved.get(&name) {
                return Ok(hit.clone());
            }
        }

        let file = self.find(&name)?;
        let (html, metadata) = self
            .shared
            .renderer
            .render_path(&file)
            .map_err(|e| tera::Error::msg(format!("include_md: {}", e)))?;

        let loaded = (file, html, metadata);
        if let Ok(mut resolved) = self.resolved.lock() {
            resolved.insert(name, loaded.clone());
        }
        Ok(loaded)
    }
}

impl Function for IncludeMarkdown {
    fn call(&self, args: &HashMap<String, Value>) -> tera::Result<Value> {
        let path = match args.get("path") {
            Some(value) => tera::try_get_value!("include_md", "path", String, value),
            None => return Err(tera::Error::msg("include_md requires a `path` argument")),
        };

        let (file, html, metadata) = self.load(&path)?;
        tracing::debug!("Including {:?}", file);

        // markdown metadata wins over the surrounding context
        let mut context = metadata.into_context();
        for (key, value) in &self.context {
            if !context.contains_key(key) {
                context.insert(key.clone(), value.clone());
            }
        }

        let origin = file
            .strip_prefix(&self.shared.site.templates_dir)
            .ok()
            .and_then(|relative| relative.to_str())
            .map(|relative| relative.replace('\\', "/"));
        let rendered =
            render_markdown_html(&self.shared, &html, &context, origin.as_deref(), self.depth)?;
        Ok(Value::String(rendered))
    }

    fn is_safe(&self) -> bool {
        true
    }
}

/// `directory_contents(directory=..., exclude=...)`: metadata for the
/// markdown files in a content directory, defaulting to the request path
struct DirectoryContents {
    shared: Arc<Shared>,
    request_path: String,
}

impl Function for DirectoryContents {
    fn call(&self, args: &HashMap<String, Value>) -> tera::Result<Value> {
        let directory = match args.get("directory") {
            Some(value) => tera::try_get_value!("directory_contents", "directory", String, value),
            None => self.request_path.clone(),
        };
        let exclude = match args.get("exclude") {
            Some(value) => Some(tera::try_get_value!(
                "directory_contents",
                "exclude",
                String,
                value
            )),
            None => None,
        };

        let loader = ContentLoader::new(&self.shared.site, self.shared.renderer.as_ref());
        let contents = loader
            .directory_contents(&directory, exclude.as_deref())
            .map_err(|e| tera::Error::msg(format!("directory_contents: {}", e)))?;

        Ok(Value::Array(contents.into_iter().map(Value::Object).collect()))
    }
}

/// `{{ text | to_html }}`: markdown to HTML, rendered against its own
/// metadata and the current request
struct ToHtml {
    shared: Arc<Shared>,
    request: Option<Value>,
    depth: usize,
}

impl tera::Filter for ToHtml {
    fn filter(&self, value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
        let text = tera::try_get_value!("to_html", "value", String, value);

        let (html, metadata) = self
            .shared
            .renderer
            .render_text(&text)
            .map_err(|e| tera::Error::msg(format!("to_html: {}", e)))?;

        let mut context = metadata.into_context();
        if let Some(request) = &self.request {
            context.insert("request".to_string(), request.clone());
        }

        let rendered = render_markdown_html(&self.shared, &html, &context, None, self.depth)?;
        Ok(Value::String(rendered))
    }

    fn is_safe(&self) -> bool {
        true
    }
}
