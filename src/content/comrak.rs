//! comrak rendering strategy

use comrak::nodes::{AstNode, NodeHtmlBlock, NodeValue};
use comrak::{format_html, parse_document, Anchorizer, Arena, Options};
use std::path::{Path, PathBuf};

use super::highlight::Highlighter;
use super::markdown::{MarkdownRenderer, RenderedBody};
use crate::config::MarkdownExtension;
use crate::error::{Error, Result};
use crate::helpers::Heading;
use crate::Site;

/// Markdown renderer backed by comrak
pub struct ComrakRenderer {
    content_dir: PathBuf,
    extensions: Vec<MarkdownExtension>,
    highlighter: Option<Highlighter>,
}

impl ComrakRenderer {
    pub fn new(site: &Site) -> Self {
        let extensions = site.config.markdown_extensions.clone();
        let highlighter = extensions
            .contains(&MarkdownExtension::Highlight)
            .then(|| Highlighter::new(&site.config.highlight));

        Self {
            content_dir: site.content_dir.clone(),
            extensions,
            highlighter,
        }
    }

    fn options(&self) -> Options<'static> {
        let mut options = Options::default();
        options.extension.table = self.has_extension(MarkdownExtension::Tables);
        options.extension.strikethrough = self.has_extension(MarkdownExtension::Strikethrough);
        options.extension.tasklist = self.has_extension(MarkdownExtension::TaskLists);
        options.extension.footnotes = self.has_extension(MarkdownExtension::Footnotes);
        options.parse.smart = self.has_extension(MarkdownExtension::SmartPunctuation);
        if self.wants_heading_ids() {
            options.extension.header_ids = Some(String::new());
        }
        // raw HTML and highlighted blocks pass through
        options.render.unsafe_ = true;
        options
    }

    fn wants_heading_ids(&self) -> bool {
        self.has_extension(MarkdownExtension::HeaderIds) || self.has_extension(MarkdownExtension::Toc)
    }
}

impl MarkdownRenderer for ComrakRenderer {
    fn name(&self) -> &'static str {
        "comrak"
    }

    fn extensions(&self) -> &[MarkdownExtension] {
        &self.extensions
    }

    fn content_dir(&self) -> &Path {
        &self.content_dir
    }

    fn body_to_html(&self, body: &str) -> Result<RenderedBody> {
        let arena = Arena::new();
        let options = self.options();
        let root = parse_document(&arena, body, &options);

        let headings = if self.wants_heading_ids() {
            collect_headings(root)
        } else {
            Vec::new()
        };

        if let Some(highlighter) = &self.highlighter {
            highlight_code_blocks(root, highlighter);
        }

        let mut output = Vec::new();
        format_html(root, &options, &mut output)?;
        let html = String::from_utf8(output)
            .map_err(|e| Error::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))?;

        Ok(RenderedBody { html, headings })
    }
}

/// Collect headings with the anchors comrak writes for them
///
/// Runs the same anchorizer over the same text as comrak's HTML writer, so
/// every toc link matches the id in the page.
fn collect_headings<'a>(root: &'a AstNode<'a>) -> Vec<Heading> {
    let mut anchorizer = Anchorizer::new();
    let mut headings = Vec::new();

    for node in root.descendants() {
        let level = match node.data.borrow().value {
            NodeValue::Heading(ref heading) => heading.level,
            _ => continue,
        };

        let mut text = String::new();
        push_text(node, &mut text);
        headings.push(Heading {
            level,
            id: anchorizer.anchorize(text.clone()),
            text: text.trim().to_string(),
        });
    }

    headings
}

/// Plain text of a node, with line breaks as spaces
fn push_text<'a>(node: &'a AstNode<'a>, text: &mut String) {
    match node.data.borrow().value {
        NodeValue::Text(ref literal) => text.push_str(literal),
        NodeValue::Code(ref code) => text.push_str(&code.literal),
        NodeValue::Math(ref math) => text.push_str(&math.literal),
        NodeValue::LineBreak | NodeValue::SoftBreak => text.push(' '),
        _ => {
            for child in node.children() {
                push_text(child, text);
            }
        }
    }
}

fn highlight_code_blocks<'a>(root: &'a AstNode<'a>, highlighter: &Highlighter) {
    for node in root.descendants() {
        let mut data = node.data.borrow_mut();
        let highlighted = match &data.value {
            NodeValue::CodeBlock(block) => {
                let lang = block.info.split_whitespace().next();
                Some(highlighter.highlight(&block.literal, lang))
            }
            _ => None,
        };
        if let Some(literal) = highlighted {
            data.value = NodeValue::HtmlBlock(NodeHtmlBlock {
                block_type: 0,
                literal,
            });
        }
    }
}
