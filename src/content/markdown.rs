//! Markdown rendering strategies
//!
//! Every strategy shares the same front-matter and metadata pipeline and only
//! differs in how a markdown body becomes HTML.

use pulldown_cmark::{html, CodeBlockKind, CowStr, Event, Options, Parser, Tag, TagEnd};
use std::fs;
use std::path::{Path, PathBuf};

use super::highlight::Highlighter;
use super::{FrontMatter, Metadata};
use crate::config::MarkdownExtension;
use crate::error::{Error, Result};
use crate::helpers::{path_segments, toc_html, Heading, HeadingIds};
use crate::Site;

/// HTML for a markdown body plus the headings found in it
#[derive(Debug, Clone, Default)]
pub struct RenderedBody {
    pub html: String,
    pub headings: Vec<Heading>,
}

/// Converts markdown documents into HTML and metadata
pub trait MarkdownRenderer: Send + Sync {
    /// Strategy name for logging
    fn name(&self) -> &'static str;

    /// Enabled extensions
    fn extensions(&self) -> &[MarkdownExtension];

    /// Root that slugs resolve against
    fn content_dir(&self) -> &Path;

    /// Convert a markdown body (no front-matter) to HTML
    fn body_to_html(&self, body: &str) -> Result<RenderedBody>;

    fn has_extension(&self, extension: MarkdownExtension) -> bool {
        self.extensions().contains(&extension)
    }

    /// Render markdown text, front-matter included
    fn render_text(&self, text: &str) -> Result<(String, Metadata)> {
        let (front_matter, body) = if self.has_extension(MarkdownExtension::Metadata) {
            FrontMatter::parse(text)
        } else {
            (FrontMatter::default(), text)
        };

        let rendered = self.body_to_html(body)?;
        let toc = if self.has_extension(MarkdownExtension::Toc) {
            toc_html(&rendered.headings)
        } else {
            None
        };

        Ok((rendered.html, Metadata::from_front_matter(front_matter, toc)))
    }

    /// Render a markdown file
    fn render_path(&self, path: &Path) -> Result<(String, Metadata)> {
        tracing::debug!("Rendering {:?} with {}", path, self.name());
        let text = fs::read_to_string(path)?;
        self.render_text(&text)
    }

    /// Render the content file for a slug
    fn render_slug(&self, slug: &str) -> Result<(String, Metadata)> {
        let path = content_path_for_slug(self.content_dir(), slug)?;
        self.render_path(&path)
    }
}

/// Find the markdown file for a slug: `<slug>.md`, then `<slug>/index.md`
pub fn content_path_for_slug(content_dir: &Path, slug: &str) -> Result<PathBuf> {
    let segments = path_segments(slug)?;

    let Some((last, parents)) = segments.split_last() else {
        let index = content_dir.join("index.md");
        return if index.is_file() {
            Ok(index)
        } else {
            Err(Error::NotFound(slug.to_string()))
        };
    };

    let dir = parents
        .iter()
        .fold(content_dir.to_path_buf(), |path, segment| path.join(segment));

    let file = dir.join(format!("{}.md", last));
    if file.is_file() {
        return Ok(file);
    }

    let index = dir.join(last).join("index.md");
    if index.is_file() {
        return Ok(index);
    }

    Err(Error::NotFound(slug.to_string()))
}

/// Markdown renderer backed by pulldown-cmark
pub struct PulldownRenderer {
    content_dir: PathBuf,
    extensions: Vec<MarkdownExtension>,
    highlighter: Option<Highlighter>,
}

impl PulldownRenderer {
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

    fn options(&self) -> Options {
        let mut options = Options::empty();
        for extension in &self.extensions {
            options |= match extension {
                MarkdownExtension::Tables => Options::ENABLE_TABLES,
                MarkdownExtension::Strikethrough => Options::ENABLE_STRIKETHROUGH,
                MarkdownExtension::Footnotes => Options::ENABLE_FOOTNOTES,
                MarkdownExtension::TaskLists => Options::ENABLE_TASKLISTS,
                MarkdownExtension::SmartPunctuation => Options::ENABLE_SMART_PUNCTUATION,
                MarkdownExtension::HeaderIds => Options::ENABLE_HEADING_ATTRIBUTES,
                _ => Options::empty(),
            };
        }
        options
    }

    /// The table of contents links to heading ids, so it needs them too
    fn wants_heading_ids(&self) -> bool {
        self.has_extension(MarkdownExtension::HeaderIds) || self.has_extension(MarkdownExtension::Toc)
    }
}

impl MarkdownRenderer for PulldownRenderer {
    fn name(&self) -> &'static str {
        "pulldown-cmark"
    }

    fn extensions(&self) -> &[MarkdownExtension] {
        &self.extensions
    }

    fn content_dir(&self) -> &Path {
        &self.content_dir
    }

    fn body_to_html(&self, body: &str) -> Result<RenderedBody> {
        let mut events: Vec<Event> = Parser::new_ext(body, self.options()).collect();

        let headings = if self.wants_heading_ids() {
            assign_heading_ids(&mut events)
        } else {
            Vec::new()
        };

        if let Some(highlighter) = &self.highlighter {
            events = highlight_code_blocks(events, highlighter);
        }

        let mut html_output = String::new();
        html::push_html(&mut html_output, events.into_iter());

        Ok(RenderedBody {
            html: html_output,
            headings,
        })
    }
}

/// Give every heading an anchor id and collect it for the table of contents
fn assign_heading_ids(events: &mut [Event<'_>]) -> Vec<Heading> {
    let mut ids = HeadingIds::new();
    let mut headings = Vec::new();

    for i in 0..events.len() {
        let level = match &events[i] {
            Event::Start(Tag::Heading { level, .. }) => *level as u8,
            _ => continue,
        };
        let text = heading_text(&events[i + 1..]);

        if let Event::Start(Tag::Heading { id, .. }) = &mut events[i] {
            // explicit `{#id}` attributes win over the slug
            let anchor = match id.take() {
                Some(explicit) => ids.claim(explicit.to_string()),
                None => ids.unique(&text),
            };
            *id = Some(CowStr::from(anchor.clone()));
            headings.push(Heading {
                level,
                id: anchor,
                text,
            });
        }
    }

    headings
}

fn heading_text(events: &[Event<'_>]) -> String {
    let mut text = String::new();
    for event in events {
        match event {
            Event::End(TagEnd::Heading(_)) => break,
            Event::Text(t) | Event::Code(t) => text.push_str(t),
            _ => {}
        }
    }
    text.trim().to_string()
}

/// Replace code blocks with highlighted HTML
fn highlight_code_blocks<'a>(events: Vec<Event<'a>>, highlighter: &Highlighter) -> Vec<Event<'a>> {
    let mut output = Vec::with_capacity(events.len());
    let mut code_block: Option<(Option<String>, String)> = None;

    for event in events {
        match event {
            Event::Start(Tag::CodeBlock(kind)) => {
                let lang = match kind {
                    CodeBlockKind::Fenced(lang) => lang
                        .split_whitespace()
                        .next()
                        .map(|lang| lang.to_string()),
                    CodeBlockKind::Indented => None,
                };
                code_block = Some((lang, String::new()));
            }
            Event::End(TagEnd::CodeBlock) => {
                if let Some((lang, code)) = code_block.take() {
                    let highlighted = highlighter.highlight(&code, lang.as_deref());
                    output.push(Event::Html(CowStr::from(highlighted)));
                }
            }
            Event::Text(text) if code_block.is_some() => {
                if let Some((_, code)) = code_block.as_mut() {
                    code.push_str(&text);
                }
            }
            other => output.push(other),
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::SiteFixture;
    use serde_json::json;

    fn renderer(fixture: &SiteFixture) -> PulldownRenderer {
        PulldownRenderer::new(&fixture.site())
    }

    #[test]
    fn test_render_basic_markdown() {
        let fixture = SiteFixture::new();
        let (html, _) = renderer(&fixture)
            .render_text("# Hello World\n\nThis is a test.")
            .unwrap();
        assert!(html.contains(r#"<h1 id="hello-world">Hello World</h1>"#));
        assert!(html.contains("<p>This is a test.</p>"));
    }

    #[test]
    fn test_render_slug_with_frontmatter() {
        let fixture = SiteFixture::new();
        fixture.write(
            "content/test-1.md",
            "---\ntemplate: test-template.html\n---\n\ntest data\n",
        );

        let (html, metadata) = renderer(&fixture).render_slug("test-1").unwrap();
        assert_eq!(html, "<p>test data</p>\n");
        assert_eq!(metadata.template(), Some("test-template.html"));
        assert!(metadata.toc.is_none());
        assert!(!metadata.draft);
    }

    #[test]
    fn test_render_slug_directory_index() {
        let fixture = SiteFixture::new();
        fixture.write("content/dir/index.md", "# dir");

        let (html, _) = renderer(&fixture).render_slug("dir").unwrap();
        assert!(html.contains(r#"<h1 id="dir">dir</h1>"#));
    }

    #[test]
    fn test_render_missing_slug() {
        let fixture = SiteFixture::new();
        let err = renderer(&fixture).render_slug("missing").unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_toc() {
        let fixture = SiteFixture::new();
        fixture.write("content/test-1.md", "\n# title\n\n## test data\n");

        let (html, metadata) = renderer(&fixture).render_slug("test-1").unwrap();
        assert_eq!(
            html,
            "<h1 id=\"title\">title</h1>\n<h2 id=\"test-data\">test data</h2>\n"
        );

        let expected_toc = r##"<ul>
  <li><a href="#title">title</a>
  <ul>
    <li><a href="#test-data">test data</a></li>
  </ul></li>
</ul>
"##;
        assert_eq!(metadata.toc.as_deref(), Some(expected_toc));
    }

    #[test]
    fn test_toc_disabled_by_extension_list() {
        let fixture = SiteFixture::new();
        fixture.write(
            "content/test-1.md",
            "---\ntemplate: test-template.html\n---\n\n# title\n",
        );
        let site = fixture.site_with(|config| {
            config.markdown_extensions = vec![MarkdownExtension::Metadata];
        });

        let (html, metadata) = PulldownRenderer::new(&site).render_slug("test-1").unwrap();
        assert_eq!(html, "<h1>title</h1>\n");
        assert_eq!(metadata.template(), Some("test-template.html"));

        let context = metadata.into_context();
        assert_eq!(context.get("toc"), Some(&serde_json::Value::Null));
    }

    #[test]
    fn test_metadata_extension_disabled_keeps_frontmatter_as_body() {
        let fixture = SiteFixture::new();
        let site = fixture.site_with(|config| {
            config.markdown_extensions = vec![MarkdownExtension::Toc];
        });

        let (html, metadata) = PulldownRenderer::new(&site)
            .render_text("---\ntemplate: x.html\n---\nbody\n")
            .unwrap();
        assert!(metadata.template().is_none());
        assert!(html.contains("template: x.html"));
    }

    #[test]
    fn test_draft_values() {
        let fixture = SiteFixture::new();
        let cases = [
            ("true", true),
            ("false", false),
            ("1", false),
            ("blob", false),
            ("\"1\"", true),
            ("\"true\"", true),
        ];

        for (value, expected) in cases {
            fixture.write(
                "content/draft.md",
                &format!("---\ntemplate: test-template.html\ndraft: {}\n---\n", value),
            );
            let (_, metadata) = renderer(&fixture).render_slug("draft").unwrap();
            assert_eq!(metadata.draft, expected, "draft: {}", value);
        }
    }

    #[test]
    fn test_publish_date_in_metadata() {
        let fixture = SiteFixture::new();
        fixture.write(
            "content/test-1.md",
            "---\ntemplate: test-template.html\npublish_date: 2022-02-26 10:26:02\n---\n",
        );

        let (_, metadata) = renderer(&fixture).render_slug("test-1").unwrap();
        let context = metadata.into_context();
        assert_eq!(context["publish_date"], json!("2022-02-26T10:26:02"));
    }

    #[test]
    fn test_duplicate_and_explicit_heading_ids() {
        let fixture = SiteFixture::new();
        let (html, metadata) = renderer(&fixture)
            .render_text("## Notes\n\n## Notes\n\n## Custom {#picked}\n")
            .unwrap();
        assert!(html.contains(r#"<h2 id="notes">Notes</h2>"#));
        assert!(html.contains(r#"<h2 id="notes-1">Notes</h2>"#));
        assert!(html.contains(r#"<h2 id="picked">Custom</h2>"#));
        assert!(metadata.toc.unwrap().contains("href=\"#notes-1\""));
    }

    #[test]
    fn test_heading_colliding_with_suffixed_id() {
        let fixture = SiteFixture::new();
        let (html, metadata) = renderer(&fixture)
            .render_text("## Notes\n\n## Notes\n\n## Notes 1\n")
            .unwrap();
        assert!(html.contains(r#"<h2 id="notes-1">Notes</h2>"#));
        assert!(html.contains(r#"<h2 id="notes-1-1">Notes 1</h2>"#));

        let toc = metadata.toc.unwrap();
        assert!(toc.contains(r##"<a href="#notes-1">Notes</a>"##));
        assert!(toc.contains(r##"<a href="#notes-1-1">Notes 1</a>"##));
    }

    #[test]
    fn test_tables_extension() {
        let fixture = SiteFixture::new();
        let (html, _) = renderer(&fixture)
            .render_text("| a | b |\n|---|---|\n| 1 | 2 |\n")
            .unwrap();
        assert!(html.contains("<table>"));
    }

    #[test]
    fn test_plain_code_block() {
        let fixture = SiteFixture::new();
        let (html, _) = renderer(&fixture)
            .render_text("```rust\nfn main() {}\n```")
            .unwrap();
        assert!(html.contains(r#"<pre><code class="language-rust">fn main() {}"#));
    }

    #[test]
    fn test_highlighted_code_block() {
        let fixture = SiteFixture::new();
        let site = fixture.site_with(|config| {
            config.markdown_extensions.push(MarkdownExtension::Highlight);
        });
        let (html, _) = PulldownRenderer::new(&site)
            .render_text("```rust\nfn main() {}\n```")
            .unwrap();
        assert!(!html.contains("language-rust"));
        assert!(html.contains("<pre style="));
    }

    #[test]
    fn test_template_tags_survive_rendering() {
        let fixture = SiteFixture::new();
        let (html, _) = renderer(&fixture)
            .render_text("test data {{ data.test }}")
            .unwrap();
        assert_eq!(html, "<p>test data {{ data.test }}</p>\n");
    }
}
