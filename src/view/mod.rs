//! Content view: request path in, rendered page out

use serde_json::{json, Value};
use std::sync::Arc;
use std::time::SystemTime;

use crate::cache::ViewCache;
use crate::content::{load_data, renderer_for, ContextMap, MarkdownRenderer};
use crate::error::Result;
use crate::locator::{Locator, Resolution};
use crate::templates::{TemplateRenderer, CONTENT_TEMPLATE};
use crate::Site;

/// Template rendered for unresolvable paths when the site provides one
pub const NOT_FOUND_TEMPLATE: &str = "404.html";

/// A rendered page
#[derive(Debug, Clone)]
pub struct PageResponse {
    pub body: String,
    /// Set when the page came through the view cache
    pub cache: Option<CacheHeaders>,
}

/// Values for the `Cache-Control` and `Expires` headers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheHeaders {
    pub max_age: u64,
    pub expires: SystemTime,
}

impl CacheHeaders {
    pub fn cache_control(&self) -> String {
        format!("max-age={}", self.max_age)
    }

    pub fn expires(&self) -> String {
        httpdate::fmt_http_date(self.expires)
    }
}

/// Resolves request paths and renders them
pub struct ContentView {
    site: Arc<Site>,
    renderer: Arc<dyn MarkdownRenderer>,
    templates: TemplateRenderer,
    cache: ViewCache,
}

impl ContentView {
    /// Build a view with the configured renderer and cache
    pub fn new(site: Site) -> Result<Self> {
        let renderer = renderer_for(&site);
        let cache = ViewCache::from_config(&site.config.view_cache);
        Self::with_parts(site, renderer, cache)
    }

    pub fn with_parts(
        site: Site,
        renderer: Arc<dyn MarkdownRenderer>,
        cache: ViewCache,
    ) -> Result<Self> {
        let site = Arc::new(site);
        let templates = TemplateRenderer::load(Arc::clone(&site), Arc::clone(&renderer))?;
        Ok(Self {
            site,
            renderer,
            templates,
            cache,
        })
    }

    pub fn site(&self) -> &Site {
        &self.site
    }

    /// Render the page for a request path
    pub fn respond(&self, path: &str) -> Result<PageResponse> {
        let templates = self.templates()?;

        match Locator::new(&self.site).resolve(path)? {
            Resolution::Template { name } => {
                let context = self.standard_context(path)?;
                let body = templates.render(&name, &context)?;
                Ok(PageResponse { body, cache: None })
            }
            Resolution::Content { slug, .. } => {
                let entry = match self.cache.get_if_enabled(&slug) {
                    Some(entry) => entry,
                    None => {
                        let (template, context) = self.render_content(&templates, &slug, path)?;
                        self.cache
                            .set_if_enabled(&slug, self.cache.entry(template, context))
                    }
                };

                let body = templates.render(&entry.template, &entry.context)?;
                let cache = self.cache.is_enabled().then(|| CacheHeaders {
                    max_age: self.cache.ttl().as_secs(),
                    expires: entry.expires_at,
                });
                Ok(PageResponse { body, cache })
            }
        }
    }

    /// Template name and full context for a content slug
    ///
    /// The context holds the front-matter and derived metadata, `template`,
    /// `request`, `data`, `site`, and `content`: the markdown HTML rendered
    /// as a template against everything else.
    pub fn render_markdown(&self, slug: &str, request_path: &str) -> Result<(String, ContextMap)> {
        let templates = self.templates()?;
        self.render_content(&templates, slug, request_path)
    }

    /// The site's `404.html` rendered for `path`, if it has one
    pub fn render_not_found(&self, path: &str) -> Result<Option<String>> {
        let templates = self.templates()?;
        if !templates.has_template(NOT_FOUND_TEMPLATE) {
            return Ok(None);
        }
        let context = self.standard_context(path)?;
        Ok(Some(templates.render(NOT_FOUND_TEMPLATE, &context)?))
    }

    fn render_content(
        &self,
        templates: &TemplateRenderer,
        slug: &str,
        request_path: &str,
    ) -> Result<(String, ContextMap)> {
        let (html, metadata) = self.renderer.render_slug(slug)?;
        let template = metadata.template().unwrap_or(CONTENT_TEMPLATE).to_string();

        let mut context = metadata.into_context();
        context.extend(self.standard_context(request_path)?);
        context.insert("template".to_string(), Value::String(template.clone()));

        let content = templates.render_str(&html, &context)?;
        context.insert("content".to_string(), Value::String(content));

        Ok((template, context))
    }

    /// `request`, `data` and `site`, available to every page
    fn standard_context(&self, request_path: &str) -> Result<ContextMap> {
        let config = &self.site.config;
        let mut context = ContextMap::new();
        context.insert("request".to_string(), json!({ "path": request_path }));
        context.insert("data".to_string(), load_data(&self.site)?);
        context.insert(
            "site".to_string(),
            json!({
                "title": config.title,
                "url": config.url,
                "extra": serde_json::to_value(&config.extra)?,
            }),
        );
        Ok(context)
    }

    /// Templates are reloaded on each request in debug mode
    fn templates(&self) -> Result<TemplateRenderer> {
        if self.site.config.debug {
            return TemplateRenderer::load(Arc::clone(&self.site), Arc::clone(&self.renderer));
        }
        Ok(self.templates.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheBackend, CacheEntry, MemoryCache};
    use crate::config::{MarkdownExtension, RendererKind};
    use crate::content::{PulldownRenderer, RenderedBody};
    use crate::test_support::SiteFixture;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts markdown conversions
    struct CountingRenderer {
        inner: PulldownRenderer,
        calls: Arc<AtomicUsize>,
    }

    impl MarkdownRenderer for CountingRenderer {
        fn name(&self) -> &'static str {
            "counting"
        }

        fn extensions(&self) -> &[MarkdownExtension] {
            self.inner.extensions()
        }

        fn content_dir(&self) -> &Path {
            self.inner.content_dir()
        }

        fn body_to_html(&self, body: &str) -> Result<RenderedBody> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.body_to_html(body)
        }
    }

    /// Counts cache reads and writes
    #[derive(Default)]
    struct CountingBackend {
        inner: MemoryCache,
        gets: AtomicUsize,
        sets: AtomicUsize,
    }

    impl CacheBackend for CountingBackend {
        fn get(&self, key: &str) -> Option<CacheEntry> {
            self.gets.fetch_add(1, Ordering::SeqCst);
            self.inner.get(key)
        }

        fn set(&self, key: &str, entry: CacheEntry) {
            self.sets.fetch_add(1, Ordering::SeqCst);
            self.inner.set(key, entry);
        }
    }

    fn view(fixture: &SiteFixture) -> ContentView {
        ContentView::new(fixture.site()).unwrap()
    }

    fn body(fixture: &SiteFixture, path: &str) -> String {
        view(fixture).respond(path).unwrap().body
    }

    #[test]
    fn test_empty_site_is_not_found() {
        let fixture = SiteFixture::new();
        assert!(view(&fixture).respond("/").unwrap_err().is_not_found());
    }

    #[test]
    fn test_parent_traversal_is_not_found() {
        let fixture = SiteFixture::new();
        fixture.write("content/index.md", "# index");
        assert!(view(&fixture).respond("/../").unwrap_err().is_not_found());
    }

    #[test]
    fn test_index_with_and_without_slash() {
        let fixture = SiteFixture::new();
        fixture.write("content/index.md", "# index");

        assert!(body(&fixture, "/").contains(r#"<h1 id="index">index</h1>"#));
        assert!(body(&fixture, "").contains(r#"<h1 id="index">index</h1>"#));
    }

    #[test]
    fn test_directory_index_with_and_without_slash() {
        let fixture = SiteFixture::new();
        fixture.write("content/dir/index.md", "# dir");

        assert!(body(&fixture, "/dir/").contains(r#"<h1 id="dir">dir</h1>"#));
        assert!(body(&fixture, "/dir").contains(r#"<h1 id="dir">dir</h1>"#));
    }

    #[test]
    fn test_url_slug() {
        let fixture = SiteFixture::new();
        fixture.write("content/test-this.md", "# test this");

        let response = view(&fixture).respond("/test-this").unwrap();
        assert_eq!(response.body, "<h1 id=\"test-this\">test this</h1>\n\n");
        assert!(response.cache.is_none());
    }

    #[test]
    fn test_url_slug_with_json_data() {
        let fixture = SiteFixture::new();
        fixture.write("content/test-this-data.md", "test data {{ data.test }}");
        fixture.write("data/test.json", "1");

        assert!(body(&fixture, "/test-this-data").contains("<p>test data 1</p>\n"));
    }

    #[test]
    fn test_url_slug_with_json5_data() {
        let fixture = SiteFixture::new();
        fixture.write("content/test-this-data.md", "test data {{ data.test }}");
        fixture.write("data/test.json5", "1");

        assert!(body(&fixture, "/test-this-data").contains("<p>test data 1</p>\n"));
    }

    #[test]
    fn test_front_matter_template() {
        let fixture = SiteFixture::new();
        fixture.write(
            "content/page.md",
            "---\ntemplate: custom.html\ntitle: Page\n---\nbody\n",
        );
        fixture.write(
            "templates/custom.html",
            "<div>{{ title }}|{{ template }}|{{ request.path }}|{{ content }}</div>",
        );

        assert_eq!(
            body(&fixture, "/page"),
            "<div>Page|custom.html|/page|<p>body</p>\n</div>"
        );
    }

    #[test]
    fn test_render_markdown_context() {
        let fixture = SiteFixture::new();
        fixture.write("content/page.md", "---\ntitle: Page\n---\n# Head\n");

        let (template, context) = view(&fixture).render_markdown("page", "/page").unwrap();
        assert_eq!(template, CONTENT_TEMPLATE);
        for key in ["title", "toc", "draft", "now", "template", "request", "data", "site", "content"] {
            assert!(context.contains_key(key), "missing {}", key);
        }
        assert_eq!(context["content"], json!("<h1 id=\"head\">Head</h1>\n"));
    }

    #[test]
    fn test_site_values_in_context() {
        let fixture = SiteFixture::new();
        fixture.write("content/page.md", "{{ site.title }} {{ site.extra.owner }}");
        let site = fixture.site_with(|config| {
            config.title = "Docs".to_string();
            config
                .extra
                .insert("owner".to_string(), serde_yaml::Value::from("me"));
        });

        let page = ContentView::new(site).unwrap().respond("/page").unwrap();
        assert!(page.body.contains("<p>Docs me</p>"));
    }

    #[test]
    fn test_cache_headers_are_stable() {
        let fixture = SiteFixture::new();
        fixture.write("content/test-this-cache.md", "test cache");
        let site = fixture.site_with(|config| config.view_cache.seconds = 15);
        let view = ContentView::new(site).unwrap();

        let first = view.respond("/test-this-cache").unwrap();
        let headers = first.cache.unwrap();
        assert_eq!(headers.cache_control(), "max-age=15");
        assert!(headers.expires().ends_with("GMT"));

        let second = view.respond("/test-this-cache").unwrap();
        assert_eq!(second.cache.unwrap().expires(), headers.expires());
        assert_eq!(second.body, first.body);
    }

    #[test]
    fn test_huge_cache_lifetime_still_has_headers() {
        let fixture = SiteFixture::new();
        fixture.write("content/page.md", "page");
        let site = fixture.site_with(|config| config.view_cache.seconds = 1_000_000_000_000);

        let page = ContentView::new(site).unwrap().respond("/page").unwrap();
        let headers = page.cache.unwrap();
        assert_eq!(headers.cache_control(), "max-age=31536000");
        assert!(headers.expires().ends_with("GMT"));
    }

    #[test]
    fn test_cache_hit_skips_rendering() {
        let fixture = SiteFixture::new();
        fixture.write("content/test-this-cache.md", "test cache");
        let site = fixture.site_with(|config| config.view_cache.seconds = 15);

        let calls = Arc::new(AtomicUsize::new(0));
        let renderer = Arc::new(CountingRenderer {
            inner: PulldownRenderer::new(&site),
            calls: Arc::clone(&calls),
        });
        let backend = Arc::new(CountingBackend::default());
        let cache = ViewCache::with_backend(backend.clone(), 15);
        let view = ContentView::with_parts(site, renderer, cache).unwrap();

        let first = view.respond("/test-this-cache").unwrap();
        let second = view.respond("/test-this-cache").unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(backend.gets.load(Ordering::SeqCst), 2);
        assert_eq!(backend.sets.load(Ordering::SeqCst), 1);
        assert_eq!(first.body, second.body);
    }

    #[test]
    fn test_disabled_cache_renders_every_time() {
        let fixture = SiteFixture::new();
        fixture.write("content/page.md", "page");
        let site = fixture.site();

        let calls = Arc::new(AtomicUsize::new(0));
        let renderer = Arc::new(CountingRenderer {
            inner: PulldownRenderer::new(&site),
            calls: Arc::clone(&calls),
        });
        let view = ContentView::with_parts(site, renderer, ViewCache::disabled()).unwrap();

        view.respond("/page").unwrap();
        view.respond("/page").unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_direct_template() {
        let fixture = SiteFixture::new();
        fixture.write("templates/test-this.html", "test this");

        let response = view(&fixture).respond("/test-this").unwrap();
        assert!(response.body.contains("test this"));
        assert!(response.cache.is_none());
    }

    #[test]
    fn test_direct_template_gets_standard_context() {
        let fixture = SiteFixture::new();
        fixture.write("templates/info.html", "{{ request.path }} {{ data.test }}");
        fixture.write("data/test.json", "7");

        assert_eq!(body(&fixture, "/info"), "/info 7");
    }

    #[test]
    fn test_wildcard_templates() {
        let fixture = SiteFixture::new();
        fixture.write("templates/*.html", "asterisk");
        fixture.write("templates/test-this/*.html", "directory asterisk");
        fixture.write(
            "templates/new/another/*/*.html",
            "multiple asterisk in subdirectory",
        );

        assert!(body(&fixture, "/test-this-missing-thing").contains("asterisk"));
        assert!(body(&fixture, "/test-this/missing-thing").contains("directory asterisk"));
        assert!(body(&fixture, "/new/another/something/test-this-should-200")
            .contains("multiple asterisk in subdirectory"));
        assert!(view(&fixture)
            .respond("/something/test-this-should-404")
            .unwrap_err()
            .is_not_found());
    }

    #[test]
    fn test_include_md_in_content() {
        let fixture = SiteFixture::new();
        fixture.write(
            "content/page.md",
            "---\ntitle: Outer\n---\n{{ include_md(path='partials/note') }}\n",
        );
        fixture.write(
            "templates/partials/note.md",
            "---\nlabel: Note\n---\n{{ label }} for {{ title }}\n",
        );

        assert!(body(&fixture, "/page").contains("<p>Note for Outer</p>"));
    }

    #[test]
    fn test_double_quoted_tags_with_either_renderer() {
        let fixture = SiteFixture::new();
        fixture.write(
            "content/page.md",
            "{{ include_md(path=\"note\") }}\n\n{% if \"a\" != \"b\" %}differs{% endif %}\n",
        );
        fixture.write("templates/note.md", "noted");

        for kind in [RendererKind::Pulldown, RendererKind::Comrak] {
            let site = fixture.site_with(|config| config.markdown_renderer = kind);
            let page = ContentView::new(site).unwrap().respond("/page").unwrap();
            assert!(page.body.contains("<p>noted</p>"), "{:?}: {}", kind, page.body);
            assert!(page.body.contains("<p>differs</p>"), "{:?}: {}", kind, page.body);
        }
    }

    #[test]
    fn test_directory_contents_in_template() {
        let fixture = SiteFixture::new();
        fixture.write("content/blog/index.md", "---\ntemplate: list.html\n---\n");
        fixture.write("content/blog/one.md", "---\ntitle: One\n---\n");
        fixture.write("content/blog/two.md", "---\ntitle: Two\n---\n");
        fixture.write(
            "templates/list.html",
            "{% set posts = directory_contents(exclude='blog/two') %}{% for post in posts %}<a href=\"/{{ post.slug }}\">{{ post.title }}</a>{% endfor %}",
        );

        assert_eq!(body(&fixture, "/blog/"), "<a href=\"/blog/one\">One</a>");
    }

    #[test]
    fn test_custom_not_found_page() {
        let fixture = SiteFixture::new();
        assert!(view(&fixture).render_not_found("/missing").unwrap().is_none());

        fixture.write("templates/404.html", "no {{ request.path }}");
        assert_eq!(
            view(&fixture).render_not_found("/missing").unwrap().as_deref(),
            Some("no /missing")
        );
    }

    #[test]
    fn test_debug_reloads_templates() {
        let fixture = SiteFixture::new();
        fixture.write("templates/page.html", "before");
        let site = fixture.site_with(|config| config.debug = true);
        let view = ContentView::new(site).unwrap();

        assert_eq!(view.respond("/page").unwrap().body, "before");
        fixture.write("templates/page.html", "after");
        assert_eq!(view.respond("/page").unwrap().body, "after");
    }
}
