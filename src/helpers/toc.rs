//! Table of contents generation

use std::collections::HashSet;

use super::html::html_escape;

/// A heading collected while rendering markdown
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Heading {
    pub level: u8,
    pub id: String,
    pub text: String,
}

/// Hands out unique anchor ids for headings within one document
#[derive(Debug, Default)]
pub struct HeadingIds {
    taken: HashSet<String>,
}

impl HeadingIds {
    pub fn new() -> Self {
        Self::default()
    }

    /// Slugify `text` and suffix `-1`, `-2`, ... on repeats
    pub fn unique(&mut self, text: &str) -> String {
        let base = match slug::slugify(text) {
            s if s.is_empty() => "section".to_string(),
            s => s,
        };
        self.claim(base)
    }

    /// Reserve an id chosen elsewhere (explicit `{#id}` or another anchorizer)
    ///
    /// Suffixes `-1`, `-2`, ... until the id is free, so a heading titled
    /// `Notes 1` after two `Notes` headings gets `notes-1-1`.
    pub fn claim(&mut self, base: String) -> String {
        let mut id = base.clone();
        let mut suffix = 0;
        while self.taken.contains(&id) {
            suffix += 1;
            id = format!("{}-{}", base, suffix);
        }
        self.taken.insert(id.clone());
        id
    }
}

/// Build the table of contents as nested `<ul>` lists
///
/// Returns `None` when there are no headings. Output shape:
///
/// ```text
/// <ul>
///   <li><a href="#title">title</a>
///   <ul>
///     <li><a href="#test-data">test data</a></li>
///   </ul></li>
/// </ul>
/// ```
pub fn toc_html(headings: &[Heading]) -> Option<String> {
    if headings.is_empty() {
        return None;
    }

    let mut lines: Vec<String> = Vec::new();
    let mut stack: Vec<u8> = vec![0];

    fn indent(stack: &[u8]) -> String {
        "  ".repeat(stack.len() - 1)
    }

    fn close_item(lines: &mut [String]) {
        if let Some(last) = lines.last_mut() {
            if !last.ends_with("</li>") {
                last.push_str("</li>");
            }
        }
    }

    for heading in headings {
        let top = *stack.last().unwrap_or(&0);
        if heading.level > top {
            lines.push(format!("{}<ul>", indent(&stack)));
            stack.push(heading.level);
        } else {
            // the outermost list stays open even when a later heading is shallower
            while stack.len() > 2 && heading.level < stack[stack.len() - 1] {
                stack.pop();
                close_item(&mut lines);
                lines.push(format!("{}</ul></li>", indent(&stack)));
            }
            close_item(&mut lines);
        }
        lines.push(format!(
            r##"{}<li><a href="#{}">{}</a>"##,
            indent(&stack),
            heading.id,
            html_escape(&heading.text)
        ));
    }

    while stack.len() > 1 {
        stack.pop();
        close_item(&mut lines);
        lines.push(format!("{}</ul>", indent(&stack)));
    }

    let mut html = lines.join("\n");
    html.push('\n');
    Some(html)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn heading(level: u8, text: &str) -> Heading {
        Heading {
            level,
            id: slug::slugify(text),
            text: text.to_string(),
        }
    }

    #[test]
    fn test_nested_toc() {
        let toc = toc_html(&[heading(1, "title"), heading(2, "test data")]).unwrap();
        let expected = r##"<ul>
  <li><a href="#title">title</a>
  <ul>
    <li><a href="#test-data">test data</a></li>
  </ul></li>
</ul>
"##;
        assert_eq!(toc, expected);
    }

    #[test]
    fn test_sibling_and_dedent_toc() {
        let toc = toc_html(&[
            heading(1, "one"),
            heading(2, "one a"),
            heading(1, "two"),
            heading(1, "three"),
        ])
        .unwrap();
        let expected = r##"<ul>
  <li><a href="#one">one</a>
  <ul>
    <li><a href="#one-a">one a</a></li>
  </ul></li>
  <li><a href="#two">two</a></li>
  <li><a href="#three">three</a></li>
</ul>
"##;
        assert_eq!(toc, expected);
    }

    #[test]
    fn test_shallower_heading_after_first_stays_balanced() {
        let toc = toc_html(&[heading(2, "sub"), heading(1, "top")]).unwrap();
        assert_eq!(toc.matches("<ul>").count(), toc.matches("</ul>").count());
        assert_eq!(toc.matches("<li>").count(), toc.matches("</li>").count());
    }

    #[test]
    fn test_empty_toc() {
        assert!(toc_html(&[]).is_none());
    }

    #[test]
    fn test_heading_text_is_escaped() {
        let toc = toc_html(&[heading(2, "a < b")]).unwrap();
        assert!(toc.contains("a &lt; b"));
    }

    #[test]
    fn test_unique_ids() {
        let mut ids = HeadingIds::new();
        assert_eq!(ids.unique("Intro"), "intro");
        assert_eq!(ids.unique("Intro"), "intro-1");
        assert_eq!(ids.unique("Intro"), "intro-2");
        assert_eq!(ids.unique("???"), "section");
    }

    #[test]
    fn test_suffixed_id_is_not_reissued() {
        let mut ids = HeadingIds::new();
        assert_eq!(ids.unique("Notes"), "notes");
        assert_eq!(ids.unique("Notes"), "notes-1");
        assert_eq!(ids.unique("Notes 1"), "notes-1-1");
        assert_eq!(ids.claim("notes".to_string()), "notes-2");
    }
}
