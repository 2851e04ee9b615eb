//! HTML helper functions

use std::borrow::Cow;

/// Tera tag delimiters that may appear in rendered markdown
const TAG_DELIMITERS: [(&str, &str); 2] = [("{{", "}}"), ("{%", "%}")];

/// Escape HTML special characters
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Reverse [`html_escape`]
pub fn html_unescape(s: &str) -> String {
    s.replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

/// Undo HTML escaping inside `{{ ... }}` and `{% ... %}` tags
///
/// Markdown renderers escape quotes and comparison operators in text, which
/// would leave template tags in a markdown body unparseable. Text outside
/// the tags keeps its escaping.
pub fn unescape_template_tags(html: &str) -> Cow<'_, str> {
    if !html.contains('&') {
        return Cow::Borrowed(html);
    }

    let mut out = String::with_capacity(html.len());
    let mut rest = html;
    loop {
        let next = TAG_DELIMITERS
            .iter()
            .filter_map(|&(open, close)| rest.find(open).map(|at| (at, open, close)))
            .min_by_key(|&(at, _, _)| at);
        let Some((at, open, close)) = next else {
            break;
        };

        let inner_start = at + open.len();
        let Some(len) = rest[inner_start..].find(close) else {
            break;
        };
        let inner_end = inner_start + len;

        out.push_str(&rest[..inner_start]);
        out.push_str(&html_unescape(&rest[inner_start..inner_end]));
        out.push_str(close);
        rest = &rest[inner_end + close.len()..];
    }
    out.push_str(rest);

    Cow::Owned(out)
}
