//! Metadata derived from front-matter

use chrono::{DateTime, Local, NaiveDateTime};
use serde_json::{Map, Value};

use super::FrontMatter;
use crate::helpers::{date_iso, parse_date_string};

/// Template context mapping
pub type ContextMap = Map<String, Value>;

/// Keys the renderer owns; front-matter values for them are replaced
const DERIVED_KEYS: [&str; 4] = ["toc", "publish_date", "draft", "now"];

/// Front-matter plus derived fields for one rendered document
#[derive(Debug, Clone, PartialEq)]
pub struct Metadata {
    /// Remaining front-matter keys
    pub fields: ContextMap,
    /// Table of contents HTML, `None` when disabled or empty
    pub toc: Option<String>,
    /// Parsed `publish_date`, when present and parseable
    pub publish_date: Option<NaiveDateTime>,
    pub draft: bool,
    /// When the document was rendered
    pub now: DateTime<Local>,
}

impl Metadata {
    /// Derive metadata from parsed front-matter
    pub fn from_front_matter(front_matter: FrontMatter, toc: Option<String>) -> Self {
        let mut fields = front_matter.fields;

        let draft = fields.get("draft").map(coerce_draft).unwrap_or(false);

        let publish_date = match fields.get("publish_date") {
            Some(Value::String(s)) => {
                let parsed = parse_date_string(s);
                if parsed.is_none() {
                    tracing::warn!("Unparseable publish_date {:?}, keeping it as text", s);
                }
                parsed
            }
            _ => None,
        };

        for key in DERIVED_KEYS {
            if key == "publish_date" && publish_date.is_none() {
                continue;
            }
            fields.remove(key);
        }

        Self {
            fields,
            toc,
            publish_date,
            draft,
            now: Local::now(),
        }
    }

    /// The page template named in front-matter
    pub fn template(&self) -> Option<&str> {
        self.fields.get("template").and_then(Value::as_str)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Flatten into a template context mapping
    ///
    /// `toc`, `draft` and `now` are always present; `publish_date` only when
    /// it parsed.
    pub fn into_context(self) -> ContextMap {
        let mut context = self.fields;
        context.insert(
            "toc".to_string(),
            self.toc.map(Value::String).unwrap_or(Value::Null),
        );
        if let Some(publish_date) = self.publish_date {
            context.insert(
                "publish_date".to_string(),
                Value::String(date_iso(&publish_date)),
            );
        }
        context.insert("draft".to_string(), Value::Bool(self.draft));
        context.insert("now".to_string(), Value::String(self.now.to_rfc3339()));
        context
    }
}

/// Permissive draft coercion
///
/// A YAML boolean is kept as is. A string is true only when it is exactly
/// `"true"` or `"1"`. Anything else, numbers included, is false.
pub fn coerce_draft(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::String(s) => matches!(s.as_str(), "true" | "1"),
        _ => false,
    }
}
