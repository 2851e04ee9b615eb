//! List site content

use anyhow::Result;
use serde_json::Value;

use crate::content::{renderer_for, ContentItem, ContentLoader};
use crate::Site;

/// Print every content file with its URL
pub fn run(site: &Site, include_drafts: bool) -> Result<()> {
    let renderer = renderer_for(site);
    let loader = ContentLoader::new(site, renderer.as_ref());
    let items = loader.content_items(!include_drafts)?;

    println!("Content ({}):", items.len());
    for item in &items {
        println!("  {}", describe(item));
    }

    Ok(())
}

/// `2022-02-26 - Title [/url]`, with a draft marker
fn describe(item: &ContentItem) -> String {
    let date = item
        .metadata
        .publish_date
        .map(|date| date.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "----------".to_string());
    let title = item
        .metadata
        .get("title")
        .and_then(Value::as_str)
        .unwrap_or(&item.slug);
    let draft = if item.is_draft() { " (draft)" } else { "" };

    format!("{} - {} [{}]{}", date, title, item.relative_url, draft)
}
