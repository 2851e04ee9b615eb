//! Render one URL path to stdout

use anyhow::Result;

use crate::view::ContentView;
use crate::Site;

/// Render the page a URL path resolves to
pub fn render(site: Site, path: &str) -> Result<String> {
    let view = ContentView::new(site)?;
    Ok(view.respond(path)?.body)
}

pub fn run(site: Site, path: &str) -> Result<()> {
    print!("{}", render(site, path)?);
    Ok(())
}
