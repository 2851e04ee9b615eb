//! Helper functions shared by the renderer, locator and templates

mod date;
mod html;
mod merge;
mod toc;
mod url;

pub use date::*;
pub use html::*;
pub use merge::*;
pub use toc::*;
pub use url::*;
