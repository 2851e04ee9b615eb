//! Shared fixtures for unit tests

use std::fs;
use std::path::PathBuf;

use tempfile::TempDir;

use crate::config::SiteConfig;
use crate::Site;

/// A throwaway site directory
pub(crate) struct SiteFixture {
    dir: TempDir,
}

impl SiteFixture {
    pub(crate) fn new() -> Self {
        let dir = TempDir::new().expect("create temp dir");
        fs::create_dir_all(dir.path().join("content")).expect("create content dir");
        Self { dir }
    }

    /// Write a file relative to the base directory, creating parents
    pub(crate) fn write(&self, relative: &str, contents: &str) -> PathBuf {
        let path = self.dir.path().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent dir");
        }
        fs::write(&path, contents).expect("write fixture");
        path
    }

    pub(crate) fn site(&self) -> Site {
        Site::with_config(self.dir.path(), SiteConfig::default())
    }

    pub(crate) fn site_with(&self, configure: impl FnOnce(&mut SiteConfig)) -> Site {
        let mut config = SiteConfig::default();
        configure(&mut config);
        Site::with_config(self.dir.path(), config)
    }
}
