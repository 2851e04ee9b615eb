//! Library error type

use thiserror::Error;

/// Errors produced while resolving and rendering content
#[derive(Error, Debug)]
pub enum Error {
    /// Nothing on disk answers the requested path
    #[error("Not found: {0}")]
    NotFound(String),

    /// `parent` was asked for the directory above the root
    #[error("No parent for path: {0:?}")]
    NoParent(String),

    #[error("Template error: {0}")]
    Template(#[from] tera::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl Error {
    /// Whether this error should surface as an HTTP 404
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
