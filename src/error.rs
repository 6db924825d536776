//! Error types for loading and configuring the catalog.
//!
//! Only failures that stop a load are errors. Lookup gaps (dangling
//! references, unknown series ids, deep links that miss the current list)
//! and missing media are absorbed where they happen.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, CatalogError>;

/// Which source document a structural failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Characters,
    Videos,
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentKind::Characters => f.write_str("character"),
            DocumentKind::Videos => f.write_str("video"),
        }
    }
}

#[derive(Error, Debug)]
pub enum CatalogError {
    /// Malformed document or missing required fields. Fails the whole load.
    #[error("malformed {kind} document: {source}")]
    Structural {
        kind: DocumentKind,
        #[source]
        source: serde_json::Error,
    },

    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Configuration values that parse but make no sense.
    #[error("configuration error: {0}")]
    Config(String),

    #[error("cannot parse configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),
}

impl CatalogError {
    pub fn structural(kind: DocumentKind, source: serde_json::Error) -> Self {
        CatalogError::Structural { kind, source }
    }

    pub fn is_structural(&self) -> bool {
        matches!(self, CatalogError::Structural { .. })
    }
}
