//! Error types for Folio.
//!
//! Library crates use [`FolioError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all Folio operations.
#[derive(Debug, thiserror::Error)]
pub enum FolioError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// The remote page could not be fetched, or it is not a usable page.
    #[error("fetch error: {message}")]
    Fetch { message: String },

    /// Block conversion, markdown rendering, or template rendering failed.
    #[error("render error: {0}")]
    Render(String),

    /// A config file could not be parsed.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// An insert lost the race for a slug at the unique index.
    #[error("slug conflict: '{slug}' is already taken")]
    SlugConflict { slug: String },

    /// No item is stored under the requested slug.
    #[error("no item found with slug '{slug}'")]
    NotFound { slug: String },

    /// Database or storage layer error.
    #[error("storage error: {0}")]
    Storage(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Invalid caller input (bad filter value, bad option, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, FolioError>;

impl FolioError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a fetch error from any displayable message.
    pub fn fetch(msg: impl Into<String>) -> Self {
        Self::Fetch {
            message: msg.into(),
        }
    }

    /// Create a render error from any displayable message.
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether retrying the same call later can succeed.
    ///
    /// Fetch failures are surfaced to the user with a retry prompt; slug
    /// conflicts are transient by nature.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Fetch { .. } | Self::SlugConflict { .. })
    }

    /// Whether this is a client-visible "not found" rather than a fault.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
