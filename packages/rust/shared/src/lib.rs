//! Shared types, error model, and configuration for Folio.
//!
//! This crate is the foundation depended on by all other Folio crates.
//! It provides:
//! - [`FolioError`], the unified error type
//! - Domain types ([`Item`], [`NewItem`], [`ItemSummary`], [`ListQuery`], [`IngestOptions`])
//! - Configuration ([`AppConfig`], [`SourceConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, DB_PATH_ENV, DefaultsConfig, NotionConfig, SourceConfig, StorageConfig,
    config_dir, config_file_path, database_path, init_config, load_config, load_config_from,
    validate_api_key,
};
pub use error::{FolioError, Result};
pub use types::{
    DEFAULT_AUTHOR, IngestOptions, Item, ItemId, ItemSummary, ListQuery, NewItem, SortDirection,
    SortField, UNKNOWN_DATE,
};
