//! Core domain logic for Folio.
//!
//! Ties the Notion source, markup passes and storage together into the
//! ingestion pipeline, and owns slug allocation and the template view step.

pub mod catalog;
pub mod collaborators;
pub mod pipeline;
pub mod slug;
pub mod view;

pub use catalog::{get_by_slug, list_all};
pub use collaborators::{
    BlocksToMarkdown, CommonMark, ItemStore, MarkdownToHtml, NotionMarkdown, PageSource,
    SourcePage,
};
pub use pipeline::{IngestionPipeline, ProgressReporter, SilentProgress};
pub use slug::{allocate_unique, allocate_unique_in, backfill_missing_slugs, slugify};
pub use view::render_item;
