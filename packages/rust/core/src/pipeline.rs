//! End-to-end ingest: page id → fetch → markdown → HTML → math → header → item.

use std::sync::Arc;
use std::time::Instant;

use folio_markup::{HeaderMeta, inject_metadata, rewrite_math};
use folio_shared::{
    FolioError, IngestOptions, Item, ItemSummary, ListQuery, NewItem, Result, UNKNOWN_DATE,
};
use tracing::{debug, info, instrument, warn};

use crate::catalog;
use crate::collaborators::{
    BlocksToMarkdown, CommonMark, ItemStore, MarkdownToHtml, NotionMarkdown, PageSource,
};
use crate::slug::{allocate_unique_in, slugify};

/// Default number of re-allocations after losing a slug race.
pub const DEFAULT_SLUG_RETRY_LIMIT: u32 = 5;

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called once the item is stored.
    fn done(&self, item: &Item);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn done(&self, _item: &Item) {}
}

/// The ingestion pipeline and the read side of the corpus.
///
/// Cheap to share: wrap it in an `Arc` and call [`ingest`](Self::ingest)
/// from as many tasks as needed.
pub struct IngestionPipeline {
    source: Arc<dyn PageSource>,
    to_markdown: Arc<dyn BlocksToMarkdown>,
    to_html: Arc<dyn MarkdownToHtml>,
    store: Arc<dyn ItemStore>,
    slug_retry_limit: u32,
}

impl IngestionPipeline {
    /// Pipeline with the default markdown and HTML converters.
    pub fn new(source: Arc<dyn PageSource>, store: Arc<dyn ItemStore>) -> Self {
        Self {
            source,
            to_markdown: Arc::new(NotionMarkdown),
            to_html: Arc::new(CommonMark),
            store,
            slug_retry_limit: DEFAULT_SLUG_RETRY_LIMIT,
        }
    }

    pub fn with_converters(
        mut self,
        to_markdown: Arc<dyn BlocksToMarkdown>,
        to_html: Arc<dyn MarkdownToHtml>,
    ) -> Self {
        self.to_markdown = to_markdown;
        self.to_html = to_html;
        self
    }

    pub fn with_slug_retry_limit(mut self, limit: u32) -> Self {
        self.slug_retry_limit = limit;
        self
    }

    /// Ingest one page. See [`ingest_with_progress`](Self::ingest_with_progress).
    pub async fn ingest(&self, remote_id: &str, options: &IngestOptions) -> Result<Item> {
        self.ingest_with_progress(remote_id, options, &SilentProgress)
            .await
    }

    /// Ingest one page, reporting phases to `progress`.
    ///
    /// Nothing is written unless every stage succeeds; the only write is the
    /// final insert. A slug lost to a concurrent ingest is re-allocated up to
    /// the retry limit, after which the `SlugConflict` is returned.
    #[instrument(skip(self, options, progress), fields(indexed = options.indexed))]
    pub async fn ingest_with_progress(
        &self,
        remote_id: &str,
        options: &IngestOptions,
        progress: &dyn ProgressReporter,
    ) -> Result<Item> {
        let start = Instant::now();
        info!("starting ingest");

        // --- Fetch ---
        progress.phase("Fetching page");
        let page = self.source.fetch_page(remote_id).await?;
        if page.title.trim().is_empty() {
            return Err(FolioError::fetch(format!(
                "page '{remote_id}' has no title"
            )));
        }
        debug!(title = %page.title, blocks = page.blocks.len(), "page fetched");

        // --- Render ---
        progress.phase("Rendering");
        let markdown = self.to_markdown.to_markdown(&page.blocks)?;
        let html = self.to_html.render(&markdown)?;
        let html = rewrite_math(&html);
        let author = options.resolved_author().to_string();
        let content = inject_metadata(
            &html,
            &HeaderMeta {
                title: page.title.clone(),
                author: author.clone(),
                created_at: page.created_at.clone(),
            },
        );
        debug!(markdown_len = markdown.len(), html_len = content.len(), "rendered");

        // --- Store ---
        progress.phase("Saving");
        let base = slugify(&page.title);
        let mut new_item = NewItem {
            title: page.title,
            content,
            date: page
                .created_at
                .filter(|d| !d.trim().is_empty())
                .unwrap_or_else(|| UNKNOWN_DATE.to_string()),
            is_indexed: options.indexed,
            author,
            slug: String::new(),
            subject: options.resolved_subject().to_string(),
        };

        let mut retries = 0;
        let item = loop {
            new_item.slug = allocate_unique_in(self.store.as_ref(), &base).await?;
            match self.store.insert_item(&new_item).await {
                Ok(item) => break item,
                Err(FolioError::SlugConflict { slug }) if retries < self.slug_retry_limit => {
                    retries += 1;
                    warn!(%slug, retries, "slug taken concurrently, re-allocating");
                }
                Err(e) => return Err(e),
            }
        };

        info!(
            id = %item.id,
            slug = %item.slug,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "ingest complete"
        );
        progress.done(&item);
        Ok(item)
    }

    /// See [`catalog::list_all`].
    pub async fn list_all(&self, query: &ListQuery) -> Result<Vec<ItemSummary>> {
        catalog::list_all(self.store.as_ref(), query).await
    }

    /// See [`catalog::get_by_slug`].
    pub async fn get_by_slug(&self, slug: &str) -> Result<Item> {
        catalog::get_by_slug(self.store.as_ref(), slug).await
    }
}
