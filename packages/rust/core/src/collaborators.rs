//! The seams of the ingestion pipeline and their production implementations.

use async_trait::async_trait;
use folio_markup::render_markdown;
use folio_shared::{Item, ItemSummary, ListQuery, NewItem, Result};
use folio_source::{Block, NotionClient, blocks_to_markdown, normalize_page_id};
use folio_storage::Storage;

/// A fetched page: title, creation time and block tree.
#[derive(Debug, Clone, PartialEq)]
pub struct SourcePage {
    pub title: String,
    pub created_at: Option<String>,
    pub blocks: Vec<Block>,
}

/// Where pages come from.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Fetch a page by the identifier the author supplied. Fails with a
    /// `Fetch` error for invalid or inaccessible ids.
    async fn fetch_page(&self, remote_id: &str) -> Result<SourcePage>;
}

pub trait BlocksToMarkdown: Send + Sync {
    fn to_markdown(&self, blocks: &[Block]) -> Result<String>;
}

pub trait MarkdownToHtml: Send + Sync {
    fn render(&self, markdown: &str) -> Result<String>;
}

/// Persistence used by the pipeline.
#[async_trait]
pub trait ItemStore: Send + Sync {
    async fn slug_exists(&self, slug: &str) -> Result<bool>;
    /// Single-statement insert; a taken slug is a `SlugConflict`.
    async fn insert_item(&self, item: &NewItem) -> Result<Item>;
    async fn get_by_slug(&self, slug: &str) -> Result<Option<Item>>;
    async fn list_items(&self, query: &ListQuery) -> Result<Vec<ItemSummary>>;
}

// ---------------------------------------------------------------------------
// Production implementations
// ---------------------------------------------------------------------------

#[async_trait]
impl PageSource for NotionClient {
    async fn fetch_page(&self, remote_id: &str) -> Result<SourcePage> {
        let page_id = normalize_page_id(remote_id)?;
        let page = NotionClient::fetch_page(self, &page_id).await?;
        let blocks = self.fetch_block_tree(&page_id).await?;
        Ok(SourcePage {
            title: page.title,
            created_at: page.created_at,
            blocks,
        })
    }
}

/// Notion block tree → markdown.
#[derive(Debug, Clone, Copy, Default)]
pub struct NotionMarkdown;

impl BlocksToMarkdown for NotionMarkdown {
    fn to_markdown(&self, blocks: &[Block]) -> Result<String> {
        Ok(blocks_to_markdown(blocks))
    }
}

/// CommonMark → HTML.
#[derive(Debug, Clone, Copy, Default)]
pub struct CommonMark;

impl MarkdownToHtml for CommonMark {
    fn render(&self, markdown: &str) -> Result<String> {
        Ok(render_markdown(markdown))
    }
}

#[async_trait]
impl ItemStore for Storage {
    async fn slug_exists(&self, slug: &str) -> Result<bool> {
        Storage::slug_exists(self, slug).await
    }

    async fn insert_item(&self, item: &NewItem) -> Result<Item> {
        Storage::insert_item(self, item).await
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Item>> {
        self.get_item_by_slug(slug).await
    }

    async fn list_items(&self, query: &ListQuery) -> Result<Vec<ItemSummary>> {
        Storage::list_items(self, query).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_markup::rewrite_math;
    use serde_json::json;

    fn block(kind: &str, payload: serde_json::Value) -> Block {
        Block {
            id: format!("{kind}-id"),
            kind: kind.into(),
            has_children: false,
            payload,
            children: vec![],
        }
    }

    #[test]
    fn tex_survives_markdown_rendering() {
        let blocks = vec![
            block(
                "equation",
                json!({ "expression": r"\begin{matrix} a \\ b \end{matrix}" }),
            ),
            block(
                "paragraph",
                json!({ "rich_text": [
                    { "type": "equation", "equation": { "expression": "x*y*z" }, "plain_text": "x*y*z" }
                ] }),
            ),
        ];

        let markdown = NotionMarkdown.to_markdown(&blocks).unwrap();
        let html = rewrite_math(&CommonMark.render(&markdown).unwrap());

        assert!(
            html.contains(r"<p>\[\begin{matrix} a \\ b \end{matrix}\]</p>"),
            "{html}"
        );
        assert!(html.contains(r"<p>\(x*y*z\)</p>"), "{html}");
        assert!(!html.contains("<em>"), "{html}");
    }
}
