//! HTTP client for the Notion REST API.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use folio_shared::{FolioError, Result, SourceConfig};
use reqwest::Client;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use crate::block::{ApiError, Block, BlockList, NotionPage, RawPage};

/// User-Agent string for API requests.
const USER_AGENT: &str = concat!("Folio/", env!("CARGO_PKG_VERSION"));

/// Largest page size the children endpoint accepts.
const PAGE_SIZE: &str = "100";

/// Authenticated Notion API client.
#[derive(Debug, Clone)]
pub struct NotionClient {
    http: Client,
    base_url: String,
}

impl NotionClient {
    /// Build a client with bearer auth and the `Notion-Version` header preset.
    pub fn new(config: &SourceConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();

        let mut auth = HeaderValue::from_str(&format!("Bearer {}", config.api_key))
            .map_err(|_| FolioError::config("Notion API key contains invalid characters"))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        let version = HeaderValue::from_str(&config.api_version)
            .map_err(|_| FolioError::config("invalid Notion API version"))?;
        headers.insert("Notion-Version", version);

        let http = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| FolioError::fetch(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Fetch a page object by its dashed id.
    #[instrument(skip(self))]
    pub async fn fetch_page(&self, page_id: &str) -> Result<NotionPage> {
        let url = format!("{}/pages/{page_id}", self.base_url);
        let raw: RawPage = self.get_json(&url, &[]).await?;
        Ok(raw.into())
    }

    /// Fetch one level of children, following pagination to the end.
    #[instrument(skip(self))]
    pub async fn fetch_block_children(&self, block_id: &str) -> Result<Vec<Block>> {
        let url = format!("{}/blocks/{block_id}/children", self.base_url);
        let mut blocks = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let mut query = vec![("page_size", PAGE_SIZE.to_string())];
            if let Some(c) = &cursor {
                query.push(("start_cursor", c.clone()));
            }

            let list: BlockList = self.get_json(&url, &query).await?;
            blocks.extend(list.results.into_iter().map(Block::from));

            match list.next_cursor {
                Some(next) if list.has_more => cursor = Some(next),
                _ => break,
            }
        }

        debug!(count = blocks.len(), "fetched block children");
        Ok(blocks)
    }

    /// Fetch the complete block tree under `block_id` (a page id works too).
    pub fn fetch_block_tree<'a>(
        &'a self,
        block_id: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<Block>>> + Send + 'a>> {
        Box::pin(async move {
            let mut blocks = self.fetch_block_children(block_id).await?;
            for block in &mut blocks {
                if block.wants_children() {
                    block.children = self.fetch_block_tree(&block.id).await?;
                }
            }
            Ok(blocks)
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let response = self
            .http
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| FolioError::fetch(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let detail = match serde_json::from_str::<ApiError>(&body) {
                Ok(err) => match err.code {
                    Some(code) => format!(": {code}: {}", err.message),
                    None => format!(": {}", err.message),
                },
                Err(_) => String::new(),
            };
            return Err(FolioError::fetch(format!("{url}: HTTP {status}{detail}")));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| FolioError::fetch(format!("{url}: malformed response body: {e}")))
    }
}
