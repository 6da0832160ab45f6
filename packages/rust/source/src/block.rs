//! Page and block types decoded from API payloads.

use serde::Deserialize;
use serde_json::{Map, Value};

/// The parts of a Notion page object the ingester needs.
#[derive(Debug, Clone, PartialEq)]
pub struct NotionPage {
    pub id: String,
    /// First rich-text run of the title property; empty when the page has none.
    pub title: String,
    /// `created_time`, ISO-8601.
    pub created_at: Option<String>,
}

/// One node of a page's block tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub id: String,
    /// The API `type`, e.g. `paragraph`, `heading_1`, `table_row`.
    pub kind: String,
    pub has_children: bool,
    /// The type-specific object (`block[kind]`), kept as raw JSON.
    pub payload: Value,
    pub children: Vec<Block>,
}

impl Block {
    /// Whether the client should fetch this block's children.
    ///
    /// Sub-pages and databases are separate documents and are not inlined.
    pub fn wants_children(&self) -> bool {
        self.has_children && !matches!(self.kind.as_str(), "child_page" | "child_database")
    }
}

// ---------------------------------------------------------------------------
// Wire formats
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(crate) struct RawPage {
    pub id: String,
    #[serde(default)]
    pub created_time: Option<String>,
    #[serde(default)]
    pub properties: Map<String, Value>,
}

impl From<RawPage> for NotionPage {
    fn from(raw: RawPage) -> Self {
        let title = raw
            .properties
            .values()
            .find(|prop| prop.get("type").and_then(Value::as_str) == Some("title"))
            .and_then(|prop| prop.get("title"))
            .and_then(Value::as_array)
            .and_then(|runs| runs.first())
            .and_then(run_text)
            .unwrap_or_default();

        Self {
            id: raw.id,
            title,
            created_at: raw.created_time.filter(|t| !t.trim().is_empty()),
        }
    }
}

/// `plain_text` of a rich-text run, falling back to `text.content`.
fn run_text(run: &Value) -> Option<String> {
    run.get("plain_text")
        .and_then(Value::as_str)
        .or_else(|| run.pointer("/text/content").and_then(Value::as_str))
        .map(String::from)
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawBlock {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub has_children: bool,
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

impl From<RawBlock> for Block {
    fn from(mut raw: RawBlock) -> Self {
        let payload = raw.rest.remove(&raw.kind).unwrap_or(Value::Null);
        Self {
            id: raw.id,
            kind: raw.kind,
            has_children: raw.has_children,
            payload,
            children: Vec::new(),
        }
    }
}

/// One page of a paginated list endpoint.
#[derive(Debug, Deserialize)]
pub(crate) struct BlockList {
    pub results: Vec<RawBlock>,
    #[serde(default)]
    pub has_more: bool,
    #[serde(default)]
    pub next_cursor: Option<String>,
}

/// Error body returned with non-2xx responses.
#[derive(Debug, Deserialize)]
pub(crate) struct ApiError {
    #[serde(default)]
    pub code: Option<String>,
    pub message: String,
}
