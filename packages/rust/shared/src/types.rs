//! Core domain types for Folio items.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::FolioError;

/// Author recorded when the caller leaves the author blank.
pub const DEFAULT_AUTHOR: &str = "Jamie Z";

/// Stored `date` when the source page carries no creation timestamp.
pub const UNKNOWN_DATE: &str = "unknown";

// ---------------------------------------------------------------------------
// ItemId
// ---------------------------------------------------------------------------

/// A UUID v7 wrapper for item identifiers (time-sortable).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub Uuid);

impl ItemId {
    /// Generate a new time-sortable item identifier.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for ItemId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ItemId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

// ---------------------------------------------------------------------------
// Item
// ---------------------------------------------------------------------------

/// A persisted, fully transformed page.
///
/// Every field is immutable once written except `subject`. The `slug` is
/// derived from `title` at creation time and is never recomputed, so external
/// links keep resolving even if titles become editable later.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Storage-assigned identifier.
    pub id: ItemId,
    /// Title as returned by the remote source.
    pub title: String,
    /// Final HTML (later interpreted as a template on view).
    pub content: String,
    /// ISO-8601 creation timestamp, or [`UNKNOWN_DATE`].
    pub date: String,
    /// Author-supplied "include in index" flag.
    pub is_indexed: bool,
    /// Author name.
    pub author: String,
    /// Unique, URL-safe identifier.
    pub slug: String,
    /// Free-text category tag; may be empty.
    #[serde(default)]
    pub subject: String,
}

/// An item that has not been stored yet (no id).
#[derive(Debug, Clone, PartialEq)]
pub struct NewItem {
    pub title: String,
    pub content: String,
    pub date: String,
    pub is_indexed: bool,
    pub author: String,
    pub slug: String,
    pub subject: String,
}

/// The listing projection of an [`Item`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemSummary {
    pub title: String,
    pub slug: String,
    pub date: String,
    pub subject: String,
}

// ---------------------------------------------------------------------------
// IngestOptions
// ---------------------------------------------------------------------------

/// Author-supplied options accompanying an ingest request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestOptions {
    /// Whether the item should appear in the index.
    pub indexed: bool,
    /// Author name; blank means [`DEFAULT_AUTHOR`].
    pub author: String,
    /// Optional category tag.
    pub subject: Option<String>,
}

impl IngestOptions {
    /// The author to record, falling back to [`DEFAULT_AUTHOR`] when blank.
    pub fn resolved_author(&self) -> &str {
        let author = self.author.trim();
        if author.is_empty() {
            DEFAULT_AUTHOR
        } else {
            author
        }
    }

    /// The subject to record (empty when absent).
    pub fn resolved_subject(&self) -> &str {
        self.subject.as_deref().map(str::trim).unwrap_or("")
    }
}

// ---------------------------------------------------------------------------
// Listing query
// ---------------------------------------------------------------------------

/// Column a listing is ordered by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortField {
    #[default]
    Date,
    Title,
    Subject,
}

impl SortField {
    /// The SQL column this field orders by. Only these literals ever reach SQL.
    pub fn column(self) -> &'static str {
        match self {
            Self::Date => "date",
            Self::Title => "title",
            Self::Subject => "subject",
        }
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

impl FromStr for SortField {
    type Err = FolioError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "date" => Ok(Self::Date),
            "title" => Ok(Self::Title),
            "subject" => Ok(Self::Subject),
            other => Err(FolioError::validation(format!(
                "cannot order by '{other}': expected date, title or subject"
            ))),
        }
    }
}

/// Listing direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    pub fn keyword(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Asc => f.write_str("asc"),
            Self::Desc => f.write_str("desc"),
        }
    }
}

impl FromStr for SortDirection {
    type Err = FolioError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            other => Err(FolioError::validation(format!(
                "unknown order '{other}': expected asc or desc"
            ))),
        }
    }
}

/// Filters, ordering and paging for listing items.
///
/// Date bounds are inclusive and compared as strings, which orders ISO-8601
/// timestamps correctly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    pub order_by: SortField,
    pub direction: SortDirection,
    pub subject: Option<String>,
    pub date_start: Option<String>,
    pub date_end: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_id_roundtrip() {
        let id = ItemId::new();
        let s = id.to_string();
        let parsed: ItemId = s.parse().expect("parse ItemId");
        assert_eq!(id, parsed);
    }

    #[test]
    fn blank_author_falls_back_to_default() {
        let opts = IngestOptions {
            author: "   ".into(),
            ..Default::default()
        };
        assert_eq!(opts.resolved_author(), DEFAULT_AUTHOR);

        let opts = IngestOptions {
            author: " Ada ".into(),
            ..Default::default()
        };
        assert_eq!(opts.resolved_author(), "Ada");
    }

    #[test]
    fn missing_subject_is_empty() {
        let opts = IngestOptions::default();
        assert_eq!(opts.resolved_subject(), "");
    }

    #[test]
    fn sort_field_parsing() {
        assert_eq!("Title".parse::<SortField>().unwrap(), SortField::Title);
        assert_eq!("subject".parse::<SortField>().unwrap(), SortField::Subject);
        let err = "id; DROP TABLE items".parse::<SortField>().unwrap_err();
        assert!(err.to_string().contains("cannot order by"));
    }

    #[test]
    fn list_query_defaults_to_newest_first() {
        let query = ListQuery::default();
        assert_eq!(query.order_by, SortField::Date);
        assert_eq!(query.direction, SortDirection::Desc);
        assert_eq!(query.direction.keyword(), "DESC");
    }

    #[test]
    fn item_serialization_uses_snake_case_fields() {
        let item = Item {
            id: ItemId::new(),
            title: "Hello".into(),
            content: "<p>hi</p>".into(),
            date: "2024-01-15T10:30:00.000Z".into(),
            is_indexed: true,
            author: DEFAULT_AUTHOR.into(),
            slug: "hello".into(),
            subject: String::new(),
        };

        let json = serde_json::to_value(&item).expect("serialize");
        assert_eq!(json["is_indexed"], true);
        assert_eq!(json["slug"], "hello");
    }
}
