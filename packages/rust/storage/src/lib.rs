//! Turso Embedded / libSQL storage layer for ingested items.
//!
//! The [`Storage`] struct wraps a libSQL database holding the `items` corpus.
//! Every write is a single statement, so concurrent readers never observe a
//! half-written item.
//!
//! **Access rules:**
//! - ingestion and slug backfill: read-write via [`Storage::open`]
//! - viewers: read-only via [`Storage::open_readonly`]

mod migrations;

use std::path::Path;

use folio_shared::{FolioError, Item, ItemId, ItemSummary, ListQuery, NewItem, Result};
use libsql::{Connection, Database, Value, params, params_from_iter};

/// Column list shared by every query that materializes a full [`Item`].
const ITEM_COLUMNS: &str = "id, title, content, date, is_indexed, author, slug, subject";

/// Primary storage handle wrapping a libSQL database.
pub struct Storage {
    #[allow(dead_code)]
    db: Database,
    conn: Connection,
    readonly: bool,
}

impl Storage {
    /// Open or create a database at `path` in read-write mode.
    pub async fn open(path: &Path) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| FolioError::io(parent, e))?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| FolioError::Storage(e.to_string()))?;

        let conn = db.connect().map_err(|e| FolioError::Storage(e.to_string()))?;

        let storage = Self {
            db,
            conn,
            readonly: false,
        };
        storage.run_migrations().await?;
        Ok(storage)
    }

    /// Open a database at `path` in read-only mode.
    pub async fn open_readonly(path: &Path) -> Result<Self> {
        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| FolioError::Storage(e.to_string()))?;

        let conn = db.connect().map_err(|e| FolioError::Storage(e.to_string()))?;

        Ok(Self {
            db,
            conn,
            readonly: true,
        })
    }

    /// Run pending schema migrations.
    async fn run_migrations(&self) -> Result<()> {
        let current_version = self.get_schema_version().await;

        for migration in migrations::all_migrations() {
            if migration.version > current_version {
                tracing::info!(
                    version = migration.version,
                    description = migration.description,
                    "applying migration"
                );
                self.conn
                    .execute_batch(migration.sql)
                    .await
                    .map_err(|e| {
                        FolioError::Storage(format!("migration v{} failed: {e}", migration.version))
                    })?;
            }
        }
        Ok(())
    }

    /// Get the current schema version, or 0 if no migrations have been applied.
    async fn get_schema_version(&self) -> u32 {
        let result = self
            .conn
            .query("SELECT MAX(version) FROM schema_migrations", params![])
            .await;

        match result {
            Ok(mut rows) => {
                if let Ok(Some(row)) = rows.next().await {
                    row.get::<u32>(0).unwrap_or(0)
                } else {
                    0
                }
            }
            Err(_) => 0, // Table doesn't exist yet
        }
    }

    /// Ensure we're in read-write mode before writing.
    fn check_writable(&self) -> Result<()> {
        if self.readonly {
            return Err(FolioError::Storage(
                "database is opened in read-only mode".into(),
            ));
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Item writes
    // -----------------------------------------------------------------------

    /// Insert a new item with a fresh id and return the stored record.
    ///
    /// Fails with [`FolioError::SlugConflict`] when another item already
    /// holds `item.slug`.
    pub async fn insert_item(&self, item: &NewItem) -> Result<Item> {
        self.check_writable()?;
        let id = ItemId::new();
        self.conn
            .execute(
                "INSERT INTO items (id, title, content, date, is_indexed, author, slug, subject)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    id.to_string(),
                    item.title.as_str(),
                    item.content.as_str(),
                    item.date.as_str(),
                    i64::from(item.is_indexed),
                    item.author.as_str(),
                    item.slug.as_str(),
                    item.subject.as_str(),
                ],
            )
            .await
            .map_err(|e| map_write_error(e, &item.slug))?;

        tracing::debug!(%id, slug = %item.slug, "item inserted");

        Ok(Item {
            id,
            title: item.title.clone(),
            content: item.content.clone(),
            date: item.date.clone(),
            is_indexed: item.is_indexed,
            author: item.author.clone(),
            slug: item.slug.clone(),
            subject: item.subject.clone(),
        })
    }

    /// Set the slug of a legacy row that has none. Rows that already carry a
    /// slug are left untouched; returns whether a row was updated.
    pub async fn assign_slug(&self, id: &str, slug: &str) -> Result<bool> {
        self.check_writable()?;
        let changed = self
            .conn
            .execute(
                "UPDATE items SET slug = ?1 WHERE id = ?2 AND (slug IS NULL OR slug = '')",
                params![slug, id],
            )
            .await
            .map_err(|e| map_write_error(e, slug))?;
        Ok(changed > 0)
    }

    // -----------------------------------------------------------------------
    // Item reads
    // -----------------------------------------------------------------------

    /// Whether any item holds `slug`.
    pub async fn slug_exists(&self, slug: &str) -> Result<bool> {
        let mut rows = self
            .conn
            .query("SELECT 1 FROM items WHERE slug = ?1 LIMIT 1", params![slug])
            .await
            .map_err(|e| FolioError::Storage(e.to_string()))?;

        match rows.next().await {
            Ok(Some(_)) => Ok(true),
            Ok(None) => Ok(false),
            Err(e) => Err(FolioError::Storage(e.to_string())),
        }
    }

    /// Get an item by slug.
    pub async fn get_item_by_slug(&self, slug: &str) -> Result<Option<Item>> {
        let mut rows = self
            .conn
            .query(
                &format!("SELECT {ITEM_COLUMNS} FROM items WHERE slug = ?1"),
                params![slug],
            )
            .await
            .map_err(|e| FolioError::Storage(e.to_string()))?;

        match rows.next().await {
            Ok(Some(row)) => Ok(Some(row_to_item(&row)?)),
            Ok(None) => Ok(None),
            Err(e) => Err(FolioError::Storage(e.to_string())),
        }
    }

    /// List item summaries matching `query`.
    ///
    /// The ORDER BY column and direction come from enums, never from caller
    /// text; every filter value is a bound parameter.
    pub async fn list_items(&self, query: &ListQuery) -> Result<Vec<ItemSummary>> {
        let mut sql = String::from(
            "SELECT title, slug, date, subject FROM items WHERE slug IS NOT NULL AND slug <> ''",
        );
        let mut values: Vec<Value> = Vec::new();

        if let Some(subject) = &query.subject {
            values.push(Value::Text(subject.clone()));
            sql.push_str(&format!(" AND subject = ?{}", values.len()));
        }
        if let Some(start) = &query.date_start {
            values.push(Value::Text(start.clone()));
            sql.push_str(&format!(" AND date >= ?{}", values.len()));
        }
        if let Some(end) = &query.date_end {
            values.push(Value::Text(end.clone()));
            sql.push_str(&format!(" AND date <= ?{}", values.len()));
        }

        let direction = query.direction.keyword();
        sql.push_str(&format!(
            " ORDER BY {} {direction}, id {direction}",
            query.order_by.column()
        ));

        // SQLite only accepts OFFSET after a LIMIT; -1 means "no limit".
        match (query.limit, query.offset) {
            (None, None) => {}
            (limit, offset) => {
                values.push(Value::Integer(limit.map_or(-1, i64::from)));
                sql.push_str(&format!(" LIMIT ?{}", values.len()));
                if let Some(offset) = offset {
                    values.push(Value::Integer(i64::from(offset)));
                    sql.push_str(&format!(" OFFSET ?{}", values.len()));
                }
            }
        }

        tracing::debug!(%sql, "listing items");

        let mut rows = self
            .conn
            .query(&sql, params_from_iter(values))
            .await
            .map_err(|e| FolioError::Storage(e.to_string()))?;

        let mut results = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| FolioError::Storage(e.to_string()))?
        {
            results.push(ItemSummary {
                title: row
                    .get::<String>(0)
                    .map_err(|e| FolioError::Storage(e.to_string()))?,
                slug: row
                    .get::<String>(1)
                    .map_err(|e| FolioError::Storage(e.to_string()))?,
                date: row
                    .get::<String>(2)
                    .map_err(|e| FolioError::Storage(e.to_string()))?,
                subject: row.get::<String>(3).unwrap_or_default(),
            });
        }
        Ok(results)
    }

    /// Rows without a slug, in id order. Returns `Vec<(id, title)>`.
    pub async fn items_missing_slug(&self) -> Result<Vec<(String, String)>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, title FROM items WHERE slug IS NULL OR slug = '' ORDER BY id",
                params![],
            )
            .await
            .map_err(|e| FolioError::Storage(e.to_string()))?;

        let mut results = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| FolioError::Storage(e.to_string()))?
        {
            results.push((
                row.get::<String>(0)
                    .map_err(|e| FolioError::Storage(e.to_string()))?,
                row.get::<String>(1).unwrap_or_default(),
            ));
        }
        Ok(results)
    }

    /// Total number of stored items.
    pub async fn count_items(&self) -> Result<u64> {
        let mut rows = self
            .conn
            .query("SELECT COUNT(1) FROM items", params![])
            .await
            .map_err(|e| FolioError::Storage(e.to_string()))?;

        match rows.next().await {
            Ok(Some(row)) => Ok(row
                .get::<i64>(0)
                .ok()
                .and_then(|n| u64::try_from(n).ok())
                .unwrap_or(0)),
            Ok(None) => Ok(0),
            Err(e) => Err(FolioError::Storage(e.to_string())),
        }
    }
}

/// Translate a write failure, recognising the slug unique index.
fn map_write_error(err: libsql::Error, slug: &str) -> FolioError {
    let message = err.to_string();
    if message.contains("UNIQUE constraint failed") && message.contains("items.slug") {
        FolioError::SlugConflict {
            slug: slug.to_string(),
        }
    } else {
        FolioError::Storage(message)
    }
}

/// Convert a database row (in [`ITEM_COLUMNS`] order) to an [`Item`].
fn row_to_item(row: &libsql::Row) -> Result<Item> {
    let id: String = row
        .get(0)
        .map_err(|e| FolioError::Storage(e.to_string()))?;
    Ok(Item {
        id: id
            .parse()
            .map_err(|e| FolioError::Storage(format!("invalid item id '{id}': {e}")))?,
        title: row
            .get::<String>(1)
            .map_err(|e| FolioError::Storage(e.to_string()))?,
        content: row
            .get::<String>(2)
            .map_err(|e| FolioError::Storage(e.to_string()))?,
        date: row
            .get::<String>(3)
            .map_err(|e| FolioError::Storage(e.to_string()))?,
        is_indexed: row.get::<i64>(4).map(|v| v != 0).unwrap_or(false),
        author: row
            .get::<String>(5)
            .map_err(|e| FolioError::Storage(e.to_string()))?,
        slug: row
            .get::<String>(6)
            .map_err(|e| FolioError::Storage(e.to_string()))?,
        subject: row.get::<String>(7).unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_shared::{SortDirection, SortField};
    use uuid::Uuid;

    /// Create a temp file storage for testing.
    async fn test_storage() -> Storage {
        let tmp = std::env::temp_dir().join(format!("folio_test_{}.db", Uuid::now_v7()));
        Storage::open(&tmp).await.expect("open test db")
    }

    fn new_item(title: &str, slug: &str, date: &str, subject: &str) -> NewItem {
        NewItem {
            title: title.into(),
            content: format!("<h1>{title}</h1>"),
            date: date.into(),
            is_indexed: false,
            author: "Jamie Z".into(),
            slug: slug.into(),
            subject: subject.into(),
        }
    }

    async fn seed(storage: &Storage) {
        for (title, slug, date, subject) in [
            ("Alpha", "alpha", "2024-01-10T08:00:00.000Z", "math"),
            ("Beta", "beta", "2024-02-10T08:00:00.000Z", "physics"),
            ("Gamma", "gamma", "2024-03-10T08:00:00.000Z", "math"),
            ("Delta", "delta", "unknown", ""),
        ] {
            storage
                .insert_item(&new_item(title, slug, date, subject))
                .await
                .unwrap();
        }
    }

    fn slugs(summaries: &[ItemSummary]) -> Vec<&str> {
        summaries.iter().map(|s| s.slug.as_str()).collect()
    }

    #[tokio::test]
    async fn open_and_migrate() {
        let storage = test_storage().await;
        let version = storage.get_schema_version().await;
        assert_eq!(version, 1);
    }

    #[tokio::test]
    async fn idempotent_migration() {
        let tmp = std::env::temp_dir().join(format!("folio_test_{}.db", Uuid::now_v7()));
        let _s1 = Storage::open(&tmp).await.expect("first open");
        drop(_s1);
        let s2 = Storage::open(&tmp).await.expect("second open");
        assert_eq!(s2.get_schema_version().await, 1);
    }

    #[tokio::test]
    async fn insert_and_get_by_slug() {
        let storage = test_storage().await;
        let mut item = new_item("Hello World", "hello-world", "2024-01-15T10:30:00.000Z", "");
        item.is_indexed = true;

        let stored = storage.insert_item(&item).await.expect("insert item");
        assert_eq!(stored.slug, "hello-world");

        let found = storage
            .get_item_by_slug("hello-world")
            .await
            .expect("get item")
            .expect("item present");
        assert_eq!(found, stored);
        assert!(found.is_indexed);

        assert!(storage.slug_exists("hello-world").await.unwrap());
        assert!(!storage.slug_exists("hello-world-1").await.unwrap());
        assert!(storage.get_item_by_slug("nope").await.unwrap().is_none());
        assert_eq!(storage.count_items().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn duplicate_slug_is_a_conflict() {
        let storage = test_storage().await;
        storage
            .insert_item(&new_item("A", "same", "unknown", ""))
            .await
            .unwrap();

        let err = storage
            .insert_item(&new_item("B", "same", "unknown", ""))
            .await
            .unwrap_err();
        assert!(matches!(err, FolioError::SlugConflict { ref slug } if slug == "same"));
        assert_eq!(storage.count_items().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn list_defaults_to_newest_first() {
        let storage = test_storage().await;
        seed(&storage).await;

        let all = storage.list_items(&ListQuery::default()).await.unwrap();
        // "unknown" sorts after any ISO date string.
        assert_eq!(slugs(&all), vec!["delta", "gamma", "beta", "alpha"]);
    }

    #[tokio::test]
    async fn list_filters_and_orders() {
        let storage = test_storage().await;
        seed(&storage).await;

        let math = storage
            .list_items(&ListQuery {
                subject: Some("math".into()),
                order_by: SortField::Title,
                direction: SortDirection::Asc,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(slugs(&math), vec!["alpha", "gamma"]);

        let window = storage
            .list_items(&ListQuery {
                date_start: Some("2024-02-01".into()),
                date_end: Some("2024-03-31".into()),
                direction: SortDirection::Asc,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(slugs(&window), vec!["beta", "gamma"]);
    }

    #[tokio::test]
    async fn list_pages_with_limit_and_offset() {
        let storage = test_storage().await;
        seed(&storage).await;

        let page = storage
            .list_items(&ListQuery {
                direction: SortDirection::Asc,
                limit: Some(2),
                offset: Some(1),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(slugs(&page), vec!["beta", "gamma"]);

        let tail = storage
            .list_items(&ListQuery {
                direction: SortDirection::Asc,
                offset: Some(3),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(slugs(&tail), vec!["delta"]);
    }

    #[tokio::test]
    async fn legacy_rows_get_slugs_once() {
        let tmp = std::env::temp_dir().join(format!("folio_test_{}.db", Uuid::now_v7()));
        let storage = Storage::open(&tmp).await.unwrap();
        storage
            .conn
            .execute(
                "INSERT INTO items (id, title, content, date) VALUES (?1, 'Old Post', '<p/>', 'unknown')",
                params![Uuid::now_v7().to_string()],
            )
            .await
            .unwrap();

        let missing = storage.items_missing_slug().await.unwrap();
        assert_eq!(missing.len(), 1);
        assert_eq!(missing[0].1, "Old Post");

        // Legacy rows are invisible to listings until they have a slug.
        assert!(storage.list_items(&ListQuery::default()).await.unwrap().is_empty());

        assert!(storage.assign_slug(&missing[0].0, "old-post").await.unwrap());
        // A second assignment is refused: slugs never change once set.
        assert!(!storage.assign_slug(&missing[0].0, "other").await.unwrap());

        assert!(storage.items_missing_slug().await.unwrap().is_empty());
        let item = storage.get_item_by_slug("old-post").await.unwrap().unwrap();
        assert_eq!(item.author, "Jamie Z");
        assert_eq!(item.subject, "");
    }

    #[tokio::test]
    async fn readonly_rejects_writes() {
        let tmp = std::env::temp_dir().join(format!("folio_test_{}.db", Uuid::now_v7()));
        let rw = Storage::open(&tmp).await.unwrap();
        rw.insert_item(&new_item("One", "one", "unknown", ""))
            .await
            .unwrap();
        drop(rw);

        let ro = Storage::open_readonly(&tmp).await.unwrap();
        assert!(ro.get_item_by_slug("one").await.unwrap().is_some());
        let result = ro.insert_item(&new_item("Two", "two", "unknown", "")).await;
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("read-only"));
    }
}
