//! Read side of the corpus: listings and slug lookups.

use folio_shared::{FolioError, Item, ItemSummary, ListQuery, Result};
use tracing::instrument;

use crate::collaborators::ItemStore;

/// Summaries of stored items, filtered, ordered and paged by `query`.
#[instrument(skip(store))]
pub async fn list_all(store: &dyn ItemStore, query: &ListQuery) -> Result<Vec<ItemSummary>> {
    store.list_items(query).await
}

/// The item stored under `slug`, or [`FolioError::NotFound`].
#[instrument(skip(store))]
pub async fn get_by_slug(store: &dyn ItemStore, slug: &str) -> Result<Item> {
    store
        .get_by_slug(slug)
        .await?
        .ok_or_else(|| FolioError::NotFound {
            slug: slug.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_shared::{NewItem, SortField};
    use folio_storage::Storage;
    use uuid::Uuid;

    async fn temp_storage() -> Storage {
        let path = std::env::temp_dir().join(format!("folio_test_{}.db", Uuid::now_v7()));
        Storage::open(&path).await.expect("open test db")
    }

    fn new_item(title: &str, slug: &str) -> NewItem {
        NewItem {
            title: title.into(),
            content: "<p>body</p>".into(),
            date: "2024-01-15".into(),
            is_indexed: true,
            author: "Jamie Z".into(),
            slug: slug.into(),
            subject: String::new(),
        }
    }

    #[tokio::test]
    async fn lookup_hits_and_misses() {
        let storage = temp_storage().await;
        storage.insert_item(&new_item("Alpha", "alpha")).await.unwrap();

        let item = get_by_slug(&storage, "alpha").await.unwrap();
        assert_eq!(item.title, "Alpha");

        let err = get_by_slug(&storage, "beta").await.unwrap_err();
        assert!(err.is_not_found());
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn listing_goes_through_the_store() {
        let storage = temp_storage().await;
        storage.insert_item(&new_item("Beta", "beta")).await.unwrap();
        storage.insert_item(&new_item("Alpha", "alpha")).await.unwrap();

        let query = ListQuery {
            order_by: SortField::Title,
            direction: folio_shared::SortDirection::Asc,
            ..Default::default()
        };
        let slugs: Vec<String> = list_all(&storage, &query)
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.slug)
            .collect();
        assert_eq!(slugs, vec!["alpha", "beta"]);
    }
}
