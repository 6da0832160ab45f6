//! URL slugs: derivation from titles and unique allocation.

use std::sync::LazyLock;

use folio_shared::Result;
use folio_storage::Storage;
use regex::Regex;
use tracing::{debug, info, instrument};

use crate::collaborators::ItemStore;

/// Slug used when a title has no usable characters.
pub const FALLBACK_SLUG: &str = "item";

/// Derive a slug: lowercase ASCII alphanumerics joined by single hyphens.
///
/// Total over all input; never returns an empty string.
pub fn slugify(title: &str) -> String {
    static NON_ALNUM: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"[^a-z0-9]+").expect("valid regex"));

    let lowered = title.trim().to_lowercase();
    let hyphenated = NON_ALNUM.replace_all(&lowered, "-");
    let slug = hyphenated.trim_matches('-');

    if slug.is_empty() {
        FALLBACK_SLUG.to_string()
    } else {
        slug.to_string()
    }
}

/// First of `base`, `base-1`, `base-2`, … for which `exists` is false.
pub fn allocate_unique(base: &str, mut exists: impl FnMut(&str) -> bool) -> String {
    if !exists(base) {
        return base.to_string();
    }
    let mut n: u64 = 1;
    loop {
        let candidate = format!("{base}-{n}");
        if !exists(&candidate) {
            return candidate;
        }
        n += 1;
    }
}

/// [`allocate_unique`] probing a store.
///
/// The answer can be stale by the time it is used; the store's unique index
/// is what finally decides.
pub async fn allocate_unique_in(store: &dyn ItemStore, base: &str) -> Result<String> {
    if !store.slug_exists(base).await? {
        return Ok(base.to_string());
    }
    let mut n: u64 = 1;
    loop {
        let candidate = format!("{base}-{n}");
        if !store.slug_exists(&candidate).await? {
            return Ok(candidate);
        }
        n += 1;
    }
}

/// Give every stored row without a slug one derived from its title.
///
/// Rows are processed one at a time and each slug is written before the next
/// is probed, so duplicates among legacy titles still come out distinct.
/// Returns the number of rows updated; a second run returns 0.
#[instrument(skip(storage))]
pub async fn backfill_missing_slugs(storage: &Storage) -> Result<usize> {
    let missing = storage.items_missing_slug().await?;
    if missing.is_empty() {
        return Ok(0);
    }

    let mut updated = 0;
    for (id, title) in missing {
        let slug = allocate_unique_in(storage, &slugify(&title)).await?;
        if storage.assign_slug(&id, &slug).await? {
            debug!(%id, %slug, "assigned slug");
            updated += 1;
        }
    }

    info!(updated, "slug backfill complete");
    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use uuid::Uuid;

    fn is_well_formed(slug: &str) -> bool {
        !slug.is_empty()
            && !slug.starts_with('-')
            && !slug.ends_with('-')
            && !slug.contains("--")
            && slug
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    }

    #[test]
    fn slugify_basic() {
        assert_eq!(slugify("Hello World"), "hello-world");
        assert_eq!(slugify("  Rust 2024: What's New?  "), "rust-2024-what-s-new");
        assert_eq!(slugify("a -- b"), "a-b");
        assert_eq!(slugify("Ünïcode Çafé"), "n-code-af");
    }

    #[test]
    fn slugify_falls_back_to_item() {
        assert_eq!(slugify(""), "item");
        assert_eq!(slugify("   "), "item");
        assert_eq!(slugify("!!! ??? ---"), "item");
        assert_eq!(slugify("日本語"), "item");
    }

    #[test]
    fn slugify_output_is_always_well_formed() {
        let titles = [
            "Hello World",
            "--leading and trailing--",
            "Mixed_CASE and_underscores",
            "$$E = mc^2$$",
            "tabs\tand\nnewlines",
            "emoji 🚀 launch",
            "",
            "-",
        ];
        for title in titles {
            let slug = slugify(title);
            assert!(is_well_formed(&slug), "{title:?} -> {slug:?}");
        }
    }

    #[test]
    fn allocation_counts_up_from_base() {
        let mut taken: HashSet<String> = HashSet::new();
        let mut allocated = Vec::new();
        for _ in 0..4 {
            let slug = allocate_unique("hello-world", |s| taken.contains(s));
            taken.insert(slug.clone());
            allocated.push(slug);
        }
        assert_eq!(
            allocated,
            vec!["hello-world", "hello-world-1", "hello-world-2", "hello-world-3"]
        );
    }

    #[test]
    fn allocation_fills_the_first_gap() {
        let taken: HashSet<&str> = ["post", "post-1", "post-3"].into_iter().collect();
        assert_eq!(allocate_unique("post", |s| taken.contains(s)), "post-2");
        assert_eq!(allocate_unique("fresh", |s| taken.contains(s)), "fresh");
    }

    #[tokio::test]
    async fn backfill_assigns_distinct_slugs_once() {
        let path = std::env::temp_dir().join(format!("folio_test_{}.db", Uuid::now_v7()));
        let storage = Storage::open(&path).await.unwrap();

        // Legacy rows are written without a slug through a second connection.
        let db = libsql::Builder::new_local(&path).build().await.unwrap();
        let conn = db.connect().unwrap();
        for title in ["Old Post", "Old Post", "???"] {
            conn.execute(
                "INSERT INTO items (id, title, content, date) VALUES (?1, ?2, '<p/>', 'unknown')",
                libsql::params![Uuid::now_v7().to_string(), title],
            )
            .await
            .unwrap();
        }

        assert_eq!(backfill_missing_slugs(&storage).await.unwrap(), 3);
        assert_eq!(backfill_missing_slugs(&storage).await.unwrap(), 0);

        for slug in ["old-post", "old-post-1", "item"] {
            assert!(storage.slug_exists(slug).await.unwrap(), "{slug}");
        }
        assert_eq!(storage.count_items().await.unwrap(), 3);
    }
}
