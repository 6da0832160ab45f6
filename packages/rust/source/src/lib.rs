//! Notion as a page source.
//!
//! [`NotionClient`] fetches a page and its full block tree over the public
//! REST API; [`blocks_to_markdown`] flattens that tree into CommonMark.

mod block;
mod client;
mod markdown;

use std::sync::LazyLock;

use folio_shared::{FolioError, Result};
use regex::Regex;
use url::Url;

pub use block::{Block, NotionPage};
pub use client::NotionClient;
pub use markdown::blocks_to_markdown;

/// Normalize a user-supplied page reference to the dashed, lowercase UUID
/// form the API expects.
///
/// Accepts a bare 32-hex id, a dashed UUID, or a Notion URL whose last path
/// segment ends in the id (`…/My-Page-0123abcd…`).
pub fn normalize_page_id(input: &str) -> Result<String> {
    static TRAILING_ID: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"([0-9a-fA-F]{32})$").expect("valid regex"));

    let input = input.trim();
    let invalid = || FolioError::fetch(format!("'{input}' is not a valid Notion page id or URL"));

    let compact = if input.contains("://") {
        let url = Url::parse(input).map_err(|_| invalid())?;
        let segment = url
            .path_segments()
            .and_then(|mut segments| segments.rfind(|s| !s.is_empty()))
            .ok_or_else(invalid)?;
        let stripped = segment.replace('-', "");
        TRAILING_ID
            .captures(&stripped)
            .map(|c| c[1].to_string())
            .ok_or_else(invalid)?
    } else {
        let stripped = input.replace('-', "");
        if stripped.len() != 32 || !TRAILING_ID.is_match(&stripped) {
            return Err(invalid());
        }
        stripped
    };

    let hex = compact.to_ascii_lowercase();
    Ok(format!(
        "{}-{}-{}-{}-{}",
        &hex[0..8],
        &hex[8..12],
        &hex[12..16],
        &hex[16..20],
        &hex[20..32]
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    const DASHED: &str = "0123abcd-4567-89ef-0123-456789abcdef";

    #[test]
    fn bare_and_dashed_ids() {
        assert_eq!(
            normalize_page_id("0123ABCD456789ef0123456789abcdef").unwrap(),
            DASHED
        );
        assert_eq!(normalize_page_id(&format!("  {DASHED} ")).unwrap(), DASHED);
    }

    #[test]
    fn notion_urls() {
        let urls = [
            "https://www.notion.so/acme/Hello-World-0123abcd456789ef0123456789abcdef",
            "https://www.notion.so/0123abcd456789ef0123456789abcdef?v=1234",
            "https://acme.notion.site/Hello-0123abcd456789ef0123456789abcdef/",
        ];
        for url in urls {
            assert_eq!(normalize_page_id(url).unwrap(), DASHED, "{url}");
        }
    }

    #[test]
    fn rejects_garbage() {
        for input in ["", "hello", "0123abcd", "https://www.notion.so/acme/Hello-World"] {
            let err = normalize_page_id(input).unwrap_err();
            assert!(matches!(err, FolioError::Fetch { .. }), "{input}");
        }
    }
}
