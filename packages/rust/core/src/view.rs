//! Template view of a stored item.
//!
//! Stored content is treated as a `tera` template with a single variable,
//! `item`. Whoever exposes this step grants stored markup template
//! execution rights.

use std::error::Error as _;

use folio_shared::{FolioError, Item, Result};
use tera::{Context, Tera};

/// Render `item.content` as a template with `item` bound, autoescaping on.
pub fn render_item(item: &Item) -> Result<String> {
    let mut context = Context::new();
    context.insert("item", item);

    Tera::one_off(&item.content, &context, true).map_err(|e| {
        let mut message = format!("template for '{}' failed: {e}", item.slug);
        let mut source = e.source();
        while let Some(cause) = source {
            message.push_str(&format!(": {cause}"));
            source = cause.source();
        }
        FolioError::render(message)
    })
}
