//! HTML production and post-processing for ingested pages.
//!
//! Three independent passes, applied by the pipeline in a fixed order:
//! 1. [`render_markdown`]: markdown → HTML fragment
//! 2. [`rewrite_math`]: `$…$` / `$$…$$` → MathJax delimiters outside code
//! 3. [`inject_metadata`]: prepend the title heading, caption and MathJax loader
//!
//! None of the passes can fail: the HTML5 parser recovers from any input.

mod math;
mod metadata;
mod render;

pub use math::{SKIP_TAGS, rewrite as rewrite_math, rewrite_text};
pub use metadata::{HeaderMeta, MATHJAX_SCRIPT_ID, MATHJAX_SRC, caption_date, inject as inject_metadata};
pub use render::render_markdown;
