//! Markdown → HTML rendering.

use pulldown_cmark::{Options, Parser, html};
use tracing::instrument;

/// Render CommonMark with tables, strikethrough and task lists.
///
/// Raw HTML in the input passes through. `$` spans are left as literal text
/// for [`crate::rewrite_math`] to pick up.
#[instrument(skip(markdown), fields(len = markdown.len()))]
pub fn render_markdown(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);

    let parser = Parser::new_ext(markdown, options);
    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_headings_and_paragraphs() {
        let out = render_markdown("# Title\n\nSome *text*.");
        assert!(out.contains("<h1>Title</h1>"));
        assert!(out.contains("<p>Some <em>text</em>.</p>"));
    }

    #[test]
    fn renders_extensions() {
        let out = render_markdown("| a | b |\n|---|---|\n| 1 | 2 |\n\n~~gone~~\n\n- [x] done\n");
        assert!(out.contains("<table>"));
        assert!(out.contains("<del>gone</del>"));
        assert!(out.contains("checkbox"));
    }

    #[test]
    fn dollar_spans_stay_literal() {
        let out = render_markdown("Euler: $e^{i\\pi} = -1$");
        assert!(out.contains("$e^{i\\pi} = -1$"));
    }

    #[test]
    fn code_blocks_are_escaped() {
        let out = render_markdown("```rust\nlet x = \"$y\" < 2;\n```");
        assert!(out.contains("<pre><code class=\"language-rust\">"));
        assert!(out.contains("&lt; 2"));
    }

    #[test]
    fn empty_input_renders_nothing() {
        assert_eq!(render_markdown(""), "");
    }
}
