//! Math delimiter rewriting.
//!
//! Markdown leaves TeX spans as literal `$…$` and `$$…$$` text. MathJax's
//! default configuration only recognizes `\(…\)` and `\[…\]`, so every text
//! node outside code-like elements is rewritten into those forms.

use ego_tree::{NodeId, NodeRef};
use scraper::{Html, Node};
use tracing::debug;

/// Elements whose subtree is left byte-for-byte untouched.
pub const SKIP_TAGS: [&str; 7] = ["code", "pre", "script", "style", "math", "svg", "textarea"];

/// Rewrite math delimiters in every eligible text node of `html`.
///
/// When no text node needs rewriting the input is returned unchanged, so
/// unparseable or math-free markup passes through verbatim.
pub fn rewrite(html: &str) -> String {
    let mut doc = Html::parse_fragment(html);

    let mut pending: Vec<(NodeId, String)> = Vec::new();
    collect_rewrites(doc.tree.root(), &mut pending);

    if pending.is_empty() {
        return html.to_string();
    }

    debug!(nodes = pending.len(), "rewriting math delimiters");

    for (id, replacement) in &pending {
        if let Some(mut node) = doc.tree.get_mut(*id) {
            if let Node::Text(text) = node.value() {
                text.text = replacement.as_str().into();
            }
        }
    }

    doc.root_element().inner_html()
}

/// Rewrite the delimiters in a single text run, or `None` if it has no `$`.
///
/// `$$` spans are handled first and their contents are never split on single
/// `$`; the text between them then gets the inline rule, so
/// `"$$a$$ and $b$"` yields both a display and an inline span rather than
/// leaving `$b$` bare as a split on `$$` alone would. Pairing is
/// positional, so an unmatched trailing marker still wraps the rest of the
/// run.
pub fn rewrite_text(text: &str) -> Option<String> {
    if !text.contains('$') {
        return None;
    }
    if !text.contains("$$") {
        return Some(wrap_inline(text));
    }

    let mut out = String::with_capacity(text.len() + 8);
    for (i, segment) in text.split("$$").enumerate() {
        if i % 2 == 1 {
            out.push_str(r"\[");
            out.push_str(segment);
            out.push_str(r"\]");
        } else {
            out.push_str(&wrap_inline(segment));
        }
    }
    Some(out)
}

fn wrap_inline(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 4);
    for (i, segment) in text.split('$').enumerate() {
        if i % 2 == 1 {
            out.push_str(r"\(");
            out.push_str(segment);
            out.push_str(r"\)");
        } else {
            out.push_str(segment);
        }
    }
    out
}

/// Depth-first walk that never enters a skip-tagged element.
fn collect_rewrites(node: NodeRef<'_, Node>, out: &mut Vec<(NodeId, String)>) {
    for child in node.children() {
        match child.value() {
            Node::Text(text) => {
                if let Some(rewritten) = rewrite_text(&text.text) {
                    out.push((child.id(), rewritten));
                }
            }
            Node::Element(el) if SKIP_TAGS.contains(&el.name()) => {}
            _ => collect_rewrites(child, out),
        }
    }
}
