//! Page header injection: title heading, author/date caption and the MathJax
//! loader, prepended to the rendered body.

use ego_tree::{NodeMut, NodeRef};
use folio_shared::UNKNOWN_DATE;
use scraper::{Html, Node};

/// `id` of the injected MathJax `<script>`.
pub const MATHJAX_SCRIPT_ID: &str = "MathJax-script";

/// MathJax v3 bundle with TeX input and CommonHTML output.
pub const MATHJAX_SRC: &str = "https://cdn.jsdelivr.net/npm/mathjax@3/es5/tex-mml-chtml.js";

/// What goes into the injected header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderMeta {
    pub title: String,
    pub author: String,
    /// Source creation timestamp, usually ISO-8601.
    pub created_at: Option<String>,
}

/// Calendar part of a creation timestamp.
///
/// `"2024-01-15T10:30:00.000Z"` → `"2024-01-15"`; a value without `T` is kept
/// as is; a missing or blank value becomes `"unknown"`.
pub fn caption_date(created_at: Option<&str>) -> String {
    match created_at.map(str::trim) {
        None | Some("") => UNKNOWN_DATE.to_string(),
        Some(value) => match value.split_once('T') {
            Some((date, _)) => date.to_string(),
            None => value.to_string(),
        },
    }
}

/// Prepend the header to `html`.
///
/// The fragment root's first three children become, in order, the
/// `h1.heading-primary` title, the `<i>` caption and the MathJax `<script>`.
/// Title and author always land as text, never as markup.
pub fn inject(html: &str, meta: &HeaderMeta) -> String {
    let mut doc = Html::parse_fragment(html);
    let header = Html::parse_fragment(&header_markup(meta));

    let root_id = doc.root_element().id();
    let header_nodes: Vec<NodeRef<'_, Node>> = header.root_element().children().collect();

    if let Some(mut root) = doc.tree.get_mut(root_id) {
        for node in header_nodes.into_iter().rev() {
            let copy = root.prepend(node.value().clone());
            graft_children(node, copy);
        }
    }

    tracing::debug!(title = %meta.title, "injected page header");
    doc.root_element().inner_html()
}

fn header_markup(meta: &HeaderMeta) -> String {
    format!(
        r#"<h1 class="heading-primary">{title}</h1><i>{author} {date}</i><script id="{MATHJAX_SCRIPT_ID}" src="{MATHJAX_SRC}" async="async"></script>"#,
        title = escape_text(&meta.title),
        author = escape_text(&meta.author),
        date = escape_text(&caption_date(meta.created_at.as_deref())),
    )
}

/// Copy the children of `src` (from another tree) under `dst`.
fn graft_children(src: NodeRef<'_, Node>, mut dst: NodeMut<'_, Node>) {
    for child in src.children() {
        let copy = dst.append(child.value().clone());
        graft_children(child, copy);
    }
}

fn escape_text(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::{ElementRef, Selector};

    fn meta(title: &str, author: &str, created_at: Option<&str>) -> HeaderMeta {
        HeaderMeta {
            title: title.into(),
            author: author.into(),
            created_at: created_at.map(String::from),
        }
    }

    /// The first three element children of the fragment root.
    fn leading_elements(doc: &Html) -> Vec<ElementRef<'_>> {
        doc.root_element()
            .children()
            .filter_map(ElementRef::wrap)
            .take(3)
            .collect()
    }

    #[test]
    fn caption_date_variants() {
        assert_eq!(caption_date(Some("2024-01-15T10:30:00.000Z")), "2024-01-15");
        assert_eq!(caption_date(Some("2024-01-15")), "2024-01-15");
        assert_eq!(caption_date(Some("   ")), "unknown");
        assert_eq!(caption_date(None), "unknown");
    }

    #[test]
    fn header_comes_first() {
        let out = inject(
            "<p>Body</p><p>More</p>",
            &meta("Hello World", "Jamie Z", Some("2024-01-15T10:30:00.000Z")),
        );
        let doc = Html::parse_fragment(&out);
        let first = leading_elements(&doc);

        assert_eq!(first[0].value().name(), "h1");
        assert_eq!(first[0].value().attr("class"), Some("heading-primary"));
        assert_eq!(first[0].text().collect::<String>(), "Hello World");

        assert_eq!(first[1].value().name(), "i");
        assert_eq!(first[1].text().collect::<String>(), "Jamie Z 2024-01-15");

        assert_eq!(first[2].value().name(), "script");
        assert_eq!(first[2].value().attr("id"), Some(MATHJAX_SCRIPT_ID));
        assert_eq!(first[2].value().attr("src"), Some(MATHJAX_SRC));
        assert_eq!(first[2].value().attr("async"), Some("async"));

        // Original content follows, in order.
        let sel = Selector::parse("p").unwrap();
        let paragraphs: Vec<String> = doc
            .select(&sel)
            .map(|p| p.text().collect())
            .collect();
        assert_eq!(paragraphs, vec!["Body", "More"]);
    }

    #[test]
    fn header_on_empty_fragment() {
        let out = inject("", &meta("Empty", "Ada", None));
        let doc = Html::parse_fragment(&out);
        let first = leading_elements(&doc);
        assert_eq!(first.len(), 3);
        assert_eq!(first[1].text().collect::<String>(), "Ada unknown");
    }

    #[test]
    fn header_before_leading_text_node() {
        let out = inject("loose text<p>x</p>", &meta("T", "A", None));
        assert!(out.starts_with("<h1"));
        assert!(out.ends_with("loose text<p>x</p>"));
    }

    #[test]
    fn title_and_author_are_escaped() {
        let out = inject(
            "<p>x</p>",
            &meta("<script>alert(1)</script> & co", "<b>Eve</b>", None),
        );
        let doc = Html::parse_fragment(&out);
        let first = leading_elements(&doc);

        assert_eq!(
            first[0].text().collect::<String>(),
            "<script>alert(1)</script> & co"
        );
        assert_eq!(first[0].children().count(), 1);
        assert_eq!(first[1].text().collect::<String>(), "<b>Eve</b> unknown");

        let scripts = Selector::parse("script").unwrap();
        assert_eq!(doc.select(&scripts).count(), 1);
    }
}
