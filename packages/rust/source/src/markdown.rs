//! Block tree → CommonMark.
//!
//! Blocks are separated by blank lines, consecutive list items by single
//! newlines. Children of list items are indented four spaces; children of
//! other blocks follow at the same level.

use serde_json::Value;
use tracing::debug;

use crate::block::Block;

const LIST_INDENT: &str = "    ";

/// Convert a fetched block tree to markdown. An empty tree yields `""`.
pub fn blocks_to_markdown(blocks: &[Block]) -> String {
    let mut out = render_blocks(blocks);
    if !out.is_empty() {
        out.push('\n');
    }
    out
}

fn render_blocks(blocks: &[Block]) -> String {
    let mut out = String::new();
    let mut prev_was_list = false;
    let mut number = 0u32;

    for block in blocks {
        let is_list = is_list_item(&block.kind);
        number = if block.kind == "numbered_list_item" {
            number + 1
        } else {
            0
        };

        let Some(text) = render_block(block, number) else {
            continue;
        };

        if !out.is_empty() {
            out.push_str(if prev_was_list && is_list { "\n" } else { "\n\n" });
        }
        out.push_str(&text);
        prev_was_list = is_list;
    }
    out
}

fn is_list_item(kind: &str) -> bool {
    matches!(kind, "bulleted_list_item" | "numbered_list_item" | "to_do")
}

/// Render one block and its children, or `None` for kinds that produce nothing.
fn render_block(block: &Block, number: u32) -> Option<String> {
    let p = &block.payload;
    let head = match block.kind.as_str() {
        "paragraph" => rich_text(&p["rich_text"]),
        "heading_1" => format!("# {}", rich_text(&p["rich_text"])),
        "heading_2" => format!("## {}", rich_text(&p["rich_text"])),
        "heading_3" => format!("### {}", rich_text(&p["rich_text"])),
        "bulleted_list_item" => format!("- {}", rich_text(&p["rich_text"])),
        "numbered_list_item" => format!("{number}. {}", rich_text(&p["rich_text"])),
        "to_do" => {
            let mark = if p["checked"].as_bool().unwrap_or(false) { 'x' } else { ' ' };
            format!("- [{mark}] {}", rich_text(&p["rich_text"]))
        }
        "quote" => quote_lines(&rich_text(&p["rich_text"])),
        "callout" => {
            let text = rich_text(&p["rich_text"]);
            let line = match p.pointer("/icon/emoji").and_then(Value::as_str) {
                Some(emoji) => format!("{emoji} {text}"),
                None => text,
            };
            quote_lines(&line)
        }
        "toggle" => rich_text(&p["rich_text"]),
        "code" => {
            let language = match p["language"].as_str() {
                Some("plain text") | None => "",
                Some(lang) => lang,
            };
            format!("```{language}\n{}\n```", plain_text(&p["rich_text"]))
        }
        "equation" => {
            let expr = p["expression"].as_str().unwrap_or_default();
            format!("$${}$$", escape_tex(expr))
        }
        "divider" => "---".to_string(),
        "image" => {
            let url = file_url(p)?;
            format!("![{}]({url})", plain_text(&p["caption"]))
        }
        "bookmark" | "embed" | "link_preview" => {
            let url = p["url"].as_str()?;
            let caption = plain_text(&p["caption"]);
            let label = if caption.is_empty() { url } else { caption.as_str() };
            format!("[{label}]({url})")
        }
        "child_page" => format!("**{}**", p["title"].as_str().unwrap_or_default()),
        "table" => return table(block),
        other => {
            debug!(kind = other, id = %block.id, "skipping unsupported block");
            return None;
        }
    };

    if block.children.is_empty() {
        return if head.is_empty() { None } else { Some(head) };
    }

    let children = render_blocks(&block.children);
    if children.is_empty() {
        return Some(head);
    }

    if is_list_item(&block.kind) {
        Some(format!("{head}\n{}", indent(&children)))
    } else if head.is_empty() {
        Some(children)
    } else {
        Some(format!("{head}\n\n{children}"))
    }
}

/// Rich-text runs with annotations, links and inline equations.
fn rich_text(runs: &Value) -> String {
    let Some(runs) = runs.as_array() else {
        return String::new();
    };

    let mut out = String::new();
    for run in runs {
        if run["type"] == "equation" {
            let expr = run.pointer("/equation/expression").and_then(Value::as_str);
            out.push('$');
            out.push_str(&escape_tex(expr.unwrap_or_default()));
            out.push('$');
            continue;
        }

        let text = run_plain(run);
        if text.trim().is_empty() {
            out.push_str(text);
            continue;
        }

        let a = &run["annotations"];
        let mut piece = text.to_string();
        if a["code"].as_bool().unwrap_or(false) {
            piece = format!("`{piece}`");
        }
        if a["bold"].as_bool().unwrap_or(false) {
            piece = format!("**{piece}**");
        }
        if a["italic"].as_bool().unwrap_or(false) {
            piece = format!("_{piece}_");
        }
        if a["strikethrough"].as_bool().unwrap_or(false) {
            piece = format!("~~{piece}~~");
        }

        let link = run["href"]
            .as_str()
            .or_else(|| run.pointer("/text/link/url").and_then(Value::as_str));
        match link {
            Some(url) => out.push_str(&format!("[{piece}]({url})")),
            None => out.push_str(&piece),
        }
    }
    out
}

/// Backslash-escape every ASCII punctuation character so the CommonMark
/// renderer hands the TeX source back verbatim as text.
fn escape_tex(expr: &str) -> String {
    let mut out = String::with_capacity(expr.len() * 2);
    for c in expr.chars() {
        if c.is_ascii_punctuation() {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Concatenated text of the runs, without any markup.
fn plain_text(runs: &Value) -> String {
    runs.as_array()
        .map(|runs| runs.iter().map(run_plain).collect())
        .unwrap_or_default()
}

fn run_plain(run: &Value) -> &str {
    run["plain_text"]
        .as_str()
        .or_else(|| run.pointer("/text/content").and_then(Value::as_str))
        .unwrap_or_default()
}

/// URL of a file object (`external` or Notion-hosted `file`).
fn file_url(payload: &Value) -> Option<&str> {
    let source = payload["type"].as_str()?;
    payload[source]["url"].as_str()
}

fn quote_lines(text: &str) -> String {
    text.lines()
        .map(|line| format!("> {line}"))
        .collect::<Vec<_>>()
        .join("\n")
}

fn indent(text: &str) -> String {
    text.lines()
        .map(|line| {
            if line.is_empty() {
                String::new()
            } else {
                format!("{LIST_INDENT}{line}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// `table` with `table_row` children; the first row is the header.
fn table(block: &Block) -> Option<String> {
    let rows: Vec<Vec<String>> = block
        .children
        .iter()
        .filter(|child| child.kind == "table_row")
        .map(|row| {
            row.payload["cells"]
                .as_array()
                .map(|cells| {
                    cells
                        .iter()
                        .map(|cell| rich_text(cell).replace('|', "\\|"))
                        .collect()
                })
                .unwrap_or_default()
        })
        .collect();

    let width = rows.iter().map(Vec::len).max().unwrap_or(0);
    if width == 0 {
        return None;
    }

    let line = |cells: &[String]| {
        let mut padded: Vec<&str> = cells.iter().map(String::as_str).collect();
        padded.resize(width, "");
        format!("| {} |", padded.join(" | "))
    };

    let separator = vec!["---".to_string(); width];
    let mut lines = vec![line(rows[0].as_slice()), line(separator.as_slice())];
    lines.extend(rows[1..].iter().map(|row| line(row.as_slice())));
    Some(lines.join("\n"))
}
