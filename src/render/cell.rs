//! Table cell formatting.
//!
//! Every cell renders to a single line: line breaks become `<br/>` and pipes
//! are escaped so the table row structure cannot break.

use crate::links;
use crate::model::Cell;
use regex::Regex;
use std::sync::LazyLock;

static RE_LIST_ITEM: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[-*]\s+(.+)$").unwrap());

/// Whether and when a long cell is folded into a `<details>` element.
#[derive(Debug, Clone, Copy, Default)]
pub struct Collapse {
    pub enabled: bool,
    pub threshold: usize,
}

impl Collapse {
    fn applies(&self, raw: &str) -> bool {
        self.enabled && raw.chars().count() > self.threshold && raw.trim().lines().count() > 1
    }
}

/// Format one cell for a Markdown table row.
pub fn format_cell(cell: &Cell, collapse: Collapse) -> String {
    match cell {
        Cell::Empty => String::new(),
        Cell::Link { text, href } => escape_pipes(&links::markdown_link(text, href)),
        Cell::Code(raw) => collapsed(&normalize_newlines(raw), collapse, code),
        Cell::Text(raw) => collapsed(&normalize_newlines(raw), collapse, description),
        Cell::List(items) => list(items),
        Cell::Markup(raw) => escape_pipes(&normalize_newlines(raw).replace('\n', "<br/>")),
    }
}

/// CRLF sources leave `\r` in expressions; a lone CR also ends a table row.
fn normalize_newlines(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

/// Keep the first line visible and fold the rest.
fn collapsed(raw: &str, collapse: Collapse, format: fn(&str) -> String) -> String {
    if !collapse.applies(raw) {
        return format(raw);
    }
    let trimmed = raw.trim();
    let (first, rest) = trimmed.split_once('\n').unwrap_or((trimmed, ""));
    format!(
        "<details><summary>{}</summary>{}</details>",
        format(first),
        format(rest)
    )
}

/// Source text in a `<pre>` element.
fn code(raw: &str) -> String {
    let escaped = html_escape(raw.trim_end()).replace('|', "&#124;");
    format!("<pre>{}</pre>", escaped.replace('\n', "<br/>"))
}

/// Free text: lines trimmed and joined with `<br/>`, runs of `- item` lines as
/// an HTML list.
fn description(raw: &str) -> String {
    let mut out = String::new();
    let mut in_list = false;
    let mut previous = false;
    for line in raw.trim().lines().map(str::trim) {
        match RE_LIST_ITEM.captures(line) {
            Some(caps) => {
                if !in_list {
                    if previous {
                        out.push_str("<br/>");
                    }
                    out.push_str("<ul>");
                    in_list = true;
                }
                out.push_str("<li>");
                out.push_str(&caps[1]);
                out.push_str("</li>");
            }
            None => {
                if in_list {
                    out.push_str("</ul>");
                    in_list = false;
                } else if previous {
                    out.push_str("<br/>");
                }
                out.push_str(line);
            }
        }
        previous = true;
    }
    if in_list {
        out.push_str("</ul>");
    }
    escape_pipes(&out)
}

fn list(items: &[String]) -> String {
    if items.is_empty() {
        return String::new();
    }
    let items: String = items
        .iter()
        .map(|item| format!("<li>{}</li>", normalize_newlines(item.trim()).replace('\n', "<br/>")))
        .collect();
    escape_pipes(&format!("<ul>{items}</ul>"))
}

fn escape_pipes(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut escaped = false;
    for c in text.chars() {
        if c == '|' && !escaped {
            out.push('\\');
        }
        escaped = c == '\\' && !escaped;
        out.push(c);
    }
    out
}

fn html_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
