//! Post bodies are block documents produced by the browser editor:
//! `{ "time": .., "blocks": [ { "type": "paragraph", "data": { .. } } ], "version": .. }`.
//!
//! The server stores the document verbatim (JSONB) and only needs to check
//! its outer shape, render it to escaped HTML and derive a text excerpt.

use serde::Deserialize;
use serde_json::Value;

/// Number of characters kept by [`excerpt`] before the ellipsis.
pub const EXCERPT_LENGTH: usize = 75;

#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Paragraph { text: String },
    Header { text: String, level: u8 },
    List { ordered: bool, items: Vec<String> },
    Code { code: String },
    Image { url: String, caption: String },
    Link { url: String },
    Embed { url: String, caption: String },
    Table { rows: Vec<Vec<String>> },
    /// Block types this renderer does not know; kept so documents round-trip.
    Unknown { kind: String },
}

#[derive(Debug, Deserialize)]
struct RawBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    data: Value,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    pub blocks: Vec<Block>,
}

fn text_of(data: &Value, key: &str) -> String {
    data.get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

// List items are plain strings in older editor versions and
// `{ "content": .., "items": [..] }` objects in newer ones.
fn list_item_text(item: &Value) -> String {
    match item {
        Value::String(s) => s.clone(),
        Value::Object(_) => text_of(item, "content"),
        _ => String::new(),
    }
}

impl Block {
    fn from_raw(raw: RawBlock) -> Self {
        let data = &raw.data;
        match raw.kind.as_str() {
            "paragraph" => Block::Paragraph {
                text: text_of(data, "text"),
            },
            "header" => Block::Header {
                text: text_of(data, "text"),
                level: data
                    .get("level")
                    .and_then(Value::as_u64)
                    .map(|level| level.clamp(1, 6) as u8)
                    .unwrap_or(2),
            },
            "list" => Block::List {
                ordered: data.get("style").and_then(Value::as_str) == Some("ordered"),
                items: data
                    .get("items")
                    .and_then(Value::as_array)
                    .map(|items| items.iter().map(list_item_text).collect())
                    .unwrap_or_default(),
            },
            "code" => Block::Code {
                code: text_of(data, "code"),
            },
            "image" | "ImageTool" => Block::Image {
                url: data
                    .get("file")
                    .map(|file| text_of(file, "url"))
                    .unwrap_or_default(),
                caption: text_of(data, "caption"),
            },
            "linkTool" | "LinkTool" => Block::Link {
                url: text_of(data, "link"),
            },
            "embed" => Block::Embed {
                url: data
                    .get("source")
                    .or_else(|| data.get("embed"))
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                caption: text_of(data, "caption"),
            },
            "table" => Block::Table {
                rows: data
                    .get("content")
                    .and_then(Value::as_array)
                    .map(|rows| {
                        rows.iter()
                            .map(|row| {
                                row.as_array()
                                    .map(|cells| {
                                        cells
                                            .iter()
                                            .map(|c| c.as_str().unwrap_or_default().to_string())
                                            .collect()
                                    })
                                    .unwrap_or_default()
                            })
                            .collect()
                    })
                    .unwrap_or_default(),
            },
            other => Block::Unknown {
                kind: other.to_string(),
            },
        }
    }

    fn plain_text(&self) -> Option<String> {
        match self {
            Block::Paragraph { text } | Block::Header { text, .. } => Some(strip_tags(text)),
            Block::List { items, .. } => Some(
                items
                    .iter()
                    .map(|item| strip_tags(item))
                    .collect::<Vec<_>>()
                    .join(" "),
            ),
            Block::Code { code } => Some(code.clone()),
            _ => None,
        }
    }

    fn render_into(&self, html: &mut String) {
        match self {
            Block::Paragraph { text } => {
                html.push_str("<p>");
                html.push_str(&escape_html(&strip_tags(text)));
                html.push_str("</p>");
            }
            Block::Header { text, level } => {
                html.push_str(&format!(
                    "<h{level}>{}</h{level}>",
                    escape_html(&strip_tags(text))
                ));
            }
            Block::List { ordered, items } => {
                let tag = if *ordered { "ol" } else { "ul" };
                html.push_str(&format!("<{tag}>"));
                for item in items {
                    html.push_str("<li>");
                    html.push_str(&escape_html(&strip_tags(item)));
                    html.push_str("</li>");
                }
                html.push_str(&format!("</{tag}>"));
            }
            Block::Code { code } => {
                html.push_str("<pre><code>");
                html.push_str(&escape_html(code));
                html.push_str("</code></pre>");
            }
            Block::Image { url, caption } => {
                if is_http_url(url) {
                    html.push_str(&format!(
                        "<figure><img src=\"{}\" alt=\"{}\"><figcaption>{}</figcaption></figure>",
                        escape_html(url),
                        escape_html(caption),
                        escape_html(&strip_tags(caption))
                    ));
                }
            }
            Block::Link { url } | Block::Embed { url, .. } => {
                if is_http_url(url) {
                    html.push_str(&format!(
                        "<p><a href=\"{0}\" rel=\"nofollow noopener\">{0}</a></p>",
                        escape_html(url)
                    ));
                }
            }
            Block::Table { rows } => {
                html.push_str("<table>");
                for row in rows {
                    html.push_str("<tr>");
                    for cell in row {
                        html.push_str("<td>");
                        html.push_str(&escape_html(&strip_tags(cell)));
                        html.push_str("</td>");
                    }
                    html.push_str("</tr>");
                }
                html.push_str("</table>");
            }
            Block::Unknown { .. } => {}
        }
    }
}

impl Document {
    /// Checks the outer shape: an object holding a `blocks` array whose
    /// entries each name a `type`.
    pub fn validate_value(value: &Value) -> Result<(), String> {
        let blocks = value
            .as_object()
            .and_then(|object| object.get("blocks"))
            .and_then(Value::as_array)
            .ok_or_else(|| "Content must be an object with a blocks array".to_string())?;

        if blocks
            .iter()
            .all(|block| block.get("type").and_then(Value::as_str).is_some())
        {
            Ok(())
        } else {
            Err("Every content block needs a type".to_string())
        }
    }

    /// Parses a stored document; anything malformed yields an empty document.
    pub fn from_value(value: Option<&Value>) -> Self {
        let blocks = value
            .and_then(|value| value.get("blocks"))
            .and_then(Value::as_array)
            .map(|blocks| {
                blocks
                    .iter()
                    .filter_map(|block| serde_json::from_value::<RawBlock>(block.clone()).ok())
                    .map(Block::from_raw)
                    .collect()
            })
            .unwrap_or_default();

        Self { blocks }
    }

    pub fn to_html(&self) -> String {
        let mut html = String::new();
        for block in &self.blocks {
            block.render_into(&mut html);
        }
        html
    }

    pub fn plain_text(&self) -> String {
        self.blocks
            .iter()
            .filter_map(Block::plain_text)
            .filter(|text| !text.trim().is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Shortens `text` to [`EXCERPT_LENGTH`] characters, appending `...` when cut.
pub fn excerpt(text: &str) -> String {
    if text.chars().count() <= EXCERPT_LENGTH {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(EXCERPT_LENGTH).collect();
    cut.push_str("...");
    cut
}

pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

/// Drops inline markup (`<b>`, `<a href>`, ...) and decodes `&nbsp;`.
fn strip_tags(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut in_tag = false;
    for c in input.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out.replace("&nbsp;", " ")
}

fn is_http_url(url: &str) -> bool {
    url.starts_with("https://") || url.starts_with("http://")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Value {
        json!({
            "time": 1700000000000u64,
            "blocks": [
                { "type": "header", "data": { "text": "Intro", "level": 2 } },
                { "type": "paragraph", "data": { "text": "Hello <b>world</b> & friends" } },
                { "type": "list", "data": { "style": "ordered", "items": ["one", { "content": "two", "items": [] }] } },
                { "type": "code", "data": { "code": "fn main() {}" } },
                { "type": "image", "data": { "file": { "url": "javascript:alert(1)" }, "caption": "x" } },
                { "type": "checklist", "data": { "items": [] } }
            ],
            "version": "2.28.0"
        })
    }

    #[test]
    fn parses_known_and_unknown_blocks() {
        let doc = Document::from_value(Some(&sample()));
        assert_eq!(doc.blocks.len(), 6);
        assert_eq!(
            doc.blocks[2],
            Block::List {
                ordered: true,
                items: vec!["one".to_string(), "two".to_string()]
            }
        );
        assert_eq!(
            doc.blocks[5],
            Block::Unknown {
                kind: "checklist".to_string()
            }
        );
    }

    #[test]
    fn renders_escaped_html_and_skips_unsafe_urls() {
        let html = Document::from_value(Some(&sample())).to_html();
        assert!(html.contains("<h2>Intro</h2>"));
        assert!(html.contains("<p>Hello world &amp; friends</p>"));
        assert!(html.contains("<ol><li>one</li><li>two</li></ol>"));
        assert!(!html.contains("javascript:"));
    }

    #[test]
    fn plain_text_and_excerpt() {
        let doc = Document::from_value(Some(&sample()));
        assert_eq!(
            doc.plain_text(),
            "Intro Hello world & friends one two fn main() {}"
        );

        let long = "a".repeat(80);
        let cut = excerpt(&long);
        assert_eq!(cut.len(), EXCERPT_LENGTH + 3);
        assert!(cut.ends_with("..."));
        assert_eq!(excerpt("short"), "short");
    }

    #[test]
    fn validates_outer_shape() {
        assert!(Document::validate_value(&json!({ "blocks": [] })).is_ok());
        assert!(Document::validate_value(&json!({ "blocks": [{ "data": {} }] })).is_err());
        assert!(Document::validate_value(&json!([1, 2, 3])).is_err());
        assert!(Document::validate_value(&json!({ "time": 1 })).is_err());
    }

    #[test]
    fn missing_or_malformed_content_is_empty() {
        assert!(Document::from_value(None).blocks.is_empty());
        assert!(Document::from_value(Some(&json!("text"))).blocks.is_empty());
    }
}
