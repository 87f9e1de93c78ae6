//! Structured rich text
//!
//! Blocks carry plain text plus spans over character offsets. They are
//! rendered to plain text for reading-time estimation and to HTML for post
//! pages.

use serde::{Deserialize, Serialize};

use crate::helpers::escape_html;

/// Kind of a rich-text block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockKind {
    #[serde(rename = "paragraph")]
    Paragraph,
    #[serde(rename = "heading1")]
    Heading1,
    #[serde(rename = "heading2")]
    Heading2,
    #[serde(rename = "heading3")]
    Heading3,
    #[serde(rename = "heading4")]
    Heading4,
    #[serde(rename = "heading5")]
    Heading5,
    #[serde(rename = "heading6")]
    Heading6,
    #[serde(rename = "preformatted")]
    Preformatted,
    #[serde(rename = "list-item")]
    ListItem,
    #[serde(rename = "o-list-item")]
    OrderedListItem,
    #[serde(rename = "image")]
    Image,
    #[serde(rename = "embed")]
    Embed,
    #[serde(other)]
    Unknown,
}

/// Kind of an inline span
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpanKind {
    #[serde(rename = "strong")]
    Strong,
    #[serde(rename = "em")]
    Em,
    #[serde(rename = "hyperlink")]
    Hyperlink,
    #[serde(rename = "label")]
    Label,
    #[serde(other)]
    Unknown,
}

/// Inline formatting over `text[start..end]`, offsets in characters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    #[serde(rename = "type")]
    pub kind: SpanKind,
    #[serde(default)]
    pub data: serde_json::Value,
}

/// A single block of structured text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RichTextBlock {
    #[serde(rename = "type")]
    pub kind: BlockKind,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub spans: Vec<Span>,
    /// Image source
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub alt: Option<String>,
    /// Embed payload (`html`, `embed_url`, `type`)
    #[serde(default)]
    pub oembed: Option<serde_json::Value>,
}

impl RichTextBlock {
    /// A plain paragraph with no spans
    pub fn paragraph(text: &str) -> Self {
        Self {
            kind: BlockKind::Paragraph,
            text: text.to_string(),
            spans: Vec::new(),
            url: None,
            alt: None,
            oembed: None,
        }
    }
}

/// Plain text of `blocks`, joined by a single space
pub fn as_text(blocks: &[RichTextBlock]) -> String {
    blocks
        .iter()
        .map(|b| b.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

/// HTML rendering of `blocks`; consecutive list items share one list
pub fn as_html(blocks: &[RichTextBlock]) -> String {
    let mut html = String::new();
    let mut open_list: Option<BlockKind> = None;

    for block in blocks {
        let list = match block.kind {
            BlockKind::ListItem | BlockKind::OrderedListItem => Some(block.kind),
            _ => None,
        };

        if open_list != list {
            if let Some(kind) = open_list {
                html.push_str(list_tag(kind).1);
            }
            if let Some(kind) = list {
                html.push_str(list_tag(kind).0);
            }
            open_list = list;
        }

        render_block(block, &mut html);
    }

    if let Some(kind) = open_list {
        html.push_str(list_tag(kind).1);
    }

    html
}

fn list_tag(kind: BlockKind) -> (&'static str, &'static str) {
    if kind == BlockKind::OrderedListItem {
        ("<ol>", "</ol>")
    } else {
        ("<ul>", "</ul>")
    }
}

fn render_block(block: &RichTextBlock, html: &mut String) {
    let tag = match block.kind {
        BlockKind::Paragraph | BlockKind::Unknown => "p",
        BlockKind::Heading1 => "h1",
        BlockKind::Heading2 => "h2",
        BlockKind::Heading3 => "h3",
        BlockKind::Heading4 => "h4",
        BlockKind::Heading5 => "h5",
        BlockKind::Heading6 => "h6",
        BlockKind::Preformatted => "pre",
        BlockKind::ListItem | BlockKind::OrderedListItem => "li",
        BlockKind::Image => {
            let src = block.url.as_deref().unwrap_or_default();
            let alt = block.alt.as_deref().unwrap_or_default();
            html.push_str(&format!(
                r#"<p class="block-img"><img src="{}" alt="{}" /></p>"#,
                escape_html(src),
                escape_html(alt)
            ));
            return;
        }
        BlockKind::Embed => {
            render_embed(block, html);
            return;
        }
    };

    html.push_str(&format!("<{}>", tag));
    render_spans(&block.text, &block.spans, html);
    html.push_str(&format!("</{}>", tag));
}

fn render_embed(block: &RichTextBlock, html: &mut String) {
    let Some(oembed) = &block.oembed else {
        return;
    };
    let field = |name: &str| oembed.get(name).and_then(|v| v.as_str()).unwrap_or_default();

    // Provider markup is trusted as-is
    html.push_str(&format!(
        r#"<div data-oembed="{}" data-oembed-type="{}">{}</div>"#,
        escape_html(field("embed_url")),
        escape_html(field("type")),
        field("html")
    ));
}

fn render_spans(text: &str, spans: &[Span], html: &mut String) {
    let chars: Vec<char> = text.chars().collect();
    let len = chars.len();

    let mut spans: Vec<&Span> = spans
        .iter()
        .filter(|s| s.start < s.end && s.start < len)
        .collect();
    spans.sort_by(|a, b| a.start.cmp(&b.start).then(b.end.cmp(&a.end)));

    let mut bounds: Vec<usize> = vec![0, len];
    for span in &spans {
        bounds.push(span.start);
        bounds.push(span.end.min(len));
    }
    bounds.sort_unstable();
    bounds.dedup();

    let mut stack: Vec<&Span> = Vec::new();
    for window in bounds.windows(2) {
        let (start, end) = (window[0], window[1]);
        let active: Vec<&Span> = spans
            .iter()
            .copied()
            .filter(|s| s.start <= start && s.end >= end)
            .collect();

        let common = stack
            .iter()
            .zip(active.iter())
            .take_while(|(a, b)| std::ptr::eq(**a, **b))
            .count();
        for span in stack[common..].iter().rev() {
            html.push_str(close_tag(span));
        }
        for span in &active[common..] {
            html.push_str(&open_tag(span));
        }
        stack = active;

        let segment: String = chars[start..end].iter().collect();
        html.push_str(&escape_html(&segment).replace('\n', "<br />"));
    }

    for span in stack.iter().rev() {
        html.push_str(close_tag(span));
    }
}

fn open_tag(span: &Span) -> String {
    match span.kind {
        SpanKind::Strong => "<strong>".to_string(),
        SpanKind::Em => "<em>".to_string(),
        SpanKind::Hyperlink => {
            let url = span
                .data
                .get("url")
                .and_then(|v| v.as_str())
                .unwrap_or("#");
            let target = span.data.get("target").and_then(|v| v.as_str());
            match target {
                Some(target) => format!(
                    r#"<a href="{}" target="{}" rel="noopener">"#,
                    escape_html(url),
                    escape_html(target)
                ),
                None => format!(r#"<a href="{}">"#, escape_html(url)),
            }
        }
        SpanKind::Label => {
            let label = span
                .data
                .get("label")
                .and_then(|v| v.as_str())
                .unwrap_or_default();
            format!(r#"<span class="{}">"#, escape_html(label))
        }
        SpanKind::Unknown => "<span>".to_string(),
    }
}

fn close_tag(span: &Span) -> &'static str {
    match span.kind {
        SpanKind::Strong => "</strong>",
        SpanKind::Em => "</em>",
        SpanKind::Hyperlink => "</a>",
        SpanKind::Label | SpanKind::Unknown => "</span>",
    }
}
