//! Structured rich text: parsing, plain-text projection and HTML rendering
//!
//! The CMS stores formatted text as a sequence of typed blocks. Text blocks
//! carry styling spans whose offsets are UTF-16 code-unit positions into the
//! block text.

use serde::{Deserialize, Serialize};

use crate::helpers::{html_escape, is_safe_href};

/// A rich-text document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RichText(pub Vec<Block>);

/// One block of a rich-text document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawBlock", into = "RawBlock")]
pub enum Block {
    Heading { level: u8, content: TextBlock },
    Paragraph(TextBlock),
    Preformatted(TextBlock),
    ListItem(TextBlock),
    OrderedListItem(TextBlock),
    Image(ImageBlock),
    Embed(EmbedBlock),
    /// A block type this renderer does not know; renders nothing
    Unknown(String),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextBlock {
    pub text: String,
    pub spans: Vec<Span>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImageBlock {
    pub url: String,
    pub alt: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbedBlock {
    pub html: Option<String>,
    pub embed_url: Option<String>,
    #[serde(rename = "type")]
    pub embed_type: Option<String>,
    pub provider_name: Option<String>,
}

/// A styled range inside a text block
#[derive(Debug, Clone, PartialEq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub kind: SpanKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SpanKind {
    Strong,
    Em,
    Hyperlink { url: String, target: Option<String> },
    Label(String),
    Unknown(String),
}

impl RichText {
    pub fn new(blocks: Vec<Block>) -> Self {
        Self(blocks)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn blocks(&self) -> &[Block] {
        &self.0
    }

    /// Plain text of every text-bearing block, joined by a single space
    pub fn as_text(&self) -> String {
        self.0
            .iter()
            .filter_map(Block::text)
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Number of whitespace-separated words in the document
    pub fn word_count(&self) -> usize {
        self.as_text().split_whitespace().count()
    }

    /// Render the document as HTML. Consecutive list items share one list.
    pub fn as_html(&self) -> String {
        let mut html = String::new();
        let mut open_list: Option<&'static str> = None;

        for block in &self.0 {
            let list_tag = match block {
                Block::ListItem(_) => Some("ul"),
                Block::OrderedListItem(_) => Some("ol"),
                _ => None,
            };

            if open_list != list_tag {
                if let Some(tag) = open_list {
                    html.push_str(&format!("</{}>", tag));
                }
                if let Some(tag) = list_tag {
                    html.push_str(&format!("<{}>", tag));
                }
                open_list = list_tag;
            }

            render_block(block, &mut html);
        }

        if let Some(tag) = open_list {
            html.push_str(&format!("</{}>", tag));
        }

        html
    }
}

impl Block {
    /// Text content of the block, if it carries any
    pub fn text(&self) -> Option<&str> {
        match self {
            Block::Heading { content, .. }
            | Block::Paragraph(content)
            | Block::Preformatted(content)
            | Block::ListItem(content)
            | Block::OrderedListItem(content) => Some(&content.text),
            Block::Image(_) | Block::Embed(_) | Block::Unknown(_) => None,
        }
    }
}

impl TextBlock {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            spans: Vec::new(),
        }
    }
}

fn render_block(block: &Block, html: &mut String) {
    match block {
        Block::Heading { level, content } => {
            html.push_str(&format!("<h{}>", level));
            html.push_str(&render_spans(content));
            html.push_str(&format!("</h{}>", level));
        }
        Block::Paragraph(content) => wrap("p", content, html),
        Block::Preformatted(content) => wrap("pre", content, html),
        Block::ListItem(content) | Block::OrderedListItem(content) => wrap("li", content, html),
        Block::Image(image) => {
            html.push_str(&format!(
                r#"<p class="block-img"><img src="{}" alt="{}"></p>"#,
                html_escape(&image.url),
                html_escape(image.alt.as_deref().unwrap_or(""))
            ));
        }
        Block::Embed(embed) => {
            html.push_str(&format!(
                r#"<div data-oembed="{}" data-oembed-type="{}" data-oembed-provider="{}">{}</div>"#,
                html_escape(embed.embed_url.as_deref().unwrap_or("")),
                html_escape(embed.embed_type.as_deref().unwrap_or("")),
                html_escape(embed.provider_name.as_deref().unwrap_or("")),
                // provider markup is trusted as-is
                embed.html.as_deref().unwrap_or("")
            ));
        }
        Block::Unknown(kind) => {
            tracing::debug!("Skipping unknown rich text block type {:?}", kind);
        }
    }
}

fn wrap(tag: &str, content: &TextBlock, html: &mut String) {
    html.push_str(&format!("<{}>", tag));
    html.push_str(&render_spans(content));
    html.push_str(&format!("</{}>", tag));
}

/// A span resolved to byte offsets
struct Resolved<'a> {
    start: usize,
    end: usize,
    kind: &'a SpanKind,
}

/// Render block text with its spans as properly nested inline markup.
///
/// Spans that cross each other are split: the inner one is closed and
/// reopened around the outer one's end.
fn render_spans(block: &TextBlock) -> String {
    let text = block.text.as_str();

    let mut spans: Vec<Resolved> = block
        .spans
        .iter()
        .filter(|s| match &s.kind {
            SpanKind::Unknown(_) => false,
            SpanKind::Hyperlink { url, .. } if !is_safe_href(url) => {
                tracing::warn!("Dropping link with unsupported scheme: {:?}", url);
                false
            }
            _ => true,
        })
        .map(|s| Resolved {
            start: byte_offset(text, s.start),
            end: byte_offset(text, s.end),
            kind: &s.kind,
        })
        .filter(|s| s.start < s.end)
        .collect();

    if spans.is_empty() {
        return escape_text(text);
    }

    // outer spans first when they start together
    spans.sort_by(|a, b| a.start.cmp(&b.start).then(b.end.cmp(&a.end)));

    let mut boundaries: Vec<usize> = spans.iter().flat_map(|s| [s.start, s.end]).collect();
    boundaries.push(0);
    boundaries.push(text.len());
    boundaries.sort_unstable();
    boundaries.dedup();

    let mut out = String::with_capacity(text.len() * 2);
    let mut stack: Vec<usize> = Vec::new();

    for (i, &pos) in boundaries.iter().enumerate() {
        // close everything ending here, reopening survivors above the lowest one
        if let Some(lowest) = stack.iter().position(|&idx| spans[idx].end == pos) {
            let popped: Vec<usize> = stack.drain(lowest..).collect();
            for &idx in popped.iter().rev() {
                out.push_str(close_tag(spans[idx].kind));
            }
            for idx in popped {
                if spans[idx].end != pos {
                    out.push_str(&open_tag(spans[idx].kind));
                    stack.push(idx);
                }
            }
        }

        for (idx, span) in spans.iter().enumerate() {
            if span.start == pos {
                out.push_str(&open_tag(span.kind));
                stack.push(idx);
            }
        }

        if let Some(&next) = boundaries.get(i + 1) {
            out.push_str(&escape_text(&text[pos..next]));
        }
    }

    for &idx in stack.iter().rev() {
        out.push_str(close_tag(spans[idx].kind));
    }

    out
}

fn open_tag(kind: &SpanKind) -> String {
    match kind {
        SpanKind::Strong => "<strong>".to_string(),
        SpanKind::Em => "<em>".to_string(),
        SpanKind::Hyperlink {
            url,
            target: Some(target),
        } => format!(
            r#"<a href="{}" target="{}" rel="noopener">"#,
            html_escape(url),
            html_escape(target)
        ),
        SpanKind::Hyperlink { url, target: None } => format!(r#"<a href="{}">"#, html_escape(url)),
        SpanKind::Label(label) => format!(r#"<span class="{}">"#, html_escape(label)),
        SpanKind::Unknown(_) => String::new(),
    }
}

fn close_tag(kind: &SpanKind) -> &'static str {
    match kind {
        SpanKind::Strong => "</strong>",
        SpanKind::Em => "</em>",
        SpanKind::Hyperlink { .. } => "</a>",
        SpanKind::Label(_) => "</span>",
        SpanKind::Unknown(_) => "",
    }
}

fn escape_text(text: &str) -> String {
    html_escape(text).replace('\n', "<br />")
}

/// Convert a UTF-16 offset into a byte offset, clamped to the text
fn byte_offset(text: &str, utf16_offset: usize) -> usize {
    let mut units = 0;
    for (idx, ch) in text.char_indices() {
        if units >= utf16_offset {
            return idx;
        }
        units += ch.len_utf16();
    }
    text.len()
}

/// Wire shape of a block
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct RawBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    spans: Vec<RawSpan>,
    #[serde(skip_serializing_if = "Option::is_none")]
    url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    alt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    oembed: Option<EmbedBlock>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct RawSpan {
    start: usize,
    end: usize,
    #[serde(rename = "type")]
    kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<RawSpanData>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct RawSpanData {
    #[serde(skip_serializing_if = "Option::is_none")]
    url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    target: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    label: Option<String>,
}

impl From<RawBlock> for Block {
    fn from(raw: RawBlock) -> Self {
        let content = || TextBlock {
            text: raw.text.clone().unwrap_or_default(),
            spans: raw.spans.iter().cloned().map(Span::from).collect(),
        };

        match raw.kind.as_str() {
            "paragraph" => Block::Paragraph(content()),
            "preformatted" => Block::Preformatted(content()),
            "list-item" => Block::ListItem(content()),
            "o-list-item" => Block::OrderedListItem(content()),
            "image" => Block::Image(ImageBlock {
                url: raw.url.clone().unwrap_or_default(),
                alt: raw.alt.clone(),
            }),
            "embed" => Block::Embed(raw.oembed.clone().unwrap_or_default()),
            kind => match kind
                .strip_prefix("heading")
                .and_then(|n| n.parse::<u8>().ok())
            {
                Some(level @ 1..=6) => Block::Heading {
                    level,
                    content: content(),
                },
                _ => Block::Unknown(raw.kind.clone()),
            },
        }
    }
}

impl From<Block> for RawBlock {
    fn from(block: Block) -> Self {
        let text = |kind: String, content: TextBlock| RawBlock {
            kind,
            text: Some(content.text),
            spans: content.spans.into_iter().map(RawSpan::from).collect(),
            ..Default::default()
        };

        match block {
            Block::Heading { level, content } => text(format!("heading{}", level), content),
            Block::Paragraph(content) => text("paragraph".to_string(), content),
            Block::Preformatted(content) => text("preformatted".to_string(), content),
            Block::ListItem(content) => text("list-item".to_string(), content),
            Block::OrderedListItem(content) => text("o-list-item".to_string(), content),
            Block::Image(image) => RawBlock {
                kind: "image".to_string(),
                url: Some(image.url),
                alt: image.alt,
                ..Default::default()
            },
            Block::Embed(embed) => RawBlock {
                kind: "embed".to_string(),
                oembed: Some(embed),
                ..Default::default()
            },
            Block::Unknown(kind) => RawBlock {
                kind,
                ..Default::default()
            },
        }
    }
}

impl From<RawSpan> for Span {
    fn from(raw: RawSpan) -> Self {
        let data = raw.data.unwrap_or_default();
        let kind = match raw.kind.as_str() {
            "strong" => SpanKind::Strong,
            "em" => SpanKind::Em,
            "hyperlink" => match data.url {
                Some(url) => SpanKind::Hyperlink {
                    url,
                    target: data.target,
                },
                None => SpanKind::Unknown(raw.kind),
            },
            "label" => SpanKind::Label(data.label.unwrap_or_default()),
            _ => SpanKind::Unknown(raw.kind),
        };

        Span {
            start: raw.start,
            end: raw.end,
            kind,
        }
    }
}

impl From<Span> for RawSpan {
    fn from(span: Span) -> Self {
        let (kind, data) = match span.kind {
            SpanKind::Strong => ("strong".to_string(), None),
            SpanKind::Em => ("em".to_string(), None),
            SpanKind::Hyperlink { url, target } => (
                "hyperlink".to_string(),
                Some(RawSpanData {
                    url: Some(url),
                    target,
                    label: None,
                }),
            ),
            SpanKind::Label(label) => (
                "label".to_string(),
                Some(RawSpanData {
                    label: Some(label),
                    ..Default::default()
                }),
            ),
            SpanKind::Unknown(kind) => (kind, None),
        };

        RawSpan {
            start: span.start,
            end: span.end,
            kind,
            data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> RichText {
        serde_json::from_str(json).unwrap()
    }

    fn span(start: usize, end: usize, kind: SpanKind) -> Span {
        Span { start, end, kind }
    }

    #[test]
    fn test_parse_block_types() {
        let doc = parse(
            r#"[
                {"type": "heading2", "text": "Title", "spans": []},
                {"type": "paragraph", "text": "Body", "spans": [{"start": 0, "end": 4, "type": "strong"}]},
                {"type": "image", "url": "https://img/x.png", "alt": "x", "dimensions": {"width": 1}},
                {"type": "mystery", "text": "?"}
            ]"#,
        );

        assert_eq!(doc.blocks().len(), 4);
        assert!(matches!(doc.blocks()[0], Block::Heading { level: 2, .. }));
        assert!(matches!(&doc.blocks()[1], Block::Paragraph(t) if t.spans[0].kind == SpanKind::Strong));
        assert!(matches!(&doc.blocks()[2], Block::Image(i) if i.url == "https://img/x.png"));
        assert_eq!(doc.blocks()[3], Block::Unknown("mystery".to_string()));
    }

    #[test]
    fn test_heading_level_out_of_range_is_unknown() {
        let doc = parse(r#"[{"type": "heading9", "text": "x"}]"#);
        assert_eq!(doc.blocks()[0], Block::Unknown("heading9".to_string()));
    }

    #[test]
    fn test_as_text_skips_non_text_blocks() {
        let doc = RichText::new(vec![
            Block::Paragraph(TextBlock::plain("first paragraph")),
            Block::Image(ImageBlock::default()),
            Block::ListItem(TextBlock::plain("item")),
        ]);
        assert_eq!(doc.as_text(), "first paragraph item");
        assert_eq!(doc.word_count(), 3);
    }

    #[test]
    fn test_empty_document() {
        let doc = RichText::default();
        assert_eq!(doc.as_text(), "");
        assert_eq!(doc.as_html(), "");
        assert_eq!(doc.word_count(), 0);
    }

    #[test]
    fn test_html_groups_list_items() {
        let doc = RichText::new(vec![
            Block::ListItem(TextBlock::plain("a")),
            Block::ListItem(TextBlock::plain("b")),
            Block::OrderedListItem(TextBlock::plain("c")),
            Block::Paragraph(TextBlock::plain("d")),
            Block::ListItem(TextBlock::plain("e")),
        ]);
        assert_eq!(
            doc.as_html(),
            "<ul><li>a</li><li>b</li></ul><ol><li>c</li></ol><p>d</p><ul><li>e</li></ul>"
        );
    }

    #[test]
    fn test_html_escapes_text_and_breaks_lines() {
        let doc = RichText::new(vec![Block::Preformatted(TextBlock::plain(
            "if a < b {\n}",
        ))]);
        assert_eq!(doc.as_html(), "<pre>if a &lt; b {<br />}</pre>");
    }

    #[test]
    fn test_nested_spans() {
        let block = TextBlock {
            text: "hello brave world".to_string(),
            spans: vec![
                span(6, 11, SpanKind::Em),
                span(0, 17, SpanKind::Strong),
            ],
        };
        assert_eq!(
            render_spans(&block),
            "<strong>hello <em>brave</em> world</strong>"
        );
    }

    #[test]
    fn test_crossing_spans_stay_well_formed() {
        let block = TextBlock {
            text: "abcdef".to_string(),
            spans: vec![span(0, 4, SpanKind::Strong), span(2, 6, SpanKind::Em)],
        };
        assert_eq!(
            render_spans(&block),
            "<strong>ab<em>cd</em></strong><em>ef</em>"
        );
    }

    #[test]
    fn test_hyperlink_and_label() {
        let doc = parse(
            r#"[{"type": "paragraph", "text": "see docs here", "spans": [
                {"start": 4, "end": 8, "type": "hyperlink", "data": {"link_type": "Web", "url": "https://x.dev/?a=1&b=2", "target": "_blank"}},
                {"start": 9, "end": 13, "type": "label", "data": {"label": "note"}}
            ]}]"#,
        );
        assert_eq!(
            doc.as_html(),
            r#"<p>see <a href="https://x.dev/?a=1&amp;b=2" target="_blank" rel="noopener">docs</a> <span class="note">here</span></p>"#
        );
    }

    #[test]
    fn test_script_links_render_as_text() {
        let doc = parse(
            r#"[{"type": "paragraph", "text": "click me", "spans": [
                {"start": 0, "end": 5, "type": "hyperlink", "data": {"link_type": "Web", "url": "javascript:alert(1)"}},
                {"start": 6, "end": 8, "type": "hyperlink", "data": {"link_type": "Web", "url": "/post/hooks"}}
            ]}]"#,
        );
        assert_eq!(doc.as_html(), r#"<p>click <a href="/post/hooks">me</a></p>"#);
    }

    #[test]
    fn test_spans_use_utf16_offsets() {
        // "ção" is 3 UTF-16 units but 5 bytes
        let block = TextBlock {
            text: "ação já".to_string(),
            spans: vec![span(5, 7, SpanKind::Strong)],
        };
        assert_eq!(render_spans(&block), "ação <strong>já</strong>");
    }

    #[test]
    fn test_out_of_range_spans_are_clamped() {
        let block = TextBlock {
            text: "abc".to_string(),
            spans: vec![span(1, 99, SpanKind::Em), span(5, 9, SpanKind::Strong)],
        };
        assert_eq!(render_spans(&block), "a<em>bc</em>");
    }

    #[test]
    fn test_image_and_embed() {
        let doc = RichText::new(vec![
            Block::Image(ImageBlock {
                url: "https://img/a.png".to_string(),
                alt: Some("a \"quoted\" alt".to_string()),
            }),
            Block::Embed(EmbedBlock {
                html: Some("<iframe></iframe>".to_string()),
                embed_url: Some("https://youtu.be/x".to_string()),
                embed_type: Some("video".to_string()),
                provider_name: Some("YouTube".to_string()),
            }),
        ]);
        assert_eq!(
            doc.as_html(),
            concat!(
                r#"<p class="block-img"><img src="https://img/a.png" alt="a &quot;quoted&quot; alt"></p>"#,
                r#"<div data-oembed="https://youtu.be/x" data-oembed-type="video" data-oembed-provider="YouTube"><iframe></iframe></div>"#
            )
        );
    }

    #[test]
    fn test_serialize_keeps_wire_shape() {
        let json = r#"[{"type":"heading1","text":"Hi","spans":[{"start":0,"end":2,"type":"em"}]}]"#;
        let doc = parse(json);
        assert_eq!(serde_json::to_string(&doc).unwrap(), json);
    }
}
