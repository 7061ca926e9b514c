//! HTML helper functions

use std::borrow::Cow;

const ELLIPSIS: char = '…';
const LINK_SCHEMES: &[&str] = &["http", "https", "mailto"];

/// Escape text for HTML content and attribute values
pub fn html_escape(s: &str) -> Cow<'_, str> {
    if !s.contains(['&', '<', '>', '"', '\'']) {
        return Cow::Borrowed(s);
    }

    let mut out = String::with_capacity(s.len() + 16);
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    Cow::Owned(out)
}

/// Whether a link target may be emitted as an `href`: relative URLs and
/// `http`, `https` or `mailto` ones
pub fn is_safe_href(url: &str) -> bool {
    // browsers ignore these inside a scheme, e.g. "java\tscript:"
    let url: String = url
        .chars()
        .filter(|c| !c.is_ascii_whitespace() && !c.is_ascii_control())
        .collect();

    match url.split_once(':') {
        Some((scheme, _)) if !scheme.contains(['/', '?', '#']) => LINK_SCHEMES
            .iter()
            .any(|allowed| scheme.eq_ignore_ascii_case(allowed)),
        _ => true,
    }
}

/// Collapse whitespace and cut at a word boundary so the result, ellipsis
/// included, is at most `max_chars` characters
pub fn excerpt(text: &str, max_chars: usize) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= max_chars {
        return collapsed;
    }

    let mut out = String::new();
    for word in collapsed.split(' ') {
        let needed = word.chars().count() + usize::from(!out.is_empty());
        if out.chars().count() + needed + 1 > max_chars {
            break;
        }
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(word);
    }

    // a single word longer than the limit
    if out.is_empty() {
        out = collapsed.chars().take(max_chars.saturating_sub(1)).collect();
    }
    out.push(ELLIPSIS);
    out
}
