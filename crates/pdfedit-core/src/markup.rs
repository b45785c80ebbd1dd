//! Markup-to-segment parsing
//!
//! The editing surface stores each text item as one markup string over a
//! minimal tag set: `<b>`, `<i>`, `<u>` and `<span color=… font=… size=…
//! bg=…>`. This module parses that string into a flat sequence of styled
//! segments by recursive descent, threading an immutable style context down
//! each call and emitting one segment per text node with the fully-resolved
//! style at that point.
//!
//! Parsing never fails: unknown tags are stripped (their text kept), a `<`
//! that does not open a recognised tag shape is literal text, and unclosed
//! tags extend to the end of the string. Concatenating segment text always
//! reproduces the plain text of the input.

use serde::{Deserialize, Serialize};

/// One maximal stretch of identically-styled text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
    pub text: String,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    /// Hex color like "#1a2b3c"; None means the default (black).
    pub color: Option<String>,
    pub font_family: Option<String>,
    /// Editor-space pixel override; None means the item's own size.
    pub font_size: Option<f64>,
    /// Highlight color behind the text.
    pub background: Option<String>,
}

#[derive(Debug, Clone, Default)]
struct StyleContext {
    bold: bool,
    italic: bool,
    underline: bool,
    color: Option<String>,
    font: Option<String>,
    size: Option<f64>,
    background: Option<String>,
}

impl StyleContext {
    fn segment(&self, text: String) -> Segment {
        Segment {
            text,
            bold: self.bold,
            italic: self.italic,
            underline: self.underline,
            color: self.color.clone(),
            font_family: self.font.clone(),
            font_size: self.size,
            background: self.background.clone(),
        }
    }
}

/// Parse a markup string into styled segments.
pub fn parse_segments(markup: &str) -> Vec<Segment> {
    let mut out = Vec::new();
    let mut pos = 0;
    parse_nodes(markup, &mut pos, &StyleContext::default(), None, &mut out);
    out
}

/// The style-stripped text of a markup string.
pub fn plain_text(markup: &str) -> String {
    parse_segments(markup)
        .into_iter()
        .map(|s| s.text)
        .collect()
}

fn parse_nodes(
    input: &str,
    pos: &mut usize,
    ctx: &StyleContext,
    closing: Option<&str>,
    out: &mut Vec<Segment>,
) {
    let bytes = input.as_bytes();
    let mut text_start = *pos;

    while *pos < bytes.len() {
        if bytes[*pos] != b'<' {
            *pos += 1;
            continue;
        }

        // A close tag ends this level if it matches; foreign close tags are
        // stripped in place.
        if let Some((name, after)) = read_close_tag(input, *pos) {
            flush_text(input, text_start, *pos, ctx, out);
            *pos = after;
            if closing == Some(name.as_str()) {
                return;
            }
            text_start = *pos;
            continue;
        }

        if let Some(tag) = read_open_tag(input, *pos) {
            flush_text(input, text_start, *pos, ctx, out);
            *pos = tag.end;
            let child_ctx = apply_tag(ctx, &tag);
            parse_nodes(input, pos, &child_ctx, Some(&tag.name), out);
            text_start = *pos;
            continue;
        }

        // Literal '<'
        *pos += 1;
    }

    flush_text(input, text_start, *pos, ctx, out);
}

fn flush_text(input: &str, start: usize, end: usize, ctx: &StyleContext, out: &mut Vec<Segment>) {
    if end > start {
        out.push(ctx.segment(input[start..end].to_string()));
    }
}

struct OpenTag {
    name: String,
    attrs: Vec<(String, String)>,
    end: usize,
}

/// Recognise `<name attr="v" …>` at `pos`. Returns None when the text at
/// `pos` is not a plausible tag, in which case `<` is literal.
fn read_open_tag(input: &str, pos: usize) -> Option<OpenTag> {
    let rest = &input[pos + 1..];
    let gt = rest.find('>')?;
    let body = &rest[..gt];
    if body.is_empty() || body.starts_with('/') {
        return None;
    }

    let mut parts = body.splitn(2, char::is_whitespace);
    let name = parts.next().unwrap_or("");
    if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }

    let attrs = parts.next().map(parse_attrs).unwrap_or_default();
    Some(OpenTag {
        name: name.to_ascii_lowercase(),
        attrs,
        end: pos + 1 + gt + 1,
    })
}

/// Recognise `</name>` at `pos`, returning the lowercase name and the
/// position just past the tag.
fn read_close_tag(input: &str, pos: usize) -> Option<(String, usize)> {
    let rest = &input[pos..];
    if !rest.starts_with("</") {
        return None;
    }
    let gt = rest.find('>')?;
    let name = rest[2..gt].trim();
    if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    Some((name.to_ascii_lowercase(), pos + gt + 1))
}

fn parse_attrs(body: &str) -> Vec<(String, String)> {
    let mut attrs = Vec::new();
    let mut rest = body.trim();
    while !rest.is_empty() {
        let eq = match rest.find('=') {
            Some(i) => i,
            None => break,
        };
        let key = rest[..eq].trim().to_ascii_lowercase();
        let after = rest[eq + 1..].trim_start();
        let (value, remaining) = match after.chars().next() {
            Some(q @ ('"' | '\'')) => {
                let inner = &after[1..];
                match inner.find(q) {
                    Some(close) => (inner[..close].to_string(), &inner[close + 1..]),
                    None => (inner.to_string(), ""),
                }
            }
            _ => {
                let end = after
                    .find(char::is_whitespace)
                    .unwrap_or(after.len());
                (after[..end].to_string(), &after[end..])
            }
        };
        if !key.is_empty() {
            attrs.push((key, value));
        }
        rest = remaining.trim_start();
    }
    attrs
}

fn apply_tag(ctx: &StyleContext, tag: &OpenTag) -> StyleContext {
    let mut child = ctx.clone();
    match tag.name.as_str() {
        "b" => child.bold = true,
        "i" => child.italic = true,
        "u" => child.underline = true,
        "span" => {
            for (key, value) in &tag.attrs {
                match key.as_str() {
                    "color" => child.color = Some(value.clone()),
                    "font" => child.font = Some(value.clone()),
                    "size" => child.size = value.parse().ok(),
                    "bg" => child.background = Some(value.clone()),
                    _ => {}
                }
            }
        }
        // Unknown tag: no style change, children are kept as-is
        _ => {}
    }
    child
}
