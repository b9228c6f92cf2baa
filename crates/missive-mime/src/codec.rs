//! Wire codec: whole-message encode/decode.
//!
//! `encode` turns a header block plus a part tree into raw message
//! text; `decode` reverses it. Multipart containers keep their boundary
//! in their own Content-Type header, so a decoded tree re-encodes to
//! the same bytes.

use crate::content_type::ContentType;
use crate::header::Headers;
use crate::part::{Part, PartBody, mint_boundary};

/// Headers that describe content rather than the message envelope.
/// They are emitted from the part tree, never from the top block.
const CONTENT_HEADERS: [&str; 3] = [
    "Content-Type",
    "Content-Transfer-Encoding",
    "Content-Disposition",
];

fn is_content_header(name: &str) -> bool {
    CONTENT_HEADERS
        .iter()
        .any(|h| h.eq_ignore_ascii_case(name))
}

/// Encodes message headers and a part tree into raw message text.
#[must_use]
pub fn encode(headers: &Headers, parts: &[Part]) -> String {
    let mut out = String::new();
    for (name, value) in headers.iter() {
        if !is_content_header(name) {
            out.push_str(name);
            out.push_str(": ");
            out.push_str(value);
            out.push_str("\r\n");
        }
    }

    match parts {
        [] => {
            out.push_str("\r\n");
        }
        [part] => {
            out.push_str(&part.headers.to_string());
            out.push_str("\r\n");
            out.push_str(&render_body(part));
        }
        many => {
            // Reuse the boundary a parsed message already carries;
            // mint one for a freshly built tree. Only a mixed type may
            // donate its boundary here: an alternative/related top
            // belongs to a child container, and reusing its boundary
            // would collide with that child's own markers.
            let top_ct = headers
                .get("Content-Type")
                .and_then(|raw| ContentType::parse(raw).ok().map(|ct| (raw.to_string(), ct)));

            let (ct_line, boundary) = match top_ct {
                Some((raw, ct)) if ct.is("multipart", "mixed") && ct.boundary().is_some() => {
                    let boundary = ct.boundary().unwrap_or_default().to_string();
                    (raw, boundary)
                }
                _ => {
                    let boundary = mint_boundary();
                    let ct = ContentType::multipart_mixed(&boundary);
                    (ct.to_string(), boundary)
                }
            };

            out.push_str("Content-Type: ");
            out.push_str(&ct_line);
            out.push_str("\r\n\r\n");
            out.push_str(&render_children(many, &boundary));
        }
    }

    out
}

fn render_body(part: &Part) -> String {
    match &part.body {
        PartBody::Data(data) => data.clone(),
        PartBody::Multi(children) => {
            let boundary = part
                .content_type()
                .ok()
                .and_then(|ct| ct.boundary().map(ToString::to_string))
                .unwrap_or_else(mint_boundary);
            render_children(children, &boundary)
        }
    }
}

fn render_children(children: &[Part], boundary: &str) -> String {
    let mut out = String::new();
    for child in children {
        out.push_str("--");
        out.push_str(boundary);
        out.push_str("\r\n");
        out.push_str(&child.headers.to_string());
        out.push_str("\r\n");
        out.push_str(&render_body(child));
        out.push_str("\r\n");
    }
    out.push_str("--");
    out.push_str(boundary);
    out.push_str("--\r\n");
    out
}

/// Decodes raw message text into headers and a part tree.
///
/// Never fails: empty input yields empty headers and no parts, and
/// malformed multipart structure degrades to whatever could be parsed.
#[must_use]
pub fn decode(raw: &str) -> (Headers, Vec<Part>) {
    if raw.trim().is_empty() {
        return (Headers::new(), Vec::new());
    }

    let (head, body) = split_blocks(raw);
    let headers = Headers::parse(head);
    let content_type = headers.get("Content-Type").and_then(|v| ContentType::parse(v).ok());

    let parts = match content_type {
        Some(ct) if ct.is_multipart() => {
            let children = ct
                .boundary()
                .map(|b| split_multipart(body, b))
                .unwrap_or_default();
            vec![Part::new(content_headers_of(&headers), PartBody::Multi(children))]
        }
        Some(_) => {
            vec![Part::new(
                content_headers_of(&headers),
                PartBody::Data(body.to_string()),
            )]
        }
        None if body.is_empty() => Vec::new(),
        None => {
            // Implicit text/plain body
            vec![Part::new(Headers::new(), PartBody::Data(body.to_string()))]
        }
    };

    (headers, parts)
}

/// Splits raw text into its header block and body at the first empty line.
fn split_blocks(raw: &str) -> (&str, &str) {
    if let Some(pos) = raw.find("\r\n\r\n") {
        (&raw[..pos], &raw[pos + 4..])
    } else if let Some(pos) = raw.find("\n\n") {
        (&raw[..pos], &raw[pos + 2..])
    } else {
        (raw, "")
    }
}

/// Clones the content-describing headers out of a header block.
fn content_headers_of(headers: &Headers) -> Headers {
    let mut out = Headers::new();
    for (name, value) in headers.iter() {
        if is_content_header(name) {
            out.add(name, value);
        }
    }
    out
}

fn parse_part(text: &str) -> Part {
    let (head, body) = split_blocks(text);
    let headers = Headers::parse(head);
    let content_type = headers.get("Content-Type").and_then(|v| ContentType::parse(v).ok());

    match content_type {
        Some(ct) if ct.is_multipart() => {
            let children = ct
                .boundary()
                .map(|b| split_multipart(body, b))
                .unwrap_or_default();
            Part::new(headers, PartBody::Multi(children))
        }
        _ => Part::new(headers, PartBody::Data(body.to_string())),
    }
}

fn split_multipart(body: &str, boundary: &str) -> Vec<Part> {
    let delimiter = format!("--{boundary}");
    let mut parts = Vec::new();
    let mut sections = body.split(delimiter.as_str());

    // Everything before the first boundary is preamble.
    let _preamble = sections.next();

    for section in sections {
        if section.starts_with("--") {
            break;
        }
        let section = section
            .strip_prefix("\r\n")
            .or_else(|| section.strip_prefix('\n'))
            .unwrap_or(section);
        let section = section
            .strip_suffix("\r\n")
            .or_else(|| section.strip_suffix('\n'))
            .unwrap_or(section);
        parts.push(parse_part(section));
    }

    parts
}
