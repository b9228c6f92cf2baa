//! MIME encoding and decoding utilities.
//!
//! Supports Base64, Quoted-Printable, and RFC 2047 encoded words.

use crate::error::{Error, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::fmt::Write as _;

/// Encodes data as Base64.
#[must_use]
pub fn encode_base64(data: &[u8]) -> String {
    STANDARD.encode(data)
}

/// Decodes Base64 data.
///
/// # Errors
///
/// Returns an error if the input is not valid Base64.
pub fn decode_base64(data: &str) -> Result<Vec<u8>> {
    STANDARD.decode(data).map_err(Into::into)
}

/// Wraps a Base64 payload into lines of at most 76 characters
/// (RFC 2045 §6.8), discarding any whitespace already present.
#[must_use]
pub fn wrap_base64(payload: &str) -> String {
    let mut out = String::with_capacity(payload.len() + payload.len() / 38);
    let mut column = 0;
    for c in payload.chars().filter(|c| !c.is_whitespace()) {
        if column == 76 {
            out.push_str("\r\n");
            column = 0;
        }
        out.push(c);
        column += 1;
    }
    out
}

/// Maximum line length for Quoted-Printable encoding.
const MAX_LINE_LENGTH: usize = 76;

/// Encodes text using Quoted-Printable encoding (RFC 2045).
///
/// Encodes bytes that are not printable ASCII or would interfere
/// with mail transmission.
#[must_use]
pub fn encode_quoted_printable(text: &str) -> String {
    let mut result = String::new();
    let mut line_length = 0;

    for byte in text.as_bytes() {
        if line_length >= MAX_LINE_LENGTH - 3 {
            result.push_str("=\r\n");
            line_length = 0;
        }

        match byte {
            // Printable ASCII except '='
            b'!'..=b'<' | b'>'..=b'~' => {
                result.push(*byte as char);
                line_length += 1;
            }
            b' ' => {
                // Space must not end a line
                if line_length >= MAX_LINE_LENGTH - 1 {
                    result.push_str("=20");
                    line_length += 3;
                } else {
                    result.push(' ');
                    line_length += 1;
                }
            }
            _ => {
                result.push('=');
                let _ = write!(result, "{byte:02X}");
                line_length += 3;
            }
        }
    }

    result
}

/// Decodes Quoted-Printable text (RFC 2045) into raw bytes.
///
/// # Errors
///
/// Returns an error if the input contains invalid escape sequences.
pub fn decode_quoted_printable(text: &str) -> Result<Vec<u8>> {
    let mut result = Vec::new();
    let mut bytes = text.bytes().peekable();

    while let Some(b) = bytes.next() {
        if b == b'=' {
            // Soft line break
            if bytes.peek() == Some(&b'\r') {
                bytes.next();
                if bytes.peek() == Some(&b'\n') {
                    bytes.next();
                    continue;
                }
            } else if bytes.peek() == Some(&b'\n') {
                bytes.next();
                continue;
            }

            let hi = bytes.next();
            let lo = bytes.next();
            match (hi, lo) {
                (Some(hi), Some(lo)) => {
                    let hex = [hi, lo];
                    let hex = std::str::from_utf8(&hex)
                        .map_err(|e| Error::InvalidEncoding(format!("Invalid hex: {e}")))?;
                    let byte = u8::from_str_radix(hex, 16)
                        .map_err(|e| Error::InvalidEncoding(format!("Invalid hex: {e}")))?;
                    result.push(byte);
                }
                _ => {
                    return Err(Error::InvalidEncoding(
                        "Incomplete escape sequence".to_string(),
                    ));
                }
            }
        } else {
            result.push(b);
        }
    }

    Ok(result)
}

/// Decodes bytes with a declared RFC 2047 charset.
///
/// UTF-8 and US-ASCII are decoded directly, ISO-8859-1/Latin-1 is
/// byte-mapped, anything else falls back to lossy UTF-8.
#[must_use]
pub fn decode_charset(bytes: &[u8], charset: &str) -> String {
    let charset = charset.trim().to_ascii_lowercase();
    // RFC 2231 language suffix, e.g. "utf-8*en"
    let charset = charset.split('*').next().unwrap_or(&charset);
    match charset {
        "iso-8859-1" | "latin-1" | "latin1" | "iso-8859-15" => {
            bytes.iter().map(|&b| char::from(b)).collect()
        }
        _ => String::from_utf8_lossy(bytes).into_owned(),
    }
}

/// Encodes a header value as an RFC 2047 encoded word when needed.
///
/// Pure ASCII text without `=` or `?` passes through unchanged;
/// anything else becomes `=?utf-8?B?...?=`.
#[must_use]
pub fn encode_word(text: &str) -> String {
    if text.chars().all(|c| c.is_ascii() && c != '=' && c != '?') {
        return text.to_string();
    }

    let encoded = encode_base64(text.as_bytes());
    format!("=?utf-8?B?{encoded}?=")
}

/// Decodes an RFC 2047 encoded word (`=?charset?enc?text?=`) at the
/// start of the slice.
///
/// Returns the decoded text and the number of bytes consumed, or
/// `None` if no well-formed encoded word starts here.
fn decode_prefix_word(s: &str) -> Option<(String, usize)> {
    let inner = s.strip_prefix("=?")?;
    let charset_end = inner.find('?')?;
    let charset = &inner[..charset_end];
    let rest = &inner[charset_end + 1..];
    let encoding_end = rest.find('?')?;
    let encoding = &rest[..encoding_end];
    let tail = &rest[encoding_end + 1..];
    let payload_end = tail.find("?=")?;
    let payload = &tail[..payload_end];

    let bytes = match encoding {
        "B" | "b" => decode_base64(payload).ok()?,
        "Q" | "q" => {
            // Q encoding uses underscore for space
            let unspaced = payload.replace('_', " ");
            decode_quoted_printable(&unspaced).ok()?
        }
        _ => return None,
    };

    let consumed = 2 + charset_end + 1 + encoding_end + 1 + payload_end + 2;
    Some((decode_charset(&bytes, charset), consumed))
}

/// Decodes encoded words embedded anywhere in a token, such as the
/// `=?..?=<addr>` form a recipient header uses.
fn decode_token(token: &str) -> String {
    let mut out = String::new();
    let mut rest = token;

    while let Some(start) = rest.find("=?") {
        if let Some((decoded, consumed)) = decode_prefix_word(&rest[start..]) {
            out.push_str(&rest[..start]);
            out.push_str(&decoded);
            rest = &rest[start + consumed..];
        } else {
            out.push_str(&rest[..start + 2]);
            rest = &rest[start + 2..];
        }
    }

    out.push_str(rest);
    out
}

/// Decodes a header value containing RFC 2047 encoded words.
///
/// The value is tokenized on whitespace; encoded words are decoded
/// with their declared charset, raw text kept as-is, and all chunks
/// re-joined with a single space. Joining with a space rather than
/// bare concatenation keeps the word boundary between adjacent encoded
/// words of a folded multi-chunk header.
#[must_use]
pub fn decode_words(value: &str) -> String {
    if !value.contains("=?") {
        return value.trim().to_string();
    }

    let chunks: Vec<String> = value.split_whitespace().map(decode_token).collect();

    chunks.join(" ")
}
