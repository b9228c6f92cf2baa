//! MIME part tree.
//!
//! A part is a header block plus either raw payload bytes or a list of
//! child parts. This is the node shape the message layer builds and the
//! codec serializes.

use crate::content_type::ContentType;
use crate::encoding::{decode_base64, decode_quoted_printable, encode_quoted_printable, wrap_base64};
use crate::error::Result;
use crate::header::Headers;
use rand::Rng;

/// Transfer encoding types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferEncoding {
    /// 7-bit ASCII.
    SevenBit,
    /// 8-bit binary.
    EightBit,
    /// Base64 encoding.
    Base64,
    /// Quoted-Printable encoding.
    QuotedPrintable,
    /// Binary (no encoding).
    Binary,
}

impl TransferEncoding {
    /// Parses transfer encoding from a header value.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "8bit" => Self::EightBit,
            "base64" => Self::Base64,
            "quoted-printable" => Self::QuotedPrintable,
            "binary" => Self::Binary,
            _ => Self::SevenBit,
        }
    }
}

impl std::fmt::Display for TransferEncoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SevenBit => write!(f, "7bit"),
            Self::EightBit => write!(f, "8bit"),
            Self::Base64 => write!(f, "base64"),
            Self::QuotedPrintable => write!(f, "quoted-printable"),
            Self::Binary => write!(f, "binary"),
        }
    }
}

/// Payload of a part: raw data or nested parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartBody {
    /// Leaf payload, already transfer-encoded as described by the
    /// part's Content-Transfer-Encoding header.
    Data(String),
    /// Child parts of a multipart container.
    Multi(Vec<Part>),
}

/// MIME message part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Part {
    /// Part headers.
    pub headers: Headers,
    /// Part payload.
    pub body: PartBody,
}

/// Mints a multipart boundary.
///
/// Minted once at container construction and stored in the part's own
/// Content-Type so repeated encodes of the same tree are byte-stable.
#[must_use]
pub fn mint_boundary() -> String {
    let mut rng = rand::thread_rng();
    let token: u64 = rng.r#gen();
    format!("=_missive_{token:016x}")
}

impl Part {
    /// Creates a part from headers and a raw payload.
    #[must_use]
    pub const fn new(headers: Headers, body: PartBody) -> Self {
        Self { headers, body }
    }

    /// Creates a text/plain part, quoted-printable encoded.
    #[must_use]
    pub fn text(content: &str) -> Self {
        Self::leaf(ContentType::text_plain(), content)
    }

    /// Creates a text/html part, quoted-printable encoded.
    #[must_use]
    pub fn html(content: &str) -> Self {
        Self::leaf(ContentType::text_html(), content)
    }

    fn leaf(content_type: ContentType, content: &str) -> Self {
        let mut headers = Headers::new();
        headers.add("Content-Type", content_type.to_string());
        headers.add("Content-Transfer-Encoding", "quoted-printable");
        Self {
            headers,
            body: PartBody::Data(encode_quoted_printable(content)),
        }
    }

    /// Creates a multipart/alternative container for body renderings.
    #[must_use]
    pub fn alternative(children: Vec<Self>) -> Self {
        let boundary = mint_boundary();
        let mut headers = Headers::new();
        headers.add(
            "Content-Type",
            ContentType::multipart_alternative(boundary).to_string(),
        );
        Self {
            headers,
            body: PartBody::Multi(children),
        }
    }

    /// Creates an attachment part from an already base64-encoded
    /// payload, wrapped to the RFC 2045 line limit.
    #[must_use]
    pub fn attachment(filename: &str, content_type: &ContentType, payload_b64: &str) -> Self {
        let ct = content_type.clone().with_parameter("name", filename);
        let mut headers = Headers::new();
        headers.add("Content-Type", ct.to_string());
        headers.add("Content-Transfer-Encoding", "base64");
        headers.add(
            "Content-Disposition",
            format!("attachment; filename=\"{filename}\""),
        );
        Self {
            headers,
            body: PartBody::Data(wrap_base64(payload_b64)),
        }
    }

    /// Gets the content type, defaulting to text/plain.
    ///
    /// # Errors
    ///
    /// Returns an error if the Content-Type header is present but invalid.
    pub fn content_type(&self) -> Result<ContentType> {
        self.headers
            .get("Content-Type")
            .map_or_else(|| Ok(ContentType::text_plain()), ContentType::parse)
    }

    /// Gets the transfer encoding.
    #[must_use]
    pub fn transfer_encoding(&self) -> TransferEncoding {
        self.headers
            .get("Content-Transfer-Encoding")
            .map_or(TransferEncoding::SevenBit, TransferEncoding::parse)
    }

    /// Returns the filename carried by this part, if any.
    ///
    /// Checks the Content-Disposition `filename` parameter first, then
    /// the Content-Type `name` parameter. A part carrying a filename is
    /// an attachment whatever its declared maintype.
    #[must_use]
    pub fn filename(&self) -> Option<String> {
        if let Some(disposition) = self.headers.get("Content-Disposition") {
            if let Some(name) = param_value(disposition, "filename") {
                return Some(name);
            }
        }

        self.content_type()
            .ok()
            .and_then(|ct| ct.name().map(ToString::to_string))
    }

    /// Child parts of a multipart container, empty for leaves.
    #[must_use]
    pub fn children(&self) -> &[Self] {
        match &self.body {
            PartBody::Multi(parts) => parts,
            PartBody::Data(_) => &[],
        }
    }

    /// Raw (still transfer-encoded) payload for leaf parts.
    #[must_use]
    pub fn raw_payload(&self) -> Option<&str> {
        match &self.body {
            PartBody::Data(data) => Some(data),
            PartBody::Multi(_) => None,
        }
    }

    /// Decodes the payload according to the transfer encoding.
    ///
    /// # Errors
    ///
    /// Returns an error if decoding fails or the part is a container.
    pub fn decode_payload(&self) -> Result<Vec<u8>> {
        let data = match &self.body {
            PartBody::Data(data) => data,
            PartBody::Multi(_) => {
                return Err(crate::error::Error::InvalidMultipart(
                    "Container part has no payload".to_string(),
                ));
            }
        };

        match self.transfer_encoding() {
            TransferEncoding::Base64 => {
                // Lenient: wrapped base64 lines
                let cleaned: String = data.chars().filter(|c| !c.is_whitespace()).collect();
                decode_base64(&cleaned)
            }
            TransferEncoding::QuotedPrintable => decode_quoted_printable(data),
            _ => Ok(data.clone().into_bytes()),
        }
    }

    /// Decoded payload as text, using the declared charset.
    ///
    /// # Errors
    ///
    /// Returns an error if transfer decoding fails.
    pub fn decoded_text(&self) -> Result<String> {
        let bytes = self.decode_payload()?;
        let charset = self
            .content_type()
            .ok()
            .and_then(|ct| ct.charset().map(ToString::to_string))
            .unwrap_or_else(|| "utf-8".to_string());
        Ok(crate::encoding::decode_charset(&bytes, &charset))
    }

    /// Replaces the payload of a leaf text part, re-encoding it.
    pub fn set_text(&mut self, content: &str) {
        self.headers
            .set("Content-Transfer-Encoding", "quoted-printable");
        self.body = PartBody::Data(encode_quoted_printable(content));
    }
}

/// Extracts a `key=value` or `key="value"` parameter from a header value.
fn param_value(header_value: &str, key: &str) -> Option<String> {
    for piece in header_value.split(';') {
        if let Some((k, v)) = piece.split_once('=') {
            if k.trim().eq_ignore_ascii_case(key) {
                return Some(v.trim().trim_matches('"').to_string());
            }
        }
    }
    None
}
