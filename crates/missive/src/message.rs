//! The in-memory mail message model.
//!
//! An [`Email`] reconciles a structured representation (headers,
//! plain/HTML body alternatives, attachments) with the serialized wire
//! format. It is a plain value object: synchronous, no external
//! resources.

use crate::address::{self, Address, AddressList};
use crate::error::{Error, Result};
use crate::header::{canonical_name, decode_value, encode_recipients, encode_value, is_recipient_header};
use crate::html::{extract_body_fragment, html_to_text};
use crate::mimetype::MimeTypes;
use crate::subject;
use chrono::{DateTime, Utc};
use missive_mime::encoding::encode_base64;
use missive_mime::{Headers, Part, PartBody, TransferEncoding};
use rand::Rng;
use std::path::Path;

/// A header value: one string or several.
#[derive(Debug, Clone)]
pub enum FieldValue {
    /// A single value.
    One(String),
    /// Multiple values (e.g. several recipients).
    Many(Vec<String>),
}

impl FieldValue {
    fn into_vec(self) -> Vec<String> {
        match self {
            Self::One(v) => vec![v],
            Self::Many(vs) => vs,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        Self::One(v.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        Self::One(v)
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(vs: Vec<String>) -> Self {
        Self::Many(vs)
    }
}

impl From<Vec<&str>> for FieldValue {
    fn from(vs: Vec<&str>) -> Self {
        Self::Many(vs.into_iter().map(ToString::to_string).collect())
    }
}

/// Classified body content of a message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BodyParts {
    /// First plain-text body, decoded.
    pub plain: Option<String>,
    /// First HTML body, decoded.
    pub html: Option<String>,
    /// Filenames of all attachment parts.
    pub files: Vec<String>,
}

/// One attachment view entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    /// Declared content type.
    pub content_type: String,
    /// Filename.
    pub name: String,
    /// Base64-encoded payload.
    pub content: String,
}

/// Addressing and body overrides for [`Email::forward`].
#[derive(Debug, Clone, Default)]
pub struct ForwardOptions {
    /// New From mailbox.
    pub from: Option<String>,
    /// New To recipients.
    pub to: Vec<String>,
    /// New Cc recipients.
    pub cc: Vec<String>,
    /// New Bcc recipients.
    pub bcc: Vec<String>,
    /// Replacement plain body; `{original}` is formatted against the
    /// parent's plain body.
    pub body_text: Option<String>,
    /// Replacement HTML body; `{original}` is formatted against the
    /// parent's HTML `<body>` fragment.
    pub body_html: Option<String>,
}

/// An Internet mail message.
#[derive(Debug, Clone, Default)]
pub struct Email {
    headers: Headers,
    parts: Vec<Part>,
    bcc_pending: Option<String>,
}

impl Email {
    /// Creates an empty message with a freshly stamped Date header.
    #[must_use]
    pub fn new() -> Self {
        let mut email = Self::default();
        email.headers.set("Date", Utc::now().to_rfc2822());
        email
    }

    /// Starts a builder for keyword-style construction.
    #[must_use]
    pub fn builder() -> EmailBuilder {
        EmailBuilder::default()
    }

    /// Parses a message from raw text.
    ///
    /// Never fails: empty or malformed input yields a message that
    /// [`is_empty`](Self::is_empty) and whose derived views return
    /// empty defaults. No Date header is stamped.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let (headers, mut parts) = missive_mime::decode(raw);

        // A top-level mixed container unwraps into the message's own
        // part list; alternative groups stay intact as groups.
        if parts.len() == 1 {
            let is_mixed = parts[0]
                .content_type()
                .is_ok_and(|ct| ct.is("multipart", "mixed"));
            if is_mixed {
                if let PartBody::Multi(children) = parts.remove(0).body {
                    parts = children;
                }
            }
        }

        Self {
            headers,
            parts,
            bcc_pending: None,
        }
    }

    /// Whether the message holds neither headers nor parts.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.headers.is_empty() && self.parts.is_empty()
    }

    /// The message's header block.
    #[must_use]
    pub const fn headers(&self) -> &Headers {
        &self.headers
    }

    /// The message's part tree.
    #[must_use]
    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    /// Pending Bcc addresses, space-joined. Never serialized.
    #[must_use]
    pub fn bcc_pending(&self) -> Option<&str> {
        self.bcc_pending.as_deref()
    }

    /// Sets a header, applying canonical naming and wire encoding.
    ///
    /// Returns the value actually stored: the encoded header value, the
    /// pending Bcc join, or — when Date is re-set to its current value —
    /// the unchanged stored value.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an empty name or empty value.
    /// The message is not mutated on error.
    pub fn add_header(&mut self, name: &str, value: impl Into<FieldValue>) -> Result<String> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::validation("Empty header name"));
        }

        let values: Vec<String> = value
            .into()
            .into_vec()
            .into_iter()
            .filter(|v| !v.trim().is_empty())
            .collect();
        if values.is_empty() {
            return Err(Error::validation(format!("Empty value for header {name}")));
        }

        let name = canonical_name(name).map_or_else(|| name.to_string(), ToString::to_string);

        // Bcc never reaches the header block; it is kept aside for the
        // transport envelope.
        if name == "Bcc" {
            let pending = values
                .iter()
                .flat_map(|v| address::split_specs(v))
                .filter_map(|spec| {
                    let parsed = address::parse(&spec);
                    (!parsed.address.is_empty()).then_some(parsed.address)
                })
                .collect::<Vec<_>>()
                .join(" ");
            if pending.is_empty() {
                return Err(Error::validation("No parseable Bcc address"));
            }
            self.bcc_pending = Some(pending.clone());
            return Ok(pending);
        }

        if name == "Date" {
            let value = values.join(", ");
            if self.headers.get("Date") == Some(value.as_str()) {
                // Unchanged: signal a no-op rather than duplicating.
                return Ok(value);
            }
            self.headers.set("Date", value.clone());
            return Ok(value);
        }

        let encoded = if is_recipient_header(&name) {
            let encoded = encode_recipients(&values);
            if encoded.is_empty() {
                return Err(Error::validation(format!(
                    "No parseable address for header {name}"
                )));
            }
            encoded
        } else {
            encode_value(&values.join(", "))
        };

        self.headers.set(&name, encoded.clone());
        Ok(encoded)
    }

    /// Gets a header value, decoded from its wire form.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<String> {
        self.headers.get(name).map(decode_value)
    }

    /// Attaches body content as one alternative group.
    ///
    /// When only HTML is given, the plain rendering is derived via
    /// [`html_to_text`] (unless a plain body already exists). The group
    /// is appended to the part tree; body groups added earlier for
    /// other kinds survive as separate groups.
    ///
    /// # Errors
    ///
    /// Returns a validation error when neither body is given, and
    /// [`Error::BodyAlreadySet`] when a body of a supplied kind
    /// already exists.
    pub fn add_body(&mut self, plain: Option<&str>, html: Option<&str>) -> Result<()> {
        if plain.is_none() && html.is_none() {
            return Err(Error::validation("No body content given"));
        }

        let existing = self.body_parts();
        if plain.is_some() && existing.plain.is_some() {
            return Err(Error::BodyAlreadySet("plain"));
        }
        if html.is_some() && existing.html.is_some() {
            return Err(Error::BodyAlreadySet("html"));
        }

        let plain_content = plain.map(ToString::to_string).or_else(|| {
            html.and_then(|h| existing.plain.is_none().then(|| html_to_text(h)))
        });

        let mut children = Vec::new();
        if let Some(text) = &plain_content {
            children.push(Part::text(text));
        }
        if let Some(markup) = html {
            children.push(Part::html(markup));
        }

        self.parts.push(Part::alternative(children));
        Ok(())
    }

    /// Attaches a file read from disk; the filename is taken from the
    /// path's final component.
    ///
    /// # Errors
    ///
    /// Returns a validation error when no filename can be determined,
    /// or an I/O error when the file cannot be read.
    pub fn add_attachment_path(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(ToString::to_string)
            .ok_or_else(|| Error::validation("Attachment path has no filename"))?;
        let bytes = std::fs::read(path)?;
        self.add_attachment_bytes(&filename, &bytes)
    }

    /// Attaches raw bytes under a filename, using the default
    /// content-type table.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an empty filename or empty
    /// content.
    pub fn add_attachment_bytes(&mut self, filename: &str, bytes: &[u8]) -> Result<()> {
        self.add_attachment_bytes_with(filename, bytes, &MimeTypes::default())
    }

    /// Attaches raw bytes, inferring the content type from the given
    /// lookup table.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an empty filename or empty
    /// content.
    pub fn add_attachment_bytes_with(
        &mut self,
        filename: &str,
        bytes: &[u8],
        mime_types: &MimeTypes,
    ) -> Result<()> {
        if bytes.is_empty() {
            return Err(Error::validation("Empty attachment content"));
        }
        self.attach_base64(filename, &encode_base64(bytes), mime_types)
    }

    /// Attaches an already base64-encoded payload under a filename.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an empty filename or empty
    /// payload.
    pub fn add_attachment_base64(&mut self, filename: &str, payload: &str) -> Result<()> {
        if payload.trim().is_empty() {
            return Err(Error::validation("Empty attachment content"));
        }
        self.attach_base64(filename, payload, &MimeTypes::default())
    }

    fn attach_base64(&mut self, filename: &str, payload: &str, mime_types: &MimeTypes) -> Result<()> {
        let filename = filename.trim();
        if filename.is_empty() {
            return Err(Error::validation("Attachment has no filename"));
        }
        let content_type = mime_types.guess_content_type(filename);
        self.parts
            .push(Part::attachment(filename, &content_type, payload));
        Ok(())
    }

    /// Walks the part tree and classifies its content.
    ///
    /// Parts carrying a filename contribute to `files` only; they are
    /// never miscategorized as body text whatever their maintype.
    #[must_use]
    pub fn body_parts(&self) -> BodyParts {
        let mut out = BodyParts::default();
        classify_parts(&self.parts, &mut out);
        out
    }

    /// One entry per part carrying a filename, computed fresh from the
    /// current part tree on every call.
    #[must_use]
    pub fn attachments(&self) -> impl Iterator<Item = Attachment> + '_ {
        let mut found = Vec::new();
        collect_attachments(&self.parts, &mut found);
        found.into_iter()
    }

    /// The subject with any reply/forward prefix stripped.
    #[must_use]
    pub fn subject(&self) -> String {
        subject::clean_subject(&self.raw_subject())
    }

    /// The subject as carried on the wire, decoded.
    #[must_use]
    pub fn raw_subject(&self) -> String {
        self.header("Subject").unwrap_or_default()
    }

    /// Whether this message is a reply.
    #[must_use]
    pub fn is_reply(&self) -> bool {
        subject::is_reply(&self.raw_subject(), self.headers.contains("In-Reply-To"))
    }

    /// Whether this message was forwarded.
    #[must_use]
    pub fn is_forwarded(&self) -> bool {
        subject::is_forwarded(&self.raw_subject())
    }

    /// The References header, whitespace-split.
    #[must_use]
    pub fn references(&self) -> Vec<String> {
        self.header("References")
            .unwrap_or_default()
            .split_whitespace()
            .map(ToString::to_string)
            .collect()
    }

    /// The parent Message-ID: last token of the references.
    #[must_use]
    pub fn parent(&self) -> Option<String> {
        self.references().pop()
    }

    /// Parsed From mailbox.
    #[must_use]
    pub fn from_(&self) -> Address {
        Address::parse(&self.header("From").unwrap_or_default())
    }

    /// Parsed To list.
    #[must_use]
    pub fn to(&self) -> AddressList {
        address::parse_list(&self.header("To").unwrap_or_default())
    }

    /// Parsed Cc list.
    #[must_use]
    pub fn cc(&self) -> AddressList {
        address::parse_list(&self.header("Cc").unwrap_or_default())
    }

    /// Parsed Bcc list.
    ///
    /// Falls back to the pending Bcc value when no Bcc header is
    /// present (it never is on messages built here).
    #[must_use]
    pub fn bcc(&self) -> AddressList {
        if let Some(value) = self.header("Bcc") {
            return address::parse_list(&value);
        }
        match &self.bcc_pending {
            Some(pending) => AddressList::new(
                pending
                    .split_whitespace()
                    .map(ToString::to_string)
                    .collect(),
            ),
            None => AddressList::default(),
        }
    }

    /// To, Cc and Bcc concatenated as fragment lists, not deduplicated.
    #[must_use]
    pub fn recipients(&self) -> AddressList {
        self.to() + self.cc() + self.bcc()
    }

    /// Deduplicated flat list of bare recipient addresses.
    #[must_use]
    pub fn recipients_addresses(&self) -> Vec<String> {
        let mut seen = Vec::new();
        for addr in self.recipients().addresses() {
            if !seen.contains(&addr) {
                seen.push(addr);
            }
        }
        seen
    }

    /// Builds a forwarded copy of this message.
    ///
    /// The copy is seeded by re-parsing this message's serialized form.
    /// Identity and addressing headers are stripped and replaced from
    /// `options`; References gains this message's own Message-ID, a
    /// fresh Message-ID is minted, and the subject becomes
    /// `Fwd: <clean subject>`. Body overrides rewrite the first
    /// non-attachment part of each subtype, formatting `{original}`
    /// against this message's own body; attachment parts are left
    /// untouched.
    ///
    /// # Errors
    ///
    /// Returns a validation error if an override value is invalid.
    pub fn forward(&self, options: ForwardOptions) -> Result<Self> {
        let parent_references = self.references();
        let parent_message_id = self.header("Message-ID");
        let parent_subject = self.subject();
        let parent_body = self.body_parts();

        let mut fwd = Self::parse(&self.serialize());
        for name in ["From", "To", "Cc", "Bcc", "References", "Message-ID", "Subject"] {
            fwd.headers.remove(name);
        }

        if let Some(from) = options.from {
            fwd.add_header("From", from)?;
        }
        if !options.to.is_empty() {
            fwd.add_header("To", options.to)?;
        }
        if !options.cc.is_empty() {
            fwd.add_header("Cc", options.cc)?;
        }
        if !options.bcc.is_empty() {
            fwd.add_header("Bcc", options.bcc)?;
        }

        let mut references = parent_references;
        if let Some(id) = parent_message_id {
            references.push(id);
        }
        if !references.is_empty() {
            fwd.headers.set("References", references.join(" "));
        }

        let domain = fwd.from_().address;
        let domain = domain.split_once('@').map_or("localhost", |(_, d)| d);
        fwd.headers.set("Message-ID", mint_message_id(domain));

        fwd.add_header("Subject", format!("Fwd: {parent_subject}"))?;

        if options.body_text.is_some() || options.body_html.is_some() {
            let text_override = options.body_text.map(|template| {
                template.replace("{original}", parent_body.plain.as_deref().unwrap_or(""))
            });
            let html_override = options.body_html.map(|template| {
                let parent_html = parent_body.html.as_deref().unwrap_or("");
                template.replace("{original}", extract_body_fragment(parent_html))
            });

            let text_override = text_override.or_else(|| {
                html_override.as_deref().map(html_to_text)
            });

            let mut add_plain = None;
            let mut add_html = None;
            if let Some(text) = text_override {
                if !rewrite_first_text_part(&mut fwd.parts, "plain", &text) {
                    add_plain = Some(text);
                }
            }
            if let Some(markup) = html_override {
                if !rewrite_first_text_part(&mut fwd.parts, "html", &markup) {
                    add_html = Some(markup);
                }
            }
            if add_plain.is_some() || add_html.is_some() {
                fwd.add_body(add_plain.as_deref(), add_html.as_deref())?;
            }
        }

        Ok(fwd)
    }

    /// Serializes the message to its wire form.
    ///
    /// Round-trip stable: `parse(serialize(m)).serialize()` equals
    /// `serialize(m)`.
    #[must_use]
    pub fn serialize(&self) -> String {
        if self.is_empty() {
            return String::new();
        }
        missive_mime::encode(&self.headers, &self.parts)
    }
}

/// Builder for keyword-style message construction.
#[derive(Debug, Clone, Default)]
pub struct EmailBuilder {
    subject: Option<String>,
    from: Option<String>,
    to: Vec<String>,
    cc: Vec<String>,
    bcc: Vec<String>,
    date: Option<DateTime<Utc>>,
    date_raw: Option<String>,
    body_text: Option<String>,
    body_html: Option<String>,
}

impl EmailBuilder {
    /// Sets the subject.
    #[must_use]
    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    /// Sets the sender mailbox.
    #[must_use]
    pub fn from(mut self, from: impl Into<String>) -> Self {
        self.from = Some(from.into());
        self
    }

    /// Adds a To recipient.
    #[must_use]
    pub fn to(mut self, to: impl Into<String>) -> Self {
        self.to.push(to.into());
        self
    }

    /// Adds a Cc recipient.
    #[must_use]
    pub fn cc(mut self, cc: impl Into<String>) -> Self {
        self.cc.push(cc.into());
        self
    }

    /// Adds a Bcc recipient (kept out of the serialized headers).
    #[must_use]
    pub fn bcc(mut self, bcc: impl Into<String>) -> Self {
        self.bcc.push(bcc.into());
        self
    }

    /// Sets the Date from a timezone-aware timestamp, normalized to UTC.
    #[must_use]
    pub fn date<Tz: chrono::TimeZone>(mut self, date: DateTime<Tz>) -> Self {
        self.date = Some(date.with_timezone(&Utc));
        self
    }

    /// Sets the Date from an RFC 2822 or RFC 3339 string; an
    /// unparseable value is stored verbatim.
    #[must_use]
    pub fn date_str(mut self, date: impl Into<String>) -> Self {
        let date = date.into();
        if let Ok(parsed) = DateTime::parse_from_rfc2822(&date)
            .or_else(|_| DateTime::parse_from_rfc3339(&date))
        {
            self.date = Some(parsed.with_timezone(&Utc));
        } else {
            self.date_raw = Some(date);
        }
        self
    }

    /// Sets the plain-text body.
    #[must_use]
    pub fn body_text(mut self, text: impl Into<String>) -> Self {
        self.body_text = Some(text.into());
        self
    }

    /// Sets the HTML body.
    #[must_use]
    pub fn body_html(mut self, html: impl Into<String>) -> Self {
        self.body_html = Some(html.into());
        self
    }

    /// Builds the message: stamps Date, applies headers, attaches body.
    ///
    /// # Errors
    ///
    /// Propagates header and body validation errors.
    pub fn build(self) -> Result<Email> {
        let mut email = Email::default();

        let stamp = self.date_raw.unwrap_or_else(|| {
            self.date.unwrap_or_else(Utc::now).to_rfc2822()
        });
        email.headers.set("Date", stamp);

        if let Some(subject) = self.subject {
            email.add_header("Subject", subject)?;
        }
        if let Some(from) = self.from {
            email.add_header("From", from)?;
        }
        if !self.to.is_empty() {
            email.add_header("To", self.to)?;
        }
        if !self.cc.is_empty() {
            email.add_header("Cc", self.cc)?;
        }
        if !self.bcc.is_empty() {
            email.add_header("Bcc", self.bcc)?;
        }
        if self.body_text.is_some() || self.body_html.is_some() {
            email.add_body(self.body_text.as_deref(), self.body_html.as_deref())?;
        }

        Ok(email)
    }
}

fn classify_parts(parts: &[Part], out: &mut BodyParts) {
    for part in parts {
        // A filename makes a part an attachment, full stop.
        if let Some(name) = part.filename() {
            out.files.push(name);
            continue;
        }

        match &part.body {
            PartBody::Multi(children) => classify_parts(children, out),
            PartBody::Data(_) => {
                let Ok(content_type) = part.content_type() else {
                    continue;
                };
                if content_type.is("text", "html") {
                    if out.html.is_none() {
                        out.html = part.decoded_text().ok();
                    }
                } else if content_type.is("text", "plain") && out.plain.is_none() {
                    out.plain = part.decoded_text().ok();
                }
            }
        }
    }
}

fn collect_attachments(parts: &[Part], out: &mut Vec<Attachment>) {
    for part in parts {
        if let Some(name) = part.filename() {
            let content_type = part
                .content_type()
                .map_or_else(|_| "application/octet-stream".to_string(), |ct| {
                    format!("{}/{}", ct.main_type, ct.sub_type)
                });
            let content = if part.transfer_encoding() == TransferEncoding::Base64 {
                // Line-wrapped on the wire; the view is one clean string.
                part.raw_payload()
                    .unwrap_or_default()
                    .chars()
                    .filter(|c| !c.is_whitespace())
                    .collect()
            } else {
                part.decode_payload().map(|b| encode_base64(&b)).unwrap_or_default()
            };
            out.push(Attachment {
                content_type,
                name,
                content,
            });
            continue;
        }
        if let PartBody::Multi(children) = &part.body {
            collect_attachments(children, out);
        }
    }
}

fn rewrite_first_text_part(parts: &mut [Part], sub_type: &str, content: &str) -> bool {
    for part in parts.iter_mut() {
        if part.filename().is_some() {
            continue;
        }

        let is_leaf_match = matches!(&part.body, PartBody::Data(_))
            && part.content_type().is_ok_and(|ct| ct.is("text", sub_type));
        if is_leaf_match {
            part.set_text(content);
            return true;
        }

        if let PartBody::Multi(children) = &mut part.body {
            if rewrite_first_text_part(children, sub_type, content) {
                return true;
            }
        }
    }
    false
}

/// Mints a unique Message-ID for the given domain.
fn mint_message_id(domain: &str) -> String {
    let timestamp = Utc::now().timestamp_micros();
    let token: u64 = rand::thread_rng().r#gen();
    format!("<{timestamp}.{token:016x}@{domain}>")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn simple_raw() -> String {
        concat!(
            "Date: Thu, 01 Mar 2018 12:30:03 +0000\r\n",
            "From: User <notifications@git.example.com>\r\n",
            "To: missive@noreply.git.example.com, other@example.com\r\n",
            "Cc: thebest@example.com\r\n",
            "Bcc: theboss@example.com\r\n",
            "Subject: Test Message\r\n",
            "Content-Type: text/plain\r\n",
            "\r\n",
            "This is a test message body.\r\n"
        )
        .to_string()
    }

    #[test]
    fn test_parse_empty_is_falsy() {
        let email = Email::parse("");
        assert!(email.is_empty());
        assert_eq!(email.subject(), "");
        assert!(email.to().is_empty());
        assert!(email.references().is_empty());
        assert!(email.parent().is_none());
    }

    #[test]
    fn test_parse_address_views() {
        let email = Email::parse(&simple_raw());
        assert_eq!(email.from_().address, "notifications@git.example.com");
        assert_eq!(email.from_().display_name, "User");
        assert_eq!(
            email.to().addresses(),
            vec!["missive@noreply.git.example.com", "other@example.com"]
        );
        assert_eq!(email.cc().addresses(), vec!["thebest@example.com"]);
        assert_eq!(email.bcc().addresses(), vec!["theboss@example.com"]);
    }

    #[test]
    fn test_recipients_concatenation() {
        let email = Email::parse(&simple_raw());
        assert_eq!(
            email.recipients().addresses(),
            vec![
                "missive@noreply.git.example.com",
                "other@example.com",
                "thebest@example.com",
                "theboss@example.com"
            ]
        );
    }

    #[test]
    fn test_new_stamps_date() {
        let email = Email::new();
        assert!(email.headers().contains("Date"));
    }

    #[test]
    fn test_builder_basic() {
        let email = Email::builder()
            .subject("Hello")
            .from("sender@example.com")
            .to("recipient@example.com")
            .body_text("Hi there")
            .build()
            .unwrap();

        assert_eq!(email.subject(), "Hello");
        assert_eq!(email.from_().address, "sender@example.com");
        assert_eq!(email.body_parts().plain.as_deref(), Some("Hi there"));
        assert!(email.headers().contains("Date"));
    }

    #[test]
    fn test_builder_date_string_normalized() {
        let email = Email::builder()
            .date_str("Thu, 01 Mar 2018 13:30:03 +0100")
            .build()
            .unwrap();
        // Normalized to UTC
        assert_eq!(
            email.headers().get("Date"),
            Some("Thu, 1 Mar 2018 12:30:03 +0000")
        );
    }

    #[test]
    fn test_add_header_validation() {
        let mut email = Email::new();
        assert!(matches!(
            email.add_header("", "x"),
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            email.add_header("Subject", ""),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn test_add_header_canonical_name() {
        let mut email = Email::new();
        email.add_header("in-reply-to", "<abc@example.com>").unwrap();
        assert!(email.headers().contains("In-Reply-To"));
        let serialized = email.serialize();
        assert!(serialized.contains("In-Reply-To: <abc@example.com>"));
    }

    #[test]
    fn test_unknown_header_passes_through() {
        let mut email = Email::new();
        email.add_header("X-Loop-Count", "3").unwrap();
        assert!(email.serialize().contains("X-Loop-Count: 3"));
    }

    #[test]
    fn test_date_set_twice_is_noop() {
        let mut email = Email::new();
        let stored = email.headers().get("Date").unwrap().to_string();
        let returned = email.add_header("Date", stored.as_str()).unwrap();
        assert_eq!(returned, stored);

        let serialized = email.serialize();
        assert_eq!(serialized.matches("Date:").count(), 1);
    }

    #[test]
    fn test_bcc_never_serialized() {
        let email = Email::builder()
            .from("sender@example.com")
            .to("to@example.com")
            .bcc("secret@example.com")
            .build()
            .unwrap();

        assert!(!email.serialize().contains("Bcc:"));
        assert_eq!(email.bcc_pending(), Some("secret@example.com"));
        assert_eq!(email.bcc().addresses(), vec!["secret@example.com"]);
    }

    #[test]
    fn test_bcc_multiple_addresses_space_joined() {
        let mut email = Email::new();
        let pending = email
            .add_header("Bcc", vec!["a@example.com", "B <b@example.com>"])
            .unwrap();
        assert_eq!(pending, "a@example.com b@example.com");
        assert_eq!(email.bcc().addresses(), vec!["a@example.com", "b@example.com"]);
    }

    #[test]
    fn test_recipients_include_pending_bcc() {
        let email = Email::builder()
            .to("to@example.com")
            .cc("to@example.com")
            .bcc("bcc@example.com")
            .build()
            .unwrap();

        assert_eq!(
            email.recipients_addresses(),
            vec!["to@example.com", "bcc@example.com"]
        );
    }

    #[test]
    fn test_add_body_requires_content() {
        let mut email = Email::new();
        assert!(matches!(
            email.add_body(None, None),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn test_add_body_duplicate_plain_fails() {
        let mut email = Email::new();
        email.add_body(Some("a"), None).unwrap();
        assert!(matches!(
            email.add_body(Some("b"), None),
            Err(Error::BodyAlreadySet("plain"))
        ));
    }

    #[test]
    fn test_add_body_html_derives_plain() {
        let mut email = Email::new();
        email
            .add_body(None, Some("<html><body><p>Hello</p></body></html>"))
            .unwrap();
        let body = email.body_parts();
        assert!(body.html.is_some());
        let plain = body.plain.unwrap();
        assert!(plain.contains("Hello"));
    }

    #[test]
    fn test_add_body_separate_kinds() {
        let mut email = Email::new();
        email.add_body(Some("plain body"), None).unwrap();
        email.add_body(None, Some("<p>html body</p>")).unwrap();

        let body = email.body_parts();
        assert_eq!(body.plain.as_deref(), Some("plain body"));
        assert!(body.html.as_deref().unwrap().contains("html body"));
        // Two separate alternative groups
        assert_eq!(email.parts().len(), 2);
    }

    #[test]
    fn test_attachment_roundtrip() {
        let mut email = Email::new();
        email.add_attachment_bytes("notes.txt", b"hello notes").unwrap();

        let attachments: Vec<_> = email.attachments().collect();
        assert_eq!(attachments.len(), 1);
        assert_eq!(attachments[0].name, "notes.txt");
        assert_eq!(attachments[0].content_type, "text/plain");
        assert_eq!(attachments[0].content, encode_base64(b"hello notes"));
    }

    #[test]
    fn test_attachment_validation() {
        let mut email = Email::new();
        assert!(matches!(
            email.add_attachment_bytes("", b"data"),
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            email.add_attachment_bytes("f.bin", b""),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn test_attachments_restartable() {
        let mut email = Email::new();
        email.add_attachment_base64("a.bin", "AAAA").unwrap();
        assert_eq!(email.attachments().count(), 1);
        assert_eq!(email.attachments().count(), 1);

        email.add_attachment_base64("b.bin", "BBBB").unwrap();
        assert_eq!(email.attachments().count(), 2);
    }

    #[test]
    fn test_body_parts_excludes_attachments() {
        // A text/plain attachment must not leak into the plain body.
        let mut email = Email::new();
        email.add_body(None, Some("<p>the body</p>")).unwrap();
        email.add_attachment_bytes("data.txt", b"attached text").unwrap();

        let body = email.body_parts();
        assert_eq!(body.files, vec!["data.txt"]);
        assert!(body.html.is_some());
        assert_ne!(body.plain.as_deref(), Some("attached text"));
    }

    #[test]
    fn test_subject_classification() {
        let mut email = Email::new();
        email.add_header("Subject", "Re: [project] Add spec (#5)").unwrap();
        assert!(email.is_reply());
        assert!(!email.is_forwarded());
        assert_eq!(email.subject(), "[project] Add spec (#5)");
    }

    #[test]
    fn test_forwarded_beats_in_reply_to() {
        let mut email = Email::new();
        email.add_header("Subject", "Fwd: Hello").unwrap();
        email.add_header("In-Reply-To", "<x@example.com>").unwrap();
        assert!(email.is_forwarded());
        assert!(!email.is_reply());
    }

    #[test]
    fn test_references_and_parent() {
        let mut email = Email::new();
        email
            .add_header("References", "<a@example.com> <b@example.com>")
            .unwrap();
        assert_eq!(email.references(), vec!["<a@example.com>", "<b@example.com>"]);
        assert_eq!(email.parent().as_deref(), Some("<b@example.com>"));
    }

    #[test]
    fn test_encoded_subject_decoded() {
        let email =
            Email::parse("Subject: =?iso-8859-1?Q?ERROR_A_L'OBRIR_EL_LOT_DE_PERFILACI=D3_JUNY?=");
        assert_eq!(email.subject(), "ERROR A L'OBRIR EL LOT DE PERFILACIÓ JUNY");
    }

    #[test]
    fn test_serialize_round_trip() {
        let email = Email::builder()
            .subject("Round trip")
            .from("a@example.com")
            .to("b@example.com")
            .body_text("plain")
            .body_html("<p>html</p>")
            .build()
            .unwrap();

        let first = email.serialize();
        let second = Email::parse(&first).serialize();
        assert_eq!(first, second);
    }

    #[test]
    fn test_alternative_message_gains_attachment_round_trip() {
        // Parsed with an alternative top; adding an attachment must
        // wrap everything in a fresh mixed container, not reuse the
        // alternative's boundary for the new top level.
        let raw = concat!(
            "Subject: Alt top\r\n",
            "From: a@example.com\r\n",
            "Content-Type: multipart/alternative; boundary=\"ALT\"\r\n",
            "\r\n",
            "--ALT\r\n",
            "Content-Type: text/plain\r\n",
            "\r\n",
            "plain body\r\n",
            "--ALT\r\n",
            "Content-Type: text/html\r\n",
            "\r\n",
            "<p>plain body</p>\r\n",
            "--ALT--\r\n"
        );

        let mut email = Email::parse(raw);
        email.add_attachment_bytes("data.csv", b"a,b\n1,2\n").unwrap();

        let first = email.serialize();
        let reparsed = Email::parse(&first);
        assert_eq!(first, reparsed.serialize());
        assert_eq!(reparsed.body_parts().files, vec!["data.csv"]);
        assert_eq!(reparsed.body_parts().plain.as_deref(), Some("plain body"));
        assert_eq!(reparsed.attachments().count(), 1);
    }

    #[test]
    fn test_attachment_view_unwraps_wire_lines() {
        let bytes = vec![0x42; 400];
        let mut email = Email::new();
        email.add_attachment_bytes("big.bin", &bytes).unwrap();

        // Wrapped on the wire, clean in the view.
        assert!(email.serialize().lines().all(|line| line.len() <= 78));
        let attachment = email.attachments().next().unwrap();
        assert!(!attachment.content.contains(char::is_whitespace));
        assert_eq!(attachment.content, encode_base64(&bytes));
    }

    #[test]
    fn test_recipient_header_rejects_unparseable_value() {
        let mut email = Email::new();
        assert!(matches!(
            email.add_header("To", "not an address"),
            Err(Error::Validation(_))
        ));
        assert!(!email.headers().contains("To"));
    }

    #[test]
    fn test_serialize_round_trip_with_attachment() {
        let mut email = Email::builder()
            .subject("With file")
            .from("a@example.com")
            .to("b@example.com")
            .body_text("see attached")
            .build()
            .unwrap();
        email.add_attachment_bytes("f.pdf", b"%PDF-1.4 fake").unwrap();

        let first = email.serialize();
        let reparsed = Email::parse(&first);
        assert_eq!(first, reparsed.serialize());
        assert_eq!(reparsed.body_parts().files, vec!["f.pdf"]);
        assert_eq!(reparsed.body_parts().plain.as_deref(), Some("see attached"));
    }

    #[test]
    fn test_forward_header_hygiene() {
        let mut original = Email::builder()
            .subject("Re: Quarterly report")
            .from("alice@example.com")
            .to("bob@example.com")
            .cc("carol@example.com")
            .body_text("the numbers")
            .build()
            .unwrap();
        original.add_header("Message-ID", "<orig@example.com>").unwrap();
        original
            .add_header("References", "<root@example.com>")
            .unwrap();

        let fwd = original
            .forward(ForwardOptions {
                from: Some("bob@example.com".to_string()),
                to: vec!["dave@example.com".to_string()],
                ..ForwardOptions::default()
            })
            .unwrap();

        assert_eq!(
            fwd.references(),
            vec!["<root@example.com>", "<orig@example.com>"]
        );
        let new_id = fwd.header("Message-ID").unwrap();
        assert_ne!(new_id, "<orig@example.com>");
        assert!(fwd.cc().is_empty());
        assert!(fwd.bcc().is_empty());
        assert!(fwd.raw_subject().starts_with("Fwd:"));
        assert_eq!(fwd.subject(), "Quarterly report");
        assert_eq!(fwd.to().addresses(), vec!["dave@example.com"]);
        assert_eq!(fwd.from_().address, "bob@example.com");
    }

    #[test]
    fn test_forward_body_placeholder() {
        let original = Email::builder()
            .subject("Numbers")
            .from("alice@example.com")
            .to("bob@example.com")
            .body_text("the original numbers")
            .build()
            .unwrap();

        let fwd = original
            .forward(ForwardOptions {
                to: vec!["dave@example.com".to_string()],
                body_text: Some("FYI:\n{original}".to_string()),
                ..ForwardOptions::default()
            })
            .unwrap();

        assert_eq!(
            fwd.body_parts().plain.as_deref(),
            Some("FYI:\nthe original numbers")
        );
    }

    #[test]
    fn test_forward_keeps_attachments() {
        let mut original = Email::builder()
            .subject("With file")
            .from("a@example.com")
            .to("b@example.com")
            .body_text("body")
            .build()
            .unwrap();
        original.add_attachment_bytes("f.csv", b"1,2,3").unwrap();

        let fwd = original
            .forward(ForwardOptions {
                to: vec!["c@example.com".to_string()],
                body_text: Some("see below\n{original}".to_string()),
                ..ForwardOptions::default()
            })
            .unwrap();

        let attachments: Vec<_> = fwd.attachments().collect();
        assert_eq!(attachments.len(), 1);
        assert_eq!(attachments[0].name, "f.csv");
        assert_eq!(
            fwd.body_parts().plain.as_deref(),
            Some("see below\nbody")
        );
    }

    #[test]
    fn test_forward_html_extracts_body_fragment() {
        let original = Email::builder()
            .subject("Styled")
            .from("a@example.com")
            .to("b@example.com")
            .body_text("plain")
            .body_html("<html><body><p>inner content</p></body></html>")
            .build()
            .unwrap();

        let fwd = original
            .forward(ForwardOptions {
                to: vec!["c@example.com".to_string()],
                body_html: Some("<div>quoted: {original}</div>".to_string()),
                ..ForwardOptions::default()
            })
            .unwrap();

        let html = fwd.body_parts().html.unwrap();
        assert!(html.contains("quoted: <p>inner content</p>"));
        assert!(!html.contains("<html>"));
    }
}
