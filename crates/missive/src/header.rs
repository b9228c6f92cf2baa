//! Header name canonicalization and value encoding.
//!
//! Header names are matched case-insensitively against the fixed table
//! of standard RFC 4021/5322/2045 names and stored with canonical
//! capitalization; unrecognized names pass through as supplied.
//! Recipient headers carry mailbox lists and are encoded per address.

use crate::address;
use missive_mime::encoding::{decode_words, encode_word};

/// Canonical capitalization for the standard mail and MIME headers
/// (RFC 4021, RFC 5322, RFC 2045).
pub const CANONICAL_HEADERS: [&str; 82] = [
    "Accept-Language",
    "Alternate-Recipient",
    "Archived-At",
    "Autoforwarded",
    "Autosubmitted",
    "Bcc",
    "Cc",
    "Comments",
    "Content-Alternative",
    "Content-Base",
    "Content-Description",
    "Content-Disposition",
    "Content-Duration",
    "Content-ID",
    "Content-Language",
    "Content-Location",
    "Content-MD5",
    "Content-Transfer-Encoding",
    "Content-Type",
    "Conversion",
    "Conversion-With-Loss",
    "Date",
    "Deferred-Delivery",
    "Delivery-Date",
    "Disclose-Recipients",
    "Disposition-Notification-Options",
    "Disposition-Notification-To",
    "DL-Expansion-History",
    "Encoding",
    "Encrypted",
    "Expires",
    "Expiry-Date",
    "From",
    "Importance",
    "In-Reply-To",
    "Incomplete-Copy",
    "Keywords",
    "Language",
    "Latest-Delivery-Time",
    "List-Archive",
    "List-Help",
    "List-ID",
    "List-Owner",
    "List-Post",
    "List-Subscribe",
    "List-Unsubscribe",
    "Message-Context",
    "Message-ID",
    "Message-Type",
    "MIME-Version",
    "Obsoletes",
    "Original-Encoded-Information-Types",
    "Original-Message-ID",
    "Originator-Return-Address",
    "PICS-Label",
    "Prevent-NonDelivery-Report",
    "Priority",
    "Received",
    "References",
    "Reply-By",
    "Reply-To",
    "Resent-Bcc",
    "Resent-Cc",
    "Resent-Date",
    "Resent-From",
    "Resent-Message-ID",
    "Resent-Reply-To",
    "Resent-Sender",
    "Resent-To",
    "Return-Path",
    "Sender",
    "Sensitivity",
    "Subject",
    "Supersedes",
    "To",
    "X400-Content-Identifier",
    "X400-Content-Return",
    "X400-Content-Type",
    "X400-MTS-Identifier",
    "X400-Originator",
    "X400-Received",
    "X400-Recipients",
];

/// Looks up the canonical capitalization of a standard header name.
///
/// Returns `None` for names outside the table; the caller then uses
/// the name as supplied, unmodified.
#[must_use]
pub fn canonical_name(name: &str) -> Option<&'static str> {
    CANONICAL_HEADERS
        .iter()
        .find(|canonical| canonical.eq_ignore_ascii_case(name))
        .copied()
}

/// Whether a header semantically carries a mailbox list.
#[must_use]
pub fn is_recipient_header(name: &str) -> bool {
    ["From", "To", "Cc", "Bcc"]
        .iter()
        .any(|h| h.eq_ignore_ascii_case(name))
}

/// Decodes a wire header value (RFC 2047 encoded words) to text.
#[must_use]
pub fn decode_value(raw: &str) -> String {
    decode_words(raw)
}

/// Encodes a header value for transmission, UTF-8 charset.
#[must_use]
pub fn encode_value(value: &str) -> String {
    encode_word(value)
}

/// Encodes the values of a recipient header.
///
/// Each value is split into mailbox specs, parsed, its display name
/// encoded-word encoded and rendered as `encoded-name<addr>` (no space
/// before `<`), or the bare address when there is no display name.
/// Values are comma-joined.
#[must_use]
pub fn encode_recipients(values: &[String]) -> String {
    values
        .iter()
        .flat_map(|value| address::split_specs(value))
        .filter_map(|spec| {
            let parsed = address::parse(&spec);
            if parsed.address.is_empty() {
                return None;
            }
            if parsed.display_name.is_empty() {
                Some(parsed.address)
            } else {
                let name = encode_word(&parsed.display_name);
                Some(format!("{name}<{}>", parsed.address))
            }
        })
        .collect::<Vec<_>>()
        .join(",")
}
