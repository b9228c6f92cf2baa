//! # missive-mime
//!
//! MIME message codec for the missive mail stack.
//!
//! This crate owns the wire format: an ordered header map, transfer
//! encodings (Base64, Quoted-Printable), RFC 2047 encoded words,
//! content types, and a part tree that encodes to / decodes from raw
//! message text with multipart boundary handling.
//!
//! ## Decoding a message
//!
//! ```ignore
//! let raw = "From: sender@example.com\r\n\
//!            Subject: Test\r\n\
//!            Content-Type: text/plain\r\n\
//!            \r\n\
//!            Hello, World!";
//!
//! let (headers, parts) = missive_mime::decode(raw);
//! assert_eq!(headers.get("Subject"), Some("Test"));
//! assert_eq!(parts[0].decoded_text()?, "Hello, World!");
//! ```
//!
//! ## Building a part tree
//!
//! ```ignore
//! use missive_mime::{ContentType, Headers, Part};
//!
//! let mut headers = Headers::new();
//! headers.add("Subject", "Report");
//!
//! let parts = vec![
//!     Part::alternative(vec![Part::text("plain"), Part::html("<p>html</p>")]),
//!     Part::attachment("report.pdf", &ContentType::new("application", "pdf"), "JVBERi0="),
//! ];
//!
//! let raw = missive_mime::encode(&headers, &parts);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod codec;
mod content_type;
mod error;
mod header;
mod part;

pub mod encoding;

pub use codec::{decode, encode};
pub use content_type::ContentType;
pub use error::{Error, Result};
pub use header::Headers;
pub use part::{Part, PartBody, TransferEncoding, mint_boundary};
