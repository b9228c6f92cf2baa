//! # missive
//!
//! Mail message abstraction layer: build, parse, inspect and submit
//! Internet mail messages.
//!
//! This crate provides:
//! - The [`Email`] message model with builder-style construction
//! - A mailbox address model with lenient parsing
//! - Header canonicalization and RFC 2047 value encoding
//! - Subject classification (reply/forward prefixes across locales)
//! - Attachment handling with content-type inference
//! - Submission via SMTP, an HTTP relay, a file or a debug sink
//!
//! ## Building and sending
//!
//! ```ignore
//! use missive::{Email, Sender, SenderStack};
//!
//! let mut email = Email::builder()
//!     .subject("Quarterly report")
//!     .from("Alice <alice@example.com>")
//!     .to("bob@example.com")
//!     .body_text("See attached.")
//!     .build()?;
//! email.add_attachment_path("report.pdf")?;
//!
//! let mut senders = SenderStack::new();
//! senders.push(Sender::Debug);
//! let raw = senders.send(&email).await?;
//! ```
//!
//! ## Parsing
//!
//! ```ignore
//! use missive::Email;
//!
//! let email = Email::parse(&raw);
//! println!("{} (reply: {})", email.subject(), email.is_reply());
//! for attachment in email.attachments() {
//!     println!("  {} ({})", attachment.name, attachment.content_type);
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod address;
mod error;
pub mod header;
mod html;
mod message;
mod mimetype;
mod sender;
pub mod subject;

pub use address::{Address, AddressList, normalize_display_name};
pub use error::{Error, Result};
pub use html::html_to_text;
pub use message::{Attachment, BodyParts, Email, EmailBuilder, FieldValue, ForwardOptions};
pub use mimetype::{DEFAULT_MIME_TYPE, MimeTypes};
pub use sender::{Envelope, HttpRelayConfig, Sender, SenderStack, SmtpConfig, SmtpSecurity};
