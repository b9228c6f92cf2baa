//! # missive-smtp
//!
//! Async SMTP submission client used by the missive transports.
//!
//! Supports plain TCP, implicit TLS and STARTTLS connections, AUTH
//! PLAIN/LOGIN, and a single linear mail transaction per connection —
//! the shape the transport layer needs: negotiate once at scope entry,
//! submit, quit.
//!
//! ```ignore
//! use missive_smtp::{Client, SmtpStream};
//!
//! let stream = SmtpStream::open("smtp.example.com", 587).await?;
//! let client = Client::handshake(stream, "localhost").await?;
//! let mut client = client.starttls("smtp.example.com").await?;
//! client.auth_plain("user@example.com", "password").await?;
//! client
//!     .send_mail(
//!         "sender@example.com",
//!         &["recipient@example.com".to_string()],
//!         "Subject: Test\r\n\r\nHello!",
//!     )
//!     .await?;
//! client.quit().await?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod client;
mod error;
mod reply;
mod stream;

pub use client::Client;
pub use error::{Error, Result};
pub use reply::Reply;
pub use stream::SmtpStream;
