//! Error types for the core library.
//!
//! Validation errors (bad input to a call), state errors (the message
//! already holds what the call tries to add) and transport errors are
//! kept as distinct variants so callers can tell them apart.

use thiserror::Error;

/// Errors that can occur in core operations.
#[derive(Debug, Error)]
pub enum Error {
    /// A call precondition was violated; the message was not mutated.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A body part of this kind already exists.
    #[error("Message already has a {0} body")]
    BodyAlreadySet(&'static str),

    /// Codec failure.
    #[error("MIME error: {0}")]
    Mime(#[from] missive_mime::Error),

    /// SMTP transport failure.
    #[error("SMTP error: {0}")]
    Smtp(#[from] missive_smtp::Error),

    /// HTTP relay transport failure.
    #[error("HTTP relay error: {0}")]
    Http(#[from] reqwest::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The HTTP relay answered with an unexpected status code.
    #[error("HTTP relay rejected the message with status {0}")]
    RelayStatus(u16),

    /// Send was requested with no sender configured on the stack.
    #[error("No sender configured")]
    NoSender,
}

impl Error {
    /// Shorthand for a validation error.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
