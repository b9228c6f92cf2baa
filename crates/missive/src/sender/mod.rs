//! Message submission.
//!
//! A [`Sender`] turns a finished [`Email`] into a delivery attempt:
//! printed, written to disk, submitted over SMTP or posted to an HTTP
//! relay. A [`SenderStack`] lets callers override the active sender for
//! a scope of their own (tests swap in a debug sender, a batch job
//! swaps in a file sender) without touching global state.

mod http;
mod smtp;

pub use http::HttpRelayConfig;
pub use smtp::{SmtpConfig, SmtpSecurity};

use crate::error::{Error, Result};
use crate::message::Email;
use std::path::PathBuf;

/// SMTP envelope derived from a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    /// Envelope sender, the bare From address.
    pub from: String,
    /// Envelope recipients: To, Cc and pending Bcc, deduplicated.
    pub to: Vec<String>,
}

impl Envelope {
    /// Derives the envelope from a message's headers.
    ///
    /// # Errors
    ///
    /// Returns a validation error when the message has no From address
    /// or no recipients.
    pub fn from_email(email: &Email) -> Result<Self> {
        let from = email.from_();
        if from.address.is_empty() {
            return Err(Error::validation("Message has no From address"));
        }

        let to = email.recipients_addresses();
        if to.is_empty() {
            return Err(Error::validation("Message has no recipients"));
        }

        Ok(Self {
            from: from.address,
            to,
        })
    }
}

/// A way to submit a message.
#[derive(Debug, Clone)]
pub enum Sender {
    /// Logs the serialized message and returns it; no delivery.
    Debug,
    /// Appends the serialized message to a file.
    File(PathBuf),
    /// Submits over SMTP.
    Smtp(SmtpConfig),
    /// Posts to an HTTP relay endpoint.
    HttpRelay(HttpRelayConfig),
}

impl Sender {
    /// Submits a message.
    ///
    /// Returns the serialized message for [`Sender::Debug`] and an
    /// empty string for the delivering variants.
    ///
    /// # Errors
    ///
    /// Returns a validation error when the envelope cannot be derived,
    /// or a transport error from the underlying delivery.
    pub async fn send(&self, email: &Email) -> Result<String> {
        let raw = email.serialize();

        match self {
            Self::Debug => {
                tracing::debug!(bytes = raw.len(), "debug sender, not delivering");
                Ok(raw)
            }
            Self::File(path) => {
                let envelope = Envelope::from_email(email)?;
                tracing::debug!(path = %path.display(), from = %envelope.from, "writing message to file");
                append_to_file(path, &raw).await?;
                Ok(String::new())
            }
            Self::Smtp(config) => {
                let envelope = Envelope::from_email(email)?;
                smtp::submit(config, &envelope, &raw).await?;
                Ok(String::new())
            }
            Self::HttpRelay(config) => {
                Envelope::from_email(email)?;
                http::submit(config, email).await?;
                Ok(String::new())
            }
        }
    }
}

async fn append_to_file(path: &std::path::Path, raw: &str) -> Result<()> {
    use tokio::io::AsyncWriteExt;

    let mut file = tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await?;
    file.write_all(raw.as_bytes()).await?;
    file.write_all(b"\r\n").await?;
    file.flush().await?;
    Ok(())
}

/// Stack of senders; the innermost (most recently pushed) one wins.
#[derive(Debug, Clone, Default)]
pub struct SenderStack {
    senders: Vec<Sender>,
}

impl SenderStack {
    /// Creates an empty stack.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            senders: Vec::new(),
        }
    }

    /// Pushes a sender, making it the active one.
    pub fn push(&mut self, sender: Sender) {
        self.senders.push(sender);
    }

    /// Pops the active sender, restoring the previous one.
    pub fn pop(&mut self) -> Option<Sender> {
        self.senders.pop()
    }

    /// Whether no sender is configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.senders.is_empty()
    }

    /// Submits via the active sender.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoSender`] on an empty stack, otherwise
    /// whatever the active sender returns.
    pub async fn send(&self, email: &Email) -> Result<String> {
        match self.senders.last() {
            Some(sender) => sender.send(email).await,
            None => Err(Error::NoSender),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sample_email() -> Email {
        Email::builder()
            .subject("Envelope test")
            .from("Sender <sender@example.com>")
            .to("to@example.com")
            .cc("cc@example.com")
            .bcc("bcc@example.com")
            .body_text("hello")
            .build()
            .unwrap()
    }

    #[test]
    fn test_envelope_derivation() {
        let envelope = Envelope::from_email(&sample_email()).unwrap();
        assert_eq!(envelope.from, "sender@example.com");
        assert_eq!(
            envelope.to,
            vec!["to@example.com", "cc@example.com", "bcc@example.com"]
        );
    }

    #[test]
    fn test_envelope_requires_from() {
        let email = Email::builder()
            .to("to@example.com")
            .build()
            .unwrap();
        assert!(matches!(
            Envelope::from_email(&email),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn test_envelope_requires_recipients() {
        let email = Email::builder()
            .from("from@example.com")
            .build()
            .unwrap();
        assert!(matches!(
            Envelope::from_email(&email),
            Err(Error::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_debug_sender_returns_serialization() {
        let email = sample_email();
        let sent = Sender::Debug.send(&email).await.unwrap();
        assert_eq!(sent, email.serialize());
    }

    #[tokio::test]
    async fn test_empty_stack_refuses() {
        let stack = SenderStack::new();
        assert!(matches!(
            stack.send(&sample_email()).await,
            Err(Error::NoSender)
        ));
    }

    #[tokio::test]
    async fn test_stack_innermost_wins_and_pops() {
        let email = sample_email();
        let mut stack = SenderStack::new();
        stack.push(Sender::File(PathBuf::from("/nonexistent-dir/mail.out")));
        stack.push(Sender::Debug);

        // Debug is on top, so no file I/O happens.
        assert!(stack.send(&email).await.is_ok());

        stack.pop();
        assert!(stack.send(&email).await.is_err());
    }

    #[tokio::test]
    async fn test_file_sender_appends() {
        let dir = std::env::temp_dir();
        let path = dir.join(format!("missive-test-{}.eml", std::process::id()));
        let _ = tokio::fs::remove_file(&path).await;

        let email = sample_email();
        let sender = Sender::File(path.clone());
        assert_eq!(sender.send(&email).await.unwrap(), "");
        sender.send(&email).await.unwrap();

        let written = tokio::fs::read_to_string(&path).await.unwrap();
        assert_eq!(written.matches("Subject: Envelope test").count(), 2);
        assert!(!written.contains("Bcc:"));

        let _ = tokio::fs::remove_file(&path).await;
    }
}
