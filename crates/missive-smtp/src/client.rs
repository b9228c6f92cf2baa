//! SMTP submission client.
//!
//! One linear submission path: greeting, EHLO, optional STARTTLS,
//! optional AUTH, one mail transaction, QUIT.

use crate::error::{Error, Result};
use crate::reply::Reply;
use crate::stream::SmtpStream;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::collections::HashSet;

/// SMTP client over an established stream.
#[derive(Debug)]
pub struct Client {
    stream: SmtpStream,
    extensions: HashSet<String>,
}

impl Client {
    /// Reads the server greeting and performs the EHLO exchange.
    ///
    /// # Errors
    ///
    /// Returns an error if the greeting or EHLO fails.
    pub async fn handshake(mut stream: SmtpStream, ehlo_hostname: &str) -> Result<Self> {
        let greeting = stream.read_reply().await?;
        if !greeting.is_positive() {
            return Err(Error::smtp(greeting.code, greeting.text()));
        }

        let mut client = Self {
            stream,
            extensions: HashSet::new(),
        };
        client.ehlo(ehlo_hostname).await?;
        Ok(client)
    }

    /// Sends EHLO and records the advertised extensions.
    async fn ehlo(&mut self, hostname: &str) -> Result<()> {
        let reply = self.command(&format!("EHLO {hostname}")).await?;
        if !reply.is_positive() {
            return Err(Error::smtp(reply.code, reply.text()));
        }

        // First line is the server greeting, the rest are extensions.
        self.extensions = reply
            .lines
            .iter()
            .skip(1)
            .filter_map(|line| line.split_whitespace().next())
            .map(str::to_uppercase)
            .collect();
        Ok(())
    }

    /// Whether the server advertised an extension keyword.
    #[must_use]
    pub fn supports(&self, extension: &str) -> bool {
        self.extensions.contains(&extension.to_uppercase())
    }

    /// Upgrades the connection with STARTTLS and repeats EHLO.
    ///
    /// # Errors
    ///
    /// Returns an error if STARTTLS is not offered or the TLS
    /// handshake fails.
    pub async fn starttls(mut self, hostname: &str) -> Result<Self> {
        if !self.supports("STARTTLS") {
            return Err(Error::NotSupported("STARTTLS".into()));
        }

        let reply = self.command("STARTTLS").await?;
        if !reply.is_positive() {
            return Err(Error::smtp(reply.code, reply.text()));
        }

        tracing::debug!(hostname, "upgrading to TLS");
        self.stream = self.stream.upgrade_to_tls(hostname).await?;
        self.ehlo(hostname).await?;
        Ok(self)
    }

    /// Authenticates with AUTH PLAIN.
    ///
    /// # Errors
    ///
    /// Returns an error if the server rejects the credentials.
    pub async fn auth_plain(&mut self, username: &str, password: &str) -> Result<()> {
        let payload = STANDARD.encode(format!("\0{username}\0{password}"));
        let reply = self.command(&format!("AUTH PLAIN {payload}")).await?;
        if !reply.is_positive() {
            return Err(Error::smtp(reply.code, reply.text()));
        }
        tracing::debug!(username, "authenticated");
        Ok(())
    }

    /// Authenticates with AUTH LOGIN.
    ///
    /// # Errors
    ///
    /// Returns an error if the server rejects the credentials.
    pub async fn auth_login(&mut self, username: &str, password: &str) -> Result<()> {
        let reply = self.command("AUTH LOGIN").await?;
        if reply.code != 334 {
            return Err(Error::smtp(reply.code, reply.text()));
        }

        let reply = self.command(&STANDARD.encode(username)).await?;
        if reply.code != 334 {
            return Err(Error::smtp(reply.code, reply.text()));
        }

        let reply = self.command(&STANDARD.encode(password)).await?;
        if !reply.is_positive() {
            return Err(Error::smtp(reply.code, reply.text()));
        }
        Ok(())
    }

    /// Runs one mail transaction: MAIL FROM, RCPT TO per recipient,
    /// DATA and the dot-stuffed message payload.
    ///
    /// # Errors
    ///
    /// Returns an error on an empty recipient list or any negative
    /// server reply.
    pub async fn send_mail(&mut self, from: &str, recipients: &[String], raw: &str) -> Result<()> {
        if recipients.is_empty() {
            return Err(Error::InvalidAddress("Empty recipient list".into()));
        }

        let reply = self.command(&format!("MAIL FROM:<{from}>")).await?;
        if !reply.is_positive() {
            return Err(Error::smtp(reply.code, reply.text()));
        }

        for recipient in recipients {
            let reply = self.command(&format!("RCPT TO:<{recipient}>")).await?;
            if !reply.is_positive() {
                return Err(Error::smtp(reply.code, reply.text()));
            }
        }

        let reply = self.command("DATA").await?;
        if reply.code != 354 {
            return Err(Error::smtp(reply.code, reply.text()));
        }

        let mut payload = dot_stuff(raw);
        payload.push_str(".\r\n");
        self.stream.send_raw(payload.as_bytes()).await?;

        let reply = self.stream.read_reply().await?;
        if !reply.is_positive() {
            return Err(Error::smtp(reply.code, reply.text()));
        }

        tracing::info!(from, recipients = recipients.len(), "message accepted");
        Ok(())
    }

    /// Sends QUIT and drops the connection.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails; a negative reply to QUIT
    /// is ignored since the connection is being torn down anyway.
    pub async fn quit(mut self) -> Result<()> {
        let _ = self.command("QUIT").await?;
        Ok(())
    }

    async fn command(&mut self, line: &str) -> Result<Reply> {
        tracing::trace!(command = redact(line), "send");
        self.stream.send_line(line).await?;
        self.stream.read_reply().await
    }
}

/// Normalizes newlines to CRLF and escapes leading dots (RFC 5321 §4.5.2).
fn dot_stuff(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len() + 16);
    for line in raw.split('\n') {
        let line = line.strip_suffix('\r').unwrap_or(line);
        if line.starts_with('.') {
            out.push('.');
        }
        out.push_str(line);
        out.push_str("\r\n");
    }
    out
}

/// Hides AUTH payloads from trace output.
fn redact(line: &str) -> &str {
    if line.to_uppercase().starts_with("AUTH") {
        "AUTH <redacted>"
    } else {
        line
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_dot_stuffing() {
        let stuffed = dot_stuff("line one\r\n.hidden\r\nline two");
        assert_eq!(stuffed, "line one\r\n..hidden\r\nline two\r\n");
    }

    #[test]
    fn test_dot_stuffing_normalizes_newlines() {
        let stuffed = dot_stuff("a\nb");
        assert_eq!(stuffed, "a\r\nb\r\n");
    }

    #[test]
    fn test_redact_auth() {
        assert_eq!(redact("AUTH PLAIN abcd"), "AUTH <redacted>");
        assert_eq!(redact("MAIL FROM:<a@b>"), "MAIL FROM:<a@b>");
    }
}
