//! HTTP relay submission.
//!
//! Posts the message as a JSON envelope to a relay endpoint that
//! performs the actual delivery.

use crate::error::{Error, Result};
use crate::message::Email;
use serde::Serialize;

/// HTTP relay settings.
#[derive(Debug, Clone)]
pub struct HttpRelayConfig {
    /// Endpoint URL receiving the JSON envelope.
    pub endpoint: String,
    /// Bearer token; empty sends no Authorization header.
    pub api_key: String,
}

impl HttpRelayConfig {
    /// Settings for an endpoint without authentication.
    #[must_use]
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key: String::new(),
        }
    }
}

#[derive(Debug, Serialize)]
struct RelayEnvelope {
    from: String,
    to: Vec<String>,
    subject: String,
    body_plain: String,
    body_html: Option<String>,
    attachments: Vec<RelayAttachment>,
}

#[derive(Debug, Serialize)]
struct RelayAttachment {
    name: String,
    content_type: String,
    /// Base64-encoded payload.
    content: String,
}

fn build_envelope(email: &Email) -> RelayEnvelope {
    let body = email.body_parts();
    RelayEnvelope {
        from: email.from_().address,
        to: email.recipients_addresses(),
        subject: email.raw_subject(),
        body_plain: body.plain.unwrap_or_default(),
        body_html: body.html,
        attachments: email
            .attachments()
            .map(|a| RelayAttachment {
                name: a.name,
                content_type: a.content_type,
                content: a.content,
            })
            .collect(),
    }
}

/// Posts one message to the relay. Success is exactly HTTP 200.
pub(super) async fn submit(config: &HttpRelayConfig, email: &Email) -> Result<()> {
    let envelope = build_envelope(email);

    let client = reqwest::Client::new();
    let mut request = client.post(&config.endpoint).json(&envelope);
    if !config.api_key.is_empty() {
        request = request.bearer_auth(&config.api_key);
    }

    tracing::debug!(
        endpoint = %config.endpoint,
        recipients = envelope.to.len(),
        "posting message to relay"
    );

    let response = request.send().await?;
    let status = response.status().as_u16();
    if status != 200 {
        return Err(Error::RelayStatus(status));
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_shape() {
        let mut email = Email::builder()
            .subject("Relay test")
            .from("Sender <sender@example.com>")
            .to("to@example.com")
            .bcc("bcc@example.com")
            .body_text("plain body")
            .body_html("<p>html body</p>")
            .build()
            .unwrap();
        email.add_attachment_bytes("f.txt", b"contents").unwrap();

        let envelope = build_envelope(&email);
        let json = serde_json::to_value(&envelope).unwrap();

        assert_eq!(json["from"], "sender@example.com");
        assert_eq!(json["to"][0], "to@example.com");
        assert_eq!(json["to"][1], "bcc@example.com");
        assert_eq!(json["subject"], "Relay test");
        assert_eq!(json["body_plain"], "plain body");
        assert!(json["body_html"].as_str().unwrap().contains("html body"));
        assert_eq!(json["attachments"][0]["name"], "f.txt");
        assert_eq!(json["attachments"][0]["content_type"], "text/plain");
    }

    #[test]
    fn test_envelope_without_html() {
        let email = Email::builder()
            .from("a@example.com")
            .to("b@example.com")
            .body_text("only plain")
            .build()
            .unwrap();

        let envelope = build_envelope(&email);
        assert!(envelope.body_html.is_none());
        assert!(envelope.attachments.is_empty());
    }
}
