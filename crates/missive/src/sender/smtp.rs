//! SMTP submission with a single implicit-TLS fallback.

use super::Envelope;
use crate::error::Result;
use missive_smtp::{Client, SmtpStream};

/// Connection security for SMTP submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SmtpSecurity {
    /// Plaintext connection, no TLS.
    None,
    /// Plaintext connection upgraded with STARTTLS.
    #[default]
    StartTls,
    /// TLS from the first byte.
    Implicit,
}

/// SMTP submission settings.
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    /// Server hostname.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Username; empty skips authentication.
    pub username: String,
    /// Password.
    pub password: String,
    /// Connection security.
    pub security: SmtpSecurity,
    /// Hostname announced in EHLO.
    pub ehlo_hostname: String,
}

impl SmtpConfig {
    /// Settings for a server with default submission port and STARTTLS.
    #[must_use]
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: 587,
            username: String::new(),
            password: String::new(),
            security: SmtpSecurity::default(),
            ehlo_hostname: "localhost".to_string(),
        }
    }
}

/// Submits one message.
///
/// When the configured plaintext or STARTTLS connection cannot be
/// established or negotiated, one retry is made over implicit TLS on
/// the same port. The mail transaction itself is never retried.
pub(super) async fn submit(config: &SmtpConfig, envelope: &Envelope, raw: &str) -> Result<()> {
    let mut client = match negotiate(config).await {
        Ok(client) => client,
        Err(err) if config.security != SmtpSecurity::Implicit => {
            tracing::warn!(
                host = %config.host,
                port = config.port,
                error = %err,
                "connection failed, retrying over implicit TLS"
            );
            let stream = SmtpStream::open_tls(&config.host, config.port).await?;
            authenticate(config, stream).await?
        }
        Err(err) => return Err(err.into()),
    };

    client.send_mail(&envelope.from, &envelope.to, raw).await?;
    client.quit().await?;
    Ok(())
}

/// Connects and negotiates per the configured security mode.
async fn negotiate(config: &SmtpConfig) -> missive_smtp::Result<Client> {
    match config.security {
        SmtpSecurity::Implicit => {
            let stream = SmtpStream::open_tls(&config.host, config.port).await?;
            authenticate(config, stream).await
        }
        SmtpSecurity::StartTls => {
            let stream = SmtpStream::open(&config.host, config.port).await?;
            let client = Client::handshake(stream, &config.ehlo_hostname).await?;
            let mut client = client.starttls(&config.host).await?;
            auth_if_configured(config, &mut client).await?;
            Ok(client)
        }
        SmtpSecurity::None => {
            let stream = SmtpStream::open(&config.host, config.port).await?;
            let mut client = Client::handshake(stream, &config.ehlo_hostname).await?;
            auth_if_configured(config, &mut client).await?;
            Ok(client)
        }
    }
}

async fn authenticate(config: &SmtpConfig, stream: SmtpStream) -> missive_smtp::Result<Client> {
    let mut client = Client::handshake(stream, &config.ehlo_hostname).await?;
    auth_if_configured(config, &mut client).await?;
    Ok(client)
}

async fn auth_if_configured(config: &SmtpConfig, client: &mut Client) -> missive_smtp::Result<()> {
    if config.username.is_empty() {
        return Ok(());
    }

    if client.supports("AUTH") {
        client.auth_plain(&config.username, &config.password).await
    } else {
        // Some servers accept AUTH without advertising it.
        client.auth_login(&config.username, &config.password).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = SmtpConfig::new("mail.example.com");
        assert_eq!(config.port, 587);
        assert_eq!(config.security, SmtpSecurity::StartTls);
        assert!(config.username.is_empty());
    }
}
