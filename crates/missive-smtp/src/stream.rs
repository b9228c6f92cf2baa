//! Reply-framed connection transport.
//!
//! The submission dialogue is strictly lock-step: write one command or
//! payload, read one (possibly multi-line) reply. The stream type owns
//! that framing so the client never touches raw lines.

use crate::error::{Error, Result};
use crate::reply::{Reply, parse_line};
use rustls::pki_types::ServerName;
use std::sync::{Arc, OnceLock};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;
use tokio_rustls::client::TlsStream;
use tokio_rustls::rustls::{ClientConfig, RootCertStore};

/// Connection to an SMTP server, plain or encrypted.
#[derive(Debug)]
pub struct SmtpStream {
    inner: Inner,
}

#[derive(Debug)]
enum Inner {
    Plain(BufReader<TcpStream>),
    Tls(Box<BufReader<TlsStream<TcpStream>>>),
}

impl SmtpStream {
    /// Opens a plain TCP connection.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection fails.
    pub async fn open(hostname: &str, port: u16) -> Result<Self> {
        tracing::debug!(hostname, port, "connecting");
        let tcp = TcpStream::connect((hostname, port)).await?;
        Ok(Self {
            inner: Inner::Plain(BufReader::new(tcp)),
        })
    }

    /// Opens a connection that is TLS from the first byte
    /// (port 465 style).
    ///
    /// # Errors
    ///
    /// Returns an error if the connection or TLS handshake fails.
    pub async fn open_tls(hostname: &str, port: u16) -> Result<Self> {
        tracing::debug!(hostname, port, "connecting with implicit TLS");
        let tcp = TcpStream::connect((hostname, port)).await?;
        let tls = handshake_tls(tcp, hostname).await?;
        Ok(Self {
            inner: Inner::Tls(Box::new(BufReader::new(tls))),
        })
    }

    /// Upgrades an established plain connection to TLS (STARTTLS).
    ///
    /// # Errors
    ///
    /// Returns an error if the connection is already encrypted or the
    /// TLS handshake fails.
    pub async fn upgrade_to_tls(self, hostname: &str) -> Result<Self> {
        let Inner::Plain(reader) = self.inner else {
            return Err(Error::Protocol("Connection is already encrypted".into()));
        };

        let tls = handshake_tls(reader.into_inner(), hostname).await?;
        Ok(Self {
            inner: Inner::Tls(Box::new(BufReader::new(tls))),
        })
    }

    /// Reads one complete server reply, following `250-` continuations
    /// until the final line.
    ///
    /// # Errors
    ///
    /// Returns an error on a closed connection or a malformed reply
    /// line.
    pub async fn read_reply(&mut self) -> Result<Reply> {
        let mut lines = Vec::new();
        loop {
            let line = self.next_line().await?;
            let (code, continues, text) = parse_line(&line)?;
            lines.push(text.to_string());
            if !continues {
                return Ok(Reply { code, lines });
            }
        }
    }

    /// Writes one CRLF-terminated command line.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub async fn send_line(&mut self, line: &str) -> Result<()> {
        self.send_raw(format!("{line}\r\n").as_bytes()).await
    }

    /// Writes raw bytes and flushes.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub async fn send_raw(&mut self, data: &[u8]) -> Result<()> {
        match &mut self.inner {
            Inner::Plain(reader) => {
                let stream = reader.get_mut();
                stream.write_all(data).await?;
                stream.flush().await?;
            }
            Inner::Tls(reader) => {
                let stream = reader.get_mut();
                stream.write_all(data).await?;
                stream.flush().await?;
            }
        }
        Ok(())
    }

    async fn next_line(&mut self) -> Result<String> {
        let mut line = String::new();
        let read = match &mut self.inner {
            Inner::Plain(reader) => reader.read_line(&mut line).await?,
            Inner::Tls(reader) => reader.read_line(&mut line).await?,
        };
        if read == 0 {
            return Err(Error::Protocol("Connection closed by server".into()));
        }
        Ok(line.trim_end().to_string())
    }
}

async fn handshake_tls(tcp: TcpStream, hostname: &str) -> Result<TlsStream<TcpStream>> {
    let server_name = ServerName::try_from(hostname.to_string())
        .map_err(|_| Error::Protocol(format!("Invalid hostname: {hostname}")))?;
    let connector = TlsConnector::from(tls_config());
    Ok(connector.connect(server_name, tcp).await?)
}

/// Client TLS configuration with the webpki trust roots, built once
/// and shared across connections.
fn tls_config() -> Arc<ClientConfig> {
    static CONFIG: OnceLock<Arc<ClientConfig>> = OnceLock::new();
    Arc::clone(CONFIG.get_or_init(|| {
        let mut roots = RootCertStore::empty();
        roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
        Arc::new(
            ClientConfig::builder()
                .with_root_certificates(roots)
                .with_no_client_auth(),
        )
    }))
}
