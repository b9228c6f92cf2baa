//! SMTP reply parsing.

use crate::error::{Error, Result};

/// A parsed SMTP reply: a three-digit code plus one or more text lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// Three-digit reply code.
    pub code: u16,
    /// Reply text, one entry per line.
    pub lines: Vec<String>,
}

impl Reply {
    /// Whether the reply is a positive completion or intermediate
    /// reply (2xx or 3xx).
    #[must_use]
    pub const fn is_positive(&self) -> bool {
        self.code >= 200 && self.code < 400
    }

    /// The reply text joined into one string.
    #[must_use]
    pub fn text(&self) -> String {
        self.lines.join(" ")
    }
}

/// Parses one reply line into its code, continuation flag and text.
///
/// `250-STARTTLS` continues, `250 OK` terminates the reply.
///
/// # Errors
///
/// Returns a protocol error when the line has no valid reply code.
pub fn parse_line(line: &str) -> Result<(u16, bool, &str)> {
    if line.len() < 3 {
        return Err(Error::Protocol(format!("Short reply line: {line:?}")));
    }

    let code: u16 = line[..3]
        .parse()
        .map_err(|_| Error::Protocol(format!("Bad reply code in {line:?}")))?;

    let rest = &line[3..];
    let (continues, text) = match rest.as_bytes().first() {
        Some(b'-') => (true, &rest[1..]),
        Some(b' ') => (false, &rest[1..]),
        None => (false, rest),
        _ => return Err(Error::Protocol(format!("Malformed reply line: {line:?}"))),
    };

    Ok((code, continues, text))
}
