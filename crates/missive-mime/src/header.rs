//! Ordered mail header collection.
//!
//! Header names are matched case-insensitively but stored and rendered
//! exactly as supplied, in insertion order. Serialization order equal
//! to insertion order is an invariant the message layer relies on.

use std::fmt;

/// Ordered collection of mail headers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: Vec<(String, String)>,
}

impl Headers {
    /// Creates a new empty header collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true when no headers are present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of header lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Appends a header value.
    pub fn add(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.push((name.into(), value.into()));
    }

    /// Sets a header value, replacing any existing values.
    ///
    /// The first existing entry keeps its position; later duplicates
    /// are dropped. A new name is appended at the end.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();

        let mut replaced = false;
        self.entries.retain_mut(|(n, v)| {
            if n.eq_ignore_ascii_case(&name) {
                if replaced {
                    return false;
                }
                replaced = true;
                *v = value.clone();
            }
            true
        });

        if !replaced {
            self.entries.push((name, value));
        }
    }

    /// Gets the first value for a header, case-insensitively.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Gets all values for a header.
    #[must_use]
    pub fn get_all(&self, name: &str) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
            .collect()
    }

    /// Checks whether a header is present.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Removes all values for a header.
    pub fn remove(&mut self, name: &str) {
        self.entries.retain(|(n, _)| !n.eq_ignore_ascii_case(name));
    }

    /// Returns an iterator over all headers in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Parses headers from raw text, unfolding continuation lines.
    ///
    /// Stops at the first empty line (the header/body separator).
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let mut headers = Self::new();
        let mut current_name: Option<String> = None;
        let mut current_value = String::new();

        for line in text.lines() {
            if line.is_empty() {
                break;
            }

            if line.starts_with(' ') || line.starts_with('\t') {
                // Folded continuation line
                if current_name.is_some() {
                    current_value.push(' ');
                    current_value.push_str(line.trim());
                }
            } else {
                if let Some(name) = current_name.take() {
                    headers.add(name, current_value.trim().to_string());
                    current_value.clear();
                }

                if let Some((name, value)) = line.split_once(':') {
                    current_name = Some(name.trim().to_string());
                    current_value = value.trim().to_string();
                }
            }
        }

        if let Some(name) = current_name {
            headers.add(name, current_value.trim().to_string());
        }

        headers
    }
}

impl fmt::Display for Headers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, value) in &self.entries {
            write!(f, "{name}: {value}\r\n")?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_headers_add_get() {
        let mut headers = Headers::new();
        headers.add("Content-Type", "text/plain");
        assert_eq!(headers.get("Content-Type"), Some("text/plain"));
        assert_eq!(headers.get("content-type"), Some("text/plain"));
    }

    #[test]
    fn test_headers_set_keeps_position() {
        let mut headers = Headers::new();
        headers.add("From", "a@example.com");
        headers.add("To", "b@example.com");
        headers.set("From", "c@example.com");

        let order: Vec<_> = headers.iter().collect();
        assert_eq!(
            order,
            vec![("From", "c@example.com"), ("To", "b@example.com")]
        );
    }

    #[test]
    fn test_headers_set_collapses_duplicates() {
        let mut headers = Headers::new();
        headers.add("To", "a@example.com");
        headers.add("To", "b@example.com");
        headers.set("To", "c@example.com");
        assert_eq!(headers.get_all("To"), vec!["c@example.com"]);
    }

    #[test]
    fn test_headers_remove() {
        let mut headers = Headers::new();
        headers.add("Subject", "Test");
        headers.remove("subject");
        assert!(!headers.contains("Subject"));
    }

    #[test]
    fn test_headers_parse_with_folding() {
        let text = concat!(
            "From: sender@example.com\r\n",
            "Subject: Test Message\r\n",
            "Content-Type: text/plain;\r\n",
            " charset=utf-8\r\n",
            "\r\n",
            "body ignored\r\n"
        );

        let headers = Headers::parse(text);
        assert_eq!(headers.get("From"), Some("sender@example.com"));
        assert_eq!(
            headers.get("Content-Type"),
            Some("text/plain; charset=utf-8")
        );
        assert_eq!(headers.len(), 3);
    }

    #[test]
    fn test_headers_render_preserves_insertion_order() {
        let mut headers = Headers::new();
        headers.add("Subject", "Hi");
        headers.add("From", "a@example.com");
        headers.add("To", "b@example.com");

        let rendered = headers.to_string();
        let subject_pos = rendered.find("Subject:").unwrap();
        let from_pos = rendered.find("From:").unwrap();
        let to_pos = rendered.find("To:").unwrap();
        assert!(subject_pos < from_pos && from_pos < to_pos);
    }

    #[test]
    fn test_headers_parse_render_round_trip() {
        let mut headers = Headers::new();
        headers.add("From", "a@example.com");
        headers.add("To", "b@example.com");
        headers.add("Subject", "Round trip");

        let reparsed = Headers::parse(&headers.to_string());
        assert_eq!(headers, reparsed);
    }
}
