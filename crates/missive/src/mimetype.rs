//! Content-type inference from filename extensions.
//!
//! Kept as a lookup-table collaborator rather than wired into the
//! message model, so callers can extend or replace the table.

use missive_mime::ContentType;

/// Fallback type for unknown extensions.
pub const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

/// Built-in extension table.
const DEFAULT_TABLE: [(&str, &str); 28] = [
    ("txt", "text/plain"),
    ("html", "text/html"),
    ("htm", "text/html"),
    ("css", "text/css"),
    ("csv", "text/csv"),
    ("eml", "message/rfc822"),
    ("json", "application/json"),
    ("xml", "application/xml"),
    ("pdf", "application/pdf"),
    ("zip", "application/zip"),
    ("gz", "application/gzip"),
    ("doc", "application/msword"),
    ("docx", "application/vnd.openxmlformats-officedocument.wordprocessingml.document"),
    ("xls", "application/vnd.ms-excel"),
    ("xlsx", "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"),
    ("ppt", "application/vnd.ms-powerpoint"),
    ("pptx", "application/vnd.openxmlformats-officedocument.presentationml.presentation"),
    ("odt", "application/vnd.oasis.opendocument.text"),
    ("ods", "application/vnd.oasis.opendocument.spreadsheet"),
    ("png", "image/png"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("gif", "image/gif"),
    ("svg", "image/svg+xml"),
    ("webp", "image/webp"),
    ("mp3", "audio/mpeg"),
    ("mp4", "video/mp4"),
    ("ics", "text/calendar"),
];

/// Extension to MIME type lookup table.
#[derive(Debug, Clone)]
pub struct MimeTypes {
    table: Vec<(String, String)>,
}

impl Default for MimeTypes {
    fn default() -> Self {
        Self {
            table: DEFAULT_TABLE
                .iter()
                .map(|(ext, mime)| ((*ext).to_string(), (*mime).to_string()))
                .collect(),
        }
    }
}

impl MimeTypes {
    /// Creates an empty table; every lookup falls back to the default.
    #[must_use]
    pub const fn empty() -> Self {
        Self { table: Vec::new() }
    }

    /// Registers or overrides an extension mapping.
    pub fn register(&mut self, extension: impl Into<String>, mime: impl Into<String>) {
        let extension = extension.into().to_lowercase();
        self.table.retain(|(ext, _)| *ext != extension);
        self.table.push((extension, mime.into()));
    }

    /// Guesses the MIME type for a filename from its extension.
    #[must_use]
    pub fn guess(&self, filename: &str) -> &str {
        filename
            .rsplit_once('.')
            .and_then(|(_, ext)| {
                let ext = ext.to_lowercase();
                self.table
                    .iter()
                    .find(|(e, _)| *e == ext)
                    .map(|(_, mime)| mime.as_str())
            })
            .unwrap_or(DEFAULT_MIME_TYPE)
    }

    /// Guesses the MIME type as a parsed [`ContentType`].
    #[must_use]
    pub fn guess_content_type(&self, filename: &str) -> ContentType {
        ContentType::parse(self.guess(filename)).unwrap_or_else(|_| ContentType::octet_stream())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guess_known_extensions() {
        let types = MimeTypes::default();
        assert_eq!(types.guess("report.pdf"), "application/pdf");
        assert_eq!(types.guess("photo.JPG"), "image/jpeg");
        assert_eq!(types.guess("notes.txt"), "text/plain");
    }

    #[test]
    fn test_guess_unknown_extension_defaults() {
        let types = MimeTypes::default();
        assert_eq!(types.guess("blob.xyz"), DEFAULT_MIME_TYPE);
        assert_eq!(types.guess("no_extension"), DEFAULT_MIME_TYPE);
    }

    #[test]
    fn test_register_override() {
        let mut types = MimeTypes::default();
        types.register("log", "text/plain");
        assert_eq!(types.guess("today.log"), "text/plain");
    }

    #[test]
    fn test_guess_content_type() {
        let types = MimeTypes::default();
        let ct = types.guess_content_type("a.png");
        assert!(ct.is("image", "png"));
    }
}
