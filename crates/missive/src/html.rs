//! HTML to plain-text conversion.

/// Converts HTML to a plain-text rendering.
///
/// Uses `htmd` for the conversion and falls back to stripping tags
/// when the input is too malformed to convert.
#[must_use]
pub fn html_to_text(html: &str) -> String {
    htmd::convert(html).unwrap_or_else(|_| strip_tags(html))
}

/// Returns the inner `<body>...</body>` fragment when present,
/// else the whole input. Used when quoting a message body into a
/// forwarded one.
#[must_use]
pub fn extract_body_fragment(html: &str) -> &str {
    let lowered = html.to_lowercase();
    let Some(open) = lowered.find("<body") else {
        return html;
    };
    let Some(open_end) = lowered[open..].find('>') else {
        return html;
    };
    let start = open + open_end + 1;
    let end = lowered[start..]
        .find("</body>")
        .map_or(html.len(), |pos| start + pos);
    &html[start..end]
}

/// Bare tag-stripping scan, the conversion fallback.
fn strip_tags(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut in_tag = false;
    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            c if !in_tag => out.push(c),
            _ => {}
        }
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_html_to_text_simple() {
        let text = html_to_text("<p>Hello <strong>World</strong></p>");
        assert!(text.contains("Hello"));
        assert!(text.contains("World"));
        assert!(!text.contains('<'));
    }

    #[test]
    fn test_extract_body_fragment() {
        let html = "<html><head><title>t</title></head><body><p>inner</p></body></html>";
        assert_eq!(extract_body_fragment(html), "<p>inner</p>");
    }

    #[test]
    fn test_extract_body_fragment_with_attributes() {
        let html = "<body class=\"x\">content</body>";
        assert_eq!(extract_body_fragment(html), "content");
    }

    #[test]
    fn test_extract_body_fragment_absent() {
        assert_eq!(extract_body_fragment("<p>no body tag</p>"), "<p>no body tag</p>");
    }

    #[test]
    fn test_strip_tags_fallback() {
        assert_eq!(strip_tags("<p>a</p> <div>b</div>"), "a b");
    }
}
