//! Subject line classification.
//!
//! Reply and forward prefixes are kept as locale-tagged data tables so
//! new locales can be added without touching the matching logic. See
//! <https://en.wikipedia.org/wiki/List_of_email_subject_abbreviations>.

/// Localized equivalents of "RE:", tagged by locale.
pub const REPLY_PREFIXES: [(&str, &str); 11] = [
    ("en", "RE:"),
    ("da", "SV:"),
    ("nl", "Antw:"),
    ("fi", "VS:"),
    ("de", "AW:"),
    ("hu", "Vá:"),
    ("it", "R:"),
    ("it", "RIF:"),
    ("es", "BLS:"),
    ("pl", "Odp:"),
    ("tr", "YNT:"),
];

/// Localized equivalents of "FW:"/"FWD:", tagged by locale.
pub const FORWARD_PREFIXES: [(&str, &str); 15] = [
    ("en", "FW:"),
    ("en", "FWD:"),
    ("da", "VS:"),
    ("nl", "Doorst:"),
    ("fi", "VL:"),
    ("fr", "TR:"),
    ("de", "WG:"),
    ("hu", "Továbbítás:"),
    ("it", "I:"),
    ("is", "FS:"),
    ("sv", "VB:"),
    ("es", "RV:"),
    ("pt", "ENC:"),
    ("pl", "PD:"),
    ("tr", "İLT:"),
];

/// Finds a prefix from a table at the start of a trimmed subject,
/// returning the length of the match in bytes.
fn match_prefix(subject: &str, table: &[(&str, &str)]) -> Option<usize> {
    let lowered = subject.to_lowercase();
    table.iter().find_map(|(_, prefix)| {
        let prefix_lower = prefix.to_lowercase();
        lowered
            .starts_with(&prefix_lower)
            .then(|| subject.char_indices().nth(prefix.chars().count()).map_or(subject.len(), |(i, _)| i))
    })
}

/// Whether the subject starts with a forward prefix.
#[must_use]
pub fn is_forwarded(subject: &str) -> bool {
    match_prefix(subject.trim_start(), &FORWARD_PREFIXES).is_some()
}

/// Whether the subject marks a reply.
///
/// A message is a reply when it is not forwarded and either carries an
/// In-Reply-To header or starts with a reply prefix.
#[must_use]
pub fn is_reply(subject: &str, has_in_reply_to: bool) -> bool {
    let subject = subject.trim_start();
    !is_forwarded(subject)
        && (has_in_reply_to || match_prefix(subject, &REPLY_PREFIXES).is_some())
}

/// Strips one leading reply or forward prefix and trims whitespace.
///
/// Reply patterns are tried first; only the first matching prefix at
/// the very start is removed, not all occurrences.
#[must_use]
pub fn clean_subject(subject: &str) -> String {
    let trimmed = subject.trim();
    let stripped = match_prefix(trimmed, &REPLY_PREFIXES)
        .or_else(|| match_prefix(trimmed, &FORWARD_PREFIXES))
        .map_or(trimmed, |len| &trimmed[len..]);
    stripped.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_reply_by_prefix() {
        assert!(is_reply("Re: [project] Add spec (#5)", false));
        assert!(is_reply("RE: hello", false));
        assert!(is_reply("sv: hej", false));
    }

    #[test]
    fn test_is_reply_by_header() {
        assert!(is_reply("No prefix at all", true));
        assert!(!is_reply("No prefix at all", false));
    }

    #[test]
    fn test_forwarded_wins_over_reply() {
        assert!(is_forwarded("Fwd: Hello"));
        assert!(!is_reply("Fwd: Hello", true));
    }

    #[test]
    fn test_is_forwarded_localized() {
        assert!(is_forwarded("WG: Besprechung"));
        assert!(is_forwarded("RV: Hola"));
        assert!(!is_forwarded("Plain subject"));
    }

    #[test]
    fn test_clean_subject_reply() {
        assert_eq!(
            clean_subject("Re: [project] Add spec (#5)"),
            "[project] Add spec (#5)"
        );
    }

    #[test]
    fn test_clean_subject_forward() {
        assert_eq!(clean_subject("Fwd: Hello"), "Hello");
    }

    #[test]
    fn test_clean_subject_strips_only_first_prefix() {
        assert_eq!(clean_subject("Re: Re: Hello"), "Re: Hello");
    }

    #[test]
    fn test_clean_subject_no_prefix() {
        assert_eq!(clean_subject("  Plain subject  "), "Plain subject");
    }

    #[test]
    fn test_clean_subject_leading_whitespace() {
        assert_eq!(clean_subject("   RE: trimmed"), "trimmed");
    }
}
