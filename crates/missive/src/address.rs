//! Mailbox address model.
//!
//! A mailbox is an optional display name plus a bare `local@domain`
//! address. Lists of mailboxes are kept as the raw header fragments
//! they came from; flattening to bare addresses is a derived view.

use std::fmt;
use std::ops::Add;

/// Characters in a display name that force quoting.
const SPECIAL_CHARS: [char; 4] = [',', ';', '<', '>'];

/// A single parsed mailbox: display name plus bare address.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Address {
    /// Display name, possibly empty.
    pub display_name: String,
    /// Bare `local@domain` address, no angle brackets.
    pub address: String,
}

impl Address {
    /// Parses a single mailbox specification.
    ///
    /// Accepts `Name <addr>`, `"Name" <addr>` and bare `addr` forms.
    /// Unparseable input yields an address with empty fields rather
    /// than an error.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        parse(raw)
    }

    /// Whether both fields are empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.display_name.is_empty() && self.address.is_empty()
    }

    /// Renders the mailbox for a header.
    ///
    /// With a display name: `"Name" <addr>`, embedded quotes escaped.
    /// Without one: the bare address.
    #[must_use]
    pub fn display(&self) -> String {
        if self.display_name.is_empty() {
            return self.address.clone();
        }
        let escaped = self.display_name.replace('"', "\\\"");
        format!("\"{escaped}\" <{}>", self.address)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display())
    }
}

/// Parses a single mailbox specification. See [`Address::parse`].
#[must_use]
pub fn parse(raw: &str) -> Address {
    let raw = raw.trim();

    if let Some(open) = raw.find('<') {
        let Some(close) = raw[open..].find('>') else {
            return Address::default();
        };

        let address = raw[open + 1..open + close].trim().to_string();
        let name = raw[..open].trim();
        let name = name
            .strip_prefix('"')
            .and_then(|n| n.strip_suffix('"'))
            .map_or_else(|| name.to_string(), |n| n.replace("\\\"", "\""));

        return Address {
            display_name: name,
            address,
        };
    }

    // Bare addr-spec form
    if raw.contains('@') && !raw.contains(char::is_whitespace) {
        return Address {
            display_name: String::new(),
            address: raw.to_string(),
        };
    }

    Address::default()
}

/// Wraps a raw header string as a single-fragment address list.
///
/// Empty input yields an empty list.
#[must_use]
pub fn parse_list(raw: &str) -> AddressList {
    if raw.trim().is_empty() {
        AddressList::default()
    } else {
        AddressList::new(vec![raw.to_string()])
    }
}

/// Ordered list of raw header fragments, each possibly holding several
/// comma-separated mailbox specs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressList {
    fragments: Vec<String>,
}

impl AddressList {
    /// Creates a list from raw fragments.
    #[must_use]
    pub const fn new(fragments: Vec<String>) -> Self {
        Self { fragments }
    }

    /// The raw fragments as stored.
    #[must_use]
    pub fn fragments(&self) -> &[String] {
        &self.fragments
    }

    /// Whether the list has no fragments.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// Flattened, order-preserving list of bare addresses.
    ///
    /// Entries without a parseable address are dropped.
    #[must_use]
    pub fn addresses(&self) -> Vec<String> {
        self.fragments
            .iter()
            .flat_map(|fragment| split_specs(fragment))
            .filter_map(|spec| {
                let parsed = parse(&spec);
                (!parsed.address.is_empty()).then_some(parsed.address)
            })
            .collect()
    }
}

impl Add for AddressList {
    type Output = Self;

    fn add(mut self, other: Self) -> Self {
        self.fragments.extend(other.fragments);
        self
    }
}

/// Splits a header fragment into mailbox specs on commas that are
/// outside quotes and angle brackets.
pub(crate) fn split_specs(fragment: &str) -> Vec<String> {
    let mut specs = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut in_angle = false;

    for c in fragment.chars() {
        match c {
            '"' => {
                in_quotes = !in_quotes;
                current.push(c);
            }
            '<' if !in_quotes => {
                in_angle = true;
                current.push(c);
            }
            '>' if !in_quotes => {
                in_angle = false;
                current.push(c);
            }
            ',' if !in_quotes && !in_angle => {
                if !current.trim().is_empty() {
                    specs.push(current.trim().to_string());
                }
                current.clear();
            }
            _ => current.push(c),
        }
    }

    if !current.trim().is_empty() {
        specs.push(current.trim().to_string());
    }

    specs
}

/// Quotes the display name of a full `Name <addr>` string when needed.
///
/// A name containing any of `, ; < >` that is not already quoted is
/// wrapped in quotes, with embedded quote characters escaped first.
/// Strings without angle brackets pass through unchanged.
#[must_use]
pub fn normalize_display_name(raw: &str) -> String {
    let (Some(open), true) = (raw.find('<'), raw.contains('>')) else {
        return raw.to_string();
    };

    let mut name = raw[..open].trim().to_string();
    let address = raw[open + 1..].trim_end_matches([' ', '>']).trim();

    let already_quoted = name.starts_with('"') && name.ends_with('"') && name.len() >= 2;
    if !name.is_empty() && !already_quoted && name.contains(SPECIAL_CHARS) {
        name = name.replace('"', "\\\"");
        name = format!("\"{name}\"");
    }

    format!("{name} <{address}>")
}
