#![forbid(unsafe_code)]

//! Source keys, content addresses, and the content a panel can host.

use std::fmt;

/// Stable identifier of a piece of tooltip content.
///
/// Derived from the hovered element's text with any leading `[0-9 ]*` prefix
/// removed, so `"4 Lightning Bolt"` (a decklist line) and `"Lightning Bolt"`
/// share one key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceKey(String);

impl SourceKey {
    /// Wrap an already-normalized key.
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Derive a key from element text. Returns `None` when nothing remains
    /// after normalization.
    #[must_use]
    pub fn from_element_text(text: &str) -> Option<Self> {
        let stripped = text.trim_start_matches(|c: char| c.is_ascii_digit() || c == ' ');
        let key = stripped.trim();
        if key.is_empty() {
            None
        } else {
            Some(Self(key.to_string()))
        }
    }

    /// The key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SourceKey {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Address of the remote content for a source key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContentAddress(String);

impl ContentAddress {
    /// `base + key + suffix`, with every `?` removed. The content host
    /// mis-routes paths containing `?`.
    #[must_use]
    pub fn build(base: &str, key: &SourceKey, suffix: &str) -> Self {
        let mut url = String::with_capacity(base.len() + key.as_str().len() + suffix.len());
        url.push_str(base);
        url.push_str(key.as_str());
        url.push_str(suffix);
        url.retain(|c| c != '?');
        Self(url)
    }

    /// The address as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Loaded tooltip content. `I` is the host's image handle type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content<I> {
    /// A loaded image, hosted directly by the panel.
    Image(I),
    /// An HTML fragment, rendered inside the decorative table.
    Text(String),
}

/// Request handed to the host when content must be fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadRequest {
    pub source: SourceKey,
    pub address: ContentAddress,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_leading_count() {
        assert_eq!(
            SourceKey::from_element_text("4 Lightning Bolt"),
            Some(SourceKey::new("Lightning Bolt"))
        );
        assert_eq!(
            SourceKey::from_element_text("  12  Island "),
            Some(SourceKey::new("Island"))
        );
    }

    #[test]
    fn keeps_inner_digits() {
        assert_eq!(
            SourceKey::from_element_text("1 Borrowing 100,000 Arrows"),
            Some(SourceKey::new("Borrowing 100,000 Arrows"))
        );
    }

    #[test]
    fn empty_after_strip_is_none() {
        assert_eq!(SourceKey::from_element_text("4 "), None);
        assert_eq!(SourceKey::from_element_text(""), None);
    }

    #[test]
    fn address_strips_question_marks() {
        let key = SourceKey::new("Who? What? When?");
        let addr = ContentAddress::build("https://deckbox.org/mtg/", &key, "/tooltip");
        assert_eq!(addr.as_str(), "https://deckbox.org/mtg/Who What When/tooltip");
    }

    #[test]
    fn address_strips_question_marks_from_base_and_suffix() {
        let key = SourceKey::new("Opt");
        let addr = ContentAddress::build("https://x.test/?a=", &key, "/tooltip?");
        assert_eq!(addr.to_string(), "https://x.test/a=Opt/tooltip");
    }
}
