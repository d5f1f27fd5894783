#![forbid(unsafe_code)]

//! Engine configuration.
//!
//! Defaults reproduce the deckbox.org tooltip behavior. The web frontend
//! accepts a JSON object with any subset of these fields:
//!
//! ```
//! use cardtip_core::HoverConfig;
//!
//! let config = HoverConfig::from_json(r#"{ "debounce_ms": 120 }"#).unwrap();
//! assert_eq!(config.debounce_ms, 120);
//! assert_eq!(config.image_height, 310);
//! ```

use core::time::Duration;

use serde::Deserialize;

use crate::content::{ContentAddress, SourceKey};
use crate::error::CardtipError;
use crate::placement::CursorOffset;

/// Hover controller configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct HoverConfig {
    /// Delay between pointer-enter and starting the load (default: 200).
    pub debounce_ms: u64,
    /// A load still outstanding after this long is treated as failed.
    /// `None` keeps the `Loading…` placeholder forever (default: 8000).
    pub load_timeout_ms: Option<u64>,
    /// Prefix of every content address.
    pub content_base: String,
    /// Suffix of every content address.
    pub content_suffix: String,
    /// Rendered height of tooltip images in pixels (default: 310).
    pub image_height: u32,
    /// Horizontal distance between pointer and panel (default: 15).
    pub cursor_offset_x: i32,
    /// The panel is lifted by `height / lift_divisor` (default: 3).
    pub lift_divisor: i32,
    /// Maximum measured width of text content (default: 330).
    pub text_max_width: i32,
    /// Added to the clamped text width (default: 20).
    pub text_margin: i32,
    /// Host serving the tooltip stylesheets, without protocol.
    pub stylesheet_host: String,
    /// Class marking tooltip-eligible elements (default: `card`).
    pub eligible_class: String,
    /// Attribute that opts an element out (default: `data-nott`).
    pub opt_out_attribute: String,
}

impl Default for HoverConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 200,
            load_timeout_ms: Some(8_000),
            content_base: "https://deckbox.org/mtg/".to_string(),
            content_suffix: "/tooltip".to_string(),
            image_height: 310,
            cursor_offset_x: 15,
            lift_divisor: 3,
            text_max_width: 330,
            text_margin: 20,
            stylesheet_host: "deckbox.org".to_string(),
            eligible_class: "card".to_string(),
            opt_out_attribute: "data-nott".to_string(),
        }
    }
}

impl HoverConfig {
    /// Parse a (partial) JSON configuration and validate it.
    pub fn from_json(json: &str) -> Result<Self, CardtipError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the engine cannot run with.
    pub fn validate(&self) -> Result<(), CardtipError> {
        if self.lift_divisor < 0 {
            return Err(CardtipError::InvalidConfig(
                "lift_divisor must not be negative".into(),
            ));
        }
        if self.eligible_class.trim().is_empty() {
            return Err(CardtipError::InvalidConfig(
                "eligible_class must not be empty".into(),
            ));
        }
        if self.text_max_width < 0 || self.text_margin < 0 {
            return Err(CardtipError::InvalidConfig(
                "text widths must not be negative".into(),
            ));
        }
        Ok(())
    }

    /// Set the debounce delay in milliseconds.
    #[must_use]
    pub fn debounce_ms(mut self, ms: u64) -> Self {
        self.debounce_ms = ms;
        self
    }

    /// Set (or disable) the load timeout in milliseconds.
    #[must_use]
    pub fn load_timeout_ms(mut self, ms: Option<u64>) -> Self {
        self.load_timeout_ms = ms;
        self
    }

    /// Set the content address prefix and suffix.
    #[must_use]
    pub fn content_address(mut self, base: impl Into<String>, suffix: impl Into<String>) -> Self {
        self.content_base = base.into();
        self.content_suffix = suffix.into();
        self
    }

    /// Set the cursor offset.
    #[must_use]
    pub fn cursor_offset(mut self, dx: i32, lift_divisor: i32) -> Self {
        self.cursor_offset_x = dx;
        self.lift_divisor = lift_divisor;
        self
    }

    /// Debounce delay as a [`Duration`].
    #[must_use]
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Load timeout as a [`Duration`].
    #[must_use]
    pub fn load_timeout(&self) -> Option<Duration> {
        self.load_timeout_ms.map(Duration::from_millis)
    }

    /// Cursor offset used for placement.
    #[must_use]
    pub fn cursor(&self) -> CursorOffset {
        CursorOffset {
            dx: self.cursor_offset_x,
            lift_divisor: self.lift_divisor,
        }
    }

    /// Content address for `key`.
    #[must_use]
    pub fn address_for(&self, key: &SourceKey) -> ContentAddress {
        ContentAddress::build(&self.content_base, key, &self.content_suffix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_match_deckbox() {
        let config = HoverConfig::default();
        assert_eq!(config.debounce(), Duration::from_millis(200));
        assert_eq!(
            config.address_for(&SourceKey::new("Lightning Bolt")).as_str(),
            "https://deckbox.org/mtg/Lightning Bolt/tooltip"
        );
        assert_eq!(config.cursor(), CursorOffset::default());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config =
            HoverConfig::from_json(r#"{ "load_timeout_ms": null, "eligible_class": "cardlink" }"#)
                .unwrap();
        assert_eq!(config.load_timeout(), None);
        assert_eq!(config.eligible_class, "cardlink");
        assert_eq!(config.debounce_ms, 200);
    }

    #[test]
    fn rejects_malformed_json() {
        let err = HoverConfig::from_json("{ debounce_ms: }").unwrap_err();
        assert!(matches!(err, CardtipError::InvalidConfig(_)));
    }

    #[test]
    fn rejects_empty_class() {
        let err = HoverConfig::from_json(r#"{ "eligible_class": " " }"#).unwrap_err();
        assert_eq!(
            err,
            CardtipError::InvalidConfig("eligible_class must not be empty".into())
        );
    }

    #[test]
    fn builders() {
        let config = HoverConfig::default()
            .debounce_ms(50)
            .load_timeout_ms(None)
            .content_address("https://img.test/", ".png")
            .cursor_offset(10, 0);
        assert_eq!(config.debounce_ms, 50);
        assert_eq!(config.load_timeout(), None);
        assert_eq!(
            config.address_for(&SourceKey::new("Opt")).as_str(),
            "https://img.test/Opt.png"
        );
        assert_eq!(config.cursor().lift_divisor, 0);
    }
}
