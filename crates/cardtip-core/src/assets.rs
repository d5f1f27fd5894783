#![forbid(unsafe_code)]

//! Stylesheets the frontend appends to `<head>` at startup.

use crate::config::HoverConfig;
use crate::viewport::EnvironmentProfile;

/// Main tooltip stylesheet path on the stylesheet host.
pub const STYLESHEET_PATH: &str = "/assets/external/deckbox_tooltip.css";

/// Extra stylesheet for legacy IE.
pub const LEGACY_IE_STYLESHEET_PATH: &str = "/assets/external/deckbox_tooltip_ie.css";

/// Protocol to load assets with, mirroring the page: `https:` pages get
/// `https:`, everything else (including `file:`) gets `http:`.
#[must_use]
pub fn asset_protocol(page_protocol: &str) -> &'static str {
    if page_protocol.eq_ignore_ascii_case("https:") {
        "https:"
    } else {
        "http:"
    }
}

/// Stylesheet URLs to inject, in order.
#[must_use]
pub fn stylesheet_urls(
    config: &HoverConfig,
    page_protocol: &str,
    profile: &EnvironmentProfile,
) -> Vec<String> {
    let protocol = asset_protocol(page_protocol);
    let host = config.stylesheet_host.trim_end_matches('/');
    let mut urls = vec![format!("{protocol}//{host}{STYLESHEET_PATH}")];
    if profile.legacy_ie {
        urls.push(format!("{protocol}//{host}{LEGACY_IE_STYLESHEET_PATH}"));
    }
    urls
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn mirrors_https() {
        let urls = stylesheet_urls(
            &HoverConfig::default(),
            "https:",
            &EnvironmentProfile::standard(),
        );
        assert_eq!(
            urls,
            vec!["https://deckbox.org/assets/external/deckbox_tooltip.css".to_string()]
        );
    }

    #[test]
    fn non_https_falls_back_to_http() {
        assert_eq!(asset_protocol("file:"), "http:");
        assert_eq!(asset_protocol("http:"), "http:");
    }

    #[test]
    fn legacy_ie_gets_extra_sheet() {
        let profile = EnvironmentProfile {
            legacy_ie: true,
            ..EnvironmentProfile::standard()
        };
        let urls = stylesheet_urls(&HoverConfig::default(), "http:", &profile);
        assert_eq!(
            urls,
            vec![
                "http://deckbox.org/assets/external/deckbox_tooltip.css".to_string(),
                "http://deckbox.org/assets/external/deckbox_tooltip_ie.css".to_string(),
            ]
        );
    }
}
