#![forbid(unsafe_code)]

//! Rules for turning a DOM event target into a hover element.

use cardtip_core::TooltipKind;

/// DOM node type of text nodes (`Node.TEXT_NODE`).
pub const TEXT_NODE: u16 = 3;

/// Attribute selecting the tooltip flavor of an eligible element.
pub const KIND_ATTRIBUTE: &str = "data-tt-kind";

/// Whether a target of `node_type` has to be swapped for its parent element
/// before it can be classified. Some engines report the text node under the
/// pointer rather than the element holding it.
#[must_use]
pub const fn resolves_to_parent(node_type: u16) -> bool {
    node_type == TEXT_NODE
}

/// An attribute counts as present only with a non-empty value, so
/// `data-nott=""` does not opt out.
#[must_use]
pub fn attribute_set(value: Option<&str>) -> bool {
    value.is_some_and(|v| !v.is_empty())
}

/// Tooltip flavor from the [`KIND_ATTRIBUTE`] value. Anything but `text`
/// gets the image tooltip.
#[must_use]
pub fn kind_from_attribute(value: Option<&str>) -> TooltipKind {
    match value.map(str::trim) {
        Some(v) if v.eq_ignore_ascii_case("text") => TooltipKind::Text,
        _ => TooltipKind::Image,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_text_nodes_resolve_to_parent() {
        assert!(resolves_to_parent(TEXT_NODE));
        assert!(!resolves_to_parent(1));
        assert!(!resolves_to_parent(9));
    }

    #[test]
    fn empty_attribute_is_unset() {
        assert!(!attribute_set(None));
        assert!(!attribute_set(Some("")));
        assert!(attribute_set(Some("1")));
        assert!(attribute_set(Some("true")));
    }

    #[test]
    fn kind_attribute() {
        assert_eq!(kind_from_attribute(None), TooltipKind::Image);
        assert_eq!(kind_from_attribute(Some("image")), TooltipKind::Image);
        assert_eq!(kind_from_attribute(Some(" Text ")), TooltipKind::Text);
        assert_eq!(kind_from_attribute(Some("bogus")), TooltipKind::Image);
    }
}
