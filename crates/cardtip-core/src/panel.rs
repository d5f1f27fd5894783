#![forbid(unsafe_code)]

//! The drawing surface a tooltip instance owns.
//!
//! The engine never touches the DOM directly; it drives a [`Panel`]. The web
//! frontend implements it over a `<div>`, the [`harness`](crate::harness)
//! implements it in memory.
//!
//! Ordering contract: instances always call [`Panel::render`] before
//! [`Panel::set_visible`]`(true)`, so a host never shows a panel whose body
//! is stale or empty.

use std::fmt;

use crate::geometry::{Point, Size};

/// Placeholder shown while image content is loading.
pub const LOADING_TEXT: &str = "Loading…";

/// Placeholder shown once a load has failed or timed out.
pub const UNAVAILABLE_TEXT: &str = "Image unavailable";

/// Body to render into a panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PanelBody<'a, I> {
    /// Literal text replacing the whole body.
    Placeholder(&'static str),
    /// An image hosted directly by the panel.
    Image(&'a I),
    /// HTML markup (the decorative text table).
    Markup(String),
}

/// Host surface for one floating panel.
pub trait Panel {
    /// Host image handle type.
    type Image: fmt::Debug;

    /// Replace the panel body.
    fn render(&mut self, body: PanelBody<'_, Self::Image>);

    /// Show or hide the panel.
    fn set_visible(&mut self, visible: bool);

    /// Current rendered size of the panel (`offsetWidth`/`offsetHeight`).
    fn measured_size(&self) -> Size;

    /// Move the panel's top-left corner.
    fn set_position(&mut self, at: Point);

    /// Set an explicit width, or clear it with `None`.
    fn set_width(&mut self, width: Option<i32>);

    /// Rendered width of the body's first child (the text table).
    fn body_width(&self) -> i32;

    /// Remove the panel from the document.
    fn detach(self);
}

/// Markup of the text-kind panel body.
///
/// The two-row table with its `th` decoration cells is what the
/// external tooltip stylesheet targets; its shape and whitespace are kept
/// exactly as the stylesheet expects.
#[must_use]
pub fn text_table_markup(content: &str) -> String {
    format!(
        concat!(
            "\n                <table>\n",
            "                    <tr>\n",
            "                        <td>{}</td>\n",
            "                        <th style=\"background-position: right top;\" />\n",
            "                    </tr>\n",
            "                    <tr>\n",
            "                        <th style=\"background-position: left bottom;\" />\n",
            "                        <th style=\"background-position: right bottom;\" />\n",
            "                    </tr>\n",
            "                </table>\n",
            "            "
        ),
        content
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_embeds_content_in_first_cell() {
        let markup = text_table_markup("<b>Flying</b>");
        assert!(markup.contains("<td><b>Flying</b></td>"));
        assert_eq!(markup.matches("<tr>").count(), 2);
        assert_eq!(markup.matches("<th ").count(), 3);
        assert!(markup.trim_start().starts_with("<table>"));
    }

    #[test]
    fn decoration_cells_in_order() {
        let markup = text_table_markup("");
        let positions: Vec<usize> = ["right top", "left bottom", "right bottom"]
            .iter()
            .filter_map(|p| markup.find(p))
            .collect();
        assert_eq!(positions.len(), 3);
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }
}
