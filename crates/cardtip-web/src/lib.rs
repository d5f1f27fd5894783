#![forbid(unsafe_code)]

//! WASM frontend for cardtip.
//!
//! Binds [`cardtip_core::HoverController`] to a live document: DOM pointer
//! listeners feed the controller, `setTimeout` drives its wake-ups, and two
//! absolutely positioned `<div>` panels draw the tooltips.
//!
//! The DOM-free pieces (event field extraction, target resolution rules,
//! inline styles) live in [`pointer`], [`target`] and [`styles`] so they
//! build and test on native targets too.

pub mod pointer;
pub mod styles;
pub mod target;

#[cfg(target_arch = "wasm32")]
mod dom;
#[cfg(target_arch = "wasm32")]
mod wasm;

#[cfg(target_arch = "wasm32")]
pub use wasm::CardTips;

pub use cardtip_core::{CardtipError, HoverConfig};

/// Native builds compile this crate as a stub so `cargo check --workspace`
/// stays green on non-wasm targets. It only parses and validates options.
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Default)]
pub struct CardTips {
    config: HoverConfig,
}

#[cfg(not(target_arch = "wasm32"))]
impl CardTips {
    /// Parse JSON options the same way the wasm constructor does.
    pub fn new(options: Option<&str>) -> Result<Self, CardtipError> {
        let config = match options {
            Some(json) => HoverConfig::from_json(json)?,
            None => HoverConfig::default(),
        };
        Ok(Self { config })
    }

    #[must_use]
    pub fn config(&self) -> &HoverConfig {
        &self.config
    }
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;

    #[test]
    fn stub_parses_options() {
        let tips = CardTips::new(Some(r#"{"debounce_ms": 120}"#)).unwrap();
        assert_eq!(tips.config().debounce_ms, 120);
        assert_eq!(CardTips::new(None).unwrap().config().debounce_ms, 200);
    }

    #[test]
    fn stub_rejects_bad_options() {
        assert!(matches!(
            CardTips::new(Some(r#"{"eligible_class": " "}"#)),
            Err(CardtipError::InvalidConfig(_))
        ));
    }
}
