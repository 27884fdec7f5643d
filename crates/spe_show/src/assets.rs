//! Named asset tracking for the show's textures.
//!
//! Timelines never wait on an asset that cannot arrive: a failed load
//! counts as settled, so `fraction()` always reaches 1.0 and the intro's
//! loading phase always completes. Scenes query readiness to decide
//! between the real visual and its simplified fallback.

use std::collections::HashMap;

/// Texture key for the built-in 1x1 white pixel every tinted primitive
/// samples by default.
pub const WHITE_TEXTURE: &str = "__white";
/// Title card revealed during the intro's explosion.
pub const INTRO_TITLE_TEXTURE: &str = "intro_title";
/// Title card floating above the passage door.
pub const PASSAGE_TITLE_TEXTURE: &str = "passage_title";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetState {
    Pending,
    Ready,
    /// Load or decode failed; a fallback visual substitutes for it.
    Failed,
}

#[derive(Debug, Default)]
pub struct AssetCatalog {
    entries: HashMap<&'static str, AssetState>,
}

impl AssetCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn declare(&mut self, name: &'static str) {
        self.entries.insert(name, AssetState::Pending);
    }

    pub fn mark_ready(&mut self, name: &'static str) {
        self.entries.insert(name, AssetState::Ready);
    }

    pub fn mark_failed(&mut self, name: &'static str) {
        log::warn!("Asset '{name}' failed to load; using fallback visual");
        self.entries.insert(name, AssetState::Failed);
    }

    pub fn is_ready(&self, name: &str) -> bool {
        self.entries.get(name) == Some(&AssetState::Ready)
    }

    pub fn is_failed(&self, name: &str) -> bool {
        self.entries.get(name) == Some(&AssetState::Failed)
    }

    /// Ready or failed — either way the show stops waiting for it.
    pub fn is_settled(&self, name: &str) -> bool {
        matches!(
            self.entries.get(name),
            Some(AssetState::Ready | AssetState::Failed)
        )
    }

    /// Settled share of declared assets, 0..1. An empty catalog is fully
    /// loaded by definition.
    pub fn fraction(&self) -> f32 {
        if self.entries.is_empty() {
            return 1.0;
        }
        let settled = self
            .entries
            .values()
            .filter(|state| !matches!(state, AssetState::Pending))
            .count();
        settled as f32 / self.entries.len() as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_catalog_is_fully_loaded() {
        let catalog = AssetCatalog::new();
        assert_eq!(catalog.fraction(), 1.0);
    }

    #[test]
    fn fraction_tracks_settled_entries() {
        let mut catalog = AssetCatalog::new();
        catalog.declare("a");
        catalog.declare("b");
        assert_eq!(catalog.fraction(), 0.0);

        catalog.mark_ready("a");
        assert!((catalog.fraction() - 0.5).abs() < 1e-6);

        catalog.mark_failed("b");
        assert_eq!(catalog.fraction(), 1.0);
    }

    #[test]
    fn failure_counts_as_settled_but_not_ready() {
        let mut catalog = AssetCatalog::new();
        catalog.declare("title");
        catalog.mark_failed("title");
        assert!(catalog.is_settled("title"));
        assert!(catalog.is_failed("title"));
        assert!(!catalog.is_ready("title"));
    }

    #[test]
    fn undeclared_assets_read_as_unsettled() {
        let catalog = AssetCatalog::new();
        assert!(!catalog.is_settled("nope"));
        assert!(!catalog.is_ready("nope"));
    }
}
