//! Developer/presenter overlay for the show.

pub mod stage_overlay;

pub use stage_overlay::{OverlayActions, OverlayStats, StageOverlay};
