//! The scene capability surface.
//!
//! A scene is a self-contained timeline plus the visuals it owns. The
//! interface is closed: `update` and `content` are required, `dispose`
//! defaults to a no-op instead of being probed for at runtime. Scenes
//! receive their collaborators through `SceneCtx` every frame — nothing
//! here reaches for globals.

use spe_core::input::MotionInput;
use spe_core::progress::ProgressStore;
use spe_render::{RenderContent, WalkCamera};

use crate::assets::AssetCatalog;
use crate::audio::AudioCues;

/// Per-frame context handed to the active scene.
pub struct SceneCtx<'a> {
    /// Show time in seconds (sum of capped deltas).
    pub elapsed: f64,
    /// Seconds since the previous frame.
    pub delta: f64,
    pub camera: &'a WalkCamera,
    pub input: &'a mut MotionInput,
    pub audio: &'a mut dyn AudioCues,
    pub assets: &'a AssetCatalog,
    pub progress: &'a mut ProgressStore,
}

pub trait Scene {
    /// Advance the scene's timeline by one frame and rebuild its visuals.
    fn update(&mut self, ctx: &mut SceneCtx<'_>);

    /// The scene's current draw list, rebuilt in place by `update`.
    fn content(&self) -> &RenderContent;

    /// Label of the current timeline phase, for the overlay.
    fn phase_label(&self) -> &'static str {
        ""
    }

    /// Release owned resources before the scene is dropped. Pending
    /// one-shot timers die with the scene; implementations only need this
    /// for effects visible outside the scene (stopping a hum, restoring
    /// input).
    fn dispose(&mut self) {}
}
