//! Threshold stage: a gated passage.
//!
//! Unlike the intro this timeline is not phase-named — every animation is
//! driven off fixed thresholds against scene time. The door starts
//! sliding after a delay and eases open; its audio cue fires inside a
//! small elapsed-fraction window near the slide's start so the clunk
//! lands with the first visible movement. The title reveals on its own
//! schedule once its asset settles, then floats on a sine offset.
//! Progression is spatial, not temporal: walking through the doorway —
//! the camera's depth crossing a fixed threshold — is what arms the
//! advance flag.

use glam::{Vec2, Vec3};

use spe_core::ease::ease_out_cubic;
use spe_core::timer::OneShot;
use spe_render::{Primitive, RenderContent};

use crate::assets::{PASSAGE_TITLE_TEXTURE, WHITE_TEXTURE};
use crate::scene::{Scene, SceneCtx};

const DOOR_DELAY: f64 = 1.0;
const DOOR_SLIDE_DURATION: f64 = 2.2;
/// Elapsed-fraction window of the slide inside which the cue fires.
const DOOR_CUE_WINDOW: (f64, f64) = (0.05, 0.25);

const DOOR_LEAF_WIDTH: f32 = 1.5;
const DOOR_HEIGHT: f32 = 3.2;
const DOORWAY_Z: f32 = 0.0;
/// Camera depth past the doorway that enables progression.
const ADVANCE_DEPTH: f32 = -2.0;

const TITLE_DELAY: f64 = 1.5;
const TITLE_FADE_DURATION: f64 = 1.0;
const TITLE_FLOAT_OMEGA: f64 = 0.9;
const TITLE_FLOAT_AMPLITUDE: f32 = 0.12;
const TITLE_CENTER: Vec3 = Vec3::new(0.0, 4.2, DOORWAY_Z);

const GUIDE_LIGHT_COUNT: usize = 6;
const GUIDE_LIGHT_SPACING: f32 = 1.5;

pub struct PassageScene {
    elapsed: f64,
    door_open: f32,
    door_cue: OneShot,
    title_fade_elapsed: f64,
    title_opacity: f32,
    title_float: f32,
    depth_gate: OneShot,
    content: RenderContent,
}

impl PassageScene {
    pub fn new() -> Self {
        Self {
            elapsed: 0.0,
            door_open: 0.0,
            door_cue: OneShot::new(),
            title_fade_elapsed: 0.0,
            title_opacity: 0.0,
            title_float: 0.0,
            depth_gate: OneShot::new(),
            content: RenderContent::with_capacity(GUIDE_LIGHT_COUNT * 2 + 8),
        }
    }

    fn update_door(&mut self, ctx: &mut SceneCtx<'_>) {
        if self.elapsed < DOOR_DELAY {
            return;
        }
        let slide_t = ((self.elapsed - DOOR_DELAY) / DOOR_SLIDE_DURATION).clamp(0.0, 1.0);
        self.door_open = ease_out_cubic(slide_t as f32);

        if slide_t >= DOOR_CUE_WINDOW.0 && !self.door_cue.has_fired() {
            if slide_t <= DOOR_CUE_WINDOW.1 {
                if self.door_cue.fire() {
                    ctx.audio.door_open();
                }
            } else {
                // A pathological frame skipped the whole window; swallow
                // the cue rather than play it out of sync.
                let _ = self.door_cue.fire();
                log::debug!("Door cue window skipped at slide_t={slide_t:.2}");
            }
        }
    }

    fn update_title(&mut self, ctx: &mut SceneCtx<'_>) {
        if self.elapsed < TITLE_DELAY || !ctx.assets.is_settled(PASSAGE_TITLE_TEXTURE) {
            return;
        }
        if self.title_opacity < 1.0 {
            self.title_fade_elapsed += ctx.delta;
            self.title_opacity = (self.title_fade_elapsed / TITLE_FADE_DURATION).min(1.0) as f32;
        } else {
            // Fully revealed: drift on a continuous sine.
            self.title_float =
                (self.elapsed * TITLE_FLOAT_OMEGA).sin() as f32 * TITLE_FLOAT_AMPLITUDE;
        }
    }

    fn update_gate(&mut self, ctx: &mut SceneCtx<'_>) {
        if ctx.camera.depth() < ADVANCE_DEPTH && self.depth_gate.fire() {
            log::info!(
                "Doorway crossed at depth {:.2}; enabling progression",
                ctx.camera.depth()
            );
            ctx.progress.set_can_advance(true);
        }
    }

    fn rebuild_content(&mut self, title_ready: bool) {
        self.content.clear();

        // Guide lights leading into the doorway.
        for i in 0..GUIDE_LIGHT_COUNT {
            let z = DOORWAY_Z + (i as f32 + 1.0) * GUIDE_LIGHT_SPACING;
            for x in [-1.2, 1.2] {
                self.content.push(Primitive::billboard(
                    Vec3::new(x, 0.15, z),
                    Vec2::splat(0.1),
                    [0.6, 0.8, 1.0, 0.9],
                    WHITE_TEXTURE,
                ));
            }
        }

        // Portal frame: posts and lintel.
        let post_size = Vec2::new(0.4, DOOR_HEIGHT + 0.4);
        for x in [-(DOOR_LEAF_WIDTH + 0.2), DOOR_LEAF_WIDTH + 0.2] {
            self.content.push(Primitive::wall(
                Vec3::new(x, (DOOR_HEIGHT + 0.4) / 2.0, DOORWAY_Z),
                post_size,
                [0.25, 0.28, 0.35, 1.0],
                WHITE_TEXTURE,
            ));
        }
        self.content.push(Primitive::wall(
            Vec3::new(0.0, DOOR_HEIGHT + 0.6, DOORWAY_Z),
            Vec2::new(2.0 * DOOR_LEAF_WIDTH + 1.2, 0.4),
            [0.25, 0.28, 0.35, 1.0],
            WHITE_TEXTURE,
        ));

        // Door leaves slide apart as door_open goes 0 -> 1.
        let slide = self.door_open * DOOR_LEAF_WIDTH;
        let leaf_size = Vec2::new(DOOR_LEAF_WIDTH, DOOR_HEIGHT);
        self.content.push(Primitive::wall(
            Vec3::new(-DOOR_LEAF_WIDTH / 2.0 - slide, DOOR_HEIGHT / 2.0, DOORWAY_Z),
            leaf_size,
            [0.5, 0.55, 0.62, 1.0],
            WHITE_TEXTURE,
        ));
        self.content.push(Primitive::wall(
            Vec3::new(DOOR_LEAF_WIDTH / 2.0 + slide, DOOR_HEIGHT / 2.0, DOORWAY_Z),
            leaf_size,
            [0.5, 0.55, 0.62, 1.0],
            WHITE_TEXTURE,
        ));

        // Title card above the doorway.
        if self.title_opacity > 0.0 {
            let center = TITLE_CENTER + Vec3::new(0.0, self.title_float, 0.0);
            if title_ready {
                self.content.push(Primitive::billboard(
                    center,
                    Vec2::new(3.0, 0.75),
                    [1.0, 1.0, 1.0, self.title_opacity],
                    PASSAGE_TITLE_TEXTURE,
                ));
            } else {
                // Failed load: simplified glowing bar.
                self.content.push(Primitive::billboard(
                    center,
                    Vec2::new(3.0, 0.2),
                    [0.9, 0.95, 1.0, self.title_opacity],
                    WHITE_TEXTURE,
                ));
            }
        }
    }
}

impl Default for PassageScene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene for PassageScene {
    fn update(&mut self, ctx: &mut SceneCtx<'_>) {
        self.elapsed += ctx.delta;

        self.update_door(ctx);
        self.update_title(ctx);
        self.update_gate(ctx);

        let title_ready = ctx.assets.is_ready(PASSAGE_TITLE_TEXTURE);
        self.rebuild_content(title_ready);
    }

    fn content(&self) -> &RenderContent {
        &self.content
    }

    fn phase_label(&self) -> &'static str {
        if self.elapsed < DOOR_DELAY {
            "door-closed"
        } else if self.door_open < 1.0 {
            "door-sliding"
        } else {
            "door-open"
        }
    }

    fn dispose(&mut self) {
        log::debug!("Passage scene disposed (door_open={:.2})", self.door_open);
    }
}
