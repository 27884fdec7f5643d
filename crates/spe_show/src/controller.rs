//! Top-level scene orchestration.
//!
//! The controller owns the registry of built scenes, the active scene,
//! and the progress store. Everything else — camera, input, audio, asset
//! catalog, renderer — arrives through `FrameCtx` each frame, so the
//! dependency edges are visible at the call site instead of hiding behind
//! a global instance.
//!
//! Per-frame order is load-bearing: input is applied before the active
//! scene consumes it, the scene's terminal visual state is staged for
//! render before the progress check runs, and a scene that flips the
//! advance flag mid-update therefore gets drawn one final time before the
//! swap.

use std::collections::HashMap;

use spe_core::input::MotionInput;
use spe_core::progress::{ProgressStore, StageId};
use spe_core::timer::DelayTimer;
use spe_render::{StageRenderer, WalkCamera};

use crate::assets::AssetCatalog;
use crate::audio::AudioCues;
use crate::scene::{Scene, SceneCtx};

/// Duration of the black overlay masking the pop of a scene swap.
pub const FADE_DURATION: f64 = 0.3;
/// How long the progression guard stays engaged after a swap.
pub const SETTLE_DELAY: f64 = 0.5;

/// Everything the controller needs for one frame.
pub struct FrameCtx<'a> {
    /// Wall-clock seconds since startup; drives deadline timers.
    pub now: f64,
    /// Show time (sum of capped deltas); drives animation.
    pub elapsed: f64,
    pub delta: f64,
    pub camera: &'a mut WalkCamera,
    pub input: &'a mut MotionInput,
    pub audio: &'a mut dyn AudioCues,
    pub assets: &'a AssetCatalog,
    pub renderer: &'a mut dyn StageRenderer,
}

pub struct SceneController {
    registry: HashMap<StageId, Box<dyn Scene>>,
    active: Option<Box<dyn Scene>>,
    progress: ProgressStore,
    guard_engaged: bool,
    settle: DelayTimer,
    fade_started: Option<f64>,
}

impl SceneController {
    pub fn new(progress: ProgressStore) -> Self {
        Self {
            registry: HashMap::new(),
            active: None,
            progress,
            guard_engaged: false,
            settle: DelayTimer::new(),
            fade_started: None,
        }
    }

    /// Register a built scene instance for a stage. Instances are
    /// consumed when installed and never reused after disposal.
    pub fn register(&mut self, stage: StageId, scene: Box<dyn Scene>) {
        if self.registry.insert(stage, scene).is_some() {
            log::warn!("Stage '{stage}' registered twice; replacing the earlier instance");
        }
    }

    pub fn progress(&self) -> &ProgressStore {
        &self.progress
    }

    pub fn progress_mut(&mut self) -> &mut ProgressStore {
        &mut self.progress
    }

    pub fn has_active_scene(&self) -> bool {
        self.active.is_some()
    }

    pub fn active_phase_label(&self) -> &'static str {
        self.active
            .as_ref()
            .map(|scene| scene.phase_label())
            .unwrap_or("")
    }

    pub fn guard_engaged(&self) -> bool {
        self.guard_engaged
    }

    /// Current fade-overlay opacity; 0 outside the guard window.
    pub fn fade_alpha(&self, now: f64) -> f32 {
        match self.fade_started {
            Some(started) => {
                let t = ((now - started) / FADE_DURATION).clamp(0.0, 1.0);
                (1.0 - t) as f32
            }
            None => 0.0,
        }
    }

    /// Install the scene for `stage`. A stage with no built scene is a
    /// degraded mode, not an error: index tracking and the fade still run
    /// so the indicator stays truthful, the frame just has no content.
    pub fn switch_to(&mut self, stage: StageId, now: f64) {
        if let Some(mut outgoing) = self.active.take() {
            outgoing.dispose();
        }

        match self.registry.remove(&stage) {
            Some(scene) => {
                log::info!("Switching to stage '{stage}'");
                self.active = Some(scene);
            }
            None => {
                log::warn!("Stage '{stage}' has no built scene; showing empty stage");
            }
        }

        self.progress.set_stage(stage.index());
        self.fade_started = Some(now);
    }

    /// One frame. See the module docs for why the internal order matters.
    pub fn update(&mut self, ctx: &mut FrameCtx<'_>) {
        ctx.input.update(ctx.now);
        ctx.camera.apply_motion(ctx.input.intent(), ctx.delta as f32);

        if let Some(scene) = self.active.as_mut() {
            let mut scene_ctx = SceneCtx {
                elapsed: ctx.elapsed,
                delta: ctx.delta,
                camera: ctx.camera,
                input: ctx.input,
                audio: &mut *ctx.audio,
                assets: ctx.assets,
                progress: &mut self.progress,
            };
            scene.update(&mut scene_ctx);
        }

        if let Some(scene) = self.active.as_ref() {
            ctx.renderer.render(scene.content(), ctx.camera);
        }

        if self.settle.poll(ctx.now) {
            self.guard_engaged = false;
        }
        self.check_progress(ctx.now);
    }

    /// Consume a pending advance request, at most once per guard window.
    ///
    /// The exit condition and this poll are decoupled: a scene can set
    /// the flag and keep rendering for several frames before a transition
    /// settles, so without the guard one advance intent could be consumed
    /// twice.
    pub fn check_progress(&mut self, now: f64) {
        if !self.progress.can_advance() || self.guard_engaged {
            return;
        }

        self.guard_engaged = true;
        self.progress.set_can_advance(false);

        if self.progress.current().is_intro() {
            // Intro finished: jump to wherever the viewer last was.
            let target = self.progress.resume_stage();
            self.switch_to(target, now);
        } else if self.progress.advance_to_next() {
            self.switch_to(self.progress.current(), now);
        }

        self.settle.schedule(now, SETTLE_DELAY);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::NullAudio;
    use spe_core::progress::RESUME_KEY;
    use spe_core::storage::MemoryStore;
    use spe_render::RenderContent;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Scene that sets the advance flag after a configured number of
    /// updates and records its disposal.
    struct StubScene {
        content: RenderContent,
        updates_until_advance: Option<u32>,
        updates_seen: u32,
        disposed: Rc<RefCell<bool>>,
    }

    impl StubScene {
        fn new(updates_until_advance: Option<u32>) -> (Self, Rc<RefCell<bool>>) {
            let disposed = Rc::new(RefCell::new(false));
            (
                Self {
                    content: RenderContent::new(),
                    updates_until_advance,
                    updates_seen: 0,
                    disposed: Rc::clone(&disposed),
                },
                disposed,
            )
        }
    }

    impl Scene for StubScene {
        fn update(&mut self, ctx: &mut SceneCtx<'_>) {
            self.updates_seen += 1;
            if Some(self.updates_seen) == self.updates_until_advance {
                ctx.progress.set_can_advance(true);
            }
        }

        fn content(&self) -> &RenderContent {
            &self.content
        }

        fn phase_label(&self) -> &'static str {
            "stub"
        }

        fn dispose(&mut self) {
            *self.disposed.borrow_mut() = true;
        }
    }

    /// Renderer that records which frame events it saw, in order.
    #[derive(Default)]
    struct RecordingRenderer {
        events: Rc<RefCell<Vec<String>>>,
    }

    impl StageRenderer for RecordingRenderer {
        fn render(&mut self, content: &RenderContent, _camera: &WalkCamera) {
            self.events
                .borrow_mut()
                .push(format!("render:{}", content.len()));
        }
    }

    struct Harness {
        controller: SceneController,
        camera: WalkCamera,
        input: MotionInput,
        audio: NullAudio,
        assets: AssetCatalog,
        renderer: RecordingRenderer,
        now: f64,
    }

    impl Harness {
        fn new(stored_resume: Option<&str>) -> Self {
            let backing = match stored_resume {
                Some(value) => MemoryStore::with(RESUME_KEY, value),
                None => MemoryStore::new(),
            };
            Self {
                controller: SceneController::new(ProgressStore::new(Box::new(backing))),
                camera: WalkCamera::new(1280, 720),
                input: MotionInput::new(),
                audio: NullAudio,
                assets: AssetCatalog::new(),
                renderer: RecordingRenderer::default(),
                now: 0.0,
            }
        }

        fn step(&mut self, dt: f64) {
            self.now += dt;
            let mut ctx = FrameCtx {
                now: self.now,
                elapsed: self.now,
                delta: dt,
                camera: &mut self.camera,
                input: &mut self.input,
                audio: &mut self.audio,
                assets: &self.assets,
                renderer: &mut self.renderer,
            };
            self.controller.update(&mut ctx);
        }
    }

    #[test]
    fn switching_to_unbuilt_stage_degrades_without_panic() {
        let mut harness = Harness::new(None);
        harness.controller.switch_to(StageId::Gallery, 0.0);

        assert!(!harness.controller.has_active_scene());
        assert_eq!(harness.controller.progress().current(), StageId::Gallery);
        // Degraded mode still runs frames without content.
        harness.step(1.0 / 60.0);
    }

    #[test]
    fn switch_disposes_the_outgoing_scene() {
        let mut harness = Harness::new(None);
        let (scene, disposed) = StubScene::new(None);
        harness.controller.register(StageId::Intro, Box::new(scene));
        harness.controller.switch_to(StageId::Intro, 0.0);
        assert!(!*disposed.borrow());

        harness.controller.switch_to(StageId::Threshold, 1.0);
        assert!(*disposed.borrow());
        assert!(!harness.controller.has_active_scene());
    }

    #[test]
    fn double_check_within_guard_window_swaps_once() {
        let mut harness = Harness::new(None);
        harness.controller.progress_mut().set_stage(2);

        harness.controller.progress_mut().set_can_advance(true);
        harness.controller.check_progress(10.0);
        harness.controller.check_progress(10.1);
        // One advance intent, two polls inside the guard window: one swap.
        assert_eq!(harness.controller.progress().current(), StageId::Machines);
        assert!(!harness.controller.progress().can_advance());
    }

    #[test]
    fn advance_set_during_guard_window_stays_pending_until_settle() {
        let mut harness = Harness::new(None);
        harness.controller.progress_mut().set_stage(2);

        harness.controller.progress_mut().set_can_advance(true);
        harness.controller.check_progress(10.0);
        assert_eq!(harness.controller.progress().current(), StageId::Machines);

        // A new intent arrives while the guard is engaged: not consumed
        // yet, honored once the guard settles.
        harness.controller.progress_mut().set_can_advance(true);
        harness.controller.check_progress(10.1);
        assert_eq!(harness.controller.progress().current(), StageId::Machines);
        assert!(harness.controller.progress().can_advance());
    }

    #[test]
    fn guard_disengages_after_settle_delay() {
        let mut harness = Harness::new(None);
        harness.controller.progress_mut().set_stage(2);

        harness.controller.progress_mut().set_can_advance(true);
        harness.step(1.0 / 60.0);
        assert_eq!(harness.controller.progress().current(), StageId::Machines);
        assert!(harness.controller.guard_engaged());

        // Run frames past the settle delay, then advance again.
        let mut remaining = SETTLE_DELAY + 0.1;
        while remaining > 0.0 {
            harness.step(1.0 / 60.0);
            remaining -= 1.0 / 60.0;
        }
        assert!(!harness.controller.guard_engaged());

        harness.controller.progress_mut().set_can_advance(true);
        harness.step(1.0 / 60.0);
        assert_eq!(harness.controller.progress().current(), StageId::Garden);
    }

    #[test]
    fn intro_completion_resumes_to_stored_stage() {
        let mut harness = Harness::new(Some("4"));
        let (scene, _) = StubScene::new(Some(1));
        harness.controller.register(StageId::Intro, Box::new(scene));
        harness.controller.switch_to(StageId::Intro, 0.0);

        harness.step(1.0 / 60.0);
        assert_eq!(harness.controller.progress().current(), StageId::Garden);
        assert_eq!(harness.controller.progress().current().index(), 4);
    }

    #[test]
    fn intro_completion_with_empty_store_resumes_to_first_content_stage() {
        let mut harness = Harness::new(None);
        let (scene, _) = StubScene::new(Some(1));
        harness.controller.register(StageId::Intro, Box::new(scene));
        harness.controller.switch_to(StageId::Intro, 0.0);

        harness.step(1.0 / 60.0);
        assert_eq!(harness.controller.progress().current(), StageId::Threshold);
        // Indicator state reflects the new stage.
        assert!(harness
            .controller
            .progress()
            .visited()
            .contains(&StageId::Threshold));
    }

    #[test]
    fn scene_is_rendered_before_its_advance_is_consumed() {
        let mut harness = Harness::new(None);
        let (scene, _) = StubScene::new(Some(1));
        harness.controller.register(StageId::Intro, Box::new(scene));
        harness.controller.switch_to(StageId::Intro, 0.0);
        let events = Rc::clone(&harness.renderer.events);

        harness.step(1.0 / 60.0);

        // The stub flipped the flag during its first update; the frame
        // still staged a render before the swap was evaluated.
        assert_eq!(events.borrow().len(), 1);
        assert_eq!(harness.controller.progress().current(), StageId::Threshold);
    }

    #[test]
    fn advance_on_final_stage_fails_without_state_change() {
        let mut harness = Harness::new(None);
        harness
            .controller
            .progress_mut()
            .set_stage(StageId::COUNT - 1);

        harness.controller.progress_mut().set_can_advance(true);
        harness.controller.check_progress(0.0);
        assert_eq!(harness.controller.progress().current(), StageId::Finale);
        assert!(!harness.controller.progress().can_advance());
    }

    #[test]
    fn fade_alpha_ramps_out_over_the_guard_window() {
        let mut harness = Harness::new(None);
        harness.controller.switch_to(StageId::Threshold, 10.0);

        assert_eq!(harness.controller.fade_alpha(10.0), 1.0);
        let mid = harness.controller.fade_alpha(10.0 + FADE_DURATION / 2.0);
        assert!(mid > 0.0 && mid < 1.0);
        assert_eq!(harness.controller.fade_alpha(10.0 + FADE_DURATION), 0.0);
    }

    #[test]
    fn overlay_advance_request_is_honored_like_a_timeline_exit() {
        // The external Advance trigger writes the same flag a timeline
        // would; no scene needs to be installed at all.
        let mut harness = Harness::new(None);
        harness.controller.progress_mut().set_stage(1);
        harness.controller.progress_mut().set_can_advance(true);
        harness.step(1.0 / 60.0);
        assert_eq!(harness.controller.progress().current(), StageId::Gallery);
    }
}
