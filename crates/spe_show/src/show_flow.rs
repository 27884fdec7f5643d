//! End-to-end show flow: real scenes driven through the controller at a
//! fixed 60 Hz step, no GPU. Covers the reload/resume scenarios and the
//! full intro -> passage -> advance walkthrough.

use std::cell::RefCell;
use std::rc::Rc;

use spe_core::input::{MotionInput, MotionKey};
use spe_core::progress::{ProgressStore, StageId, RESUME_KEY};
use spe_core::storage::MemoryStore;
use spe_core::timer::DelayTimer;
use spe_render::{RenderContent, StageRenderer, WalkCamera};

use crate::assets::{AssetCatalog, INTRO_TITLE_TEXTURE, PASSAGE_TITLE_TEXTURE};
use crate::audio::CountingAudio;
use crate::controller::{FrameCtx, SceneController, SETTLE_DELAY};
use crate::intro::IntroScene;
use crate::passage::PassageScene;
use crate::scene::{Scene, SceneCtx};

const DT: f64 = 1.0 / 60.0;

struct CountingRenderer {
    frames: u32,
}

impl StageRenderer for CountingRenderer {
    fn render(&mut self, _content: &RenderContent, _camera: &WalkCamera) {
        self.frames += 1;
    }
}

struct ShowRig {
    controller: SceneController,
    camera: WalkCamera,
    input: MotionInput,
    audio: CountingAudio,
    assets: AssetCatalog,
    renderer: CountingRenderer,
    now: f64,
}

impl ShowRig {
    fn new(stored_resume: Option<&str>) -> Self {
        let backing = match stored_resume {
            Some(value) => MemoryStore::with(RESUME_KEY, value),
            None => MemoryStore::new(),
        };
        let progress = ProgressStore::new(Box::new(backing));

        let mut assets = AssetCatalog::new();
        assets.declare(INTRO_TITLE_TEXTURE);
        assets.mark_ready(INTRO_TITLE_TEXTURE);
        assets.declare(PASSAGE_TITLE_TEXTURE);
        assets.mark_ready(PASSAGE_TITLE_TEXTURE);

        let mut controller = SceneController::new(progress);
        controller.register(StageId::Intro, Box::new(IntroScene::new()));
        controller.register(StageId::Threshold, Box::new(PassageScene::new()));
        controller.switch_to(StageId::Intro, 0.0);

        Self {
            controller,
            camera: WalkCamera::new(1280, 720),
            input: MotionInput::new(),
            audio: CountingAudio::default(),
            assets,
            renderer: CountingRenderer { frames: 0 },
            now: 0.0,
        }
    }

    fn step(&mut self) {
        self.now += DT;
        let mut ctx = FrameCtx {
            now: self.now,
            elapsed: self.now,
            delta: DT,
            camera: &mut self.camera,
            input: &mut self.input,
            audio: &mut self.audio,
            assets: &self.assets,
            renderer: &mut self.renderer,
        };
        self.controller.update(&mut ctx);
    }

    fn run_until_stage(&mut self, stage: StageId, max_frames: u32) {
        for _ in 0..max_frames {
            if self.controller.progress().current() == stage {
                return;
            }
            self.step();
        }
        panic!(
            "never reached stage '{stage}' (stuck on '{}', phase '{}')",
            self.controller.progress().current(),
            self.controller.active_phase_label()
        );
    }
}

#[test]
fn fresh_boot_runs_intro_then_resumes_to_first_content_stage() {
    let mut rig = ShowRig::new(None);
    assert_eq!(rig.controller.progress().current(), StageId::Intro);

    rig.run_until_stage(StageId::Threshold, 3000);
    assert!(rig.controller.has_active_scene());
    assert!(rig
        .controller
        .progress()
        .visited()
        .contains(&StageId::Threshold));
    // Intro re-enabled motion input on its way out, and every frame with
    // an installed scene staged a render.
    assert!(rig.input.is_enabled());
    assert!(rig.renderer.frames > 0);
}

#[test]
fn stored_resume_index_lands_on_that_stage_not_stage_one() {
    let mut rig = ShowRig::new(Some("4"));
    rig.run_until_stage(StageId::Garden, 3000);
    // Stage 4 is authored separately; the show degrades to an empty set
    // with correct index tracking.
    assert!(!rig.controller.has_active_scene());
    assert_eq!(rig.controller.progress().current().index(), 4);

    // Frames keep running without content or panic.
    for _ in 0..120 {
        rig.step();
    }
}

#[test]
fn full_walkthrough_intro_to_passage_to_next_stage() {
    let mut rig = ShowRig::new(None);
    rig.run_until_stage(StageId::Threshold, 3000);

    // Walk forward through the doorway.
    rig.input.key_down(MotionKey::Forward);
    let mut walked = 0;
    while rig.controller.progress().current() == StageId::Threshold {
        rig.step();
        walked += 1;
        assert!(walked < 2000, "never crossed the doorway threshold");
    }

    assert_eq!(rig.controller.progress().current(), StageId::Gallery);
    // The passage door cue fired exactly once along the way.
    assert_eq!(rig.audio.door_opens, 1);
}

#[test]
fn walkthrough_persists_resume_point_for_the_next_boot() {
    let mut rig = ShowRig::new(None);
    rig.run_until_stage(StageId::Threshold, 3000);
    // The durable store now remembers stage 1.
    assert_eq!(
        rig.controller.progress().resume_stage(),
        StageId::Threshold
    );

    rig.input.key_down(MotionKey::Forward);
    rig.run_until_stage(StageId::Gallery, 2000);
    assert_eq!(rig.controller.progress().resume_stage(), StageId::Gallery);
}

#[test]
fn intro_advance_is_consumed_exactly_once_despite_repeated_polls() {
    let mut rig = ShowRig::new(None);
    rig.run_until_stage(StageId::Threshold, 3000);
    let landed_at = rig.now;

    // The guard window spans several frames; none of them may advance
    // again even though check_progress runs every frame.
    while rig.now < landed_at + SETTLE_DELAY + 0.2 {
        rig.step();
        assert_eq!(rig.controller.progress().current(), StageId::Threshold);
    }
}

/// Scene whose pending timers would flip visible state if they ever
/// fired after disposal.
struct TimerScene {
    content: RenderContent,
    first: DelayTimer,
    second: DelayTimer,
    fired: Rc<RefCell<u32>>,
}

impl TimerScene {
    fn new(now: f64) -> (Self, Rc<RefCell<u32>>) {
        let fired = Rc::new(RefCell::new(0));
        let mut first = DelayTimer::new();
        let mut second = DelayTimer::new();
        first.schedule(now, 0.2);
        second.schedule(now, 0.4);
        (
            Self {
                content: RenderContent::new(),
                first,
                second,
                fired: Rc::clone(&fired),
            },
            fired,
        )
    }
}

impl Scene for TimerScene {
    fn update(&mut self, ctx: &mut SceneCtx<'_>) {
        // Timers are polled against show time; each would mutate state
        // shared with the controller.
        let now = ctx.elapsed;
        if self.first.poll(now) || self.second.poll(now) {
            *self.fired.borrow_mut() += 1;
            ctx.progress.set_can_advance(true);
        }
    }

    fn content(&self) -> &RenderContent {
        &self.content
    }
}

#[test]
fn disposed_scene_pending_timers_never_mutate_state() {
    let mut rig = ShowRig::new(None);
    let (scene, fired) = TimerScene::new(0.0);
    let mut controller = SceneController::new(ProgressStore::new(Box::new(MemoryStore::new())));
    controller.register(StageId::Intro, Box::new(scene));
    controller.switch_to(StageId::Intro, 0.0);

    // Dispose before either deadline by switching away.
    controller.switch_to(StageId::Gallery, 0.05);

    // Run well past both deadlines.
    for _ in 0..60 {
        rig.now += DT;
        let mut ctx = FrameCtx {
            now: rig.now,
            elapsed: rig.now,
            delta: DT,
            camera: &mut rig.camera,
            input: &mut rig.input,
            audio: &mut rig.audio,
            assets: &rig.assets,
            renderer: &mut rig.renderer,
        };
        controller.update(&mut ctx);
    }

    assert_eq!(*fired.borrow(), 0);
    assert!(!controller.progress().can_advance());
}
