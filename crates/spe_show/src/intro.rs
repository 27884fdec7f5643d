//! Opening stage: loading ring, marker pulse, dot explosion, title pulse,
//! exit burst.
//!
//! The timeline is a six-phase state machine sampled against show time.
//! Each phase owns a timer that resets on entry; exits fire on elapsed
//! thresholds, oscillator cycle counts, or the asset catalog settling.
//! Side effects (cues, value locks, input toggles) are guarded by
//! `OneShot` so re-evaluating a crossed threshold every frame never
//! re-fires them.

use glam::{Vec2, Vec3};

use spe_core::ease::{ease_in_out_cubic, ease_in_quartic, lerp};
use spe_core::signal::{CycleCounter, Pulse};
use spe_core::timer::OneShot;
use spe_render::{Primitive, RenderContent};

use crate::assets::{INTRO_TITLE_TEXTURE, WHITE_TEXTURE};
use crate::scene::{Scene, SceneCtx};

// Loading / pulse
const LOADING_RAMP: f64 = 1.2;
const PULSE_OMEGA: f64 = 4.0;
const PULSE_AMPLITUDE: f64 = 0.15;

// Ring fade
const RING_FADE_DURATION: f64 = 0.3;

// Explosion
const EXPLODE_PULSE_CYCLES: u32 = 1;
const EXPLOSION_DURATION: f64 = 1.6;
const EXPLOSION_MAX_SCALE: f32 = 40.0;
const EXPLOSION_FLARE: f32 = 2.0;
const TEXT_FADE_START: f32 = 0.25;
const TEXT_FADE_END: f32 = 0.75;
const PARTICLE_EXPAND_START: f32 = 0.20;
const PARTICLE_LOCK_MULTIPLE: f32 = 2.5;

// Text pulse
const BREATH_OMEGA: f64 = 1.2;
const TEXT_PULSE_MIN_HOLD: f64 = 2.5;
const BREATH_EXIT_THRESHOLD: f64 = 0.9;

// Exit burst
const EXIT_BURST_DURATION: f64 = 0.8;
const EXIT_TEXT_SCALE: f32 = 3.0;
const EXIT_PARTICLE_MULTIPLE: f32 = 4.0;

// Visual layout
const PARTICLE_COUNT: usize = 96;
const GOLDEN_ANGLE: f32 = 2.399_963;
const PARTICLE_BASE_RADIUS: f32 = 1.4;
const BASE_LIGHT: f32 = 1.0;
const STAGE_CENTER: Vec3 = Vec3::new(0.0, 1.6, 0.0);
const RING_INNER_RADIUS: f32 = 1.8;
const RING_OUTER_RADIUS: f32 = 2.4;
const PROGRESS_RADIUS: f32 = 2.1;
const RING_SEGMENTS: usize = 40;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum IntroPhase {
    Loading,
    RingFade,
    DotExplode,
    TextPulse,
    ExitBurst,
    Done,
}

impl IntroPhase {
    fn label(self) -> &'static str {
        match self {
            Self::Loading => "loading",
            Self::RingFade => "ring-fade",
            Self::DotExplode => "dot-explode",
            Self::TextPulse => "text-pulse",
            Self::ExitBurst => "exit-burst",
            Self::Done => "done",
        }
    }
}

pub struct IntroScene {
    phase: IntroPhase,
    phase_elapsed: f64,
    /// Shared oscillator time; keeps running across phase boundaries so
    /// the pulse never snaps.
    pulse_time: f64,
    pulse: Pulse,
    breath: Pulse,
    cycles: CycleCounter,
    /// Armed when the awaited pulse cycle completes; the explosion runs
    /// on its own budget, the pulse wait does not eat into it.
    explosion_elapsed: Option<f64>,

    started: OneShot,
    explosion_cue: OneShot,
    completion_lock: OneShot,
    exit_cue: OneShot,

    load_fraction: f32,
    ring_opacity: f32,
    marker_visible: bool,
    marker_scale: f32,
    marker_opacity: f32,
    light_intensity: f32,
    text_opacity: f32,
    text_scale: f32,
    text_glow: f32,
    title_ready: bool,
    title_failed: bool,

    // Particle arena: fixed-size buffers rewritten in place each frame.
    particle_angles: [f32; PARTICLE_COUNT],
    particle_radii: [f32; PARTICLE_COUNT],
    particle_base_radii: [f32; PARTICLE_COUNT],
    /// Radii captured at the text-pulse exit; the burst expands from
    /// here, not from the original base.
    burst_base_radii: [f32; PARTICLE_COUNT],

    is_complete: bool,
    content: RenderContent,
}

impl IntroScene {
    pub fn new() -> Self {
        let mut particle_angles = [0.0; PARTICLE_COUNT];
        let mut particle_base_radii = [0.0; PARTICLE_COUNT];
        for (i, (angle, radius)) in particle_angles
            .iter_mut()
            .zip(particle_base_radii.iter_mut())
            .enumerate()
        {
            *angle = i as f32 * GOLDEN_ANGLE;
            // Staggered shells so the cloud has depth without randomness.
            *radius = PARTICLE_BASE_RADIUS * (0.7 + 0.3 * ((i % 7) as f32 / 6.0));
        }

        Self {
            phase: IntroPhase::Loading,
            phase_elapsed: 0.0,
            pulse_time: 0.0,
            pulse: Pulse::new(PULSE_OMEGA, PULSE_AMPLITUDE),
            breath: Pulse::new(BREATH_OMEGA, 1.0),
            cycles: CycleCounter::new(),
            explosion_elapsed: None,
            started: OneShot::new(),
            explosion_cue: OneShot::new(),
            completion_lock: OneShot::new(),
            exit_cue: OneShot::new(),
            load_fraction: 0.0,
            ring_opacity: 1.0,
            marker_visible: true,
            marker_scale: 1.0,
            marker_opacity: 1.0,
            light_intensity: BASE_LIGHT,
            text_opacity: 0.0,
            text_scale: 1.0,
            text_glow: 0.0,
            title_ready: false,
            title_failed: false,
            particle_angles,
            particle_radii: particle_base_radii,
            particle_base_radii,
            burst_base_radii: particle_base_radii,
            is_complete: false,
            content: RenderContent::with_capacity(PARTICLE_COUNT + RING_SEGMENTS * 3 + 8),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.is_complete
    }

    fn enter(&mut self, phase: IntroPhase) {
        log::debug!("Intro phase: {} -> {}", self.phase.label(), phase.label());
        self.phase = phase;
        self.phase_elapsed = 0.0;
    }

    fn update_loading(&mut self, ctx: &mut SceneCtx<'_>) {
        if self.started.fire() {
            ctx.input.set_enabled(false);
            ctx.audio.hum_start();
        }

        // The indicator tracks the externally-reported load fraction but
        // never fills faster than the fixed ramp.
        let ramp = (self.phase_elapsed / LOADING_RAMP).min(1.0) as f32;
        self.load_fraction = ramp.min(ctx.assets.fraction());

        if self.load_fraction >= 1.0 {
            self.enter(IntroPhase::RingFade);
        }
    }

    fn update_ring_fade(&mut self) {
        let t = (self.phase_elapsed / RING_FADE_DURATION).min(1.0) as f32;
        self.ring_opacity = 1.0 - t;

        if self.phase_elapsed >= RING_FADE_DURATION {
            self.ring_opacity = 0.0;
            // Seed from the pulse's current sign so a half-cycle already
            // in progress is not counted as a full one.
            self.cycles.seed(self.pulse.sine(self.pulse_time));
            self.enter(IntroPhase::DotExplode);
        }
    }

    fn update_dot_explode(&mut self, ctx: &mut SceneCtx<'_>) {
        let Some(explosion_elapsed) = self.explosion_elapsed else {
            // Still waiting for the pulse to finish its cycle.
            let completed = self.cycles.observe(self.pulse.sine(self.pulse_time));
            if completed >= EXPLODE_PULSE_CYCLES {
                self.explosion_elapsed = Some(0.0);
                if self.explosion_cue.fire() {
                    ctx.audio.hum_stop();
                    ctx.audio.whoosh();
                }
            }
            return;
        };

        let explosion_elapsed = explosion_elapsed + ctx.delta;
        self.explosion_elapsed = Some(explosion_elapsed);

        let progress = (explosion_elapsed / EXPLOSION_DURATION).min(1.0) as f32;
        let k = ease_in_out_cubic(progress);
        self.marker_scale = lerp(1.0, EXPLOSION_MAX_SCALE, k);
        self.marker_opacity = 1.0 - k;
        // The marker's light flares through the blast and settles after.
        self.light_intensity =
            BASE_LIGHT + EXPLOSION_FLARE * (1.0 - (2.0 * progress - 1.0).abs());

        // Title hands off inside the explosion, not after it.
        self.text_opacity =
            ((progress - TEXT_FADE_START) / (TEXT_FADE_END - TEXT_FADE_START)).clamp(0.0, 1.0);

        let expand = ease_in_out_cubic(
            ((progress - PARTICLE_EXPAND_START) / (1.0 - PARTICLE_EXPAND_START)).clamp(0.0, 1.0),
        );
        for (radius, base) in self
            .particle_radii
            .iter_mut()
            .zip(self.particle_base_radii.iter())
        {
            *radius = base * lerp(1.0, PARTICLE_LOCK_MULTIPLE, expand);
        }

        if progress >= 1.0 && self.completion_lock.fire() {
            self.marker_visible = false;
            self.light_intensity = BASE_LIGHT;
            self.text_opacity = 1.0;
            for (radius, base) in self
                .particle_radii
                .iter_mut()
                .zip(self.particle_base_radii.iter())
            {
                *radius = base * PARTICLE_LOCK_MULTIPLE;
            }
            self.enter(IntroPhase::TextPulse);
        }
    }

    fn update_text_pulse(&mut self, ctx: &mut SceneCtx<'_>) {
        let signal = self.breath.breath(self.pulse_time);
        self.text_opacity = 0.7 + 0.3 * signal as f32;
        self.text_glow = signal as f32;

        if self.phase_elapsed < TEXT_PULSE_MIN_HOLD {
            return;
        }

        // Hold for a peak so the breath is not cut mid-cycle; bounded at
        // one full period past the hold in case the boundary lands just
        // after a peak.
        let peaked = signal >= BREATH_EXIT_THRESHOLD;
        let overdue = self.phase_elapsed >= TEXT_PULSE_MIN_HOLD + self.breath.period();
        if peaked || overdue {
            if self.exit_cue.fire() {
                ctx.audio.whoosh();
            }
            self.burst_base_radii = self.particle_radii;
            self.enter(IntroPhase::ExitBurst);
        }
    }

    fn update_exit_burst(&mut self, ctx: &mut SceneCtx<'_>) {
        let progress = (self.phase_elapsed / EXIT_BURST_DURATION).min(1.0) as f32;
        let k = ease_in_quartic(progress);
        self.text_scale = lerp(1.0, EXIT_TEXT_SCALE, k);
        self.text_opacity = 1.0 - k;
        self.text_glow = 1.0 - k;
        for (radius, base) in self
            .particle_radii
            .iter_mut()
            .zip(self.burst_base_radii.iter())
        {
            *radius = base * lerp(1.0, EXIT_PARTICLE_MULTIPLE, k);
        }

        if progress >= 1.0 {
            self.is_complete = true;
            ctx.input.set_enabled(true);
            ctx.progress.set_can_advance(true);
            self.enter(IntroPhase::Done);
        }
    }

    fn rebuild_content(&mut self) {
        self.content.clear();

        // Two guide rings, gone after the fade.
        if self.ring_opacity > 0.0 {
            for ring_radius in [RING_INNER_RADIUS, RING_OUTER_RADIUS] {
                for i in 0..RING_SEGMENTS {
                    let angle = i as f32 / RING_SEGMENTS as f32 * std::f32::consts::TAU;
                    let offset = Vec3::new(angle.cos(), angle.sin(), 0.0) * ring_radius;
                    self.content.push(Primitive::billboard(
                        STAGE_CENTER + offset,
                        Vec2::splat(0.07),
                        [0.75, 0.85, 1.0, 0.8 * self.ring_opacity],
                        WHITE_TEXTURE,
                    ));
                }
            }

            // Radial progress arc sweeping up from twelve o'clock.
            let lit = (self.load_fraction * RING_SEGMENTS as f32) as usize;
            for i in 0..lit.min(RING_SEGMENTS) {
                let angle = std::f32::consts::FRAC_PI_2
                    - i as f32 / RING_SEGMENTS as f32 * std::f32::consts::TAU;
                let offset = Vec3::new(angle.cos(), angle.sin(), 0.0) * PROGRESS_RADIUS;
                self.content.push(Primitive::billboard(
                    STAGE_CENTER + offset,
                    Vec2::splat(0.1),
                    [1.0, 0.9, 0.55, 0.9 * self.ring_opacity],
                    WHITE_TEXTURE,
                ));
            }
        }

        // Particle cloud.
        for (angle, radius) in self
            .particle_angles
            .iter()
            .zip(self.particle_radii.iter())
        {
            let offset = Vec3::new(angle.cos() * radius, angle.sin() * radius * 0.6, 0.0);
            self.content.push(Primitive::billboard(
                STAGE_CENTER + offset,
                Vec2::splat(0.05),
                [1.0, 0.8, 0.5, 0.85],
                WHITE_TEXTURE,
            ));
        }

        // Marker dot with its pulsing halo.
        if self.marker_visible {
            let pulse = self.pulse.sample(self.pulse_time) as f32;
            let size = 0.3 * self.marker_scale * pulse;
            self.content.push(Primitive::billboard(
                STAGE_CENTER,
                Vec2::splat(size * 2.2),
                [1.0, 0.95, 0.8, 0.25 * self.light_intensity * self.marker_opacity],
                WHITE_TEXTURE,
            ));
            self.content.push(Primitive::billboard(
                STAGE_CENTER,
                Vec2::splat(size),
                [1.0, 1.0, 0.95, self.marker_opacity],
                WHITE_TEXTURE,
            ));
        }

        // Title card; failed loads swap in a plain glowing bar.
        if self.text_opacity > 0.0 {
            let size = Vec2::new(3.2, 0.8) * self.text_scale;
            if self.title_ready {
                self.content.push(Primitive::billboard(
                    STAGE_CENTER,
                    size * (1.0 + 0.08 * self.text_glow),
                    [0.8, 0.9, 1.0, 0.3 * self.text_glow * self.text_opacity],
                    WHITE_TEXTURE,
                ));
                self.content.push(Primitive::billboard(
                    STAGE_CENTER,
                    size,
                    [1.0, 1.0, 1.0, self.text_opacity],
                    INTRO_TITLE_TEXTURE,
                ));
            } else if self.title_failed {
                // Simplified stand-in for the failed title card.
                self.content.push(Primitive::billboard(
                    STAGE_CENTER,
                    size * Vec2::new(1.0, 0.25),
                    [0.9, 0.95, 1.0, self.text_opacity],
                    WHITE_TEXTURE,
                ));
            }
        }
    }
}

impl Default for IntroScene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene for IntroScene {
    fn update(&mut self, ctx: &mut SceneCtx<'_>) {
        if self.is_complete {
            return;
        }

        self.pulse_time += ctx.delta;
        self.phase_elapsed += ctx.delta;
        self.title_ready = ctx.assets.is_ready(INTRO_TITLE_TEXTURE);
        self.title_failed = ctx.assets.is_failed(INTRO_TITLE_TEXTURE);

        match self.phase {
            IntroPhase::Loading => self.update_loading(ctx),
            IntroPhase::RingFade => self.update_ring_fade(),
            IntroPhase::DotExplode => self.update_dot_explode(ctx),
            IntroPhase::TextPulse => self.update_text_pulse(ctx),
            IntroPhase::ExitBurst => self.update_exit_burst(ctx),
            IntroPhase::Done => {}
        }

        self.rebuild_content();
    }

    fn content(&self) -> &RenderContent {
        &self.content
    }

    fn phase_label(&self) -> &'static str {
        self.phase.label()
    }

    fn dispose(&mut self) {
        log::debug!("Intro scene disposed in phase '{}'", self.phase.label());
    }
}
