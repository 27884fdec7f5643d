//! Walkthrough motion input.
//!
//! The show reads a continuously-refreshed motion intent (forward thrust
//! plus yaw/pitch rotation, each in -1..1) rather than raw key events.
//! Held keys are level-triggered and recomputed every frame; discrete tap
//! impulses (on-screen arrow buttons) contribute a burst of motion that an
//! owned cancellable timer returns to zero shortly after. Scenes may
//! suppress input entirely while an animation owns the camera.

use std::collections::HashSet;

use crate::timer::DelayTimer;

/// How long a tap impulse keeps contributing motion before the owned
/// reset timer zeroes it.
pub const TAP_RESET_DELAY: f64 = 0.35;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MotionKey {
    Forward,
    Backward,
    TurnLeft,
    TurnRight,
    LookUp,
    LookDown,
}

/// Per-frame motion reading: forward thrust and rotation intent, all
/// clamped to -1..1. Zero when input is disabled.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MotionIntent {
    pub forward: f32,
    pub yaw: f32,
    pub pitch: f32,
}

pub struct MotionInput {
    held: HashSet<MotionKey>,
    enabled: bool,
    tap: MotionIntent,
    tap_reset: DelayTimer,
    intent: MotionIntent,
}

impl MotionInput {
    pub fn new() -> Self {
        Self {
            held: HashSet::new(),
            enabled: true,
            tap: MotionIntent::default(),
            tap_reset: DelayTimer::new(),
            intent: MotionIntent::default(),
        }
    }

    pub fn key_down(&mut self, key: MotionKey) {
        self.held.insert(key);
    }

    pub fn key_up(&mut self, key: MotionKey) {
        self.held.remove(&key);
    }

    /// Discrete trigger (arrow-button tap): contributes motion now and
    /// arms the reset that takes it back to zero.
    pub fn tap(&mut self, impulse: MotionIntent, now: f64) {
        self.tap = impulse;
        self.tap_reset.schedule(now, TAP_RESET_DELAY);
    }

    /// Suppress or restore input. Disabling also cancels any pending tap
    /// reset so nothing fires later against restored state.
    pub fn set_enabled(&mut self, enabled: bool) {
        if self.enabled == enabled {
            return;
        }
        self.enabled = enabled;
        if !enabled {
            self.tap = MotionIntent::default();
            self.tap_reset.cancel();
        }
        log::debug!("Motion input {}", if enabled { "enabled" } else { "disabled" });
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Recompute the intent for this frame. Must run before the camera
    /// consumes it.
    pub fn update(&mut self, now: f64) {
        if self.tap_reset.poll(now) {
            self.tap = MotionIntent::default();
        }

        if !self.enabled {
            self.intent = MotionIntent::default();
            return;
        }

        let mut intent = self.tap;
        if self.held.contains(&MotionKey::Forward) {
            intent.forward += 1.0;
        }
        if self.held.contains(&MotionKey::Backward) {
            intent.forward -= 1.0;
        }
        if self.held.contains(&MotionKey::TurnLeft) {
            intent.yaw -= 1.0;
        }
        if self.held.contains(&MotionKey::TurnRight) {
            intent.yaw += 1.0;
        }
        if self.held.contains(&MotionKey::LookUp) {
            intent.pitch += 1.0;
        }
        if self.held.contains(&MotionKey::LookDown) {
            intent.pitch -= 1.0;
        }

        self.intent = MotionIntent {
            forward: intent.forward.clamp(-1.0, 1.0),
            yaw: intent.yaw.clamp(-1.0, 1.0),
            pitch: intent.pitch.clamp(-1.0, 1.0),
        };
    }

    pub fn intent(&self) -> MotionIntent {
        self.intent
    }
}

impl Default for MotionInput {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn held_key_drives_forward_intent() {
        let mut input = MotionInput::new();
        input.key_down(MotionKey::Forward);
        input.update(0.0);
        assert_eq!(input.intent().forward, 1.0);

        input.key_up(MotionKey::Forward);
        input.update(0.1);
        assert_eq!(input.intent().forward, 0.0);
    }

    #[test]
    fn opposing_keys_cancel() {
        let mut input = MotionInput::new();
        input.key_down(MotionKey::TurnLeft);
        input.key_down(MotionKey::TurnRight);
        input.update(0.0);
        assert_eq!(input.intent().yaw, 0.0);
    }

    #[test]
    fn tap_contributes_then_resets_after_delay() {
        let mut input = MotionInput::new();
        input.tap(
            MotionIntent {
                forward: 1.0,
                ..MotionIntent::default()
            },
            0.0,
        );
        input.update(0.1);
        assert_eq!(input.intent().forward, 1.0);

        // Still inside the tap window.
        input.update(TAP_RESET_DELAY - 0.05);
        assert_eq!(input.intent().forward, 1.0);

        // Past the window the owned timer has zeroed it.
        input.update(TAP_RESET_DELAY + 0.05);
        assert_eq!(input.intent().forward, 0.0);
    }

    #[test]
    fn tap_stacks_with_held_keys_but_clamps() {
        let mut input = MotionInput::new();
        input.key_down(MotionKey::Forward);
        input.tap(
            MotionIntent {
                forward: 1.0,
                ..MotionIntent::default()
            },
            0.0,
        );
        input.update(0.0);
        assert_eq!(input.intent().forward, 1.0);
    }

    #[test]
    fn disabled_input_reads_zero_and_drops_pending_tap() {
        let mut input = MotionInput::new();
        input.key_down(MotionKey::Forward);
        input.tap(
            MotionIntent {
                forward: 1.0,
                ..MotionIntent::default()
            },
            0.0,
        );
        input.set_enabled(false);
        input.update(0.1);
        assert_eq!(input.intent(), MotionIntent::default());

        // Re-enabling restores held-key intent, but the cancelled tap
        // never comes back.
        input.set_enabled(true);
        input.update(TAP_RESET_DELAY * 2.0);
        assert_eq!(input.intent().forward, 1.0);
        input.key_up(MotionKey::Forward);
        input.update(TAP_RESET_DELAY * 3.0);
        assert_eq!(input.intent().forward, 0.0);
    }

    #[test]
    fn pitch_keys_map_to_pitch_axis() {
        let mut input = MotionInput::new();
        input.key_down(MotionKey::LookUp);
        input.update(0.0);
        assert_eq!(input.intent().pitch, 1.0);
        input.key_down(MotionKey::LookDown);
        input.update(0.1);
        assert_eq!(input.intent().pitch, 0.0);
    }
}
