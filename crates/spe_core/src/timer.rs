//! Cancellable one-shot timers and fire-once flags.
//!
//! The show never sleeps and never registers delayed callbacks: pending
//! side effects are deadlines stored on the object they mutate and polled
//! once per frame. Disposing the owner drops the timer with it, so a
//! pending effect can never fire against a dead scene.

/// A one-shot deadline against the clock's `now` value. `poll` fires at
/// most once per `schedule`; `cancel` makes a pending deadline inert.
#[derive(Debug, Clone, Copy, Default)]
pub struct DelayTimer {
    deadline: Option<f64>,
}

impl DelayTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm (or re-arm) the timer `delay` seconds from `now`.
    pub fn schedule(&mut self, now: f64, delay: f64) {
        self.deadline = Some(now + delay);
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// True exactly once, on the first poll at or past the deadline.
    pub fn poll(&mut self, now: f64) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

/// Guard for side effects that must run exactly once per phase instance
/// (audio cues, value locks) even though the condition is re-evaluated
/// every frame.
#[derive(Debug, Clone, Copy, Default)]
pub struct OneShot {
    fired: bool,
}

impl OneShot {
    pub fn new() -> Self {
        Self::default()
    }

    /// True the first time, false forever after.
    pub fn fire(&mut self) -> bool {
        if self.fired {
            false
        } else {
            self.fired = true;
            true
        }
    }

    pub fn has_fired(&self) -> bool {
        self.fired
    }
}
