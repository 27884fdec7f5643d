//! Periodic signals and cycle detection for phase exit conditions.
//!
//! Timelines sample these continuously; a phase that waits "N pulses" does
//! so by feeding every frame's sample to a `CycleCounter` and reading the
//! completed count, never by scheduling a callback.

/// Sine-driven pulse: `sample()` is the scale multiplier `1 + sin(t·ω)·A`,
/// `sine()` the raw signal used for cycle counting, `breath()` the same
/// signal normalized to 0..1 for opacity/glow modulation.
#[derive(Debug, Clone, Copy)]
pub struct Pulse {
    pub omega: f64,
    pub amplitude: f64,
}

impl Pulse {
    pub fn new(omega: f64, amplitude: f64) -> Self {
        Self { omega, amplitude }
    }

    pub fn sine(&self, t: f64) -> f64 {
        (t * self.omega).sin()
    }

    pub fn sample(&self, t: f64) -> f64 {
        1.0 + self.sine(t) * self.amplitude
    }

    pub fn breath(&self, t: f64) -> f64 {
        self.sine(t) * 0.5 + 0.5
    }

    /// Seconds per full cycle.
    pub fn period(&self) -> f64 {
        std::f64::consts::TAU / self.omega
    }
}

/// Counts completed oscillator periods by watching for positive to
/// non-positive sign changes across successive samples.
///
/// Seed it with the signal's current value when the wait begins, otherwise
/// a half-cycle already in progress is counted as if it were a full one.
#[derive(Debug, Clone, Copy, Default)]
pub struct CycleCounter {
    last_positive: Option<bool>,
    completed: u32,
}

impl CycleCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Initialise the last-seen sign from the current sample without
    /// counting anything.
    pub fn seed(&mut self, sample: f64) {
        self.last_positive = Some(sample > 0.0);
    }

    /// Feed one sample; returns the total completed crossings so far.
    pub fn observe(&mut self, sample: f64) -> u32 {
        let positive = sample > 0.0;
        match self.last_positive {
            Some(true) if !positive => self.completed += 1,
            None => {
                // Unseeded: the first observation acts as the seed.
            }
            _ => {}
        }
        self.last_positive = Some(positive);
        self.completed
    }

    pub fn completed(&self) -> u32 {
        self.completed
    }
}
