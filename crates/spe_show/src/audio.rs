//! Audio collaborator: named one-shot cue triggers.
//!
//! The show fires cues and moves on — no acknowledgement, no return
//! values. Synthesis lives behind this trait; the default backend just
//! narrates cues to the log so a machine without an audio device still
//! runs the full sequence.

pub trait AudioCues {
    /// Begin the marker's idle hum.
    fn hum_start(&mut self);
    /// Stop the idle hum.
    fn hum_stop(&mut self);
    /// Transient whoosh (explosion onset, exit burst).
    fn whoosh(&mut self);
    /// Mechanical clunk-and-slide of the passage door.
    fn door_open(&mut self);
}

/// Cue backend that narrates to the log.
#[derive(Debug, Default)]
pub struct LogAudio;

impl AudioCues for LogAudio {
    fn hum_start(&mut self) {
        log::debug!("audio cue: hum start");
    }

    fn hum_stop(&mut self) {
        log::debug!("audio cue: hum stop");
    }

    fn whoosh(&mut self) {
        log::debug!("audio cue: whoosh");
    }

    fn door_open(&mut self) {
        log::debug!("audio cue: door open");
    }
}

/// Silent backend for tests.
#[derive(Debug, Default)]
pub struct NullAudio;

impl AudioCues for NullAudio {
    fn hum_start(&mut self) {}
    fn hum_stop(&mut self) {}
    fn whoosh(&mut self) {}
    fn door_open(&mut self) {}
}

/// Counting backend for asserting cue one-shot behavior in tests.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct CountingAudio {
    pub hum_starts: u32,
    pub hum_stops: u32,
    pub whooshes: u32,
    pub door_opens: u32,
}

#[cfg(test)]
impl AudioCues for CountingAudio {
    fn hum_start(&mut self) {
        self.hum_starts += 1;
    }

    fn hum_stop(&mut self) {
        self.hum_stops += 1;
    }

    fn whoosh(&mut self) {
        self.whooshes += 1;
    }

    fn door_open(&mut self) {
        self.door_opens += 1;
    }
}
