use std::time::Instant;

const FPS_SAMPLE_COUNT: usize = 60;

/// Frame clock: wall-clock "now", frame-to-frame delta, and elapsed show
/// time, sampled once per frame by `begin_frame()`.
///
/// `now` is real seconds since construction and drives deadline timers.
/// `elapsed` is the sum of *capped* deltas and drives animation, so a
/// dragged window or a debugger pause nudges the show forward by at most
/// `max_delta` instead of teleporting every timeline.
pub struct Clock {
    start: Instant,
    last_instant: Instant,
    pub max_delta: f64,
    pub now: f64,
    pub delta: f64,
    pub elapsed: f64,
    pub frame_count: u64,

    fps_samples: [f64; FPS_SAMPLE_COUNT],
    fps_sample_index: usize,
    pub smoothed_fps: f64,
    pub smoothed_frame_time_ms: f64,
}

impl Clock {
    pub fn new() -> Self {
        let start = Instant::now();
        Self {
            start,
            last_instant: start,
            max_delta: 0.25,
            now: 0.0,
            delta: 0.0,
            elapsed: 0.0,
            frame_count: 0,
            fps_samples: [1.0 / 60.0; FPS_SAMPLE_COUNT],
            fps_sample_index: 0,
            smoothed_fps: 60.0,
            smoothed_frame_time_ms: 16.667,
        }
    }

    pub fn begin_frame(&mut self) {
        let instant = Instant::now();
        let real_dt = instant.duration_since(self.last_instant).as_secs_f64();
        self.last_instant = instant;
        self.now = instant.duration_since(self.start).as_secs_f64();

        self.delta = real_dt;
        if self.delta > self.max_delta {
            log::warn!(
                "Frame took {:.1}ms — capping delta to {}ms",
                real_dt * 1000.0,
                self.max_delta * 1000.0
            );
            self.delta = self.max_delta;
        }

        self.elapsed += self.delta;
        self.frame_count += 1;

        // FPS smoothing
        self.fps_samples[self.fps_sample_index] = real_dt;
        self.fps_sample_index = (self.fps_sample_index + 1) % FPS_SAMPLE_COUNT;
        let avg_dt: f64 = self.fps_samples.iter().sum::<f64>() / FPS_SAMPLE_COUNT as f64;
        self.smoothed_frame_time_ms = avg_dt * 1000.0;
        self.smoothed_fps = if avg_dt > 0.0 { 1.0 / avg_dt } else { 0.0 };
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}
