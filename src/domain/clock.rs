//! Fixed-timestep accumulator decoupling physics ticks from frame timing.

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SimulationClock {
    dt: f64,
    accumulator: f64,
    ticks: u64,
}

impl SimulationClock {
    pub fn new(dt: f64) -> Self {
        Self {
            dt,
            accumulator: 0.0,
            ticks: 0,
        }
    }

    pub fn dt(&self) -> f64 {
        self.dt
    }

    /// Completed ticks since start.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Add elapsed wall-clock time. Negative or non-finite durations are ignored.
    pub fn accumulate(&mut self, frame_time: f64) {
        if frame_time.is_finite() && frame_time > 0.0 {
            self.accumulator += frame_time;
        }
    }

    /// Consume one tick worth of time if available.
    pub fn next_step(&mut self) -> bool {
        if self.accumulator < self.dt {
            return false;
        }
        self.accumulator -= self.dt;
        self.ticks += 1;
        true
    }

    /// Count a tick that was run outside the accumulator.
    pub fn force_step(&mut self) {
        self.ticks += 1;
    }

    /// Fraction of a tick left in the accumulator, in `[0, 1)`.
    pub fn alpha(&self) -> f64 {
        self.accumulator / self.dt
    }
}
