//! Fixed-timestep scheduling
//!
//! Wall-clock time is banked into an accumulator and paid out in whole
//! simulation ticks. Rendering happens once per frame regardless of how many
//! ticks ran.

use std::time::Duration;

use crate::consts::{MAX_SUBSTEPS, SIM_DT};

#[derive(Debug, Clone)]
pub struct FixedTimestep {
    step: Duration,
    max_substeps: u32,
    accumulator: Duration,
}

impl Default for FixedTimestep {
    fn default() -> Self {
        Self::new(SIM_DT, MAX_SUBSTEPS)
    }
}

impl FixedTimestep {
    pub fn new(step: Duration, max_substeps: u32) -> Self {
        Self {
            step,
            max_substeps,
            accumulator: Duration::ZERO,
        }
    }

    pub fn step(&self) -> Duration {
        self.step
    }

    /// Bank `elapsed` and return how many ticks to run now
    ///
    /// Capped at `max_substeps`; time beyond the cap is dropped so a long
    /// stall does not snowball into ever-longer frames.
    pub fn advance(&mut self, elapsed: Duration) -> u32 {
        self.accumulator += elapsed;

        let mut substeps = 0;
        while self.accumulator >= self.step && substeps < self.max_substeps {
            self.accumulator -= self.step;
            substeps += 1;
        }
        if substeps == self.max_substeps && self.accumulator >= self.step {
            log::debug!("Dropping {:?} of simulation backlog", self.accumulator);
            self.accumulator = Duration::ZERO;
        }
        substeps
    }

    /// Time until the next tick is due
    pub fn until_next(&self) -> Duration {
        self.step.saturating_sub(self.accumulator)
    }
}
