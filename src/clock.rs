use std::time::Instant;

/// Lower bound on a reported turn duration, in seconds.
pub const MIN_ELAPSED_SECS: f64 = 0.001;

/// Nominal duration of one game turn, used by the offline simulator.
pub const TURN_SECS: f64 = 0.075;

/// Elapsed-time source sampled once per turn and shared by every pod update
/// in that turn.
#[derive(Clone, Debug)]
pub enum FrameClock {
    Monotonic { last: Instant },
    Fixed { step_secs: f64 },
}

impl FrameClock {
    pub fn monotonic() -> Self {
        Self::Monotonic {
            last: Instant::now(),
        }
    }

    pub fn fixed(step_secs: f64) -> Self {
        Self::Fixed { step_secs }
    }

    /// Seconds since the previous tick (or since construction), never below
    /// [`MIN_ELAPSED_SECS`].
    pub fn tick(&mut self) -> f64 {
        let elapsed = match self {
            Self::Monotonic { last } => {
                let now = Instant::now();
                let elapsed = now.duration_since(*last).as_secs_f64();
                *last = now;
                elapsed
            }
            Self::Fixed { step_secs } => *step_secs,
        };
        elapsed.max(MIN_ELAPSED_SECS)
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::monotonic()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_clock_repeats_its_step() {
        let mut clock = FrameClock::fixed(TURN_SECS);
        assert_eq!(clock.tick(), TURN_SECS);
        assert_eq!(clock.tick(), TURN_SECS);
    }

    #[test]
    fn elapsed_is_floored() {
        let mut clock = FrameClock::fixed(0.0);
        assert_eq!(clock.tick(), MIN_ELAPSED_SECS);

        let mut clock = FrameClock::monotonic();
        assert!(clock.tick() >= MIN_ELAPSED_SECS);
        assert!(clock.tick() >= MIN_ELAPSED_SECS);
    }
}
