use std::time::Duration;

/// Paces the polling loop. Only a minimum inter-tick delay is promised.
pub trait Clock {
    fn sleep(&mut self, interval: Duration);
}

/// Real wall-clock sleeping.
#[derive(Debug, Clone, Copy, Default)]
pub struct WallClock;

impl Clock for WallClock {
    fn sleep(&mut self, interval: Duration) {
        std::thread::sleep(interval);
    }
}

/// Returns immediately; keeps a tally of the requested delay.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopClock {
    pub slept: Duration,
}

impl Clock for NoopClock {
    fn sleep(&mut self, interval: Duration) {
        self.slept += interval;
    }
}
