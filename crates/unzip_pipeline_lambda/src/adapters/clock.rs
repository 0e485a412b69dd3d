use chrono::Utc;

pub trait Clock {
    /// Wall-clock seconds since the Unix epoch.
    fn now_epoch_seconds(&self) -> f64;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_epoch_seconds(&self) -> f64 {
        Utc::now().timestamp_micros() as f64 / 1_000_000.0
    }
}

#[cfg(any(test, feature = "test-helpers"))]
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub f64);

#[cfg(any(test, feature = "test-helpers"))]
impl Clock for FixedClock {
    fn now_epoch_seconds(&self) -> f64 {
        self.0
    }
}
