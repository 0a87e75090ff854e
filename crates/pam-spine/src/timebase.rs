use serde::{Deserialize, Serialize};
use std::time::{Instant, SystemTime, UNIX_EPOCH};

pub const MICROS_PER_SECOND: f64 = 1_000_000.0;

/// Monotonic time point, microseconds since an arbitrary origin chosen by the caller.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct TimePoint(i64);

impl TimePoint {
    pub const fn from_micros(us: i64) -> Self {
        Self(us)
    }

    pub const fn as_micros(self) -> i64 {
        self.0
    }

    #[inline]
    pub fn saturating_add(self, duration: DurationUs) -> Self {
        Self(self.0.saturating_add(duration.0))
    }
}

/// Signed span of time in microseconds. Zero and negative spans are legal command
/// inputs and mean "apply immediately".
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct DurationUs(i64);

impl DurationUs {
    pub const ZERO: Self = Self(0);

    pub const fn from_micros(us: i64) -> Self {
        Self(us)
    }

    pub const fn from_millis(ms: i64) -> Self {
        Self(ms.saturating_mul(1_000))
    }

    pub fn from_secs_f64(seconds: f64) -> Self {
        Self((seconds * MICROS_PER_SECOND) as i64)
    }

    pub const fn as_micros(self) -> i64 {
        self.0
    }

    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }
}

impl From<std::time::Duration> for DurationUs {
    fn from(d: std::time::Duration) -> Self {
        Self(i64::try_from(d.as_micros()).unwrap_or(i64::MAX))
    }
}

/// Control-cycle counter.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Iteration(i64);

impl Iteration {
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    pub const fn value(self) -> i64 {
        self.0
    }

    #[inline]
    pub fn offset(self, iterations: i64) -> Self {
        Self(self.0.saturating_add(iterations))
    }

    #[inline]
    pub fn next(self) -> Self {
        self.offset(1)
    }
}

/// Where the control loop stands on both of its clocks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub time: TimePoint,
    pub iteration: Iteration,
}

impl Position {
    pub const fn new(time: TimePoint, iteration: Iteration) -> Self {
        Self { time, iteration }
    }
}

/// Signed microseconds from `start` to `now`; negative when `now` precedes `start`.
#[inline]
pub fn micros_between(start: TimePoint, now: TimePoint) -> i64 {
    now.0.saturating_sub(start.0)
}

#[inline]
pub fn seconds_between(start: TimePoint, now: TimePoint) -> f64 {
    micros_between(start, now) as f64 / MICROS_PER_SECOND
}

#[inline]
pub fn iterations_between(start: Iteration, now: Iteration) -> i64 {
    now.0.saturating_sub(start.0)
}

#[derive(Debug, Clone, Copy)]
pub struct TimeBase {
    start: Instant,
}

impl TimeBase {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Monotonic time point since start.
    pub fn now(&self) -> TimePoint {
        TimePoint(i64::try_from(self.start.elapsed().as_micros()).unwrap_or(i64::MAX))
    }

    /// Wall-clock microseconds since Unix epoch (for cross-process logs only).
    pub fn unix_us(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_micros() as u64
    }
}

impl Default for TimeBase {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deltas_are_signed() {
        let start = TimePoint::from_micros(1_000);
        assert_eq!(micros_between(start, TimePoint::from_micros(1_500)), 500);
        assert_eq!(micros_between(start, TimePoint::from_micros(400)), -600);
        assert_eq!(
            iterations_between(Iteration::new(10), Iteration::new(4)),
            -6
        );
    }

    #[test]
    fn seconds_between_uses_microsecond_resolution() {
        let s = seconds_between(TimePoint::from_micros(0), TimePoint::from_micros(300_000));
        assert!((s - 0.3).abs() < 1e-12);
    }

    #[test]
    fn duration_constructors_agree() {
        assert_eq!(DurationUs::from_millis(500), DurationUs::from_micros(500_000));
        assert_eq!(DurationUs::from_secs_f64(1.5), DurationUs::from_micros(1_500_000));
        assert_eq!(
            DurationUs::from(std::time::Duration::from_millis(2)),
            DurationUs::from_micros(2_000)
        );
        assert!(!DurationUs::ZERO.is_positive());
    }

    #[test]
    fn time_base_is_monotonic() {
        let tb = TimeBase::new();
        let a = tb.now();
        let b = tb.now();
        assert!(b >= a);
    }
}
