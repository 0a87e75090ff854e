use serde::{Deserialize, Serialize};
use std::fmt;

/// Added before truncation when an interpolated real value is turned back into an
/// integer state. Recorded trajectories are replayed against this exact rule.
pub const ROUNDING_OFFSET: f64 = 0.5;

/// Round-half-up as `+0.5` then truncate toward zero.
#[inline]
pub fn round_half_up(value: f64) -> i64 {
    (value + ROUNDING_OFFSET) as i64
}

/// Scalar state of a single actuator, as seen by the interpolator.
///
/// Implementors are plain values: the interpolator never clamps them, it only converts
/// to `f64` for the arithmetic and back with [`round_half_up`].
pub trait ActuatorValue: Copy + PartialEq + fmt::Debug {
    fn to_f64(self) -> f64;
    fn from_rounded(value: f64) -> Self;
}

impl ActuatorValue for i32 {
    #[inline]
    fn to_f64(self) -> f64 {
        f64::from(self)
    }

    #[inline]
    fn from_rounded(value: f64) -> Self {
        (value + ROUNDING_OFFSET) as i32
    }
}

impl ActuatorValue for i64 {
    #[inline]
    fn to_f64(self) -> f64 {
        self as f64
    }

    #[inline]
    fn from_rounded(value: f64) -> Self {
        round_half_up(value)
    }
}

/// Pressure of one pneumatic muscle, in the unit reported by the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActuatorState {
    pressure: i32,
}

impl ActuatorState {
    /// Pressure of a state that was never set by a driver or a command.
    pub const UNSET: i32 = -1;

    pub const fn new(pressure: i32) -> Self {
        Self { pressure }
    }

    pub const fn pressure(self) -> i32 {
        self.pressure
    }

    pub const fn is_set(self) -> bool {
        self.pressure != Self::UNSET
    }
}

impl Default for ActuatorState {
    fn default() -> Self {
        Self::new(Self::UNSET)
    }
}

impl From<i32> for ActuatorState {
    fn from(pressure: i32) -> Self {
        Self::new(pressure)
    }
}

impl From<ActuatorState> for i32 {
    fn from(state: ActuatorState) -> Self {
        state.pressure
    }
}

impl fmt::Display for ActuatorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.pressure)
    }
}

impl ActuatorValue for ActuatorState {
    #[inline]
    fn to_f64(self) -> f64 {
        f64::from(self.pressure)
    }

    #[inline]
    fn from_rounded(value: f64) -> Self {
        Self::new(i32::from_rounded(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounding_offset_is_half() {
        assert_eq!(ROUNDING_OFFSET, 0.5);
    }

    #[test]
    fn rounds_half_up_for_positive_values() {
        assert_eq!(round_half_up(10.5), 11);
        assert_eq!(round_half_up(10.49), 10);
        assert_eq!(i32::from_rounded(9999.5), 10000);
        assert_eq!(ActuatorState::from_rounded(12000.4).pressure(), 12000);
    }

    #[test]
    fn truncation_rule_applies_below_zero() {
        // +0.5 then truncate toward zero, not floor.
        assert_eq!(round_half_up(-2.7), -2);
        assert_eq!(round_half_up(-0.4), 0);
    }

    #[test]
    fn default_state_is_unset() {
        let state = ActuatorState::default();
        assert_eq!(state.pressure(), -1);
        assert!(!state.is_set());
        assert!(ActuatorState::new(0).is_set());
    }

    #[test]
    fn displays_bare_pressure() {
        assert_eq!(ActuatorState::new(15000).to_string(), "15000");
    }
}
