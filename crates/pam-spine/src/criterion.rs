//! Completion criteria: the rule deciding when an actuator command is done.

use crate::error::CommandError;
use crate::timebase::{DurationUs, Iteration};
use serde::{Deserialize, Serialize};

/// Rate of change in value-units per second. Never negative, never NaN.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Speed {
    units_per_second: f64,
}

impl Speed {
    pub fn per_second(units: f64) -> Result<Self, CommandError> {
        if !units.is_finite() {
            return Err(CommandError::NonFiniteSpeed { value: units });
        }
        if units < 0.0 {
            return Err(CommandError::NegativeSpeed { value: units });
        }
        Ok(Self {
            units_per_second: units,
        })
    }

    pub fn per_millisecond(units: f64) -> Result<Self, CommandError> {
        Self::per_second(units * 1_000.0)
    }

    pub fn units_per_second(self) -> f64 {
        self.units_per_second
    }

    /// A zero speed never completes by rate.
    pub fn is_zero(self) -> bool {
        self.units_per_second == 0.0
    }
}

impl TryFrom<f64> for Speed {
    type Error = CommandError;

    fn try_from(units: f64) -> Result<Self, Self::Error> {
        Self::per_second(units)
    }
}

impl From<Speed> for f64 {
    fn from(speed: Speed) -> Self {
        speed.units_per_second
    }
}

/// Iteration at which a command must be complete.
///
/// Relative targets count from the iteration the command is issued at and are
/// resolved to absolute ones by [`CompletionCriterion::resolve`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IterationTarget {
    value: i64,
    #[serde(default)]
    relative: bool,
}

impl IterationTarget {
    pub const fn absolute(iteration: i64) -> Self {
        Self {
            value: iteration,
            relative: false,
        }
    }

    pub const fn relative(iterations: i64) -> Self {
        Self {
            value: iterations,
            relative: true,
        }
    }

    pub const fn is_relative(self) -> bool {
        self.relative
    }

    /// Absolute target iteration for a command issued at `issued_at`.
    #[inline]
    pub fn resolve(self, issued_at: Iteration) -> Iteration {
        if self.relative {
            issued_at.offset(self.value)
        } else {
            Iteration::new(self.value)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionCriterion {
    /// Complete once `duration` has elapsed since the command started.
    Duration(DurationUs),
    /// Complete at the target iteration.
    Iteration(IterationTarget),
    /// Move toward the target at a fixed rate; completion time is derived.
    Speed(Speed),
}

impl CompletionCriterion {
    pub const TAG_DURATION: u8 = 0;
    pub const TAG_ITERATION: u8 = 1;
    pub const TAG_SPEED: u8 = 2;

    /// Flat tag of this criterion, the inverse of [`Self::from_raw`].
    pub fn tag(&self) -> u8 {
        match self {
            Self::Duration(_) => Self::TAG_DURATION,
            Self::Iteration(_) => Self::TAG_ITERATION,
            Self::Speed(_) => Self::TAG_SPEED,
        }
    }

    /// Decode a criterion from its flat `(tag, value)` form, for callers that carry
    /// criteria as a numeric tag instead of the enum (shared memory, foreign bindings).
    /// Serde-based inputs such as command plans never go through here; they reject unknown
    /// criteria while deserializing.
    ///
    /// Duration values are microseconds, iteration values absolute iterations and speed
    /// values units per second. Any other tag is a contract violation by the producer and
    /// comes back as [`CommandError::UnknownCriterion`].
    pub fn from_raw(tag: u8, value: f64) -> Result<Self, CommandError> {
        match tag {
            Self::TAG_DURATION => Ok(Self::Duration(DurationUs::from_micros(value as i64))),
            Self::TAG_ITERATION => Ok(Self::Iteration(IterationTarget::absolute(value as i64))),
            Self::TAG_SPEED => Speed::per_second(value).map(Self::Speed),
            tag => Err(CommandError::UnknownCriterion { tag }),
        }
    }

    /// Same criterion with any relative iteration target made absolute.
    #[inline]
    pub fn resolve(self, issued_at: Iteration) -> Self {
        match self {
            Self::Iteration(target) => {
                Self::Iteration(IterationTarget::absolute(target.resolve(issued_at).value()))
            }
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_negative_and_nan_speed() {
        assert!(matches!(
            Speed::per_second(-1.0),
            Err(CommandError::NegativeSpeed { .. })
        ));
        assert!(matches!(
            Speed::per_second(f64::NAN),
            Err(CommandError::NonFiniteSpeed { .. })
        ));
        assert!(Speed::per_second(0.0).unwrap().is_zero());
        assert_eq!(Speed::per_millisecond(4.0).unwrap().units_per_second(), 4000.0);
    }

    #[test]
    fn relative_iteration_resolves_from_issue_point() {
        let criterion = CompletionCriterion::Iteration(IterationTarget::relative(100));
        let resolved = criterion.resolve(Iteration::new(250));
        assert_eq!(
            resolved,
            CompletionCriterion::Iteration(IterationTarget::absolute(350))
        );
        // absolute targets are left alone
        assert_eq!(resolved.resolve(Iteration::new(999)), resolved);
    }

    #[test]
    fn raw_round_trip_keeps_tag() {
        for (tag, value) in [(0u8, 1_000_000.0), (1, 100.0), (2, 4000.0)] {
            let criterion = CompletionCriterion::from_raw(tag, value).unwrap();
            assert_eq!(criterion.tag(), tag);
        }
    }

    #[test]
    fn unknown_raw_tag_is_an_error() {
        assert_eq!(
            CompletionCriterion::from_raw(7, 1.0),
            Err(CommandError::UnknownCriterion { tag: 7 })
        );
    }

    #[test]
    fn deserializes_each_variant() {
        let duration: CompletionCriterion = serde_json::from_str(r#"{"duration":500000}"#).unwrap();
        assert_eq!(
            duration,
            CompletionCriterion::Duration(DurationUs::from_millis(500))
        );

        let iteration: CompletionCriterion =
            serde_json::from_str(r#"{"iteration":{"value":10,"relative":true}}"#).unwrap();
        assert_eq!(
            iteration,
            CompletionCriterion::Iteration(IterationTarget::relative(10))
        );

        let speed: CompletionCriterion = serde_json::from_str(r#"{"speed":4000.0}"#).unwrap();
        assert_eq!(
            speed,
            CompletionCriterion::Speed(Speed::per_second(4000.0).unwrap())
        );
    }

    #[test]
    fn unknown_or_invalid_variant_fails_to_deserialize() {
        assert!(serde_json::from_str::<CompletionCriterion>(r#"{"jerk":1}"#).is_err());
        assert!(serde_json::from_str::<CompletionCriterion>(r#"{"speed":-5.0}"#).is_err());
    }
}
