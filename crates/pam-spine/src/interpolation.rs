//! Per-cycle interpolation of an actuator command toward its target.
//!
//! Every function here is pure: no allocation, no locking, no clock reads. The control
//! loop calls [`intermediate_value`] and [`finished`] once per actuator per cycle with the
//! position the command was issued at and the current position.
//!
//! Degenerate intervals have defined results:
//! - a duration `<= 0` or an iteration target equal to the start iteration snaps to the
//!   target and is finished immediately;
//! - a zero speed never moves and never finishes.

use crate::criterion::{CompletionCriterion, Speed};
use crate::timebase::{
    iterations_between, micros_between, seconds_between, DurationUs, Iteration, Position,
    TimePoint, MICROS_PER_SECOND,
};
use crate::value::ActuatorValue;

/// Values involved in one interpolation step.
///
/// `current` and `previous_desired` are carried for callers that observe them but do
/// not influence the result.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Endpoints<V> {
    pub start: V,
    pub current: V,
    pub previous_desired: V,
    pub target: V,
}

impl<V: ActuatorValue> Endpoints<V> {
    /// Endpoints for a caller that has no separate observation of the actuator.
    pub fn new(start: V, target: V) -> Self {
        Self {
            start,
            current: start,
            previous_desired: start,
            target,
        }
    }
}

/// Result of one interpolation step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interpolation<V> {
    pub desired: V,
    pub finished: bool,
}

#[inline]
fn lerp<V: ActuatorValue>(start: V, target: V, ratio: f64) -> V {
    let start_f = start.to_f64();
    V::from_rounded(start_f + ratio * (target.to_f64() - start_f))
}

/// Linear interpolation over a fixed wall-clock duration.
pub fn by_duration<V: ActuatorValue>(
    start_time: TimePoint,
    now_time: TimePoint,
    start_value: V,
    target_value: V,
    duration: DurationUs,
) -> V {
    if duration_finished(start_time, now_time, duration) {
        return target_value;
    }
    let ratio = (micros_between(start_time, now_time) as f64 / duration.as_micros() as f64)
        .clamp(0.0, 1.0);
    lerp(start_value, target_value, ratio)
}

#[inline]
pub fn duration_finished(start_time: TimePoint, now_time: TimePoint, duration: DurationUs) -> bool {
    !duration.is_positive() || now_time >= start_time.saturating_add(duration)
}

/// Constant-rate progression toward the target, never past it.
pub fn by_speed<V: ActuatorValue>(
    start_time: TimePoint,
    now_time: TimePoint,
    start_value: V,
    target_value: V,
    speed: Speed,
) -> V {
    let elapsed = seconds_between(start_time, now_time).max(0.0);
    let travelled = speed.units_per_second() * elapsed;
    let start = start_value.to_f64();
    let target = target_value.to_f64();

    if target >= start {
        let desired = start + travelled;
        if desired > target {
            return target_value;
        }
        V::from_rounded(desired)
    } else {
        let desired = start - travelled;
        if desired < target {
            return target_value;
        }
        V::from_rounded(desired)
    }
}

/// Instant at which a constant-rate command reaches its target, or `None` for a zero
/// speed.
pub fn speed_completion<V: ActuatorValue>(
    start_time: TimePoint,
    start_value: V,
    target_value: V,
    speed: Speed,
) -> Option<TimePoint> {
    if speed.is_zero() {
        return None;
    }
    let distance = (target_value.to_f64() - start_value.to_f64()).abs();
    let micros = distance / speed.units_per_second() * MICROS_PER_SECOND;
    Some(start_time.saturating_add(DurationUs::from_micros(micros as i64)))
}

#[inline]
pub fn speed_finished<V: ActuatorValue>(
    start_time: TimePoint,
    now_time: TimePoint,
    start_value: V,
    target_value: V,
    speed: Speed,
) -> bool {
    speed_completion(start_time, start_value, target_value, speed)
        .is_some_and(|completion| now_time > completion)
}

/// Linear interpolation over control iterations up to an absolute target iteration.
pub fn by_iteration<V: ActuatorValue>(
    start_iter: Iteration,
    now_iter: Iteration,
    start_value: V,
    target_value: V,
    target_iter: Iteration,
) -> V {
    if iteration_finished(now_iter, target_iter) || target_iter == start_iter {
        return target_value;
    }
    if now_iter <= start_iter {
        return start_value;
    }
    let span = iterations_between(start_iter, target_iter) as f64;
    let ratio = (iterations_between(start_iter, now_iter) as f64 / span).clamp(0.0, 1.0);
    lerp(start_value, target_value, ratio)
}

#[inline]
pub fn iteration_finished(now_iter: Iteration, target_iter: Iteration) -> bool {
    now_iter >= target_iter
}

/// Desired value at `now` for a command issued at `start`.
pub fn intermediate_value<V: ActuatorValue>(
    start: Position,
    now: Position,
    values: &Endpoints<V>,
    criterion: &CompletionCriterion,
) -> V {
    match *criterion {
        CompletionCriterion::Duration(duration) => {
            by_duration(start.time, now.time, values.start, values.target, duration)
        }
        CompletionCriterion::Iteration(target) => by_iteration(
            start.iteration,
            now.iteration,
            values.start,
            values.target,
            target.resolve(start.iteration),
        ),
        CompletionCriterion::Speed(speed) => {
            by_speed(start.time, now.time, values.start, values.target, speed)
        }
    }
}

/// Whether a command issued at `start` is complete at `now`.
pub fn finished<V: ActuatorValue>(
    start: Position,
    now: Position,
    values: &Endpoints<V>,
    criterion: &CompletionCriterion,
) -> bool {
    match *criterion {
        CompletionCriterion::Duration(duration) => {
            duration_finished(start.time, now.time, duration)
        }
        CompletionCriterion::Iteration(target) => {
            iteration_finished(now.iteration, target.resolve(start.iteration))
        }
        CompletionCriterion::Speed(speed) => {
            speed_finished(start.time, now.time, values.start, values.target, speed)
        }
    }
}

/// [`intermediate_value`] and [`finished`] in one call.
#[inline]
pub fn interpolate<V: ActuatorValue>(
    start: Position,
    now: Position,
    values: &Endpoints<V>,
    criterion: &CompletionCriterion,
) -> Interpolation<V> {
    Interpolation {
        desired: intermediate_value(start, now, values, criterion),
        finished: finished(start, now, values, criterion),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::criterion::IterationTarget;

    fn t(us: i64) -> TimePoint {
        TimePoint::from_micros(us)
    }

    fn at(us: i64) -> Position {
        Position::new(t(us), Iteration::new(0))
    }

    fn it(n: i64) -> Position {
        Position::new(t(0), Iteration::new(n))
    }

    fn speed(units: f64) -> Speed {
        Speed::per_second(units).unwrap()
    }

    #[test]
    fn duration_scenario() {
        let d = DurationUs::from_micros(1_000_000);
        assert_eq!(by_duration(t(0), t(500_000), 5000, 15000, d), 10000);
        assert_eq!(by_duration(t(0), t(1_000_001), 5000, 15000, d), 15000);
        assert!(duration_finished(t(0), t(1_000_001), d));
        assert!(duration_finished(t(0), t(1_000_000), d));
        assert!(!duration_finished(t(0), t(999_999), d));
    }

    #[test]
    fn duration_before_start_holds_start_value() {
        let d = DurationUs::from_micros(1_000_000);
        assert_eq!(by_duration(t(1_000), t(0), 5000, 15000, d), 5000);
        assert!(!duration_finished(t(1_000), t(0), d));
    }

    #[test]
    fn non_positive_duration_snaps_to_target() {
        for d in [DurationUs::ZERO, DurationUs::from_micros(-10)] {
            assert_eq!(by_duration(t(100), t(0), 5000, 15000, d), 15000);
            assert!(duration_finished(t(100), t(0), d));
        }
    }

    #[test]
    fn speed_scenario_forward() {
        let s = speed(10_000.0);
        assert_eq!(by_speed(t(0), t(500_000), 5000, 15000, s), 10000);
        assert_eq!(speed_completion(t(0), 5000, 15000, s), Some(t(1_000_000)));
        assert!(!speed_finished(t(0), t(1_000_000), 5000, 15000, s));
        assert!(speed_finished(t(0), t(1_000_001), 5000, 15000, s));
        assert_eq!(by_speed(t(0), t(1_000_001), 5000, 15000, s), 15000);
    }

    #[test]
    fn speed_scenario_reverse() {
        let s = speed(10_000.0);
        assert_eq!(by_speed(t(0), t(300_000), 15000, 5000, s), 12000);
        assert!(!speed_finished(t(0), t(300_000), 15000, 5000, s));
        assert_eq!(by_speed(t(0), t(2_000_000), 15000, 5000, s), 5000);
    }

    #[test]
    fn speed_rounds_half_up() {
        // 1 unit/s for 0.5 s from 100 lands exactly on 100.5
        assert_eq!(by_speed(t(0), t(500_000), 100, 200, speed(1.0)), 101);
        assert_eq!(by_speed(t(0), t(400_000), 100, 200, speed(1.0)), 100);
    }

    #[test]
    fn zero_speed_never_moves_nor_finishes() {
        let s = speed(0.0);
        assert_eq!(by_speed(t(0), t(10_000_000), 5000, 15000, s), 5000);
        assert_eq!(speed_completion(t(0), 5000, 15000, s), None);
        assert!(!speed_finished(t(0), t(i64::MAX), 5000, 15000, s));
    }

    #[test]
    fn speed_before_start_holds_start_value() {
        assert_eq!(by_speed(t(1_000), t(0), 5000, 15000, speed(10_000.0)), 5000);
        assert_eq!(by_speed(t(1_000), t(0), 15000, 5000, speed(10_000.0)), 15000);
    }

    #[test]
    fn iteration_scenario() {
        let target = Iteration::new(100);
        assert_eq!(by_iteration(Iteration::new(0), Iteration::new(25), 0, 1000, target), 250);
        assert_eq!(by_iteration(Iteration::new(0), Iteration::new(100), 0, 1000, target), 1000);
        assert!(iteration_finished(Iteration::new(100), target));
        assert!(!iteration_finished(Iteration::new(99), target));
    }

    #[test]
    fn iteration_before_start_holds_start_value() {
        let target = Iteration::new(150);
        assert_eq!(by_iteration(Iteration::new(50), Iteration::new(10), 0, 1000, target), 0);
        assert!(!iteration_finished(Iteration::new(10), target));
    }

    #[test]
    fn target_behind_start_iteration() {
        // target already passed: finished at the start iteration
        let start = Iteration::new(20);
        let target = Iteration::new(15);
        assert_eq!(by_iteration(start, start, 0, 1000, target), 1000);
        assert!(iteration_finished(start, target));
        // stale call before the target still holds the start value
        assert_eq!(by_iteration(start, Iteration::new(10), 0, 1000, target), 0);
        assert!(!iteration_finished(Iteration::new(10), target));
    }

    #[test]
    fn negative_relative_target_finishes_on_issue() {
        let values = Endpoints::new(0, 1000);
        let criterion = CompletionCriterion::Iteration(IterationTarget::relative(-5));
        assert_eq!(
            interpolate(it(20), it(20), &values, &criterion),
            Interpolation { desired: 1000, finished: true }
        );
        assert_eq!(
            interpolate(it(20), it(12), &values, &criterion),
            Interpolation { desired: 0, finished: false }
        );
    }

    #[test]
    fn zero_iteration_span_returns_target() {
        let start = Iteration::new(42);
        assert_eq!(by_iteration(start, Iteration::new(10), 0, 1000, start), 1000);
    }

    #[test]
    fn dispatch_delegates_per_variant() {
        let values = Endpoints::new(5000, 15000);

        let duration = CompletionCriterion::Duration(DurationUs::from_micros(1_000_000));
        let out = interpolate(at(0), at(500_000), &values, &duration);
        assert_eq!(out, Interpolation { desired: 10000, finished: false });

        let rate = CompletionCriterion::Speed(speed(10_000.0));
        let out = interpolate(at(0), at(1_000_001), &values, &rate);
        assert_eq!(out, Interpolation { desired: 15000, finished: true });

        let iteration = CompletionCriterion::Iteration(IterationTarget::absolute(100));
        let out = interpolate(it(0), it(50), &values, &iteration);
        assert_eq!(out, Interpolation { desired: 10000, finished: false });
    }

    #[test]
    fn dispatch_resolves_relative_iterations_from_start() {
        let values = Endpoints::new(0, 1000);
        let criterion = CompletionCriterion::Iteration(IterationTarget::relative(100));
        assert_eq!(intermediate_value(it(200), it(225), &values, &criterion), 250);
        assert!(!finished(it(200), it(299), &values, &criterion));
        assert!(finished(it(200), it(300), &values, &criterion));
    }

    #[test]
    fn observed_values_do_not_change_the_result() {
        let criterion = CompletionCriterion::Duration(DurationUs::from_millis(10));
        let plain = Endpoints::new(5000, 6000);
        let noisy = Endpoints {
            current: 17_000,
            previous_desired: -3,
            ..plain
        };
        assert_eq!(
            interpolate(at(0), at(5_000), &plain, &criterion),
            interpolate(at(0), at(5_000), &noisy, &criterion)
        );
    }
}
