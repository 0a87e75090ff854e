#[cfg(test)]
mod proptest_interpolation {
    use crate::criterion::{CompletionCriterion, IterationTarget, Speed};
    use crate::interpolation::*;
    use crate::timebase::{DurationUs, Iteration, Position, TimePoint};
    use proptest::prelude::*;

    fn t(us: i64) -> TimePoint {
        TimePoint::from_micros(us)
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(5000))]

        // Property: duration commands start exactly at the start value and end exactly at the target
        #[test]
        fn duration_endpoints_exact(
            start_time in 0i64..1_000_000_000,
            duration in 1i64..10_000_000,
            overshoot in 0i64..10_000_000,
            start_value in 0i32..=40_000,
            target_value in 0i32..=40_000,
        ) {
            let d = DurationUs::from_micros(duration);
            prop_assert_eq!(
                by_duration(t(start_time), t(start_time), start_value, target_value, d),
                start_value
            );
            let end = t(start_time + duration + overshoot);
            prop_assert_eq!(by_duration(t(start_time), end, start_value, target_value, d), target_value);
            prop_assert!(duration_finished(t(start_time), end, d));
        }

        // Property: duration commands stay between start and target at every instant
        #[test]
        fn duration_never_overshoots(
            elapsed in -1_000_000i64..3_000_000,
            start_value in 0i32..=40_000,
            target_value in 0i32..=40_000,
        ) {
            let d = DurationUs::from_micros(1_000_000);
            let value = by_duration(t(0), t(elapsed), start_value, target_value, d);
            prop_assert!(value >= start_value.min(target_value));
            prop_assert!(value <= start_value.max(target_value));
        }

        // Property: speed commands are monotonic in time and never cross the target
        #[test]
        fn speed_monotonic_and_bounded(
            start_value in 0i32..=40_000,
            target_value in 0i32..=40_000,
            rate in 1.0f64..50_000.0,
            a in 0i64..5_000_000,
            b in 0i64..5_000_000,
        ) {
            let s = Speed::per_second(rate).unwrap();
            let (early, late) = if a <= b { (a, b) } else { (b, a) };
            let v_early = by_speed(t(0), t(early), start_value, target_value, s);
            let v_late = by_speed(t(0), t(late), start_value, target_value, s);

            if target_value >= start_value {
                prop_assert!(v_early <= v_late);
                prop_assert!(v_late <= target_value);
                prop_assert!(v_early >= start_value);
            } else {
                prop_assert!(v_early >= v_late);
                prop_assert!(v_late >= target_value);
                prop_assert!(v_early <= start_value);
            }
        }

        // Property: a finished speed command has reached its target
        #[test]
        fn speed_finished_implies_target(
            start_value in 0i32..=40_000,
            target_value in 0i32..=40_000,
            rate in 1.0f64..50_000.0,
            now in 0i64..100_000_000,
        ) {
            let s = Speed::per_second(rate).unwrap();
            if speed_finished(t(0), t(now), start_value, target_value, s) {
                prop_assert_eq!(by_speed(t(0), t(now), start_value, target_value, s), target_value);
            }
        }

        // Property: iteration commands hit both endpoints exactly
        #[test]
        fn iteration_endpoints_exact(
            start_iter in 0i64..1_000_000,
            span in 0i64..100_000,
            start_value in 0i32..=40_000,
            target_value in 0i32..=40_000,
        ) {
            let start = Iteration::new(start_iter);
            let target = Iteration::new(start_iter + span);
            let at_start = by_iteration(start, start, start_value, target_value, target);
            if span == 0 {
                prop_assert_eq!(at_start, target_value);
            } else {
                prop_assert_eq!(at_start, start_value);
            }
            prop_assert_eq!(by_iteration(start, target, start_value, target_value, target), target_value);
            prop_assert!(iteration_finished(target, target));
        }

        // Property: a stale iteration before the start holds the start value until the
        // target iteration is reached
        #[test]
        fn iteration_before_start_holds_start(
            start_iter in 0i64..1_000_000,
            behind in 1i64..10_000,
            span in -10_000i64..10_000,
            start_value in 0i32..=40_000,
            target_value in 0i32..=40_000,
        ) {
            let start = Iteration::new(start_iter);
            let now = Iteration::new(start_iter - behind);
            let target = Iteration::new(start_iter + span);
            let value = by_iteration(start, now, start_value, target_value, target);
            if iteration_finished(now, target) || span == 0 {
                prop_assert_eq!(value, target_value);
            } else {
                prop_assert_eq!(value, start_value);
            }
        }

        // Property: the finished predicate holds no hidden state
        #[test]
        fn finished_is_idempotent(
            now in -1_000i64..3_000_000,
            now_iter in 0i64..300,
            start_value in 0i32..=40_000,
            target_value in 0i32..=40_000,
            which in 0u8..3,
        ) {
            let criterion = match which {
                0 => CompletionCriterion::Duration(DurationUs::from_micros(1_000_000)),
                1 => CompletionCriterion::Iteration(IterationTarget::relative(100)),
                _ => CompletionCriterion::Speed(Speed::per_second(10_000.0).unwrap()),
            };
            let start = Position::new(t(0), Iteration::new(0));
            let now = Position::new(t(now), Iteration::new(now_iter));
            let values = Endpoints::new(start_value, target_value);
            let first = finished(start, now, &values, &criterion);
            let second = finished(start, now, &values, &criterion);
            prop_assert_eq!(first, second);
            prop_assert_eq!(
                intermediate_value(start, now, &values, &criterion),
                intermediate_value(start, now, &values, &criterion)
            );
        }
    }
}
