use crate::hal::PressureDriver;
use crate::limits::PressureLimits;
use crate::value::{ActuatorState, ActuatorValue};

/// Simulated robot whose muscles follow the desired pressures.
///
/// Desired pressures are clamped to the limits. With a zero response time the
/// observed pressure equals the last clamped desired pressure after each step;
/// otherwise it approaches it with a first-order lag.
#[derive(Debug, Clone)]
pub struct DummyRobot<const N: usize> {
    observed: [ActuatorState; N],
    levels: [f64; N],
    desired: [ActuatorState; N],
    limits: PressureLimits,
    response_time_s: f64,
}

impl<const N: usize> DummyRobot<N> {
    pub fn new(limits: PressureLimits, initial_pressure: i32) -> Self {
        let initial = limits.clamp(ActuatorState::new(initial_pressure));
        Self {
            observed: [initial; N],
            levels: [initial.to_f64(); N],
            desired: [initial; N],
            limits,
            response_time_s: 0.0,
        }
    }

    pub fn with_response_time(mut self, seconds: f64) -> Self {
        self.response_time_s = seconds.max(0.0);
        self
    }

    pub fn limits(&self) -> PressureLimits {
        self.limits
    }
}

impl<const N: usize> Default for DummyRobot<N> {
    fn default() -> Self {
        let limits = PressureLimits::default();
        Self::new(limits, limits.min())
    }
}

impl<const N: usize> PressureDriver<N> for DummyRobot<N> {
    fn step(&mut self, dt_s: f64) {
        if self.response_time_s <= 0.0 {
            self.observed = self.desired;
            for (level, desired) in self.levels.iter_mut().zip(self.desired.iter()) {
                *level = desired.to_f64();
            }
        } else {
            let alpha = 1.0 - (-dt_s.max(0.0) / self.response_time_s).exp();
            for i in 0..N {
                self.levels[i] += alpha * (self.desired[i].to_f64() - self.levels[i]);
                self.observed[i] = ActuatorState::from_rounded(self.levels[i]);
            }
        }
    }

    fn get(&self) -> [ActuatorState; N] {
        self.observed
    }

    fn set(&mut self, desired: &[ActuatorState; N]) {
        for (slot, value) in self.desired.iter_mut().zip(desired.iter()) {
            *slot = self.limits.clamp(*value);
        }
    }

    fn is_healthy(&self) -> bool {
        self.observed.iter().all(|p| self.limits.contains(*p))
    }
}
