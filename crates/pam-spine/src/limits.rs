use crate::error::LimitsError;
use crate::value::ActuatorState;
use serde::{Deserialize, Serialize};

/// Pressure range a driver accepts. Interpolated values are never clamped by the core;
/// drivers apply these limits before anything reaches the hardware.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PressureLimits {
    min: i32,
    max: i32,
}

impl PressureLimits {
    pub fn new(min: i32, max: i32) -> Result<Self, LimitsError> {
        if min > max {
            return Err(LimitsError::Inverted { min, max });
        }
        Ok(Self { min, max })
    }

    pub fn min(&self) -> i32 {
        self.min
    }

    pub fn max(&self) -> i32 {
        self.max
    }

    pub fn contains(&self, state: ActuatorState) -> bool {
        (self.min..=self.max).contains(&state.pressure())
    }

    #[inline]
    pub fn clamp(&self, state: ActuatorState) -> ActuatorState {
        ActuatorState::new(state.pressure().clamp(self.min, self.max))
    }
}

impl Default for PressureLimits {
    fn default() -> Self {
        Self {
            min: 5000,
            max: 20000,
        }
    }
}
