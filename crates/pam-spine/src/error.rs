use thiserror::Error;

/// Errors raised while building or issuing actuator commands.
///
/// Degenerate intervals (zero duration, zero iteration span, zero speed) are not errors;
/// they have defined fallbacks in [`crate::interpolation`].
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum CommandError {
    #[error("unknown completion criterion tag {tag}")]
    UnknownCriterion { tag: u8 },
    #[error("speed must be finite, got {value}")]
    NonFiniteSpeed { value: f64 },
    #[error("speed must not be negative, got {value}")]
    NegativeSpeed { value: f64 },
    #[error("actuator {index} out of range (robot has {count} actuators)")]
    ActuatorOutOfRange { index: usize, count: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LimitsError {
    #[error("pressure limits inverted: min {min} > max {max}")]
    Inverted { min: i32, max: i32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum ConfigError {
    #[error("control frequency must be positive and yield a non-zero period, got {hz} Hz")]
    InvalidFrequency { hz: f64 },
}
