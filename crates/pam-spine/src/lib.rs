pub mod command;
pub mod control_loop;
pub mod criterion;
pub mod error;
pub mod hal;
#[cfg(feature = "simulation")]
pub mod hal_sim;
pub mod interpolation;
mod interpolation_proptest;
pub mod joints;
pub mod limits;
pub mod sync;
pub mod timebase;
pub mod value;

pub use command::{ActiveCommand, ActuatorChannel, Command, CommandStatus};
pub use control_loop::{ControlConfig, ExecutionStats, LoopExit, PamLoop};
pub use criterion::{CompletionCriterion, IterationTarget, Speed};
pub use error::{CommandError, ConfigError, LimitsError};
pub use hal::PressureDriver;
#[cfg(feature = "simulation")]
pub use hal_sim::DummyRobot;
pub use interpolation::{Endpoints, Interpolation};
pub use joints::{JointPressures, Muscle};
pub use limits::PressureLimits;
pub use sync::{Observation, ObservationExchange};
pub use timebase::{DurationUs, Iteration, Position, TimeBase, TimePoint};
pub use value::{ActuatorState, ActuatorValue, ROUNDING_OFFSET};
