use crate::value::ActuatorState;

/// Hardware (or simulated) side of a robot with `N` pressure-controlled actuators.
pub trait PressureDriver<const N: usize>: Send {
    /// Advance the driver by one control period.
    fn step(&mut self, dt_s: f64);
    fn get(&self) -> [ActuatorState; N];
    fn set(&mut self, desired: &[ActuatorState; N]);
    /// Checked by the control loop after every step; `false` stops the loop.
    fn is_healthy(&self) -> bool;
}
