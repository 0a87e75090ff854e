use crate::command::{ActuatorChannel, Command};
use crate::criterion::CompletionCriterion;
use crate::error::{CommandError, ConfigError};
use crate::hal::PressureDriver;
use crate::limits::PressureLimits;
use crate::sync::{Observation, ObservationExchange};
use crate::timebase::{micros_between, Iteration, Position, TimeBase, TimePoint, MICROS_PER_SECOND};
use crate::value::ActuatorState;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Clone, Debug)]
pub struct ControlConfig {
    pub cycle_time: Duration,
    pub limits: PressureLimits,
    pub watchdog_timeout: Duration,
    /// Stop after this many cycles.
    pub max_iterations: Option<u64>,
}

impl ControlConfig {
    /// Set the cycle time from a frequency. Rejects frequencies that are not positive
    /// or so high that the period rounds to zero.
    pub fn with_frequency(mut self, frequency_hz: f64) -> Result<Self, ConfigError> {
        let invalid = ConfigError::InvalidFrequency { hz: frequency_hz };
        if frequency_hz.is_nan() || frequency_hz <= 0.0 {
            return Err(invalid);
        }
        let cycle_time = Duration::try_from_secs_f64(frequency_hz.recip()).map_err(|_| invalid)?;
        if cycle_time.is_zero() {
            return Err(invalid);
        }
        self.cycle_time = cycle_time;
        Ok(self)
    }

    pub fn frequency_hz(&self) -> f64 {
        1.0 / self.cycle_time.as_secs_f64()
    }
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            cycle_time: Duration::from_millis(1),
            limits: PressureLimits::default(),
            watchdog_timeout: Duration::from_millis(100),
            max_iterations: None,
        }
    }
}

#[derive(Clone, Default, Debug)]
pub struct ExecutionStats {
    pub cycles_executed: u64,
    pub cycles_missed: u64,
    pub max_jitter_us: u64,
    pub commands_issued: u64,
    pub commands_completed: u64,
}

/// Why [`PamLoop::run_until`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    Stopped,
    Done,
    IterationLimit,
    Watchdog,
    /// The driver reported itself unhealthy.
    DriverFault,
}

/// Fixed-frequency control loop driving `N` actuators through their command channels.
pub struct PamLoop<D, const N: usize>
where
    D: PressureDriver<N>,
{
    driver: D,
    config: ControlConfig,
    exchange: Arc<ObservationExchange<N>>,
    channels: [ActuatorChannel<ActuatorState>; N],
    stats: ExecutionStats,
    timebase: TimeBase,
    iteration: Iteration,
    last_cycle_time: Option<TimePoint>,
    last_jitter_us: u32,
}

impl<D, const N: usize> PamLoop<D, N>
where
    D: PressureDriver<N>,
{
    pub fn new(
        driver: D,
        config: ControlConfig,
        exchange: Arc<ObservationExchange<N>>,
        timebase: TimeBase,
    ) -> Self {
        Self {
            driver,
            config,
            exchange,
            channels: std::array::from_fn(|_| ActuatorChannel::new()),
            stats: ExecutionStats::default(),
            timebase,
            iteration: Iteration::default(),
            last_cycle_time: None,
            last_jitter_us: 0,
        }
    }

    pub fn position(&self, now: TimePoint) -> Position {
        Position::new(now, self.iteration)
    }

    /// Issue a command to one actuator, starting now.
    pub fn issue(
        &mut self,
        actuator: usize,
        command: Command<ActuatorState>,
    ) -> Result<(), CommandError> {
        let now = self.timebase.now();
        self.issue_at(actuator, command, now)
    }

    pub fn issue_at(
        &mut self,
        actuator: usize,
        command: Command<ActuatorState>,
        now: TimePoint,
    ) -> Result<(), CommandError> {
        let observed = self.driver.get();
        let position = self.position(now);
        let channel = self
            .channels
            .get_mut(actuator)
            .ok_or(CommandError::ActuatorOutOfRange {
                index: actuator,
                count: N,
            })?;
        channel.issue(command, position, observed[actuator]);
        self.stats.commands_issued += 1;
        Ok(())
    }

    /// Issue one command per actuator sharing the same criterion.
    pub fn issue_all_at(
        &mut self,
        targets: &[ActuatorState; N],
        criterion: CompletionCriterion,
        now: TimePoint,
    ) {
        let observed = self.driver.get();
        let position = self.position(now);
        for ((channel, target), current) in self.channels.iter_mut().zip(targets).zip(observed) {
            channel.issue(Command::new(*target, criterion), position, current);
        }
        self.stats.commands_issued += N as u64;
    }

    pub fn issue_all(&mut self, targets: &[ActuatorState; N], criterion: CompletionCriterion) {
        let now = self.timebase.now();
        self.issue_all_at(targets, criterion, now);
    }

    /// Run one control cycle at `now`: read the driver, step every channel, write the
    /// desired pressures and publish the observation.
    pub fn step_at(&mut self, now: TimePoint) -> Observation<N> {
        let observed = self.driver.get();
        let position = self.position(now);

        let mut desired = [ActuatorState::default(); N];
        let mut finished = [true; N];
        for (i, channel) in self.channels.iter_mut().enumerate() {
            let out = channel.step(position, observed[i]);
            desired[i] = out.desired;
            finished[i] = out.finished;
        }
        self.driver.set(&desired);

        self.stats.commands_completed = self.channels.iter().map(|c| c.completed()).sum();
        self.stats.cycles_executed += 1;

        let frequency_hz = match self.last_cycle_time {
            Some(previous) if now > previous => {
                MICROS_PER_SECOND / micros_between(previous, now) as f64
            }
            _ => 0.0,
        };
        self.last_cycle_time = Some(now);

        let observation = Observation {
            iteration: self.iteration.value(),
            timestamp_us: now.as_micros(),
            frequency_hz,
            observed,
            desired,
            finished,
            cycle_jitter_us: self.last_jitter_us,
            cycles_missed: self.stats.cycles_missed,
            commands_completed: self.stats.commands_completed,
        };
        self.exchange.publish(observation);
        self.iteration = self.iteration.next();
        observation
    }

    /// Run at the configured frequency until `stop` is set, the iteration limit is hit,
    /// the watchdog trips, the driver turns unhealthy, or `done` returns true after a
    /// cycle.
    pub fn run_until<F>(&mut self, stop: &AtomicBool, mut done: F) -> LoopExit
    where
        F: FnMut(&Self) -> bool,
    {
        let mut next_cycle = Instant::now();
        let cycle_dt_s = self.config.cycle_time.as_secs_f64();

        loop {
            if stop.load(Ordering::Relaxed) {
                return LoopExit::Stopped;
            }
            if let Some(max) = self.config.max_iterations {
                if self.stats.cycles_executed >= max {
                    log::info!("iteration limit {} reached", max);
                    return LoopExit::IterationLimit;
                }
            }

            let now = Instant::now();
            if now < next_cycle {
                while Instant::now() < next_cycle {
                    std::hint::spin_loop();
                }
                self.last_jitter_us = 0;
            } else {
                let overrun = now.duration_since(next_cycle);
                if overrun > self.config.watchdog_timeout {
                    log::error!(
                        "control cycle overrun of {} us exceeds watchdog, stopping",
                        overrun.as_micros()
                    );
                    self.emergency_stop();
                    return LoopExit::Watchdog;
                }
                if overrun >= self.config.cycle_time {
                    self.stats.cycles_missed += 1;
                }
                let jitter_us = u32::try_from(overrun.as_micros()).unwrap_or(u32::MAX);
                self.last_jitter_us = jitter_us;
                self.stats.max_jitter_us = self.stats.max_jitter_us.max(u64::from(jitter_us));
            }

            self.driver.step(cycle_dt_s);
            if !self.driver.is_healthy() {
                log::error!(
                    "driver unhealthy at iteration {}, stopping",
                    self.iteration.value()
                );
                self.emergency_stop();
                return LoopExit::DriverFault;
            }
            let now = self.timebase.now();
            self.step_at(now);

            if done(self) {
                return LoopExit::Done;
            }
            next_cycle += self.config.cycle_time;
        }
    }

    pub fn run(&mut self, stop: &AtomicBool) -> LoopExit {
        log::info!(
            "control loop running at {:.1} Hz for {} actuators",
            self.config.frequency_hz(),
            N
        );
        self.run_until(stop, |_| false)
    }

    /// True when no actuator has a pending command.
    pub fn all_idle(&self) -> bool {
        self.channels.iter().all(ActuatorChannel::is_idle)
    }

    /// Drop every command and vent all muscles to the minimum pressure.
    pub fn emergency_stop(&mut self) {
        self.channels = std::array::from_fn(|_| ActuatorChannel::new());
        self.driver
            .set(&[ActuatorState::new(self.config.limits.min()); N]);
    }

    pub fn stats(&self) -> &ExecutionStats {
        &self.stats
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn config(&self) -> &ControlConfig {
        &self.config
    }

    pub fn iteration(&self) -> Iteration {
        self.iteration
    }
}
