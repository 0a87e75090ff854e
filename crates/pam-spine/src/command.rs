//! Actuator commands and their one-way `Pending -> Finished` lifecycle.

use crate::criterion::CompletionCriterion;
use crate::interpolation::{self, Endpoints, Interpolation};
use crate::timebase::Position;
use crate::value::ActuatorValue;
use serde::{Deserialize, Serialize};

/// Request to drive one actuator toward `target` under `criterion`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Command<V> {
    pub target: V,
    pub criterion: CompletionCriterion,
}

impl<V> Command<V> {
    pub fn new(target: V, criterion: CompletionCriterion) -> Self {
        Self { target, criterion }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CommandStatus {
    #[default]
    Pending,
    Finished,
}

/// A command bound to the position and value it started from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActiveCommand<V> {
    issued_at: Position,
    start_value: V,
    target: V,
    criterion: CompletionCriterion,
    status: CommandStatus,
}

impl<V: ActuatorValue> ActiveCommand<V> {
    pub fn issue(command: Command<V>, issued_at: Position, start_value: V) -> Self {
        Self {
            issued_at,
            start_value,
            target: command.target,
            criterion: command.criterion.resolve(issued_at.iteration),
            status: CommandStatus::Pending,
        }
    }

    pub fn status(&self) -> CommandStatus {
        self.status
    }

    pub fn is_finished(&self) -> bool {
        self.status == CommandStatus::Finished
    }

    pub fn issued_at(&self) -> Position {
        self.issued_at
    }

    pub fn start_value(&self) -> V {
        self.start_value
    }

    pub fn target(&self) -> V {
        self.target
    }

    /// Criterion with relative iteration targets already resolved.
    pub fn criterion(&self) -> CompletionCriterion {
        self.criterion
    }

    /// Desired value at `now`. Once finished the command stays finished and holds its
    /// target, whatever `now` is.
    pub fn step(&mut self, now: Position, current: V, previous_desired: V) -> Interpolation<V> {
        if self.is_finished() {
            return Interpolation {
                desired: self.target,
                finished: true,
            };
        }
        let values = Endpoints {
            start: self.start_value,
            current,
            previous_desired,
            target: self.target,
        };
        let out = interpolation::interpolate(self.issued_at, now, &values, &self.criterion);
        if out.finished {
            self.status = CommandStatus::Finished;
        }
        out
    }
}

/// At most one in-flight command for a single actuator.
///
/// A newly issued command replaces the active one and starts from the last desired
/// value, so trajectories stay continuous when commands are superseded.
#[derive(Debug, Clone)]
pub struct ActuatorChannel<V> {
    active: Option<ActiveCommand<V>>,
    last_desired: Option<V>,
    completed: u64,
}

impl<V> Default for ActuatorChannel<V> {
    fn default() -> Self {
        Self {
            active: None,
            last_desired: None,
            completed: 0,
        }
    }
}

impl<V: ActuatorValue> ActuatorChannel<V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&mut self, command: Command<V>, now: Position, current: V) {
        if let Some(previous) = self.active.as_ref().filter(|c| !c.is_finished()) {
            log::debug!(
                "superseding pending command (target {:?}) issued at iteration {}",
                previous.target(),
                previous.issued_at().iteration.value()
            );
        }
        let start_value = self.last_desired.unwrap_or(current);
        self.active = Some(ActiveCommand::issue(command, now, start_value));
    }

    pub fn step(&mut self, now: Position, current: V) -> Interpolation<V> {
        let previous = self.last_desired.unwrap_or(current);
        let out = match self.active.as_mut() {
            Some(command) => {
                let was_pending = !command.is_finished();
                let out = command.step(now, current, previous);
                if was_pending && out.finished {
                    self.completed += 1;
                }
                out
            }
            None => Interpolation {
                desired: previous,
                finished: true,
            },
        };
        self.last_desired = Some(out.desired);
        out
    }

    pub fn active(&self) -> Option<&ActiveCommand<V>> {
        self.active.as_ref()
    }

    /// True when no command is pending.
    pub fn is_idle(&self) -> bool {
        self.active.as_ref().map_or(true, ActiveCommand::is_finished)
    }

    pub fn last_desired(&self) -> Option<V> {
        self.last_desired
    }

    /// Commands that reached completion on this channel.
    pub fn completed(&self) -> u64 {
        self.completed
    }
}
