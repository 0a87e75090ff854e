//! Command plans: a JSON list of phases executed one after the other.
//!
//! ```json
//! {"phases": [
//!   {"target": 20000, "criterion": {"speed": 4000}},
//!   {"actuators": [10000, 10000, 12000, 12000], "criterion": {"duration_ms": 500}},
//!   {"joints": [[15000, 10000], [10000, 15000]], "criterion": {"iteration": 200}}
//! ]}
//! ```
//!
//! `iteration` counts control cycles from the moment the phase is issued.

use crate::error::RuntimeError;
use pam_spine::joints::{self, JointPressures};
use pam_spine::{
    ActuatorState, CommandError, CompletionCriterion, DurationUs, IterationTarget, Speed,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlanError {
    #[error("plan has no phases")]
    Empty,
    #[error("phase {phase}: exactly one of `target`, `actuators`, `joints` must be given")]
    AmbiguousTargets { phase: usize },
    #[error("phase {phase}: exactly one of `duration_ms`, `iteration`, `speed` must be given")]
    AmbiguousCriterion { phase: usize },
    #[error("phase {phase}: expected {expected} actuator targets, got {got}")]
    WrongActuatorCount {
        phase: usize,
        expected: usize,
        got: usize,
    },
    #[error("phase {phase}: expected {expected} joints, got {got}")]
    WrongJointCount {
        phase: usize,
        expected: usize,
        got: usize,
    },
    #[error("phase {phase}: a zero speed never completes")]
    ZeroSpeed { phase: usize },
    #[error("phase {phase}: {source}")]
    Command {
        phase: usize,
        #[source]
        source: CommandError,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Plan {
    pub phases: Vec<Phase>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Phase {
    /// Same pressure for every actuator.
    pub target: Option<i32>,
    /// One pressure per actuator.
    pub actuators: Option<Vec<i32>>,
    /// `[agonist, antagonist]` per degree of freedom.
    pub joints: Option<Vec<[i32; 2]>>,
    pub criterion: PlanCriterion,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlanCriterion {
    pub duration_ms: Option<f64>,
    pub iteration: Option<i64>,
    pub speed: Option<f64>,
}

/// A phase ready to be issued to a robot with `N` actuators.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompiledPhase<const N: usize> {
    pub targets: [ActuatorState; N],
    pub criterion: CompletionCriterion,
}

impl Plan {
    pub fn load(path: &Path) -> Result<Self, RuntimeError> {
        let raw = std::fs::read_to_string(path).map_err(|source| RuntimeError::PlanIo {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self, RuntimeError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Up and down at a constant rate, then a timed co-contraction and release.
    pub fn demo() -> Self {
        let speed = PlanCriterion {
            speed: Some(4000.0),
            ..PlanCriterion::default()
        };
        Self {
            phases: vec![
                Phase::uniform(20000, speed),
                Phase::uniform(10000, speed),
                Phase {
                    target: None,
                    actuators: None,
                    joints: Some(vec![[15000, 10000], [10000, 15000], [15000, 10000], [10000, 15000]]),
                    criterion: PlanCriterion {
                        duration_ms: Some(500.0),
                        ..PlanCriterion::default()
                    },
                },
                Phase::uniform(
                    5000,
                    PlanCriterion {
                        iteration: Some(1000),
                        ..PlanCriterion::default()
                    },
                ),
            ],
        }
    }

    pub fn compile<const N: usize>(&self) -> Result<Vec<CompiledPhase<N>>, PlanError> {
        if self.phases.is_empty() {
            return Err(PlanError::Empty);
        }
        self.phases
            .iter()
            .enumerate()
            .map(|(index, phase)| phase.compile(index))
            .collect()
    }
}

impl Phase {
    pub fn uniform(target: i32, criterion: PlanCriterion) -> Self {
        Self {
            target: Some(target),
            actuators: None,
            joints: None,
            criterion,
        }
    }

    fn compile<const N: usize>(&self, phase: usize) -> Result<CompiledPhase<N>, PlanError> {
        Ok(CompiledPhase {
            targets: self.targets(phase)?,
            criterion: self.criterion.compile(phase)?,
        })
    }

    fn targets<const N: usize>(&self, phase: usize) -> Result<[ActuatorState; N], PlanError> {
        match (&self.target, &self.actuators, &self.joints) {
            (Some(target), None, None) => Ok([ActuatorState::new(*target); N]),
            (None, Some(values), None) => {
                if values.len() != N {
                    return Err(PlanError::WrongActuatorCount {
                        phase,
                        expected: N,
                        got: values.len(),
                    });
                }
                Ok(std::array::from_fn(|i| ActuatorState::new(values[i])))
            }
            (None, None, Some(pairs)) => {
                if pairs.len() * 2 != N {
                    return Err(PlanError::WrongJointCount {
                        phase,
                        expected: N / 2,
                        got: pairs.len(),
                    });
                }
                let mut targets = [ActuatorState::default(); N];
                for (dof, [agonist, antagonist]) in pairs.iter().copied().enumerate() {
                    let joint = JointPressures::new(
                        ActuatorState::new(agonist),
                        ActuatorState::new(antagonist),
                    );
                    joints::set_joint(&mut targets, dof, joint)
                        .map_err(|source| PlanError::Command { phase, source })?;
                }
                Ok(targets)
            }
            _ => Err(PlanError::AmbiguousTargets { phase }),
        }
    }
}

impl PlanCriterion {
    fn compile(&self, phase: usize) -> Result<CompletionCriterion, PlanError> {
        match (self.duration_ms, self.iteration, self.speed) {
            (Some(ms), None, None) => Ok(CompletionCriterion::Duration(DurationUs::from_secs_f64(
                ms / 1_000.0,
            ))),
            (None, Some(iterations), None) => Ok(CompletionCriterion::Iteration(
                IterationTarget::relative(iterations),
            )),
            (None, None, Some(units)) => {
                let speed =
                    Speed::per_second(units).map_err(|source| PlanError::Command { phase, source })?;
                if speed.is_zero() {
                    return Err(PlanError::ZeroSpeed { phase });
                }
                Ok(CompletionCriterion::Speed(speed))
            }
            _ => Err(PlanError::AmbiguousCriterion { phase }),
        }
    }
}
