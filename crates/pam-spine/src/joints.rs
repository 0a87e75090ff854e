//! Agonist/antagonist pairing of actuators.
//!
//! Each degree of freedom is driven by two muscles: actuator `2 * dof` is the agonist and
//! actuator `2 * dof + 1` the antagonist.

use crate::error::CommandError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Muscle {
    Agonist,
    Antagonist,
}

impl Muscle {
    pub fn of(actuator: usize) -> Self {
        if actuator % 2 == 0 {
            Self::Agonist
        } else {
            Self::Antagonist
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Agonist => "agonist",
            Self::Antagonist => "antagonist",
        }
    }
}

#[inline]
pub fn actuator_index(dof: usize, muscle: Muscle) -> usize {
    match muscle {
        Muscle::Agonist => 2 * dof,
        Muscle::Antagonist => 2 * dof + 1,
    }
}

#[inline]
pub fn dof_of(actuator: usize) -> usize {
    actuator / 2
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct JointPressures<V> {
    pub agonist: V,
    pub antagonist: V,
}

impl<V: Copy> JointPressures<V> {
    pub fn new(agonist: V, antagonist: V) -> Self {
        Self {
            agonist,
            antagonist,
        }
    }

    pub fn get(&self, muscle: Muscle) -> V {
        match muscle {
            Muscle::Agonist => self.agonist,
            Muscle::Antagonist => self.antagonist,
        }
    }
}

/// Joint view of an actuator array; a trailing unpaired actuator is ignored.
pub fn joints<V: Copy>(actuators: &[V]) -> impl Iterator<Item = JointPressures<V>> + '_ {
    actuators
        .chunks_exact(2)
        .map(|pair| JointPressures::new(pair[0], pair[1]))
}

/// Write one joint into an actuator array.
pub fn set_joint<V: Copy>(
    actuators: &mut [V],
    dof: usize,
    joint: JointPressures<V>,
) -> Result<(), CommandError> {
    let antagonist = actuator_index(dof, Muscle::Antagonist);
    if antagonist >= actuators.len() {
        return Err(CommandError::ActuatorOutOfRange {
            index: antagonist,
            count: actuators.len(),
        });
    }
    actuators[actuator_index(dof, Muscle::Agonist)] = joint.agonist;
    actuators[antagonist] = joint.antagonist;
    Ok(())
}
