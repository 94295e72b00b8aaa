//! # Mechanisms equipment interface
//!
//! The arm has three actuated joints, a turret which yaws about the vertical axis, a shoulder
//! and an elbow, plus a two state gripper.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Number of actuated joints on the arm.
pub const NUM_JOINTS: usize = 3;

// ------------------------------------------------------------------------------------------------
// DATA STRUCTURES
// ------------------------------------------------------------------------------------------------

/// One sample of a joint's sensors.
#[derive(Debug, Copy, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JointReading {
    /// Raw encoder angle, before any calibration offset has been applied
    pub angle_rad: f64,

    /// Angular rate
    pub rate_rads: f64,

    /// True while the joint's limit switch is pressed
    pub at_limit: bool,
}

/// Demands sent to the mechanisms in one cycle.
#[derive(Debug, Copy, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MechDems {
    /// Normalised effort for each joint, in the range [-1, 1], indexed by `JointId::index`.
    pub efforts: [f64; NUM_JOINTS],

    /// True to close the gripper.
    pub gripper_closed: bool,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Identifies one of the arm's joints.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum JointId {
    Turret,
    Shoulder,
    Elbow,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("\"{0}\" is not a joint name, expected one of turret, shoulder or elbow")]
pub struct ParseJointIdError(String);

// ------------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// ------------------------------------------------------------------------------------------------

impl JointId {
    /// All joints, in index order.
    pub const ALL: [JointId; NUM_JOINTS] = [JointId::Turret, JointId::Shoulder, JointId::Elbow];

    /// Position of this joint in per-joint arrays.
    pub fn index(self) -> usize {
        match self {
            JointId::Turret => 0,
            JointId::Shoulder => 1,
            JointId::Elbow => 2,
        }
    }
}

impl fmt::Display for JointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl FromStr for JointId {
    type Err = ParseJointIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "turret" => Ok(JointId::Turret),
            "shoulder" => Ok(JointId::Shoulder),
            "elbow" => Ok(JointId::Elbow),
            _ => Err(ParseJointIdError(s.to_string())),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_joint_index_order() {
        for (i, j) in JointId::ALL.iter().enumerate() {
            assert_eq!(j.index(), i);
        }
    }

    #[test]
    fn test_joint_from_str() {
        assert_eq!("Elbow".parse::<JointId>(), Ok(JointId::Elbow));
        assert!("wrist".parse::<JointId>().is_err());
    }
}
