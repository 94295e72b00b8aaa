//! Arm control module
//!
//! Geometry of the arm and the conversions between Cartesian coordinates of the gripper and the
//! angles of the arm's joints.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod kinematics;
mod params;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
pub use kinematics::*;
pub use params::*;

use comms_if::eqpt::mech::NUM_JOINTS;

// ---------------------------------------------------------------------------
// TYPES
// ---------------------------------------------------------------------------

/// Position of the gripper in the arm frame, in inches.
///
/// `x` is lateral, `y` is vertical and `z` is forward. The origin is on the turret axis at the
/// level of the turret bearing.
pub type CartesianCoords = nalgebra::Vector3<f64>;

/// One angle per joint, indexed by `JointId::index`.
pub type JointAngles = [f64; NUM_JOINTS];

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during kinematics calculations.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum KinematicsError {
    #[error("Target ({:.2}, {:.2}, {:.2}) in is out of range: {reason}", .target_in[0], .target_in[1], .target_in[2])]
    OutOfRange {
        target_in: [f64; 3],
        reason: RangeViolation,
    },
}

/// The reason a target could not be reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, thiserror::Error)]
pub enum RangeViolation {
    #[error("beyond the reach of the arm")]
    TooFar,

    #[error("inside the minimum reach of the arm")]
    TooClose,

    #[error("every solution violates a joint limit")]
    JointLimits,

    #[error("target is not a finite point")]
    NonFinite,
}
