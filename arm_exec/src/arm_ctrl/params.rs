//! Parameters structure for ArmCtrl

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use comms_if::eqpt::mech::{JointId, NUM_JOINTS};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for Arm control.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Params {
    // ---- GEOMETRY ----
    /// Height of the shoulder pivot above the arm frame origin.
    ///
    /// Units: inches
    pub base_height_in: f64,

    /// The length of the shoulder segment, from shoulder pivot to elbow pivot.
    ///
    /// Units: inches
    pub shoulder_length_in: f64,

    /// The length of the forearm, from elbow pivot to the gripper.
    ///
    /// Units: inches
    pub forearm_length_in: f64,

    // ---- CAPABILITIES ----
    /// Minimum joint angle (lowest negative value), indexed by joint.
    ///
    /// Units: radians
    pub min_angle_rad: [f64; NUM_JOINTS],

    /// Maximum joint angle (highest positive value), indexed by joint.
    ///
    /// Units: radians
    pub max_angle_rad: [f64; NUM_JOINTS],

    // ---- MANUAL CONTROL ----
    /// The joint moved directly by the operator's lateral axis.
    pub nudge_joint: JointId,

    /// Rate of the nudge joint at full axis deflection.
    ///
    /// Units: radians/second
    pub max_nudge_rate_rads: f64,

    /// Coordinates of the stowed starting pose.
    ///
    /// Units: inches
    pub starting_coords_in: [f64; 3],
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Params {
    /// Mechanical range of the given joint as `(min, max)`.
    pub fn range_of(&self, joint: JointId) -> (f64, f64) {
        (
            self.min_angle_rad[joint.index()],
            self.max_angle_rad[joint.index()],
        )
    }
}
