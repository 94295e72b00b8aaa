//! Parameters structure for CalibCtrl

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use comms_if::eqpt::mech::NUM_JOINTS;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for calibration control, each array is indexed by joint.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct Params {
    /// Open loop effort applied while homing. The sign selects the direction of the limit
    /// switch.
    pub homing_effort: [f64; NUM_JOINTS],

    /// Angle of the joint when its limit switch closes.
    ///
    /// Units: radians
    pub home_angle_rad: [f64; NUM_JOINTS],

    /// Maximum time a joint may spend homing before calibration fails.
    ///
    /// Units: seconds
    pub timeout_s: f64,
}
