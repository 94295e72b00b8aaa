//! Parameters structure for JointCtrl

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use comms_if::eqpt::mech::{JointId, NUM_JOINTS};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for joint control, each array is indexed by joint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Params {
    // ---- CONTROLLER GAINS ----
    /// Proportional gain, effort per radian
    pub k_p: [f64; NUM_JOINTS],

    /// Integral gain
    pub k_i: [f64; NUM_JOINTS],

    /// Derivative gain
    pub k_d: [f64; NUM_JOINTS],

    /// Maximum magnitude of the accumulated integral.
    ///
    /// Units: radian seconds
    pub integral_limit: [f64; NUM_JOINTS],

    // ---- LIMITS ----
    /// Maximum magnitude of the normalised effort the controller may demand, at most 1.
    pub max_effort: [f64; NUM_JOINTS],

    /// Error below which the joint is considered to be on target.
    ///
    /// Units: radians
    pub tolerance_rad: [f64; NUM_JOINTS],
}

/// The parameters for a single joint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JointGains {
    pub k_p: f64,
    pub k_i: f64,
    pub k_d: f64,
    pub integral_limit: f64,
    pub max_effort: f64,
    pub tolerance_rad: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Params {
    /// Extract the parameters of one joint.
    pub fn gains(&self, joint: JointId) -> JointGains {
        let i = joint.index();
        JointGains {
            k_p: self.k_p[i],
            k_i: self.k_i[i],
            k_d: self.k_d[i],
            integral_limit: self.integral_limit[i],
            max_effort: self.max_effort[i].min(1.0),
            tolerance_rad: self.tolerance_rad[i],
        }
    }
}
