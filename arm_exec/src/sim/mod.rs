//! # Simulation
//!
//! Simulated implementations of the external interfaces, used by the executable and by the
//! scenario tests. The arm is modelled as three rate limited joints with limit switches and hard
//! stops, vision as a list of scripted sample windows, and drive legs as fixed duration tasks.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod arm;
mod drive;
mod vision;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

pub use arm::*;
pub use drive::*;
pub use vision::*;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the simulation, each array is indexed by joint.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct SimParams {
    /// Joint rate at full effort.
    ///
    /// Units: radians/second
    pub max_rate_rads: [f64; 3],

    /// Lower hard stop of each joint.
    ///
    /// Units: radians
    pub stop_min_rad: [f64; 3],

    /// Upper hard stop of each joint.
    ///
    /// Units: radians
    pub stop_max_rad: [f64; 3],

    /// Angle at which each joint's limit switch triggers.
    ///
    /// Units: radians
    pub switch_angle_rad: [f64; 3],

    /// Side of the switch angle on which the switch is pressed, +1 or -1.
    pub switch_direction: [f64; 3],

    /// True angle of each joint at power on.
    ///
    /// Units: radians
    pub initial_angle_rad: [f64; 3],

    /// Offset of each joint's encoder from the true angle, unknown until calibrated.
    ///
    /// Units: radians
    pub raw_bias_rad: [f64; 3],

    /// Windows in which the vision sensor sees a target.
    #[serde(default)]
    pub vision: Vec<VisionWindow>,

    /// Drive legs available to missions.
    #[serde(default)]
    pub drive_legs: Vec<DriveLegParams>,
}
