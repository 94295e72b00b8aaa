//! Targets for the motion sequencer

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Serialize;
use std::fmt;

use super::Params;
use crate::arm_ctrl::CartesianCoords;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Identifies a target accepted by the sequencer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TargetId(pub(crate) u64);

/// A Cartesian goal for the gripper.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Target {
    /// Goal position of the gripper.
    ///
    /// Units: inches
    pub coords_in: CartesianCoords,

    /// Convergence tolerance on each axis, (x, y, z).
    ///
    /// Units: inches
    pub tolerance_in: [f64; 3],

    /// Maximum step per cycle on the x and z axes.
    ///
    /// Units: inches
    pub lateral_step_in: f64,

    /// Maximum step per cycle on the y axis.
    ///
    /// Units: inches
    pub vertical_step_in: f64,

    pub mode: MotionMode,

    /// Time after which the target is aborted if it hasn't converged.
    ///
    /// Units: seconds
    pub timeout_s: Option<f64>,

    /// If true the aim assist bias is added onto the goal position.
    pub aim_assisted: bool,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Owners of arm motion, in increasing order of priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum CtrlOwner {
    Teleop,
    Mission,
    Calibration,
    Safety,
}

/// How a target is held.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MotionMode {
    /// Must be refreshed by its owner every cycle, otherwise it lapses.
    Teleop,

    /// Persists until it converges, is aborted or is cancelled.
    Autonomous,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl Target {
    /// An autonomous target using the sequencer's default tolerance and step sizes.
    pub fn new(coords_in: CartesianCoords, params: &Params) -> Self {
        Self {
            coords_in,
            tolerance_in: params.tolerance_in,
            lateral_step_in: params.lateral_step_in,
            vertical_step_in: params.vertical_step_in,
            mode: MotionMode::Autonomous,
            timeout_s: None,
            aim_assisted: false,
        }
    }

    pub fn with_steps(mut self, lateral_step_in: f64, vertical_step_in: f64) -> Self {
        self.lateral_step_in = lateral_step_in;
        self.vertical_step_in = vertical_step_in;
        self
    }

    pub fn with_tolerance(mut self, tolerance_in: [f64; 3]) -> Self {
        self.tolerance_in = tolerance_in;
        self
    }

    pub fn with_timeout(mut self, timeout_s: f64) -> Self {
        self.timeout_s = Some(timeout_s);
        self
    }

    pub fn with_aim_assist(mut self, aim_assisted: bool) -> Self {
        self.aim_assisted = aim_assisted;
        self
    }

    pub fn in_mode(mut self, mode: MotionMode) -> Self {
        self.mode = mode;
        self
    }
}
