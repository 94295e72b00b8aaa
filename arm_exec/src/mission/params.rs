//! Parameters structure for missions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for building missions.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct Params {
    /// Time allowed for an autonomous arm move to converge.
    ///
    /// Units: seconds
    pub arm_move_timeout_s: f64,

    /// Named arm positions, authored for the blue alliance.
    pub positions: BTreeMap<String, PositionParams>,
}

/// A named arm position.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionParams {
    /// Units: inches
    pub coords_in: [f64; 3],

    /// Step size on the x and z axes when moving to this position, if not the default.
    ///
    /// Units: inches
    #[serde(default)]
    pub lateral_step_in: Option<f64>,

    /// Step size on the y axis when moving to this position, if not the default.
    ///
    /// Units: inches
    #[serde(default)]
    pub vertical_step_in: Option<f64>,

    /// Whether moves to this position use the aim assist bias.
    #[serde(default)]
    pub aim_assisted: bool,
}
