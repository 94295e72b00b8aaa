//! Parameters structure for the MotionSequencer

use serde::{Deserialize, Serialize};

/// Parameters for the motion sequencer.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct Params {
    /// Default per axis convergence tolerance, (x, y, z).
    ///
    /// Units: inches
    pub tolerance_in: [f64; 3],

    /// Default maximum step per cycle on the lateral (x) and forward (z) axes.
    ///
    /// Units: inches
    pub lateral_step_in: f64,

    /// Default maximum step per cycle on the vertical (y) axis.
    ///
    /// Units: inches
    pub vertical_step_in: f64,

    /// Distance from the target within which fine positioning starts.
    ///
    /// Units: inches
    pub fine_radius_in: f64,

    /// Scale applied to the step sizes during fine positioning.
    pub fine_scale: f64,

    /// Number of finished targets whose outcome is kept for querying.
    pub outcome_history: usize,
}
