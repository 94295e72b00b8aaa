//! # Vision equipment interface

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// DATA STRUCTURES
// ------------------------------------------------------------------------------------------------

/// An aiming offset reported by the vision sensor.
///
/// The biases are expressed in the arm frame: lateral maps onto the x axis and vertical onto the
/// y axis.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetOffset {
    /// Lateral correction to apply to the commanded position
    pub lateral_bias_in: f64,

    /// Vertical correction to apply to the commanded position
    pub vertical_bias_in: f64,

    /// Time at which the sample was captured, on the arm's clock.
    pub timestamp_s: f64,
}
