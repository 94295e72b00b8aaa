//! Calibration control module
//!
//! The joints have relative encoders so on power up the arm doesn't know where it is. Each joint
//! is homed by driving it slowly towards its limit switch. When the switch closes the joint's
//! angle reference is zeroed at the known limit position. A joint which doesn't reach its switch
//! within the timeout is marked as failed and stays failed until calibration is requested again.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

pub use params::*;
pub use state::*;

use comms_if::eqpt::mech::JointId;
use serde::Serialize;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Calibration state of a joint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum CalibStatus {
    #[default]
    Idle,
    Homing,
    Calibrated,
    Failed,
}

/// Possible errors raised by calibration.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum CalibError {
    #[error("Joint {joint} did not reach its limit switch within {timeout_s} s")]
    CalibrationTimeout { joint: JointId, timeout_s: f64 },
}
