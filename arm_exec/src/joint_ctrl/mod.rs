//! Joint control module
//!
//! One closed loop position controller per arm joint. A joint only accepts position targets once
//! it has been calibrated; before that it can only be driven open loop by the calibration
//! controller.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;
mod pid;
mod set;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

pub use params::*;
pub use pid::*;
pub use set::*;
pub use state::*;

use comms_if::eqpt::mech::JointId;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur while commanding a joint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum JointCtrlError {
    #[error("Joint {0} is not calibrated")]
    NotCalibrated(JointId),

    #[error("Joint {0} has an actuator fault")]
    ActuatorFault(JointId),

    #[error("Joint {0} is not homing, open loop effort rejected")]
    NotHoming(JointId),

    #[error("Target for joint {0} is not a finite angle")]
    NonFiniteTarget(JointId),
}
