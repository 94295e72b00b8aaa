//! Motion sequencer module
//!
//! Drives the gripper towards a Cartesian target one bounded step per cycle. Each cycle the
//! current pose is computed from the joint angles, the error to the target is clamped into a
//! small waypoint, and the waypoint is converted into joint targets with inverse kinematics.
//! Close to the target the step is reduced for fine positioning.
//!
//! Only one target is active at a time. A new target supersedes the old one, and a higher
//! priority owner (calibration, safety) can preempt it.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;
mod state;
mod target;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

pub use params::*;
pub use state::*;
pub use target::*;

use comms_if::eqpt::mech::JointId;
use serde::Serialize;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Outcome of a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MotionStatus {
    /// No target is active
    Idle,

    /// Still converging
    Moving,

    /// Reached the target within tolerance
    Converged,

    /// Stopped before reaching the target
    Aborted(AbortReason),
}

/// Why a target was aborted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, thiserror::Error)]
pub enum AbortReason {
    #[error("target is out of range of the arm")]
    OutOfRange,

    #[error("a joint is not calibrated")]
    NotCalibrated,

    #[error("actuator fault")]
    ActuatorFault,

    #[error("timed out")]
    Timeout,

    #[error("cancelled")]
    Cancelled,

    #[error("superseded by a newer target")]
    Superseded,

    #[error("preempted by a higher priority owner")]
    Preempted,

    #[error("emergency stop")]
    EmergencyStop,

    #[error("teleop target was not refreshed")]
    Lapsed,
}

/// Errors raised when a target can't be accepted.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum MotionSeqError {
    #[error("Target coordinates are not finite")]
    NonFiniteTarget,

    #[error("Joint {0} is not calibrated")]
    NotCalibrated(JointId),

    #[error("Target owned by {active:?} cannot be replaced by {requested:?}")]
    Outranked {
        active: CtrlOwner,
        requested: CtrlOwner,
    },

    #[error("Emergency stop is active")]
    EmergencyStop,
}
