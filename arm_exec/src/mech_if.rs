//! # External interfaces
//!
//! Traits at the boundary between the arm software and the things it doesn't own: the arm's
//! actuators and sensors, the vision sensor, and the drivetrain's trajectory follower. The
//! executable runs against the simulated implementations in `sim`; hardware implementations
//! provide the same traits.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use comms_if::eqpt::{
    mech::{JointId, JointReading},
    vision::TargetOffset,
};

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// Actuator and sensor interface to the arm.
pub trait MechIf {
    /// Read the sensors of one joint.
    fn read(&mut self, joint: JointId) -> Result<JointReading, MechIfError>;

    /// Write a normalised effort, in [-1, 1], to a joint.
    fn write(&mut self, joint: JointId, effort: f64) -> Result<(), MechIfError>;

    /// Open or close the gripper.
    fn write_gripper(&mut self, closed: bool) -> Result<(), MechIfError>;
}

/// Interface to the vision sensor.
pub trait VisionIf {
    /// Latest aiming offset, `None` if no target is in view. Not an error.
    fn get_target_offset(&mut self, now_s: f64) -> Option<TargetOffset>;
}

/// A unit of work run by another subsystem, polled every cycle until it completes.
pub trait Completable {
    fn name(&self) -> &str;

    fn start(&mut self, now_s: f64) -> Result<(), DriveError>;

    fn tick(&mut self, now_s: f64) -> DriveStatus;

    fn cancel(&mut self);
}

/// Source of drive legs, looked up by name.
pub trait TrajectorySource {
    fn get(&self, name: &str) -> Option<Box<dyn Completable>>;
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Progress of a `Completable`.
#[derive(Debug, Clone, PartialEq)]
pub enum DriveStatus {
    Running,
    Finished,
    Failed(DriveError),
}

/// Errors raised by the mechanisms interface.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MechIfError {
    #[error("No response from joint {0}")]
    NoResponse(JointId),

    #[error("Actuator fault reported by joint {0}")]
    ActuatorFault(JointId),

    #[error("Gripper did not accept the command")]
    Gripper,
}

/// Errors raised by a drive leg.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DriveError {
    #[error("Drive leg {0} could not be started: {1}")]
    StartRejected(String, String),

    #[error("Drive leg {0} failed: {1}")]
    Failed(String, String),
}
