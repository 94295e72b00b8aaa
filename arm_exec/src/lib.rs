//! # Arm library.
//!
//! This library allows other crates in the workspace, and the scenario tests, to access items
//! defined inside the arm crate.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Aim assist - biases targets using the vision sensor's aiming offset
pub mod aim_assist;

/// The motion core acted on by primitives and the operator
pub mod arm;

/// Arm control - kinematics of the arm
pub mod arm_ctrl;

/// Calibration control - homes joints onto their limit switches
pub mod calib_ctrl;

/// Executive - runs all modules once per cycle
pub mod exec;

pub mod gripper;

/// Joint control - closed loop position control of each joint
pub mod joint_ctrl;

/// Interfaces to the actuators, sensors and drivetrain
pub mod mech_if;

/// Missions - composition and running of autonomous routines
pub mod mission;

/// Motion sequencer - drives the gripper towards a Cartesian target
pub mod motion_seq;

pub mod params;

/// Simulated actuators, sensors and drive legs
pub mod sim;

/// Teleoperation bindings
pub mod teleop;

/// Telemetry
pub mod tm;

#[cfg(test)]
pub(crate) mod test_params {
    use crate::params::ArmExecParams;

    /// Load the parameter files shipped in the workspace.
    pub fn load() -> ArmExecParams {
        ArmExecParams::load_from_dir(concat!(env!("CARGO_MANIFEST_DIR"), "/../params"))
            .expect("Could not load the workspace parameters")
    }
}
