//! # Arm Executable Parameters
//!
//! This module provides the parameters for the arm executable, gathered from one file per module
//! in the `params` directory.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::{
    aim_assist, arm_ctrl, calib_ctrl, gripper::GripperParams, joint_ctrl, mission, motion_seq,
    teleop::TeleopParams,
};
use util::params::LoadError;

pub use util::params::params_dir;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Parameters of every module in the executable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArmExecParams {
    pub arm_ctrl: arm_ctrl::Params,
    pub joint_ctrl: joint_ctrl::Params,
    pub calib_ctrl: calib_ctrl::Params,
    pub aim_assist: aim_assist::Params,
    pub motion_seq: motion_seq::Params,
    pub mission: mission::Params,
    pub teleop: TeleopParams,
    pub exec: ExecParams,
}

/// Parameters for the executable itself.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct ExecParams {
    /// Target period of one cycle.
    ///
    /// Units: seconds
    pub tick_period_s: f64,

    /// Number of cycles between telemetry saves
    pub tm_period_ticks: u64,

    /// Number of consecutive cycle overruns after which the executable stops
    pub max_consec_overruns: u64,

    pub gripper: GripperParams,
}

// ------------------------------------------------------------------------------------------------
// ENUMERATIONS
// ------------------------------------------------------------------------------------------------

/// Errors loading the executable's parameters.
#[derive(Debug, Error)]
pub enum ParamsError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("The tick period must be a positive number of seconds, found {0}")]
    InvalidTickPeriod(f64),
}

// ------------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// ------------------------------------------------------------------------------------------------

impl ArmExecParams {
    /// Load all parameters from the `params` directory of the software root.
    pub fn load() -> Result<Self, ParamsError> {
        Self::load_from_dir(params_dir()?)
    }

    /// Load all parameters from the given directory.
    pub fn load_from_dir<P: AsRef<Path>>(dir: P) -> Result<Self, ParamsError> {
        let dir = dir.as_ref();
        let params = Self {
            arm_ctrl: util::params::load_from_dir(dir, "arm_ctrl.toml")?,
            joint_ctrl: util::params::load_from_dir(dir, "joint_ctrl.toml")?,
            calib_ctrl: util::params::load_from_dir(dir, "calib_ctrl.toml")?,
            aim_assist: util::params::load_from_dir(dir, "aim_assist.toml")?,
            motion_seq: util::params::load_from_dir(dir, "motion_seq.toml")?,
            mission: util::params::load_from_dir(dir, "mission.toml")?,
            teleop: util::params::load_from_dir(dir, "teleop.toml")?,
            exec: util::params::load_from_dir(dir, "exec.toml")?,
        };

        params.exec.validate()?;
        Ok(params)
    }
}

impl ExecParams {
    /// Check values which the main loop cannot run with.
    pub fn validate(&self) -> Result<(), ParamsError> {
        // Upper bound keeps the period representable as a `Duration`
        if !(self.tick_period_s > 0.0 && self.tick_period_s < 3600.0) {
            return Err(ParamsError::InvalidTickPeriod(self.tick_period_s));
        }
        Ok(())
    }
}
