//! # Arm Telemetry
//!
//! A read only snapshot of the executable, built at the end of every cycle.

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use serde::Serialize;

use crate::{
    aim_assist::{self, AimBias},
    calib_ctrl::CalibStatus,
    exec::ExecMode,
    joint_ctrl::JointCtrl,
    motion_seq,
    teleop,
};
use comms_if::{
    eqpt::mech::{JointId, MechDems, NUM_JOINTS},
    tc::auto::Alliance,
};

// -----------------------------------------------------------------------------------------------
// STRUCTS
// -----------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct ArmTm {
    pub tick: u64,

    /// Units: seconds
    pub time_s: f64,

    pub mode: ExecMode,
    pub alliance: Alliance,
    pub emergency_stop: bool,

    pub joints: [JointTm; NUM_JOINTS],

    /// Gripper position at the start of the cycle.
    ///
    /// Units: inches
    pub pose_in: [f64; 3],

    pub motion: motion_seq::StatusReport,

    /// Demands written to the mechanisms this cycle
    pub dems: MechDems,

    pub aim_bias: AimBias,
    pub aim: aim_assist::StatusReport,
    pub vision_stale: bool,

    pub mission: Option<MissionTm>,

    pub teleop: teleop::StatusReport,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct JointTm {
    pub id: JointId,
    pub angle_rad: f64,
    pub rate_rads: f64,
    pub target_rad: Option<f64>,
    pub effort: f64,
    pub at_limit: bool,
    pub calib: CalibStatus,
    pub fault: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct MissionTm {
    pub name: String,

    /// Current step, if running
    pub step: Option<usize>,

    pub num_steps: usize,

    /// Human readable status
    pub status: String,
}

// -----------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// -----------------------------------------------------------------------------------------------

impl From<&JointCtrl> for JointTm {
    fn from(j: &JointCtrl) -> Self {
        let s = j.state();
        Self {
            id: j.id(),
            angle_rad: s.angle_rad,
            rate_rads: s.rate_rads,
            target_rad: j.target(),
            effort: j.effort(),
            at_limit: s.at_limit,
            calib: s.calib,
            fault: s.fault,
        }
    }
}

impl ArmTm {
    /// Joint targets, indexed by joint.
    pub fn targets(&self) -> [Option<f64>; NUM_JOINTS] {
        self.joints.map(|j| j.target_rad)
    }
}
