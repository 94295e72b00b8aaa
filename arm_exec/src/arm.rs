//! # Arm
//!
//! Groups the parts of the motion core which primitives and operators act on: kinematics, joint
//! controllers, calibration, the motion sequencer and the gripper. The methods here keep the
//! joint controllers' view of calibration consistent with the calibration controller and apply
//! the ownership priority between emergency stop, calibration, missions and teleop.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::{error, info, warn};

use crate::{
    aim_assist::AimBias,
    arm_ctrl::{CartesianCoords, KinematicsConverter},
    calib_ctrl::{self, CalibCtrl, CalibEvent, CalibStatus},
    gripper::Gripper,
    joint_ctrl::JointSet,
    motion_seq::{self, AbortReason, CtrlOwner, MotionSeqError, MotionSequencer, Target, TargetId},
    params::ArmExecParams,
};
use comms_if::eqpt::mech::{JointId, JointReading, NUM_JOINTS};
use util::module::State;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The arm's motion core.
#[derive(Debug, Clone)]
pub struct Arm {
    pub kin: KinematicsConverter,

    pub joints: JointSet,

    pub calib: CalibCtrl,

    pub seq: MotionSequencer,

    pub gripper: Gripper,

    emergency_stop: bool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Arm {
    pub fn new(params: &ArmExecParams) -> Self {
        Self {
            kin: KinematicsConverter::new(params.arm_ctrl.clone()),
            joints: JointSet::new(&params.joint_ctrl, &params.arm_ctrl),
            calib: CalibCtrl::new(params.calib_ctrl.clone()),
            seq: MotionSequencer::new(params.motion_seq.clone()),
            gripper: Gripper::new(params.exec.gripper.clone()),
            emergency_stop: false,
        }
    }

    pub fn is_emergency_stopped(&self) -> bool {
        self.emergency_stop
    }

    /// Current gripper position from the joint angles.
    pub fn pose(&self) -> CartesianCoords {
        self.kin.forward(&self.joints.angles())
    }

    /// An autonomous target at the given coordinates with the sequencer's defaults.
    pub fn target_at(&self, coords_in: CartesianCoords) -> Target {
        Target::new(coords_in, self.seq.params())
    }

    /// Hand a target to the sequencer on behalf of `owner`.
    ///
    /// Rejected while emergency stopped or while any joint is uncalibrated, which includes joints
    /// that are homing.
    pub fn set_target(
        &mut self,
        target: Target,
        owner: CtrlOwner,
        now_s: f64,
    ) -> Result<TargetId, MotionSeqError> {
        if self.emergency_stop {
            return Err(MotionSeqError::EmergencyStop);
        }
        if let Some(joint) = self.joints.first_uncalibrated() {
            return Err(MotionSeqError::NotCalibrated(joint));
        }
        self.seq.set_target(target, owner, now_s)
    }

    /// Request (re)calibration of the given joints.
    ///
    /// Any active target is preempted. Ignored while emergency stopped.
    pub fn request_calibration(&mut self, joints: &[JointId], now_s: f64) -> bool {
        if self.emergency_stop {
            warn!("Calibration rejected, emergency stop is active");
            return false;
        }

        if let Some(id) = self.seq.preempt(CtrlOwner::Calibration, AbortReason::Preempted) {
            info!("Target {} preempted by calibration", id);
        }

        for joint in joints.iter().copied() {
            self.calib.request(joint, now_s);
            self.joints.get_mut(joint).begin_homing();
        }

        true
    }

    pub fn calib_status(&self) -> [CalibStatus; NUM_JOINTS] {
        JointId::ALL.map(|j| self.calib.status(j))
    }

    /// Run calibration for this cycle and apply its results to the joints.
    pub fn proc_calibration(
        &mut self,
        readings: &[Option<JointReading>; NUM_JOINTS],
        now_s: f64,
    ) -> calib_ctrl::StatusReport {
        let (output, report) = match self.calib.proc(&calib_ctrl::InputData {
            readings: *readings,
            now_s,
        }) {
            Ok(o) => o,
            Err(e) => match e {},
        };

        for event in output.events.iter() {
            match *event {
                CalibEvent::Calibrated {
                    joint,
                    raw_angle_rad,
                    home_angle_rad,
                } => self.joints.get_mut(joint).zero(home_angle_rad, raw_angle_rad),
                CalibEvent::Failed { joint, error } => {
                    error!("Joint {} is unusable until recalibrated: {}", joint, error);
                    self.joints.get_mut(joint).mark_failed();
                }
            }
        }

        for joint in JointId::ALL {
            if let Some(effort) = output.efforts[joint.index()] {
                if let Err(e) = self.joints.get_mut(joint).set_open_loop(effort) {
                    warn!("Homing effort rejected: {}", e);
                }
            }
        }

        report
    }

    /// Run one cycle of the motion sequencer.
    pub fn step_motion(&mut self, bias: AimBias, now_s: f64) -> motion_seq::StatusReport {
        self.seq.step(&self.kin, &mut self.joints, bias, now_s)
    }

    /// Stop all motion and hold every joint in place until cleared.
    pub fn emergency_stop(&mut self) {
        if !self.emergency_stop {
            error!("EMERGENCY STOP");
        }
        self.emergency_stop = true;

        self.seq.preempt(CtrlOwner::Safety, AbortReason::EmergencyStop);

        for joint in self.calib.cancel() {
            self.joints.get_mut(joint).cancel_homing();
        }

        self.joints.make_safe();
    }

    pub fn clear_emergency_stop(&mut self) {
        if self.emergency_stop {
            info!("Emergency stop cleared");
        }
        self.emergency_stop = false;
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test_params;

    #[test]
    fn test_emergency_stop_rejects_targets() {
        let params = test_params::load();
        let mut arm = Arm::new(&params);
        for j in JointId::ALL {
            arm.joints.get_mut(j).zero(params.calib_ctrl.home_angle_rad[j.index()], 0.0);
        }

        let t = arm.target_at(arm.kin.starting_coords());
        let id = arm.set_target(t, CtrlOwner::Mission, 0.0).unwrap();

        arm.emergency_stop();
        assert_eq!(
            arm.seq.status_of(id),
            Some(motion_seq::MotionStatus::Aborted(AbortReason::EmergencyStop))
        );
        assert_eq!(
            arm.set_target(t, CtrlOwner::Mission, 0.1),
            Err(MotionSeqError::EmergencyStop)
        );
        assert!(!arm.request_calibration(&JointId::ALL, 0.1));

        arm.clear_emergency_stop();
        assert!(arm.set_target(t, CtrlOwner::Mission, 0.2).is_ok());
    }

    #[test]
    fn test_calibration_preempts_and_blocks_targets() {
        let params = test_params::load();
        let mut arm = Arm::new(&params);
        for j in JointId::ALL {
            arm.joints.get_mut(j).zero(params.calib_ctrl.home_angle_rad[j.index()], 0.0);
        }

        let t = arm.target_at(arm.kin.starting_coords());
        let id = arm.set_target(t, CtrlOwner::Mission, 0.0).unwrap();

        assert!(arm.request_calibration(&[JointId::Shoulder], 0.0));
        assert_eq!(
            arm.seq.status_of(id),
            Some(motion_seq::MotionStatus::Aborted(AbortReason::Preempted))
        );
        assert_eq!(
            arm.set_target(t, CtrlOwner::Mission, 0.0),
            Err(MotionSeqError::NotCalibrated(JointId::Shoulder))
        );

        // Shoulder reaches its switch
        let mut readings = [Some(JointReading::default()); NUM_JOINTS];
        readings[1] = Some(JointReading {
            angle_rad: 0.4,
            rate_rads: 0.0,
            at_limit: true,
        });
        arm.proc_calibration(&readings, 0.02);

        assert_eq!(arm.calib.status(JointId::Shoulder), CalibStatus::Calibrated);
        assert_eq!(
            arm.joints.get(JointId::Shoulder).target(),
            Some(params.calib_ctrl.home_angle_rad[1])
        );
        assert!(arm.set_target(t, CtrlOwner::Mission, 0.04).is_ok());
    }
}
