//! The set of joint controllers making up the arm

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use super::{JointCtrl, JointCtrlError, JointTick, Params};
use crate::arm_ctrl::{self, JointAngles};
use comms_if::eqpt::mech::{JointId, JointReading, NUM_JOINTS};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// All of the arm's joint controllers, indexed by `JointId::index`.
#[derive(Debug, Clone)]
pub struct JointSet {
    joints: [JointCtrl; NUM_JOINTS],
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl JointSet {
    pub fn new(params: &Params, arm_params: &arm_ctrl::Params) -> Self {
        Self {
            joints: JointId::ALL
                .map(|id| JointCtrl::new(id, params.gains(id), arm_params.range_of(id))),
        }
    }

    pub fn get(&self, id: JointId) -> &JointCtrl {
        &self.joints[id.index()]
    }

    pub fn get_mut(&mut self, id: JointId) -> &mut JointCtrl {
        &mut self.joints[id.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = &JointCtrl> {
        self.joints.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut JointCtrl> {
        self.joints.iter_mut()
    }

    /// Current calibrated angle of every joint.
    pub fn angles(&self) -> JointAngles {
        JointId::ALL.map(|id| self.get(id).state().angle_rad)
    }

    /// Current target of every joint.
    pub fn targets(&self) -> [Option<f64>; NUM_JOINTS] {
        JointId::ALL.map(|id| self.get(id).target())
    }

    pub fn all_calibrated(&self) -> bool {
        self.joints.iter().all(|j| j.state().is_calibrated())
    }

    /// The first joint which isn't calibrated, if any.
    pub fn first_uncalibrated(&self) -> Option<JointId> {
        self.joints
            .iter()
            .find(|j| !j.state().is_calibrated())
            .map(|j| j.id())
    }

    /// The first joint with an actuator fault, if any.
    pub fn first_fault(&self) -> Option<JointId> {
        self.joints.iter().find(|j| j.state().fault).map(|j| j.id())
    }

    /// Update every joint from this cycle's sensor readings.
    pub fn update(&mut self, readings: &[Option<JointReading>; NUM_JOINTS]) {
        for (joint, reading) in self.joints.iter_mut().zip(readings.iter()) {
            joint.update(*reading);
        }
    }

    /// Set the target of every joint at once.
    ///
    /// Either every joint accepts its target or none of them are changed.
    pub fn set_targets(&mut self, angles: &JointAngles) -> Result<(), JointCtrlError> {
        for (joint, angle) in self.joints.iter().zip(angles.iter()) {
            if !angle.is_finite() {
                return Err(JointCtrlError::NonFiniteTarget(joint.id()));
            }
            joint.can_accept()?;
        }

        for (joint, angle) in self.joints.iter_mut().zip(angles.iter()) {
            joint.set_target(*angle)?;
        }

        Ok(())
    }

    /// Hold every joint where it currently is.
    pub fn make_safe(&mut self) {
        for joint in self.joints.iter_mut() {
            joint.make_safe();
        }
    }

    /// Compute this cycle's output for every joint.
    pub fn tick(&mut self, dt_s: f64) -> [JointTick; NUM_JOINTS] {
        let mut out = [JointTick::default(); NUM_JOINTS];
        for (o, joint) in out.iter_mut().zip(self.joints.iter_mut()) {
            *o = joint.tick(dt_s);
        }
        out
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test_params;

    #[test]
    fn test_set_targets_is_atomic() {
        let params = test_params::load();
        let mut joints = JointSet::new(&params.joint_ctrl, &params.arm_ctrl);

        joints.get_mut(JointId::Turret).zero(0.0, 0.0);
        joints.get_mut(JointId::Shoulder).zero(1.0, 1.0);

        // Elbow isn't calibrated so nothing may move
        assert_eq!(
            joints.set_targets(&[0.3, 1.2, -1.0]),
            Err(JointCtrlError::NotCalibrated(JointId::Elbow))
        );
        assert_eq!(joints.targets(), [Some(0.0), Some(1.0), None]);

        joints.get_mut(JointId::Elbow).zero(-1.5, -1.5);
        joints.set_targets(&[0.3, 1.2, -1.0]).unwrap();
        assert_eq!(joints.targets(), [Some(0.3), Some(1.2), Some(-1.0)]);
        assert!(joints.all_calibrated());
    }

    #[test]
    fn test_fault_detection() {
        let params = test_params::load();
        let mut joints = JointSet::new(&params.joint_ctrl, &params.arm_ctrl);

        let ok = Some(JointReading::default());
        joints.update(&[ok, None, ok]);
        assert_eq!(joints.first_fault(), Some(JointId::Shoulder));
        assert_eq!(joints.first_uncalibrated(), Some(JointId::Turret));

        joints.update(&[ok, ok, ok]);
        assert_eq!(joints.first_fault(), None);
    }
}
