//! Simulated arm

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::{debug, warn};

use super::SimParams;
use crate::mech_if::{MechIf, MechIfError};
use comms_if::eqpt::mech::{JointId, JointReading, NUM_JOINTS};
use util::maths::clamp_sym;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Joint plant which integrates the written effort over one cycle.
#[derive(Debug, Clone)]
pub struct SimArm {
    params: SimParams,

    /// Integration step, the cycle period.
    ///
    /// Units: seconds
    dt_s: f64,

    angle_rad: [f64; NUM_JOINTS],
    rate_rads: [f64; NUM_JOINTS],
    faults: [bool; NUM_JOINTS],
    gripper_closed: bool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SimArm {
    pub fn new(params: SimParams, dt_s: f64) -> Self {
        Self {
            angle_rad: params.initial_angle_rad,
            params,
            dt_s,
            rate_rads: [0.0; NUM_JOINTS],
            faults: [false; NUM_JOINTS],
            gripper_closed: false,
        }
    }

    /// True angles of the joints, which the arm software only sees through the encoder bias.
    pub fn true_angles(&self) -> [f64; NUM_JOINTS] {
        self.angle_rad
    }

    pub fn gripper_closed(&self) -> bool {
        self.gripper_closed
    }

    /// Make the joint's actuator report a fault until cleared.
    pub fn inject_fault(&mut self, joint: JointId) {
        warn!("Injecting fault into joint {}", joint);
        self.faults[joint.index()] = true;
        self.rate_rads[joint.index()] = 0.0;
    }

    pub fn clear_fault(&mut self, joint: JointId) {
        self.faults[joint.index()] = false;
    }

    fn at_limit(&self, joint: JointId) -> bool {
        let i = joint.index();
        (self.angle_rad[i] - self.params.switch_angle_rad[i]) * self.params.switch_direction[i]
            >= 0.0
    }
}

impl MechIf for SimArm {
    fn read(&mut self, joint: JointId) -> Result<JointReading, MechIfError> {
        let i = joint.index();
        if self.faults[i] {
            return Err(MechIfError::ActuatorFault(joint));
        }

        Ok(JointReading {
            angle_rad: self.angle_rad[i] + self.params.raw_bias_rad[i],
            rate_rads: self.rate_rads[i],
            at_limit: self.at_limit(joint),
        })
    }

    fn write(&mut self, joint: JointId, effort: f64) -> Result<(), MechIfError> {
        let i = joint.index();
        if self.faults[i] {
            return Err(MechIfError::ActuatorFault(joint));
        }

        let rate = clamp_sym(effort, 1.0) * self.params.max_rate_rads[i];
        let unbounded = self.angle_rad[i] + rate * self.dt_s;
        let bounded = unbounded
            .max(self.params.stop_min_rad[i])
            .min(self.params.stop_max_rad[i]);

        if bounded != unbounded {
            debug!("Joint {} against its hard stop", joint);
        }

        self.rate_rads[i] = (bounded - self.angle_rad[i]) / self.dt_s;
        self.angle_rad[i] = bounded;

        Ok(())
    }

    fn write_gripper(&mut self, closed: bool) -> Result<(), MechIfError> {
        self.gripper_closed = closed;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn params() -> SimParams {
        SimParams {
            max_rate_rads: [2.0; 3],
            stop_min_rad: [-1.0; 3],
            stop_max_rad: [1.0; 3],
            switch_angle_rad: [0.5, 0.5, -0.5],
            switch_direction: [1.0, 1.0, -1.0],
            initial_angle_rad: [0.0; 3],
            raw_bias_rad: [0.1, 0.2, 0.3],
            ..Default::default()
        }
    }

    #[test]
    fn test_integration_and_stops() {
        let mut arm = SimArm::new(params(), 0.1);

        arm.write(JointId::Turret, 0.5).unwrap();
        assert!((arm.true_angles()[0] - 0.1).abs() < 1e-12);

        let r = arm.read(JointId::Turret).unwrap();
        assert!((r.angle_rad - 0.2).abs() < 1e-12);
        assert!((r.rate_rads - 1.0).abs() < 1e-12);

        // Efforts beyond full scale are clamped
        for _ in 0..20 {
            arm.write(JointId::Turret, 5.0).unwrap();
        }
        assert_eq!(arm.true_angles()[0], 1.0);
        assert_eq!(arm.read(JointId::Turret).unwrap().rate_rads, 0.0);
    }

    #[test]
    fn test_limit_switch_direction() {
        let mut arm = SimArm::new(params(), 0.1);
        assert!(!arm.read(JointId::Elbow).unwrap().at_limit);

        for _ in 0..3 {
            arm.write(JointId::Elbow, -1.0).unwrap();
        }
        assert!(arm.read(JointId::Elbow).unwrap().at_limit);
        assert!(!arm.read(JointId::Shoulder).unwrap().at_limit);
    }

    #[test]
    fn test_fault() {
        let mut arm = SimArm::new(params(), 0.1);
        arm.inject_fault(JointId::Shoulder);
        assert_eq!(
            arm.read(JointId::Shoulder),
            Err(MechIfError::ActuatorFault(JointId::Shoulder))
        );
        assert!(arm.write(JointId::Shoulder, 1.0).is_err());

        arm.clear_fault(JointId::Shoulder);
        assert!(arm.read(JointId::Shoulder).is_ok());
    }
}
