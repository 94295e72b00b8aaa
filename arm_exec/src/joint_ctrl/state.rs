//! Implementations for the JointCtrl state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, trace};
use serde::Serialize;

// Internal
use super::{JointCtrlError, JointGains, PidController};
use crate::calib_ctrl::CalibStatus;
use comms_if::eqpt::mech::{JointId, JointReading};
use util::maths::clamp_sym;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The state of a joint as seen in the current cycle.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct JointState {
    pub id: JointId,

    /// Calibrated angle, meaningless until the joint is calibrated.
    pub angle_rad: f64,

    pub rate_rads: f64,

    /// True while the joint's limit switch is pressed
    pub at_limit: bool,

    pub calib: CalibStatus,

    /// True if the joint's sensors could not be read this cycle
    pub fault: bool,
}

/// Closed loop position controller for a single joint.
#[derive(Debug, Clone)]
pub struct JointCtrl {
    gains: JointGains,

    range_rad: (f64, f64),

    pid: PidController,

    /// Raw sensor angle at which the calibrated angle is zero
    zero_offset_rad: f64,

    state: JointState,

    target_rad: Option<f64>,

    open_loop_effort: Option<f64>,

    last_effort: f64,
}

/// Output of one controller cycle.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct JointTick {
    /// Signed error between target and angle, `None` if the joint isn't under closed loop
    /// control
    pub error_rad: Option<f64>,

    /// Normalised effort to write to the actuator
    pub effort: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl JointState {
    pub fn is_calibrated(&self) -> bool {
        self.calib == CalibStatus::Calibrated
    }
}

impl JointCtrl {
    /// Create a new controller for the joint with the given mechanical range.
    pub fn new(id: JointId, gains: JointGains, range_rad: (f64, f64)) -> Self {
        Self {
            gains,
            range_rad,
            pid: PidController::new(
                gains.k_p,
                gains.k_i,
                gains.k_d,
                gains.integral_limit,
                gains.max_effort,
            ),
            zero_offset_rad: 0.0,
            state: JointState {
                id,
                angle_rad: 0.0,
                rate_rads: 0.0,
                at_limit: false,
                calib: CalibStatus::Idle,
                fault: false,
            },
            target_rad: None,
            open_loop_effort: None,
            last_effort: 0.0,
        }
    }

    pub fn id(&self) -> JointId {
        self.state.id
    }

    pub fn state(&self) -> &JointState {
        &self.state
    }

    pub fn target(&self) -> Option<f64> {
        self.target_rad
    }

    /// The effort demanded on the last tick.
    pub fn effort(&self) -> f64 {
        self.last_effort
    }

    /// True if the joint is calibrated and within tolerance of its target.
    pub fn on_target(&self) -> bool {
        match self.target_rad {
            Some(t) => {
                self.state.is_calibrated()
                    && (t - self.state.angle_rad).abs() <= self.gains.tolerance_rad
            }
            None => false,
        }
    }

    /// Update the joint's state from this cycle's sensor snapshot.
    ///
    /// A missing reading marks the joint as faulted, the last known angle is kept.
    pub fn update(&mut self, reading: Option<JointReading>) {
        match reading {
            Some(r) => {
                self.state.angle_rad = r.angle_rad - self.zero_offset_rad;
                self.state.rate_rads = r.rate_rads;
                self.state.at_limit = r.at_limit;
                self.state.fault = false;
            }
            None => {
                if !self.state.fault {
                    debug!("Joint {} has no sensor reading, marking as faulted", self.id());
                }
                self.state.rate_rads = 0.0;
                self.state.fault = true;
            }
        }
    }

    /// Check whether the joint can currently accept a closed loop target.
    pub fn can_accept(&self) -> Result<(), JointCtrlError> {
        if self.state.fault {
            return Err(JointCtrlError::ActuatorFault(self.id()));
        }
        if !self.state.is_calibrated() {
            return Err(JointCtrlError::NotCalibrated(self.id()));
        }
        Ok(())
    }

    /// Set the target angle of the joint.
    ///
    /// The target is clamped into the joint's mechanical range, the clamped target is returned.
    pub fn set_target(&mut self, angle_rad: f64) -> Result<f64, JointCtrlError> {
        if !angle_rad.is_finite() {
            return Err(JointCtrlError::NonFiniteTarget(self.id()));
        }
        self.can_accept()?;

        let clamped = angle_rad.max(self.range_rad.0).min(self.range_rad.1);
        self.target_rad = Some(clamped);

        Ok(clamped)
    }

    /// Start homing the joint, discarding any calibration and target.
    pub fn begin_homing(&mut self) {
        self.state.calib = CalibStatus::Homing;
        self.target_rad = None;
        self.open_loop_effort = None;
        self.pid.reset();
    }

    /// Set the open loop effort used while homing.
    pub fn set_open_loop(&mut self, effort: f64) -> Result<(), JointCtrlError> {
        if self.state.calib != CalibStatus::Homing {
            return Err(JointCtrlError::NotHoming(self.id()));
        }
        self.open_loop_effort = Some(clamp_sym(effort, 1.0));
        Ok(())
    }

    /// Establish the joint's zero reference.
    ///
    /// `raw_angle_rad` is the sensor angle at which the joint is known to be at `home_angle_rad`.
    /// The joint becomes calibrated and holds its home angle.
    pub fn zero(&mut self, home_angle_rad: f64, raw_angle_rad: f64) {
        self.zero_offset_rad = raw_angle_rad - home_angle_rad;
        self.state.angle_rad = home_angle_rad;
        self.state.calib = CalibStatus::Calibrated;
        self.open_loop_effort = None;
        self.target_rad = Some(home_angle_rad);
        self.pid.reset();
    }

    /// Mark calibration of the joint as failed, the joint no longer accepts targets.
    pub fn mark_failed(&mut self) {
        self.state.calib = CalibStatus::Failed;
        self.open_loop_effort = None;
        self.target_rad = None;
        self.pid.reset();
    }

    /// Abandon homing, returning the joint to an uncalibrated idle state.
    pub fn cancel_homing(&mut self) {
        if self.state.calib == CalibStatus::Homing {
            self.state.calib = CalibStatus::Idle;
            self.open_loop_effort = None;
        }
    }

    /// Hold the joint where it currently is.
    pub fn make_safe(&mut self) {
        if self.state.is_calibrated() {
            self.target_rad = Some(
                self.state
                    .angle_rad
                    .max(self.range_rad.0)
                    .min(self.range_rad.1),
            );
        }
        self.open_loop_effort = None;
    }

    /// Compute the effort for this cycle.
    pub fn tick(&mut self, dt_s: f64) -> JointTick {
        let out = if self.state.fault {
            self.pid.reset();
            JointTick::default()
        } else {
            match (self.state.calib, self.target_rad) {
                (CalibStatus::Calibrated, Some(target)) => {
                    let error = target - self.state.angle_rad;
                    JointTick {
                        error_rad: Some(error),
                        effort: self.pid.get(error, dt_s),
                    }
                }
                (CalibStatus::Homing, _) => JointTick {
                    error_rad: None,
                    effort: self.open_loop_effort.unwrap_or(0.0),
                },
                _ => JointTick::default(),
            }
        };

        trace!("Joint {} tick: {:?}", self.id(), out);

        self.last_effort = out.effort;
        out
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn gains() -> JointGains {
        JointGains {
            k_p: 2.0,
            k_i: 0.0,
            k_d: 0.0,
            integral_limit: 0.5,
            max_effort: 1.0,
            tolerance_rad: 0.01,
        }
    }

    fn reading(angle_rad: f64) -> Option<JointReading> {
        Some(JointReading {
            angle_rad,
            rate_rads: 0.0,
            at_limit: false,
        })
    }

    #[test]
    fn test_rejects_targets_until_calibrated() {
        let mut j = JointCtrl::new(JointId::Shoulder, gains(), (-0.5, 2.5));
        j.update(reading(0.3));

        assert_eq!(
            j.set_target(1.0),
            Err(JointCtrlError::NotCalibrated(JointId::Shoulder))
        );
        assert_eq!(j.tick(0.02).effort, 0.0);

        j.begin_homing();
        assert_eq!(
            j.set_target(1.0),
            Err(JointCtrlError::NotCalibrated(JointId::Shoulder))
        );

        j.mark_failed();
        assert!(j.set_target(1.0).is_err());
        assert!(j.set_open_loop(0.2).is_err());
    }

    #[test]
    fn test_open_loop_only_while_homing() {
        let mut j = JointCtrl::new(JointId::Elbow, gains(), (-2.8, 2.8));
        j.update(reading(0.0));

        assert_eq!(
            j.set_open_loop(-0.3),
            Err(JointCtrlError::NotHoming(JointId::Elbow))
        );

        j.begin_homing();
        j.set_open_loop(-0.3).unwrap();
        let t = j.tick(0.02);
        assert_eq!(t.effort, -0.3);
        assert_eq!(t.error_rad, None);
    }

    #[test]
    fn test_zero_and_closed_loop() {
        let mut j = JointCtrl::new(JointId::Shoulder, gains(), (-0.5, 2.5));
        j.begin_homing();
        j.update(reading(3.2));

        // The limit is at 2.5 rad, the raw sensor reads 3.2 there
        j.zero(2.5, 3.2);
        assert_eq!(j.target(), Some(2.5));

        j.update(reading(3.2));
        assert!((j.state().angle_rad - 2.5).abs() < 1e-12);
        assert!(j.on_target());

        // Targets beyond the range are clamped
        assert_eq!(j.set_target(4.0), Ok(2.5));
        assert_eq!(j.set_target(1.5), Ok(1.5));

        let t = j.tick(0.02);
        assert!((t.error_rad.unwrap() + 1.0).abs() < 1e-12);
        assert!((t.effort + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_fault_gives_zero_effort() {
        let mut j = JointCtrl::new(JointId::Turret, gains(), (-3.0, 3.0));
        j.zero(0.0, 0.0);
        j.update(reading(0.0));
        j.set_target(0.5).unwrap();

        j.update(None);
        assert!(j.state().fault);
        assert_eq!(j.tick(0.02), JointTick::default());
        assert_eq!(
            j.set_target(0.1),
            Err(JointCtrlError::ActuatorFault(JointId::Turret))
        );

        j.update(reading(0.2));
        j.make_safe();
        assert_eq!(j.target(), Some(0.2));
    }
}
