//! Implementations for the CalibCtrl state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{error, info};
use serde::Serialize;

// Internal
use super::{CalibError, CalibStatus, Params};
use comms_if::eqpt::mech::{JointId, JointReading, NUM_JOINTS};
use util::module::State;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Calibration control module state
#[derive(Debug, Default, Clone)]
pub struct CalibCtrl {
    pub(crate) params: Params,

    pub(crate) report: StatusReport,

    status: [CalibStatus; NUM_JOINTS],

    /// Time at which each homing joint started homing
    homing_start_s: [Option<f64>; NUM_JOINTS],
}

/// Input data to calibration control.
#[derive(Debug, Clone, Copy)]
pub struct InputData {
    /// Raw sensor readings for each joint, `None` if a joint couldn't be read.
    pub readings: [Option<JointReading>; NUM_JOINTS],

    pub now_s: f64,
}

/// Output of calibration control.
#[derive(Debug, Clone, Default)]
pub struct OutputData {
    /// Open loop effort for each joint which is homing.
    pub efforts: [Option<f64>; NUM_JOINTS],

    /// Transitions which happened this cycle.
    pub events: Vec<CalibEvent>,
}

/// A calibration transition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CalibEvent {
    /// The joint reached its limit switch.
    Calibrated {
        joint: JointId,
        raw_angle_rad: f64,
        home_angle_rad: f64,
    },

    /// The joint failed to calibrate. Raised once per calibration request.
    Failed { joint: JointId, error: CalibError },
}

/// Status report for CalibCtrl processing.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct StatusReport {
    pub status: [CalibStatus; NUM_JOINTS],

    /// Time spent homing by each joint that is homing
    pub homing_time_s: [Option<f64>; NUM_JOINTS],
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl State for CalibCtrl {
    type InitData = Params;
    type InitError = std::convert::Infallible;

    type InputData = InputData;
    type OutputData = OutputData;
    type StatusReport = StatusReport;
    type ProcError = std::convert::Infallible;

    /// Initialise the CalibCtrl module with its parameters.
    ///
    /// Every joint starts idle, i.e. uncalibrated.
    fn init(&mut self, init_data: Self::InitData) -> Result<(), Self::InitError> {
        self.params = init_data;
        self.status = [CalibStatus::Idle; NUM_JOINTS];
        self.homing_start_s = [None; NUM_JOINTS];
        self.report = StatusReport::default();
        Ok(())
    }

    /// Perform cyclic processing of calibration control.
    fn proc(
        &mut self,
        input_data: &Self::InputData,
    ) -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError> {
        let mut output = OutputData::default();
        self.report = StatusReport::default();

        for joint in JointId::ALL.iter().copied() {
            let i = joint.index();

            if self.status[i] != CalibStatus::Homing {
                continue;
            }

            let start_s = *self.homing_start_s[i].get_or_insert(input_data.now_s);
            let elapsed_s = input_data.now_s - start_s;

            match input_data.readings[i] {
                Some(r) if r.at_limit => {
                    info!(
                        "Joint {} reached its limit after {:.2} s, calibrated",
                        joint, elapsed_s
                    );
                    self.status[i] = CalibStatus::Calibrated;
                    self.homing_start_s[i] = None;
                    output.events.push(CalibEvent::Calibrated {
                        joint,
                        raw_angle_rad: r.angle_rad,
                        home_angle_rad: self.params.home_angle_rad[i],
                    });
                }
                _ if elapsed_s >= self.params.timeout_s => {
                    let error = CalibError::CalibrationTimeout {
                        joint,
                        timeout_s: self.params.timeout_s,
                    };
                    error!("Calibration failed: {}", error);
                    self.status[i] = CalibStatus::Failed;
                    self.homing_start_s[i] = None;
                    output.events.push(CalibEvent::Failed { joint, error });
                }
                _ => {
                    output.efforts[i] = Some(self.params.homing_effort[i]);
                    self.report.homing_time_s[i] = Some(elapsed_s);
                }
            }
        }

        self.report.status = self.status;

        Ok((output, self.report))
    }
}

impl CalibCtrl {
    /// Create a calibration controller with every joint idle.
    pub fn new(params: Params) -> Self {
        let mut ctrl = Self::default();
        // Infallible
        let _ = ctrl.init(params);
        ctrl
    }

    /// Request (re)calibration of a joint, which starts homing on the next cycle.
    pub fn request(&mut self, joint: JointId, now_s: f64) {
        info!("Calibration of joint {} requested", joint);
        self.status[joint.index()] = CalibStatus::Homing;
        self.homing_start_s[joint.index()] = Some(now_s);
    }

    /// Abandon homing of every joint, homing joints return to idle.
    pub fn cancel(&mut self) -> Vec<JointId> {
        let mut cancelled = Vec::new();
        for joint in JointId::ALL.iter().copied() {
            if self.status[joint.index()] == CalibStatus::Homing {
                info!("Homing of joint {} cancelled", joint);
                self.status[joint.index()] = CalibStatus::Idle;
                self.homing_start_s[joint.index()] = None;
                cancelled.push(joint);
            }
        }
        cancelled
    }

    pub fn status(&self, joint: JointId) -> CalibStatus {
        self.status[joint.index()]
    }

    pub fn is_homing(&self) -> bool {
        self.status.iter().any(|s| *s == CalibStatus::Homing)
    }
}
