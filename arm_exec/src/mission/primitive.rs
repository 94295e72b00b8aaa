//! Mission primitives
//!
//! Every primitive follows the same contract: `start` is called once, then `tick` every cycle
//! while it is running, until it is finished or has failed. `cancel` may be called at any time.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::{debug, info, warn};
use std::fmt;

use crate::{
    arm::Arm,
    calib_ctrl::CalibStatus,
    mech_if::{Completable, DriveStatus},
    motion_seq::{AbortReason, CtrlOwner, MotionMode, MotionStatus, Target, TargetId},
};
use comms_if::eqpt::mech::JointId;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// What a primitive acts on during a cycle.
pub struct PrimitiveCtx<'a> {
    pub arm: &'a mut Arm,

    /// Current time.
    ///
    /// Units: seconds
    pub now_s: f64,
}

/// A named unit of mission work.
pub struct Primitive {
    name: String,
    kind: PrimitiveKind,
    state: PrimitiveState,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// The closed set of primitive variants.
pub enum PrimitiveKind {
    /// Move the gripper to a Cartesian target through the motion sequencer.
    ArmMove {
        target: Target,
        owner: CtrlOwner,
        id: Option<TargetId>,
    },

    /// Open or close the gripper.
    Gripper { close: bool },

    /// Home the given joints.
    Calibrate { joints: Vec<JointId> },

    /// Do nothing for a fixed time.
    Wait {
        duration_s: f64,
        end_s: Option<f64>,
    },

    /// A drive leg run by the drivetrain.
    Drive(Box<dyn Completable>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum PrimitiveState {
    /// Not yet started.
    Pending,
    Running,
    Finished,
    Failed(AbortCause),

    /// Never started because the mission was aborted.
    Aborted,
}

/// Why a primitive failed.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AbortCause {
    #[error("arm motion aborted ({0})")]
    Motion(AbortReason),

    #[error("target rejected ({0})")]
    TargetRejected(String),

    #[error("calibration of joint {0} failed")]
    Calibration(JointId),

    #[error("calibration request rejected")]
    CalibrationRejected,

    #[error("{0}")]
    Drive(String),

    #[error("cancelled")]
    Cancelled,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Primitive {
    pub fn new(name: impl Into<String>, kind: PrimitiveKind) -> Self {
        Self {
            name: name.into(),
            kind,
            state: PrimitiveState::Pending,
        }
    }

    /// Autonomous move to a target.
    pub fn arm_move(name: impl Into<String>, target: Target) -> Self {
        Self::new(
            name,
            PrimitiveKind::ArmMove {
                target: target.in_mode(MotionMode::Autonomous),
                owner: CtrlOwner::Mission,
                id: None,
            },
        )
    }

    pub fn gripper(name: impl Into<String>, close: bool) -> Self {
        Self::new(name, PrimitiveKind::Gripper { close })
    }

    pub fn calibrate(name: impl Into<String>, joints: Vec<JointId>) -> Self {
        Self::new(name, PrimitiveKind::Calibrate { joints })
    }

    pub fn wait(name: impl Into<String>, duration_s: f64) -> Self {
        Self::new(
            name,
            PrimitiveKind::Wait {
                duration_s,
                end_s: None,
            },
        )
    }

    pub fn drive(leg: Box<dyn Completable>) -> Self {
        Self::new(leg.name().to_string(), PrimitiveKind::Drive(leg))
    }

    /// Convert an arm move so that it is owned by the operator and must be refreshed every
    /// cycle. Other kinds are unchanged.
    pub fn into_teleop(mut self) -> Self {
        if let PrimitiveKind::ArmMove {
            ref mut target,
            ref mut owner,
            ..
        } = self.kind
        {
            *target = target.in_mode(MotionMode::Teleop);
            *owner = CtrlOwner::Teleop;
        }
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &PrimitiveKind {
        &self.kind
    }

    pub fn state(&self) -> &PrimitiveState {
        &self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == PrimitiveState::Running
    }

    pub fn is_finished(&self) -> bool {
        self.state == PrimitiveState::Finished
    }

    pub fn failure(&self) -> Option<&AbortCause> {
        match self.state {
            PrimitiveState::Failed(ref c) => Some(c),
            _ => None,
        }
    }

    /// Id of the sequencer target for a started arm move.
    pub fn target_id(&self) -> Option<TargetId> {
        match self.kind {
            PrimitiveKind::ArmMove { id, .. } => id,
            _ => None,
        }
    }

    /// Start the primitive. Only acts on a pending primitive.
    pub fn start(&mut self, ctx: &mut PrimitiveCtx) -> &PrimitiveState {
        if self.state != PrimitiveState::Pending {
            return &self.state;
        }

        let now_s = ctx.now_s;
        let result = match self.kind {
            PrimitiveKind::ArmMove {
                target,
                owner,
                ref mut id,
            } => match ctx.arm.set_target(target, owner, now_s) {
                Ok(i) => {
                    *id = Some(i);
                    Ok(())
                }
                Err(e) => Err(AbortCause::TargetRejected(e.to_string())),
            },
            PrimitiveKind::Gripper { close } => {
                ctx.arm.gripper.command(close, now_s);
                Ok(())
            }
            PrimitiveKind::Calibrate { ref joints } => {
                if ctx.arm.request_calibration(joints, now_s) {
                    Ok(())
                } else {
                    Err(AbortCause::CalibrationRejected)
                }
            }
            PrimitiveKind::Wait {
                duration_s,
                ref mut end_s,
            } => {
                *end_s = Some(now_s + duration_s);
                Ok(())
            }
            PrimitiveKind::Drive(ref mut leg) => {
                leg.start(now_s).map_err(|e| AbortCause::Drive(e.to_string()))
            }
        };

        self.state = match result {
            Ok(()) => {
                info!("Primitive {} started", self.name);
                PrimitiveState::Running
            }
            Err(cause) => {
                warn!("Primitive {} could not start: {}", self.name, cause);
                PrimitiveState::Failed(cause)
            }
        };

        &self.state
    }

    /// Poll the primitive. Only acts on a running primitive.
    pub fn tick(&mut self, ctx: &mut PrimitiveCtx) -> &PrimitiveState {
        if self.state != PrimitiveState::Running {
            return &self.state;
        }

        let now_s = ctx.now_s;
        let next = match self.kind {
            PrimitiveKind::ArmMove { id: Some(id), .. } => match ctx.arm.seq.status_of(id) {
                Some(MotionStatus::Converged) => Some(PrimitiveState::Finished),
                Some(MotionStatus::Aborted(r)) => {
                    Some(PrimitiveState::Failed(AbortCause::Motion(r)))
                }
                Some(MotionStatus::Idle) | Some(MotionStatus::Moving) => None,
                // Outcome has dropped out of the sequencer's history
                None => Some(PrimitiveState::Failed(AbortCause::Motion(
                    AbortReason::Cancelled,
                ))),
            },
            PrimitiveKind::ArmMove { id: None, .. } => Some(PrimitiveState::Failed(
                AbortCause::Motion(AbortReason::Cancelled),
            )),
            PrimitiveKind::Gripper { close } => {
                if ctx.arm.gripper.is_closed() != close {
                    Some(PrimitiveState::Failed(AbortCause::Cancelled))
                } else if ctx.arm.gripper.is_settled(now_s) {
                    Some(PrimitiveState::Finished)
                } else {
                    None
                }
            }
            PrimitiveKind::Calibrate { ref joints } => {
                let mut next = Some(PrimitiveState::Finished);
                for joint in joints.iter().copied() {
                    match ctx.arm.calib.status(joint) {
                        CalibStatus::Calibrated => (),
                        CalibStatus::Homing => {
                            if next == Some(PrimitiveState::Finished) {
                                next = None;
                            }
                        }
                        CalibStatus::Failed => {
                            next = Some(PrimitiveState::Failed(AbortCause::Calibration(joint)));
                            break;
                        }
                        CalibStatus::Idle => {
                            next = Some(PrimitiveState::Failed(AbortCause::Cancelled));
                            break;
                        }
                    }
                }
                next
            }
            PrimitiveKind::Wait { end_s, .. } => match end_s {
                Some(t) if now_s < t => None,
                _ => Some(PrimitiveState::Finished),
            },
            PrimitiveKind::Drive(ref mut leg) => match leg.tick(now_s) {
                DriveStatus::Running => None,
                DriveStatus::Finished => Some(PrimitiveState::Finished),
                DriveStatus::Failed(e) => Some(PrimitiveState::Failed(AbortCause::Drive(
                    e.to_string(),
                ))),
            },
        };

        if let Some(state) = next {
            match state {
                PrimitiveState::Failed(ref c) => warn!("Primitive {} failed: {}", self.name, c),
                _ => info!("Primitive {} finished", self.name),
            }
            self.state = state;
        }

        &self.state
    }

    /// Stop the primitive. A pending primitive is marked aborted, a running one is stopped
    /// and marked failed as cancelled.
    pub fn cancel(&mut self, ctx: &mut PrimitiveCtx) {
        match self.state {
            PrimitiveState::Pending => {
                self.state = PrimitiveState::Aborted;
                return;
            }
            PrimitiveState::Running => (),
            _ => return,
        }

        match self.kind {
            PrimitiveKind::ArmMove { id: Some(id), .. } => {
                ctx.arm.seq.cancel_target(id, AbortReason::Cancelled);
            }
            PrimitiveKind::Drive(ref mut leg) => leg.cancel(),
            // Homing and gripper actuation run to completion
            _ => (),
        }

        debug!("Primitive {} cancelled", self.name);
        self.state = PrimitiveState::Failed(AbortCause::Cancelled);
    }

    /// Mark a pending primitive as never started.
    pub(crate) fn mark_aborted(&mut self) {
        if self.state == PrimitiveState::Pending {
            self.state = PrimitiveState::Aborted;
        }
    }
}

impl fmt::Debug for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Primitive")
            .field("name", &self.name)
            .field("state", &self.state)
            .finish()
    }
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}
