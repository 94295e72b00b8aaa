//! # Arm Executive
//!
//! Runs every module once per cycle in a fixed order:
//!
//! - Sensor acquisition
//! - Aim assist
//! - Operator input
//! - Calibration
//! - Motion sequencing
//! - Joint control
//! - Actuator writes
//! - Mission advancement
//! - Telemetry
//!
//! All computation in a cycle works from the sensor snapshot taken at its start, and all
//! actuator writes happen after all computation. Time is counted in cycles, so a run is
//! repeatable for the same inputs.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::{debug, info, warn};
use serde::Serialize;

use crate::{
    aim_assist::{self, AimAssist, AimBias},
    arm::Arm,
    mech_if::{MechIf, TrajectorySource, VisionIf},
    mission::{
        missions, Catalog, MatchContext, MissionAbortError, MissionBuildError, MissionGraph,
        MissionRunner, MissionStatus, PrimitiveCtx,
    },
    params::ArmExecParams,
    teleop::{Teleop, TeleopAction},
    tm::{ArmTm, JointTm, MissionTm},
};
use comms_if::{
    eqpt::mech::{JointId, MechDems, NUM_JOINTS},
    input::OperatorInput,
    tc::auto::MissionName,
};
use util::{maths::clamp_sym, module::State};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The arm executive, generic over the external interfaces.
pub struct ArmExec<M, V, T> {
    params: ArmExecParams,

    ctx: MatchContext,

    arm: Arm,
    aim: AimAssist,
    teleop: Teleop,
    catalog: Catalog,

    mech: M,
    vision: V,
    trajectories: T,

    mode: ExecMode,

    mission: Option<MissionRunner>,

    /// Bias applied on the previous cycle, reused if aim assist fails
    aim_bias: AimBias,

    num_ticks: u64,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Who is driving the arm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExecMode {
    Autonomous,
    Teleop,
}

#[derive(Debug, thiserror::Error)]
pub enum ExecError {
    #[error("Could not build mission {0}: {1}")]
    MissionBuild(String, MissionBuildError),

    #[error("Missions cannot start while the emergency stop is active")]
    EmergencyStop,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl<M, V, T> ArmExec<M, V, T>
where
    M: MechIf,
    V: VisionIf,
    T: TrajectorySource,
{
    pub fn new(
        params: ArmExecParams,
        ctx: MatchContext,
        mech: M,
        vision: V,
        trajectories: T,
    ) -> Self {
        info!("Building the arm executive for the {:?} alliance", ctx.alliance);

        Self {
            arm: Arm::new(&params),
            aim: AimAssist::new(params.aim_assist.clone()),
            teleop: Teleop::new(params.teleop.clone()),
            catalog: Catalog::new(params.mission.clone(), params.motion_seq.clone(), ctx),
            params,
            ctx,
            mech,
            vision,
            trajectories,
            mode: ExecMode::Autonomous,
            mission: None,
            aim_bias: AimBias::default(),
            num_ticks: 0,
        }
    }

    /// Time of the current cycle.
    ///
    /// Units: seconds
    pub fn now_s(&self) -> f64 {
        self.num_ticks as f64 * self.params.exec.tick_period_s
    }

    pub fn num_ticks(&self) -> u64 {
        self.num_ticks
    }

    pub fn mode(&self) -> ExecMode {
        self.mode
    }

    pub fn arm(&self) -> &Arm {
        &self.arm
    }

    pub fn arm_mut(&mut self) -> &mut Arm {
        &mut self.arm
    }

    pub fn mech(&self) -> &M {
        &self.mech
    }

    pub fn mech_mut(&mut self) -> &mut M {
        &mut self.mech
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn mission(&self) -> Option<&MissionRunner> {
        self.mission.as_ref()
    }

    pub fn mission_status(&self) -> Option<&MissionStatus> {
        self.mission.as_ref().map(|m| m.status())
    }

    /// Build and start a named mission, replacing any running mission.
    pub fn start_mission(&mut self, name: MissionName) -> Result<(), ExecError> {
        let graph = missions::build(name, &self.catalog, &self.trajectories)
            .map_err(|e| ExecError::MissionBuild(name.as_str().to_string(), e))?;
        self.start_graph(name.as_str(), graph)
    }

    /// Start an already built mission graph, replacing any running mission.
    pub fn start_graph(&mut self, name: &str, graph: MissionGraph) -> Result<(), ExecError> {
        if self.arm.is_emergency_stopped() {
            return Err(ExecError::EmergencyStop);
        }

        self.cancel_mission(MissionAbortError::Interrupted);
        self.cancel_teleop();

        info!(
            "Starting mission {} ({} steps): {:?}",
            name,
            graph.num_steps(),
            graph.describe()
        );
        self.mode = ExecMode::Autonomous;
        self.mission = Some(MissionRunner::new(name, graph));

        Ok(())
    }

    /// Hand the arm to the operator, interrupting any running mission.
    pub fn enter_teleop(&mut self) {
        if self.mode != ExecMode::Teleop {
            info!("Entering teleop");
        }
        self.cancel_mission(MissionAbortError::Interrupted);
        self.mode = ExecMode::Teleop;
    }

    pub fn emergency_stop(&mut self) {
        self.arm.emergency_stop();
        self.cancel_mission(MissionAbortError::EmergencyStop);
        self.cancel_teleop();
    }

    pub fn clear_emergency_stop(&mut self) {
        self.arm.clear_emergency_stop();
    }

    pub fn request_calibration(&mut self, joints: &[JointId]) -> bool {
        let now_s = self.now_s();
        self.arm.request_calibration(joints, now_s)
    }

    /// Execute one cycle.
    pub fn tick(&mut self, input: &OperatorInput) -> ArmTm {
        let now_s = self.now_s();
        let dt_s = self.params.exec.tick_period_s;

        // ---- SENSOR ACQUISITION ----

        let mut readings = [None; NUM_JOINTS];
        for joint in JointId::ALL {
            match self.mech.read(joint) {
                Ok(r) => readings[joint.index()] = Some(r),
                Err(e) => {
                    if !self.arm.joints.get(joint).state().fault {
                        warn!("Could not read joint {}: {}", joint, e);
                    }
                }
            }
        }
        self.arm.joints.update(&readings);

        let sample = self.vision.get_target_offset(now_s);

        // ---- AIM ASSIST ----

        let (aim_bias, aim_rpt) = match self.aim.proc(&aim_assist::InputData { sample, now_s }) {
            Ok(o) => o,
            Err(e) => {
                warn!("Aim assist error, holding the previous bias: {}", e);
                (self.aim_bias, aim_assist::StatusReport::default())
            }
        };
        self.aim_bias = aim_bias;

        // ---- OPERATOR INPUT ----

        let teleop_rpt = {
            let mut ctx = PrimitiveCtx {
                arm: &mut self.arm,
                now_s,
            };
            self.teleop.handle(
                input,
                self.mode == ExecMode::Teleop,
                &mut ctx,
                &self.catalog,
                &self.trajectories,
                dt_s,
            )
        };
        if teleop_rpt.fired.contains(&TeleopAction::EmergencyStop) {
            self.cancel_mission(MissionAbortError::EmergencyStop);
        }

        // ---- CALIBRATION ----

        self.arm.proc_calibration(&readings, now_s);

        // ---- MOTION ----

        let motion_rpt = self.arm.step_motion(aim_bias, now_s);

        // ---- JOINT CONTROL ----

        let ticks = self.arm.joints.tick(dt_s);

        // ---- ACTUATOR WRITES ----

        let mut dems = MechDems {
            efforts: [0.0; NUM_JOINTS],
            gripper_closed: self.arm.gripper.is_closed(),
        };
        for joint in JointId::ALL {
            let effort = clamp_sym(ticks[joint.index()].effort, 1.0);
            dems.efforts[joint.index()] = effort;

            if readings[joint.index()].is_none() {
                continue;
            }
            if let Err(e) = self.mech.write(joint, effort) {
                warn!("Could not write to joint {}: {}", joint, e);
            }
        }
        if let Err(e) = self.mech.write_gripper(dems.gripper_closed) {
            warn!("Could not write to the gripper: {}", e);
        }

        // ---- MISSION ----

        {
            let mut ctx = PrimitiveCtx {
                arm: &mut self.arm,
                now_s,
            };
            if let Some(ref mut mission) = self.mission {
                mission.tick(&mut ctx);
            }
            self.teleop.tick_primitive(&mut ctx);
        }

        // ---- TELEMETRY ----

        let tm = ArmTm {
            tick: self.num_ticks,
            time_s: now_s,
            mode: self.mode,
            alliance: self.ctx.alliance,
            emergency_stop: self.arm.is_emergency_stopped(),
            joints: JointId::ALL.map(|j| JointTm::from(self.arm.joints.get(j))),
            pose_in: motion_rpt.pose_in,
            motion: motion_rpt,
            dems,
            aim_bias,
            vision_stale: aim_rpt.stale.is_some(),
            aim: aim_rpt,
            mission: self.mission.as_ref().map(|m| MissionTm {
                name: m.name().to_string(),
                step: match m.status() {
                    MissionStatus::Running { step } => Some(*step),
                    _ => None,
                },
                num_steps: m.num_steps(),
                status: match m.status() {
                    MissionStatus::Aborted(e) => format!("Aborted: {}", e),
                    s => format!("{:?}", s),
                },
            }),
            teleop: teleop_rpt,
        };

        debug!(
            "Cycle {} pose ({:.2}, {:.2}, {:.2}) {:?}",
            self.num_ticks, tm.pose_in[0], tm.pose_in[1], tm.pose_in[2], tm.motion.status
        );

        self.num_ticks += 1;

        tm
    }

    fn cancel_mission(&mut self, reason: MissionAbortError) {
        let now_s = self.now_s();
        if let Some(ref mut mission) = self.mission {
            let mut ctx = PrimitiveCtx {
                arm: &mut self.arm,
                now_s,
            };
            mission.cancel(&mut ctx, reason);
        }
    }

    fn cancel_teleop(&mut self) {
        let now_s = self.now_s();
        let mut ctx = PrimitiveCtx {
            arm: &mut self.arm,
            now_s,
        };
        self.teleop.cancel(&mut ctx);
    }
}
