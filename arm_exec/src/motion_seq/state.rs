//! Implementations for the MotionSequencer state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, info, warn};
use serde::Serialize;
use std::collections::VecDeque;

// Internal
use super::{AbortReason, CtrlOwner, MotionMode, MotionSeqError, MotionStatus, Params, Target, TargetId};
use crate::{
    aim_assist::AimBias,
    arm_ctrl::{CartesianCoords, KinematicsConverter},
    joint_ctrl::{JointCtrlError, JointSet},
};
use util::maths::clamp_sym;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Per cycle convergence loop towards a Cartesian target.
#[derive(Debug, Clone)]
pub struct MotionSequencer {
    params: Params,

    active: Option<ActiveTarget>,

    next_id: u64,

    /// Outcomes of recently finished targets, oldest first
    outcomes: VecDeque<(TargetId, MotionStatus)>,

    report: StatusReport,
}

#[derive(Debug, Clone, Copy)]
struct ActiveTarget {
    id: TargetId,
    target: Target,
    owner: CtrlOwner,
    accepted_s: f64,

    /// Set when a teleop target has been refreshed since the last cycle
    refreshed: bool,
}

/// Status report for motion sequencer processing.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct StatusReport {
    /// The target processed this cycle
    pub target_id: Option<TargetId>,

    pub status: MotionStatus,

    /// Gripper position at the start of the cycle
    pub pose_in: [f64; 3],

    /// Error from the pose to the (biased) goal
    pub error_in: [f64; 3],

    /// True if the step was reduced for fine positioning
    pub fine: bool,

    /// The waypoint commanded this cycle
    pub waypoint_in: Option<[f64; 3]>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for StatusReport {
    fn default() -> Self {
        Self {
            target_id: None,
            status: MotionStatus::Idle,
            pose_in: [0.0; 3],
            error_in: [0.0; 3],
            fine: false,
            waypoint_in: None,
        }
    }
}

impl MotionSequencer {
    pub fn new(params: Params) -> Self {
        Self {
            params,
            active: None,
            next_id: 0,
            outcomes: VecDeque::new(),
            report: StatusReport::default(),
        }
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn report(&self) -> &StatusReport {
        &self.report
    }

    /// The active target, its owner and its id.
    pub fn active(&self) -> Option<(TargetId, &Target, CtrlOwner)> {
        self.active.as_ref().map(|a| (a.id, &a.target, a.owner))
    }

    /// Accept a new target, superseding any active target of equal or lower priority.
    pub fn set_target(
        &mut self,
        target: Target,
        owner: CtrlOwner,
        now_s: f64,
    ) -> Result<TargetId, MotionSeqError> {
        if !target.coords_in.iter().all(|v| v.is_finite()) {
            return Err(MotionSeqError::NonFiniteTarget);
        }

        if let Some(active) = self.active {
            if active.owner > owner {
                return Err(MotionSeqError::Outranked {
                    active: active.owner,
                    requested: owner,
                });
            }
        }

        if let Some(old) = self.active.take() {
            self.finish(old, MotionStatus::Aborted(AbortReason::Superseded));
        }

        let id = TargetId(self.next_id);
        self.next_id += 1;

        info!(
            "Target {} accepted from {:?}: ({:.2}, {:.2}, {:.2}) in, {:?}",
            id,
            owner,
            target.coords_in.x,
            target.coords_in.y,
            target.coords_in.z,
            target.mode
        );

        self.active = Some(ActiveTarget {
            id,
            target,
            owner,
            accepted_s: now_s,
            refreshed: true,
        });

        Ok(id)
    }

    /// Refresh a teleop target so that it doesn't lapse this cycle.
    ///
    /// Returns false if the target is no longer active.
    pub fn refresh(&mut self, id: TargetId) -> bool {
        match self.active.as_mut() {
            Some(a) if a.id == id => {
                a.refreshed = true;
                true
            }
            _ => false,
        }
    }

    /// Cancel the active target, whoever owns it.
    pub fn cancel(&mut self, reason: AbortReason) -> Option<TargetId> {
        let active = self.active.take()?;
        let id = active.id;
        self.finish(active, MotionStatus::Aborted(reason));
        Some(id)
    }

    /// Cancel the given target if it is still active.
    pub fn cancel_target(&mut self, id: TargetId, reason: AbortReason) -> bool {
        match self.active {
            Some(a) if a.id == id => self.cancel(reason).is_some(),
            _ => false,
        }
    }

    /// Cancel the active target if `owner` has a higher priority than its owner.
    pub fn preempt(&mut self, owner: CtrlOwner, reason: AbortReason) -> Option<TargetId> {
        match self.active {
            Some(a) if owner > a.owner => self.cancel(reason),
            _ => None,
        }
    }

    /// Status of a target, `None` if the id is unknown or has dropped out of the history.
    pub fn status_of(&self, id: TargetId) -> Option<MotionStatus> {
        if let Some(a) = self.active {
            if a.id == id {
                return Some(MotionStatus::Moving);
            }
        }

        self.outcomes
            .iter()
            .rev()
            .find(|(i, _)| *i == id)
            .map(|(_, s)| *s)
    }

    /// Perform one cycle of the convergence loop.
    ///
    /// Joint targets are only changed if every joint accepts the new solution. If the solve fails
    /// the target is aborted and the joints keep their previous targets.
    pub fn step(
        &mut self,
        kin: &KinematicsConverter,
        joints: &mut JointSet,
        bias: AimBias,
        now_s: f64,
    ) -> StatusReport {
        let angles = joints.angles();
        let pose = kin.forward(&angles);

        self.report = StatusReport {
            pose_in: [pose.x, pose.y, pose.z],
            ..Default::default()
        };

        let mut active = match self.active.take() {
            Some(a) => a,
            None => return self.report,
        };
        self.report.target_id = Some(active.id);

        // ---- ABORT CONDITIONS ----

        let abort = if joints.first_fault().is_some() {
            Some(AbortReason::ActuatorFault)
        } else if joints.first_uncalibrated().is_some() {
            Some(AbortReason::NotCalibrated)
        } else if active
            .target
            .timeout_s
            .map(|t| now_s - active.accepted_s >= t)
            .unwrap_or(false)
        {
            Some(AbortReason::Timeout)
        } else if active.target.mode == MotionMode::Teleop && !active.refreshed {
            Some(AbortReason::Lapsed)
        } else {
            None
        };

        if let Some(reason) = abort {
            self.finish(active, MotionStatus::Aborted(reason));
            return self.report;
        }

        // ---- CONVERGENCE ----

        let mut goal = active.target.coords_in;
        if active.target.aim_assisted {
            goal.x += bias.lateral_in;
            goal.y += bias.vertical_in;
        }

        let error = goal - pose;
        self.report.error_in = [error.x, error.y, error.z];

        if error
            .iter()
            .zip(active.target.tolerance_in.iter())
            .all(|(e, tol)| e.abs() <= *tol)
        {
            self.finish(active, MotionStatus::Converged);
            return self.report;
        }

        // ---- WAYPOINT ----

        let scale = if error.norm() <= self.params.fine_radius_in {
            self.report.fine = true;
            self.params.fine_scale
        } else {
            1.0
        };
        let lateral_step = active.target.lateral_step_in * scale;
        let vertical_step = active.target.vertical_step_in * scale;

        let waypoint = pose
            + CartesianCoords::new(
                clamp_sym(error.x, lateral_step),
                clamp_sym(error.y, vertical_step),
                clamp_sym(error.z, lateral_step),
            );
        self.report.waypoint_in = Some([waypoint.x, waypoint.y, waypoint.z]);

        let solution = match kin.inverse(&waypoint, &angles) {
            Ok(s) => s,
            Err(e) => {
                warn!("Target {} aborted: {}", active.id, e);
                self.finish(active, MotionStatus::Aborted(AbortReason::OutOfRange));
                return self.report;
            }
        };

        if let Err(e) = joints.set_targets(&solution) {
            let reason = match e {
                JointCtrlError::ActuatorFault(_) => AbortReason::ActuatorFault,
                _ => AbortReason::NotCalibrated,
            };
            warn!("Target {} aborted: {}", active.id, e);
            self.finish(active, MotionStatus::Aborted(reason));
            return self.report;
        }

        debug!(
            "Target {} waypoint ({:.2}, {:.2}, {:.2}), error {:.3} in",
            active.id,
            waypoint.x,
            waypoint.y,
            waypoint.z,
            error.norm()
        );

        // Teleop targets must be refreshed again before the next cycle
        active.refreshed = false;
        self.active = Some(active);
        self.report.status = MotionStatus::Moving;

        self.report
    }

    /// Record the outcome of a target which is no longer active.
    fn finish(&mut self, active: ActiveTarget, status: MotionStatus) {
        match status {
            MotionStatus::Converged => info!("Target {} converged", active.id),
            MotionStatus::Aborted(reason) => info!("Target {} aborted: {}", active.id, reason),
            _ => (),
        }

        self.outcomes.push_back((active.id, status));
        while self.outcomes.len() > self.params.outcome_history.max(1) {
            self.outcomes.pop_front();
        }

        if self.report.target_id == Some(active.id) {
            self.report.status = status;
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test_params;
    use comms_if::eqpt::mech::{JointId, JointReading};

    fn setup() -> (KinematicsConverter, JointSet, MotionSequencer) {
        let p = test_params::load();
        let kin = KinematicsConverter::new(p.arm_ctrl.clone());
        let mut joints = JointSet::new(&p.joint_ctrl, &p.arm_ctrl);

        let start = kin
            .inverse(&kin.starting_coords(), &[0.0, 1.5, -2.0])
            .unwrap();
        for j in JointId::ALL {
            joints.get_mut(j).zero(start[j.index()], start[j.index()]);
        }
        joints.update(&start.map(|a| {
            Some(JointReading {
                angle_rad: a,
                ..Default::default()
            })
        }));

        (kin, joints, MotionSequencer::new(p.motion_seq))
    }

    /// Each joint covers half the distance to its target per cycle.
    fn plant(joints: &mut JointSet) {
        let readings = JointId::ALL.map(|j| {
            let c = joints.get(j);
            let a = c.state().angle_rad;
            let t = c.target().unwrap_or(a);
            Some(JointReading {
                angle_rad: a + 0.5 * (t - a),
                ..Default::default()
            })
        });
        joints.update(&readings);
    }

    #[test]
    fn test_converges_with_non_increasing_fine_error() {
        let (kin, mut joints, mut seq) = setup();
        let goal = kin.starting_coords() + CartesianCoords::new(2.0, -1.5, 3.0);

        let id = seq
            .set_target(
                Target::new(goal, seq.params()).with_tolerance([0.05; 3]),
                CtrlOwner::Mission,
                0.0,
            )
            .unwrap();

        let mut prev_error: Option<[f64; 3]> = None;
        let mut converged_at = None;

        for i in 0..200 {
            let rpt = seq.step(&kin, &mut joints, AimBias::default(), i as f64 * 0.02);

            if rpt.status == MotionStatus::Converged {
                converged_at = Some(i);
                break;
            }
            assert_eq!(rpt.status, MotionStatus::Moving);
            assert!(rpt.fine);

            if let Some(prev) = prev_error {
                for axis in 0..3 {
                    assert!(
                        rpt.error_in[axis].abs() <= prev[axis].abs() + 0.02,
                        "axis {} error grew from {} to {} at cycle {}",
                        axis,
                        prev[axis],
                        rpt.error_in[axis],
                        i
                    );
                }
            }
            prev_error = Some(rpt.error_in);

            plant(&mut joints);
        }

        assert!(converged_at.is_some());
        assert_eq!(seq.status_of(id), Some(MotionStatus::Converged));
        assert!(seq.active().is_none());
        assert!((kin.forward(&joints.angles()) - goal).norm() < 0.1);
    }

    #[test]
    fn test_out_of_range_leaves_joint_targets_untouched() {
        let (kin, mut joints, mut seq) = setup();
        let id = seq
            .set_target(
                Target::new(CartesianCoords::new(0.0, 24.0, 100.0), seq.params()),
                CtrlOwner::Mission,
                0.0,
            )
            .unwrap();

        let mut aborted = false;
        for i in 0..1000 {
            let before = joints.targets();
            let rpt = seq.step(&kin, &mut joints, AimBias::default(), i as f64 * 0.02);

            if rpt.status == MotionStatus::Aborted(AbortReason::OutOfRange) {
                assert_eq!(joints.targets(), before);
                // The arm made progress before running out of reach
                assert!(rpt.pose_in[2] > 40.0);
                aborted = true;
                break;
            }
            assert_eq!(rpt.status, MotionStatus::Moving);
            plant(&mut joints);
        }

        assert!(aborted);
        assert_eq!(
            seq.status_of(id),
            Some(MotionStatus::Aborted(AbortReason::OutOfRange))
        );
    }

    #[test]
    fn test_supersede_and_priority() {
        let (kin, _, mut seq) = setup();
        let t = Target::new(kin.starting_coords(), seq.params());

        let a = seq.set_target(t, CtrlOwner::Mission, 0.0).unwrap();
        let b = seq.set_target(t, CtrlOwner::Mission, 0.0).unwrap();
        assert_ne!(a, b);
        assert_eq!(
            seq.status_of(a),
            Some(MotionStatus::Aborted(AbortReason::Superseded))
        );
        assert_eq!(seq.status_of(b), Some(MotionStatus::Moving));

        // Teleop can't take over from a mission
        assert_eq!(
            seq.set_target(t, CtrlOwner::Teleop, 0.0),
            Err(MotionSeqError::Outranked {
                active: CtrlOwner::Mission,
                requested: CtrlOwner::Teleop
            })
        );

        // Teleop can't preempt, calibration can
        assert_eq!(seq.preempt(CtrlOwner::Teleop, AbortReason::Preempted), None);
        assert_eq!(seq.preempt(CtrlOwner::Calibration, AbortReason::Preempted), Some(b));
        assert_eq!(
            seq.status_of(b),
            Some(MotionStatus::Aborted(AbortReason::Preempted))
        );
    }

    #[test]
    fn test_teleop_target_lapses_without_refresh() {
        let (kin, mut joints, mut seq) = setup();
        let goal = kin.starting_coords() + CartesianCoords::new(0.0, 5.0, 0.0);
        let t = Target::new(goal, seq.params()).in_mode(MotionMode::Teleop);

        let id = seq.set_target(t, CtrlOwner::Teleop, 0.0).unwrap();
        assert_eq!(seq.step(&kin, &mut joints, AimBias::default(), 0.0).status, MotionStatus::Moving);

        assert!(seq.refresh(id));
        assert_eq!(seq.step(&kin, &mut joints, AimBias::default(), 0.02).status, MotionStatus::Moving);

        let rpt = seq.step(&kin, &mut joints, AimBias::default(), 0.04);
        assert_eq!(rpt.status, MotionStatus::Aborted(AbortReason::Lapsed));
        assert!(!seq.refresh(id));
    }

    #[test]
    fn test_timeout_and_calibration_aborts() {
        let (kin, mut joints, mut seq) = setup();
        let goal = kin.starting_coords() + CartesianCoords::new(0.0, 5.0, 0.0);
        let t = Target::new(goal, seq.params()).with_timeout(0.1);

        seq.set_target(t, CtrlOwner::Mission, 0.0).unwrap();
        assert_eq!(seq.step(&kin, &mut joints, AimBias::default(), 0.05).status, MotionStatus::Moving);
        assert_eq!(
            seq.step(&kin, &mut joints, AimBias::default(), 0.1).status,
            MotionStatus::Aborted(AbortReason::Timeout)
        );

        joints.get_mut(JointId::Elbow).begin_homing();
        seq.set_target(t, CtrlOwner::Mission, 1.0).unwrap();
        assert_eq!(
            seq.step(&kin, &mut joints, AimBias::default(), 1.02).status,
            MotionStatus::Aborted(AbortReason::NotCalibrated)
        );
    }

    #[test]
    fn test_aim_bias_shifts_goal() {
        let (kin, mut joints, mut seq) = setup();
        let t = Target::new(kin.starting_coords(), seq.params()).with_aim_assist(true);
        seq.set_target(t, CtrlOwner::Mission, 0.0).unwrap();

        let bias = AimBias {
            lateral_in: 3.0,
            vertical_in: 0.0,
        };
        let rpt = seq.step(&kin, &mut joints, bias, 0.0);
        assert_eq!(rpt.status, MotionStatus::Moving);
        assert!((rpt.error_in[0] - 3.0).abs() < 1e-6);
    }
}
