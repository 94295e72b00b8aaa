//! Mission runner
//!
//! Advances a `MissionGraph` once per cycle. A step's primitives are started on one cycle and
//! polled on the following cycles. The next step is started on the cycle after the one in which
//! the current step was seen to be finished.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::{error, info};

use super::{
    AbortCause, MissionAbortError, MissionGraph, Primitive, PrimitiveCtx, PrimitiveState, Step,
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct MissionRunner {
    name: String,

    steps: Vec<Step>,

    /// Index of the current step
    index: usize,

    /// True once the current step's primitives have been started
    step_started: bool,

    /// Background primitives still running
    background: Vec<Primitive>,

    /// Primitives left running after an abort, ticked until they finish under their own control
    orphans: Vec<Primitive>,

    status: MissionStatus,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum MissionStatus {
    NotStarted,
    Running { step: usize },
    Completed,
    Aborted(MissionAbortError),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl MissionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Aborted(_))
    }
}

impl MissionRunner {
    pub fn new(name: impl Into<String>, graph: MissionGraph) -> Self {
        Self {
            name: name.into(),
            steps: graph.steps,
            index: 0,
            step_started: false,
            background: Vec::new(),
            orphans: Vec::new(),
            status: MissionStatus::NotStarted,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn status(&self) -> &MissionStatus {
        &self.status
    }

    pub fn num_steps(&self) -> usize {
        self.steps.len()
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Primitives still running in the background or after an abort.
    pub fn num_detached(&self) -> usize {
        self.background.len() + self.orphans.len()
    }

    /// Advance the mission by one cycle.
    pub fn tick(&mut self, ctx: &mut PrimitiveCtx) -> &MissionStatus {
        match self.status {
            MissionStatus::Completed => return &self.status,
            MissionStatus::Aborted(_) => {
                self.tick_orphans(ctx);
                return &self.status;
            }
            MissionStatus::NotStarted => {
                info!(
                    "Mission {} started with {} steps",
                    self.name,
                    self.steps.len()
                );
                self.status = MissionStatus::Running { step: 0 };
            }
            MissionStatus::Running { .. } => (),
        }

        // ---- BACKGROUND ----

        let mut failure = None;
        for p in self.background.iter_mut() {
            let state = p.tick(ctx).clone();
            if let PrimitiveState::Failed(cause) = state {
                failure = Some((p.name().to_string(), cause));
                break;
            }
        }
        if let Some((primitive, cause)) = failure {
            self.abort(primitive, cause);
            return &self.status;
        }
        self.background.retain(|p| !p.is_finished());

        // ---- CURRENT STEP ----

        let num_steps = self.steps.len();
        if self.index < num_steps {
            let step = &mut self.steps[self.index];

            let mut failure = None;
            if !self.step_started {
                info!(
                    "Mission {} step {}/{}",
                    self.name,
                    self.index + 1,
                    num_steps
                );
                self.step_started = true;

                for p in step.blocking.iter_mut().chain(step.background.iter_mut()) {
                    let state = p.start(ctx).clone();
                    if let PrimitiveState::Failed(cause) = state {
                        failure = Some((p.name().to_string(), cause));
                        break;
                    }
                }

                self.background.append(&mut step.background);
            } else {
                for p in step.blocking.iter_mut() {
                    let state = p.tick(ctx).clone();
                    if let PrimitiveState::Failed(cause) = state {
                        failure = Some((p.name().to_string(), cause));
                        break;
                    }
                }

                if failure.is_none() && step.blocking.iter().all(|p| p.is_finished()) {
                    self.index += 1;
                    self.step_started = false;
                }
            }

            if let Some((primitive, cause)) = failure {
                self.abort(primitive, cause);
                return &self.status;
            }
        }

        // ---- COMPLETION ----

        if self.index >= self.steps.len() && self.background.is_empty() {
            info!("Mission {} completed", self.name);
            self.status = MissionStatus::Completed;
        } else {
            self.status = MissionStatus::Running {
                step: self.index.min(self.steps.len().saturating_sub(1)),
            };
        }

        &self.status
    }

    /// Cancel the mission. Running primitives are stopped, remaining ones never start.
    pub fn cancel(&mut self, ctx: &mut PrimitiveCtx, reason: MissionAbortError) {
        if self.status.is_terminal() {
            return;
        }

        for p in self.running_mut() {
            p.cancel(ctx);
        }
        for p in self.orphans.iter_mut().chain(self.background.iter_mut()) {
            p.cancel(ctx);
        }
        self.orphans.clear();
        self.background.clear();
        self.mark_remaining_aborted();

        error!("Mission {} aborted: {}", self.name, reason);
        self.status = MissionStatus::Aborted(reason);
    }

    /// Abort after a primitive failure. Nothing is retried.
    fn abort(&mut self, primitive: String, cause: AbortCause) {
        let reason = MissionAbortError::PrimitiveFailed {
            step: self.index,
            primitive,
            cause,
        };
        error!("Mission {} aborted: {}", self.name, reason);

        // Anything still running finishes under its own control
        if let Some(step) = self.steps.get_mut(self.index) {
            if self.step_started {
                let (running, rest): (Vec<_>, Vec<_>) =
                    step.blocking.drain(..).partition(|p| p.is_running());
                step.blocking = rest;
                self.orphans.extend(running);
            }
        }
        self.orphans.append(&mut self.background);
        self.orphans.retain(|p| p.is_running());

        self.mark_remaining_aborted();
        self.status = MissionStatus::Aborted(reason);
    }

    fn tick_orphans(&mut self, ctx: &mut PrimitiveCtx) {
        for p in self.orphans.iter_mut() {
            p.tick(ctx);
        }
        self.orphans.retain(|p| p.is_running());
    }

    /// Running primitives of the current step.
    fn running_mut(&mut self) -> impl Iterator<Item = &mut Primitive> {
        self.steps
            .get_mut(self.index)
            .into_iter()
            .flat_map(|s| s.blocking.iter_mut())
            .filter(|p| p.is_running())
    }

    fn mark_remaining_aborted(&mut self) {
        for step in self.steps.iter_mut().skip(self.index) {
            for p in step.blocking.iter_mut().chain(step.background.iter_mut()) {
                p.mark_aborted();
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        arm::Arm,
        mech_if::{Completable, DriveError, DriveStatus},
        mission::{parallel, parallel_background, sequence, sequence_all, single},
        motion_seq::AbortReason,
        test_params,
    };
    use comms_if::eqpt::mech::JointId;
    use std::{cell::RefCell, rc::Rc};

    /// Start and finish times observed for each leg.
    type Log = Rc<RefCell<Vec<(String, &'static str, f64)>>>;

    /// Drive leg which finishes after a fixed time and records what happens to it.
    struct ScriptedLeg {
        name: String,
        duration_s: f64,
        fail: bool,
        start_s: f64,
        log: Log,
    }

    impl Completable for ScriptedLeg {
        fn name(&self) -> &str {
            &self.name
        }

        fn start(&mut self, now_s: f64) -> Result<(), DriveError> {
            self.start_s = now_s;
            self.log.borrow_mut().push((self.name.clone(), "start", now_s));
            Ok(())
        }

        fn tick(&mut self, now_s: f64) -> DriveStatus {
            if now_s - self.start_s < self.duration_s {
                return DriveStatus::Running;
            }
            if self.fail {
                self.log.borrow_mut().push((self.name.clone(), "fail", now_s));
                DriveStatus::Failed(DriveError::Failed(self.name.clone(), "scripted failure".into()))
            } else {
                self.log
                    .borrow_mut()
                    .push((self.name.clone(), "finish", now_s));
                DriveStatus::Finished
            }
        }

        fn cancel(&mut self) {
            self.log.borrow_mut().push((self.name.clone(), "cancel", 0.0));
        }
    }

    fn leg(log: &Log, name: &str, duration_s: f64, fail: bool) -> Primitive {
        Primitive::drive(Box::new(ScriptedLeg {
            name: name.into(),
            duration_s,
            fail,
            start_s: 0.0,
            log: log.clone(),
        }))
    }

    fn time_of(log: &Log, name: &str, event: &str) -> Option<f64> {
        log.borrow()
            .iter()
            .find(|(n, e, _)| n == name && *e == event)
            .map(|(_, _, t)| *t)
    }

    /// Run the mission with one second cycles until it finishes, returning the final time.
    fn run(runner: &mut MissionRunner, arm: &mut Arm, max_ticks: usize) -> f64 {
        for i in 0..max_ticks {
            let mut ctx = PrimitiveCtx {
                arm: &mut *arm,
                now_s: i as f64,
            };
            if runner.tick(&mut ctx).is_terminal() {
                return i as f64;
            }
        }
        panic!("Mission didn't finish in {} ticks", max_ticks);
    }

    #[test]
    fn test_sequence_starts_after_finish_observed() {
        let log = Log::default();
        let mut arm = Arm::new(&test_params::load());

        let graph = sequence(leg(&log, "a", 2.0, false), leg(&log, "b", 1.0, false));
        let mut runner = MissionRunner::new("seq", graph);
        let end = run(&mut runner, &mut arm, 20);

        assert_eq!(runner.status(), &MissionStatus::Completed);
        let a_finish = time_of(&log, "a", "finish").unwrap();
        let b_start = time_of(&log, "b", "start").unwrap();
        assert_eq!(time_of(&log, "a", "start"), Some(0.0));
        assert_eq!(a_finish, 2.0);
        assert!(b_start > a_finish);
        assert_eq!(end, time_of(&log, "b", "finish").unwrap());
    }

    #[test]
    fn test_parallel_joins_both() {
        let log = Log::default();
        let mut arm = Arm::new(&test_params::load());

        let graph = sequence(
            parallel(leg(&log, "a", 1.0, false), leg(&log, "b", 4.0, false)),
            leg(&log, "c", 1.0, false),
        );
        let mut runner = MissionRunner::new("par", graph);
        run(&mut runner, &mut arm, 20);

        assert_eq!(time_of(&log, "a", "start"), time_of(&log, "b", "start"));
        assert!(time_of(&log, "c", "start").unwrap() > time_of(&log, "b", "finish").unwrap());
    }

    #[test]
    fn test_background_outlives_step() {
        let log = Log::default();
        let mut arm = Arm::new(&test_params::load());

        let graph = sequence(
            parallel_background(leg(&log, "a", 1.0, false), leg(&log, "bg", 6.0, false)),
            leg(&log, "c", 1.0, false),
        );
        let mut runner = MissionRunner::new("bg", graph);
        let end = run(&mut runner, &mut arm, 20);

        let bg_finish = time_of(&log, "bg", "finish").unwrap();
        let c_start = time_of(&log, "c", "start").unwrap();

        // The next step didn't wait for the background primitive, the mission did
        assert!(c_start < bg_finish);
        assert_eq!(end, bg_finish);
        assert_eq!(runner.status(), &MissionStatus::Completed);
    }

    #[test]
    fn test_failure_aborts_remaining_steps() {
        let log = Log::default();
        let mut arm = Arm::new(&test_params::load());

        let graph = sequence_all(vec![
            parallel(leg(&log, "fails", 1.0, true), leg(&log, "long", 5.0, false)),
            single(leg(&log, "never", 1.0, false)),
        ]);
        let mut runner = MissionRunner::new("abort", graph);
        run(&mut runner, &mut arm, 20);

        match runner.status() {
            MissionStatus::Aborted(MissionAbortError::PrimitiveFailed {
                step, primitive, ..
            }) => {
                assert_eq!(*step, 0);
                assert_eq!(primitive, "fails");
            }
            s => panic!("Unexpected status {:?}", s),
        }
        assert_eq!(
            runner.steps()[1].blocking()[0].state(),
            &PrimitiveState::Aborted
        );
        assert!(time_of(&log, "never", "start").is_none());

        // The drive leg still running is left to finish on its own
        assert_eq!(runner.num_detached(), 1);
        for i in 2..10 {
            let mut ctx = PrimitiveCtx {
                arm: &mut arm,
                now_s: i as f64,
            };
            runner.tick(&mut ctx);
        }
        assert_eq!(time_of(&log, "long", "finish"), Some(5.0));
        assert!(time_of(&log, "long", "cancel").is_none());
        assert_eq!(runner.num_detached(), 0);
    }

    #[test]
    fn test_cancel_interrupts() {
        let log = Log::default();
        let mut arm = Arm::new(&test_params::load());

        let graph = sequence(leg(&log, "a", 5.0, false), leg(&log, "b", 1.0, false));
        let mut runner = MissionRunner::new("cancel", graph);

        for i in 0..2 {
            let mut ctx = PrimitiveCtx {
                arm: &mut arm,
                now_s: i as f64,
            };
            runner.tick(&mut ctx);
        }
        assert_eq!(runner.status(), &MissionStatus::Running { step: 0 });

        let mut ctx = PrimitiveCtx {
            arm: &mut arm,
            now_s: 2.0,
        };
        runner.cancel(&mut ctx, MissionAbortError::Interrupted);

        assert_eq!(
            runner.status(),
            &MissionStatus::Aborted(MissionAbortError::Interrupted)
        );
        assert!(time_of(&log, "a", "cancel").is_some());
        assert!(time_of(&log, "b", "start").is_none());
    }

    #[test]
    fn test_empty_graph_completes() {
        let mut arm = Arm::new(&test_params::load());
        let mut runner = MissionRunner::new("default", MissionGraph::empty());
        assert_eq!(run(&mut runner, &mut arm, 2), 0.0);
    }

    #[test]
    fn test_calibrate_failure_is_mission_failure() {
        let params = test_params::load();
        let mut arm = Arm::new(&params);
        arm.emergency_stop();

        let mut runner = MissionRunner::new(
            "calib",
            single(Primitive::calibrate("calibrate", JointId::ALL.to_vec())),
        );
        run(&mut runner, &mut arm, 2);

        assert!(matches!(
            runner.status(),
            MissionStatus::Aborted(MissionAbortError::PrimitiveFailed {
                cause: AbortCause::CalibrationRejected,
                ..
            })
        ));
    }

    #[test]
    fn test_background_move_superseded_by_later_move() {
        let params = test_params::load();
        let mut arm = Arm::new(&params);
        for j in JointId::ALL {
            arm.joints
                .get_mut(j)
                .zero(params.calib_ctrl.home_angle_rad[j.index()], 0.0);
        }
        let start = arm.target_at(arm.kin.starting_coords());

        let graph = sequence(
            parallel_background(
                Primitive::wait("wait", 0.5),
                Primitive::arm_move("background", start),
            ),
            Primitive::arm_move("later", start),
        );
        let mut runner = MissionRunner::new("supersede", graph);
        run(&mut runner, &mut arm, 10);

        assert!(matches!(
            runner.status(),
            MissionStatus::Aborted(MissionAbortError::PrimitiveFailed {
                cause: AbortCause::Motion(AbortReason::Superseded),
                ..
            })
        ));
    }
}
