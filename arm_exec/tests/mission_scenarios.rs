//! End to end mission scenarios, run against the simulated equipment with the shipped
//! parameters.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use arm_lib::{
    calib_ctrl::CalibStatus,
    exec::ArmExec,
    mission::{single, AbortCause, MatchContext, MissionAbortError, MissionStatus},
    motion_seq::{AbortReason, MotionStatus},
    params::ArmExecParams,
    sim::{SimArm, SimParams, SimTrajectories, SimVision},
    tm::ArmTm,
};
use comms_if::{
    eqpt::mech::JointId,
    input::OperatorInput,
    tc::auto::{Alliance, MissionName},
};

// ---------------------------------------------------------------------------
// HELPERS
// ---------------------------------------------------------------------------

type SimExec = ArmExec<SimArm, SimVision, SimTrajectories>;

const PARAMS_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../params");

fn build(alliance: Alliance) -> SimExec {
    let params = ArmExecParams::load_from_dir(PARAMS_DIR).unwrap();
    let sim: SimParams = util::params::load_from_dir(PARAMS_DIR, "sim.toml").unwrap();
    let period_s = params.exec.tick_period_s;

    ArmExec::new(
        params,
        MatchContext { alliance },
        SimArm::new(sim.clone(), period_s),
        SimVision::new(sim.vision.clone()),
        SimTrajectories::new(sim.drive_legs.clone()),
    )
}

/// Tick until the mission ends, returning the telemetry of every cycle.
fn run_mission(exec: &mut SimExec, max_ticks: usize) -> Vec<ArmTm> {
    let mut tms = Vec::new();
    for _ in 0..max_ticks {
        tms.push(exec.tick(&OperatorInput::default()));
        if exec.mission_status().map(|s| s.is_terminal()).unwrap_or(true) {
            return tms;
        }
    }
    panic!("Mission didn't end within {} cycles", max_ticks);
}

fn tick_n(exec: &mut SimExec, n: usize) {
    for _ in 0..n {
        exec.tick(&OperatorInput::default());
    }
}

/// Calibrate every joint, move to the starting position and let the joints settle.
fn calibrate_and_stow(exec: &mut SimExec) {
    assert!(exec.request_calibration(&JointId::ALL));
    for _ in 0..250 {
        exec.tick(&OperatorInput::default());
        if exec.arm().joints.all_calibrated() {
            break;
        }
    }
    assert_eq!(exec.arm().calib_status(), [CalibStatus::Calibrated; 3]);

    let stow = exec.catalog().arm_to("starting").unwrap();
    exec.start_graph("stow", single(stow)).unwrap();
    run_mission(exec, 1000);
    assert_eq!(exec.mission_status(), Some(&MissionStatus::Completed));

    tick_n(exec, 200);
}

fn assert_near(actual: [f64; 3], expected: [f64; 3], tol: f64) {
    for i in 0..3 {
        assert!(
            (actual[i] - expected[i]).abs() <= tol,
            "{:?} is not within {} of {:?}",
            actual,
            tol,
            expected
        );
    }
}

// ---------------------------------------------------------------------------
// SCENARIOS
// ---------------------------------------------------------------------------

#[test]
fn test_pickup_completes() {
    let mut exec = build(Alliance::Blue);
    calibrate_and_stow(&mut exec);

    exec.start_mission(MissionName::Pickup).unwrap();
    let tms = run_mission(&mut exec, 3000);
    assert_eq!(exec.mission_status(), Some(&MissionStatus::Completed));

    // The move to the pickup position converged within tolerance on every axis
    let pickup_id = exec.mission().unwrap().steps()[1].blocking()[0]
        .target_id()
        .unwrap();
    assert_eq!(
        exec.arm().seq.status_of(pickup_id),
        Some(MotionStatus::Converged)
    );
    let converged = tms
        .iter()
        .find(|tm| {
            tm.motion.target_id == Some(pickup_id) && tm.motion.status == MotionStatus::Converged
        })
        .unwrap();
    for e in converged.motion.error_in.iter() {
        assert!(e.abs() <= 1.0, "pickup error {:?}", converged.motion.error_in);
    }
    assert_near(converged.motion.pose_in, [-35.0, 4.0, 0.0], 1.0);

    // Holding the piece back at the start
    assert!(exec.arm().gripper.is_closed());
    assert!(exec.mech().gripper_closed());
    assert_near(exec.arm().pose().into(), [0.0, 24.0, 20.0], 1.0);
}

#[test]
fn test_alliances_mirror_turret() {
    let mut runs = Vec::new();

    for alliance in [Alliance::Blue, Alliance::Red] {
        let mut exec = build(alliance);
        calibrate_and_stow(&mut exec);

        exec.start_mission(MissionName::PlaceCone).unwrap();
        let tms = run_mission(&mut exec, 3000);
        assert_eq!(exec.mission_status(), Some(&MissionStatus::Completed));
        runs.push(tms);
    }

    let (blue, red) = (&runs[0], &runs[1]);
    assert_eq!(blue.len(), red.len());

    let mut max_turret = 0.0f64;
    for (b, r) in blue.iter().zip(red.iter()) {
        assert!((b.joints[0].angle_rad + r.joints[0].angle_rad).abs() < 1e-6);
        assert!((b.joints[1].angle_rad - r.joints[1].angle_rad).abs() < 1e-6);
        assert!((b.joints[2].angle_rad - r.joints[2].angle_rad).abs() < 1e-6);
        max_turret = max_turret.max(b.joints[0].angle_rad.abs());
    }

    // The trajectory really did use the turret
    assert!(max_turret > 0.1);
}

#[test]
fn test_unreachable_target_aborts_without_moving_joints() {
    let mut exec = build(Alliance::Blue);
    calibrate_and_stow(&mut exec);

    let unreachable = exec
        .catalog()
        .arm_to_coords("unreachable", [0.0, 24.0, 100.0].into());
    exec.start_graph("unreachable", single(unreachable)).unwrap();
    let tms = run_mission(&mut exec, 1000);

    match exec.mission_status() {
        Some(MissionStatus::Aborted(MissionAbortError::PrimitiveFailed { cause, .. })) => {
            assert_eq!(*cause, AbortCause::Motion(AbortReason::OutOfRange))
        }
        s => panic!("Unexpected mission status {:?}", s),
    }

    let abort_idx = tms
        .iter()
        .position(|tm| tm.motion.status == MotionStatus::Aborted(AbortReason::OutOfRange))
        .unwrap();
    assert!(abort_idx > 0);

    // No joint target came from the failed solve
    assert_eq!(tms[abort_idx].targets(), tms[abort_idx - 1].targets());

    // Mission sees the abort in the same cycle
    assert_eq!(abort_idx, tms.len() - 1);
}

#[test]
fn test_actuator_fault_aborts_mission() {
    let mut exec = build(Alliance::Blue);
    calibrate_and_stow(&mut exec);

    exec.start_mission(MissionName::Pickup).unwrap();
    tick_n(&mut exec, 30);
    exec.mech_mut().inject_fault(JointId::Shoulder);
    run_mission(&mut exec, 100);

    assert!(matches!(
        exec.mission_status(),
        Some(MissionStatus::Aborted(MissionAbortError::PrimitiveFailed {
            cause: AbortCause::Motion(AbortReason::ActuatorFault),
            ..
        }))
    ));
    assert!(exec.arm().joints.get(JointId::Shoulder).state().fault);
}

#[test]
fn test_emergency_stop_holds_arm() {
    let mut exec = build(Alliance::Blue);
    calibrate_and_stow(&mut exec);

    exec.start_mission(MissionName::PlaceCone).unwrap();
    tick_n(&mut exec, 20);
    exec.emergency_stop();

    assert_eq!(
        exec.mission_status(),
        Some(&MissionStatus::Aborted(MissionAbortError::EmergencyStop))
    );

    let held = exec.arm().joints.targets();
    tick_n(&mut exec, 100);
    assert_eq!(exec.arm().joints.targets(), held);
    assert!(exec.arm().seq.active().is_none());
    assert!(exec.start_mission(MissionName::PlaceCone).is_err());

    exec.clear_emergency_stop();
    assert!(exec.start_mission(MissionName::PlaceCone).is_ok());
}

#[test]
fn test_balance_calibrates_alongside_drive() {
    let mut exec = build(Alliance::Red);

    exec.start_mission(MissionName::Balance).unwrap();
    let tms = run_mission(&mut exec, 1000);

    assert_eq!(exec.mission_status(), Some(&MissionStatus::Completed));
    assert!(exec.arm().joints.all_calibrated());

    // Drive legs take 3.5, 2.0 and 4.0 s, plus a cycle to start each step
    let end_s = tms[tms.len() - 1].time_s;
    assert!(end_s >= 9.5 && end_s < 9.7, "ended at {}", end_s);
}

#[test]
fn test_missing_drive_leg_rejects_mission() {
    let mut exec = build(Alliance::Blue);
    let params = ArmExecParams::load_from_dir(PARAMS_DIR).unwrap();
    let mut empty = ArmExec::new(
        params,
        MatchContext {
            alliance: Alliance::Blue,
        },
        SimArm::new(SimParams::default(), 0.02),
        SimVision::default(),
        SimTrajectories::default(),
    );

    assert!(exec.start_mission(MissionName::Taxi).is_ok());
    assert!(empty.start_mission(MissionName::Taxi).is_err());
}

#[test]
fn test_teleop_button_moves_arm() {
    let mut exec = build(Alliance::Blue);
    calibrate_and_stow(&mut exec);
    exec.enter_teleop();

    // Button 4 runs the arm to the top centre node while held
    let input = OperatorInput::with_button(4);
    let mut finished = false;
    for i in 0..1000 {
        let tm = exec.tick(&input);
        if i > 0 && tm.teleop.running.is_none() {
            finished = true;
            break;
        }
    }

    assert!(finished);
    assert_near(exec.arm().pose().into(), [0.0, 40.0, 44.0], 1.5);
}
