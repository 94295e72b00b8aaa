//! Main arm executable entry point.
//!
//! # Architecture
//!
//! The general execution methodology consists of:
//!
//!     - Initialise the session, logging and parameters
//!     - Build the executive against the simulated equipment
//!     - Start the selected autonomous mission
//!     - Main loop:
//!         - Executive cycle (see `arm_lib::exec`)
//!         - Periodic telemetry
//!         - Cycle management
//!
//! # Modules
//!
//! All cyclic modules (e.g. `calib_ctrl`) shall meet the following requirements:
//!     1. Provide a public struct implementing the `util::module::State` trait.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{eyre::WrapErr, Report};
use log::{error, info, warn};
use std::thread;
use std::time::{Duration, Instant};
use structopt::StructOpt;

// Internal
use arm_lib::{
    exec::ArmExec,
    mission::{MatchContext, MissionStatus},
    params::{params_dir, ArmExecParams},
    sim::{SimArm, SimParams, SimTrajectories, SimVision},
};
use comms_if::{input::OperatorInput, tc::auto::AutoSelection};
use util::{
    logger::{logger_init, LevelFilter},
    session::Session,
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Arm executable, runs the arm software against the simulation.
#[derive(Debug, StructOpt)]
#[structopt(name = "arm_exec")]
struct Opts {
    #[structopt(flatten)]
    auto: AutoSelection,

    /// Stop after this many cycles, otherwise run until the mission ends.
    #[structopt(long)]
    ticks: Option<u64>,

    /// Enter teleop once the mission has ended and keep running.
    #[structopt(long)]
    teleop: bool,
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    color_eyre::install()?;

    let opts = Opts::from_args();

    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new("arm_exec", "sessions").wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(LevelFilter::Info, &session).wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("Arm Executable\n");
    info!("Session directory: {:?}\n", session.session_root);
    info!(
        "Mission {} for the {:?} alliance",
        opts.auto.mission.as_str(),
        opts.auto.alliance
    );

    // ---- LOAD PARAMETERS ----

    let params = ArmExecParams::load().wrap_err("Could not load the exec params")?;
    let sim_params: SimParams = util::params::load_from_dir(params_dir()?, "sim.toml")
        .wrap_err("Could not load the sim params")?;

    let period_s = params.exec.tick_period_s;
    let tm_period_ticks = params.exec.tm_period_ticks.max(1);
    let max_consec_overruns = params.exec.max_consec_overruns;

    info!("Exec parameters loaded");

    // ---- INITIALISE EXECUTIVE ----

    let mut exec = ArmExec::new(
        params,
        MatchContext {
            alliance: opts.auto.alliance,
        },
        SimArm::new(sim_params.clone(), period_s),
        SimVision::new(sim_params.vision.clone()),
        SimTrajectories::new(sim_params.drive_legs.clone()),
    );

    exec.start_mission(opts.auto.mission)
        .wrap_err("Failed to start the mission")?;

    info!("Initialisation complete, entering main loop\n");

    // ---- MAIN LOOP ----

    let mut num_consec_cycle_overruns: u64 = 0;
    let mut mission_ended = false;
    let input = OperatorInput::default();

    loop {
        let cycle_start_instant = Instant::now();

        let tm = exec.tick(&input);

        // ---- TELEMETRY ----

        if tm.tick % tm_period_ticks == 0 {
            info!(
                "t = {:.2} s, pose ({:.2}, {:.2}, {:.2}) in, motion {:?}, calib {:?}",
                tm.time_s,
                tm.pose_in[0],
                tm.pose_in[1],
                tm.pose_in[2],
                tm.motion.status,
                exec.arm().calib_status()
            );
            session.save(format!("tm/arm_tm_{:08}.json", tm.tick), tm.clone());
        }

        // ---- END CONDITIONS ----

        if let Some(max) = opts.ticks {
            if exec.num_ticks() >= max {
                info!("Reached {} cycles", max);
                break;
            }
        }

        if !mission_ended {
            if let Some(status) = exec.mission_status() {
                if status.is_terminal() {
                    mission_ended = true;
                    match status {
                        MissionStatus::Aborted(e) => error!("Mission aborted: {}", e),
                        _ => info!("Mission completed in {:.2} s", tm.time_s),
                    }
                    session.save("mission_tm.json", tm.clone());

                    if opts.teleop {
                        exec.enter_teleop();
                    } else if opts.ticks.is_none() {
                        break;
                    }
                }
            }
        }

        // ---- CYCLE MANAGEMENT ----

        let cycle_dur = Instant::now() - cycle_start_instant;

        // Get sleep duration
        match Duration::from_secs_f64(period_s).checked_sub(cycle_dur) {
            Some(d) => {
                num_consec_cycle_overruns = 0;
                thread::sleep(d);
            }
            None => {
                warn!(
                    "Cycle overran by {:.06} s",
                    cycle_dur.as_secs_f64() - period_s
                );
                num_consec_cycle_overruns += 1;

                if num_consec_cycle_overruns > max_consec_overruns {
                    error!(
                        "More than {} consecutive cycle overruns, stopping",
                        max_consec_overruns
                    );
                    break;
                }
            }
        }
    }

    // ---- SHUTDOWN ----

    info!("End of execution");
    session.exit();

    Ok(())
}
