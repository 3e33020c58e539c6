//! Main arm-side executable entry point.
//!
//! # Architecture
//!
//! The general execution methodology consists of:
//!
//!     - Load parameters and initialise all modules
//!     - Enable actuator torque and read the arm's start configuration
//!     - For each move in the demo sequence:
//!         - Arm control processing: solve the target and plan a trajectory
//!         - Optionally archive the trajectory
//!         - Cyclic delivery of each trajectory sample to the actuators
//!     - Brake the arm
//!
//! A move which fails to solve, plan or execute is aborted with a warning and
//! the sequence carries on with the next target from wherever the arm is.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{eyre::WrapErr, Report};
use log::{debug, info, warn};
use serde::Serialize;
use structopt::StructOpt;

// Internal
use arm_lib::{
    actuator::{ActuatorError, ArmActuator, SimActuator},
    arm_ctrl::{self, ArmCmd, ArmCtrl, InitData, InputData},
    arm_params::{ArmParams, NUM_JOINTS},
    cycle_timer::{CycleTimer, RunEnd, RunError, RunSummary, StopFlag, Tick},
    kin::DofMode,
    traj_plan::Trajectory,
};
use util::{
    archive::Archiver,
    logger::{logger_init, LevelFilter},
    module::State,
    raise_error,
    session::Session,
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Limit of the number of consecutive demands the actuators can reject before the current move
/// is stopped.
const MAX_ACTUATOR_ERROR_LIMIT: u64 = 5;

/// Limit of the number of consecutive cycle overruns before the executable gives up.
const MAX_CONSEC_CYCLE_OVERRUNS: u64 = 500;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Drive the arm through a sequence of Cartesian targets.
#[derive(Debug, StructOpt)]
#[structopt(name = "arm_exec")]
struct Opts {
    /// Arm parameter file, relative to `$ARM_SW_ROOT/params`.
    #[structopt(long, default_value = "arm.toml")]
    arm_params: String,

    /// Use the built-in CRANE-X7 parameters instead of loading the arm parameter file.
    #[structopt(long)]
    builtin_arm: bool,

    /// Arm control parameter file, relative to `$ARM_SW_ROOT/params`.
    #[structopt(long, default_value = "arm_ctrl.toml")]
    ctrl_params: String,

    /// Override the kinematic model, "2dof" or "3dof".
    #[structopt(short, long)]
    mode: Option<DofMode>,

    /// Override the number of moves to make.
    #[structopt(short = "n", long)]
    num_moves: Option<usize>,

    /// Archive every planned trajectory as CSV in the session directory.
    #[structopt(short, long)]
    save_trajectories: bool,
}

/// Outcome of a single move, archived once per move.
#[derive(Debug, Clone, Copy, Serialize)]
struct MoveRecord {
    move_idx: usize,
    target_x_m: f64,
    target_y_m: f64,
    target_z_m: f64,

    /// Zero if the move could not be planned.
    num_samples: usize,
    num_cycles: u64,
    completed: bool,
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
    logger_init(LevelFilter::Debug, &session).wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("Arm Executable\n");
    info!("Session directory: {:?}\n", session.session_root);

    // ---- LOAD PARAMETERS ----

    let arm_params: ArmParams = if opts.builtin_arm {
        ArmParams::crane_x7()
    } else {
        util::params::load(&opts.arm_params).wrap_err("Could not load arm params")?
    };

    let mut ctrl_params: arm_ctrl::Params =
        util::params::load(&opts.ctrl_params).wrap_err("Could not load arm control params")?;
    if let Some(mode) = opts.mode {
        ctrl_params.mode = mode;
    }
    if let Some(n) = opts.num_moves {
        ctrl_params.num_moves = n;
    }
    ctrl_params.save_trajectories |= opts.save_trajectories;

    info!("Exec parameters loaded");

    // ---- INITIALISE MODULES ----

    info!("Initialising modules...");

    let mut arm_ctrl = ArmCtrl::default();
    arm_ctrl
        .init(InitData {
            arm: arm_params.clone(),
            ctrl: ctrl_params.clone(),
        })
        .wrap_err("Failed to initialise ArmCtrl")?;
    info!("ArmCtrl init complete");

    let mut actuator = SimActuator::new(
        *arm_params.joint_ranges(),
        arm_ctrl.period_s(),
        [0.0; NUM_JOINTS],
    );
    actuator
        .set_torque_enable(true)
        .wrap_err("Failed to enable arm torque")?;
    let start_state = actuator
        .get_state()
        .wrap_err("Failed to read the arm's start state")?;
    arm_ctrl.set_current_config(start_state.pos_rad);
    info!("Actuators initialised at {:?}", start_state.pos_rad);

    let mut timer = CycleTimer::from_frequency(ctrl_params.cycle_frequency_hz)
        .wrap_err("Failed to create the cycle timer")?;
    let stop = StopFlag::new();

    info!("Module initialisation complete\n");

    // ---- MAIN LOOP ----

    let mut move_arch =
        Archiver::from_path(&session, "moves.csv").wrap_err("Failed to create the move archive")?;

    info!("Beginning {} moves\n", ctrl_params.num_moves);

    let mut num_aborted = 0;

    for move_idx in 0..ctrl_params.num_moves {
        let target = match ctrl_params.target(move_idx) {
            Some(t) => t,
            None => {
                warn!("No targets are set, nothing to do");
                break;
            }
        };

        info!(
            "Move {}: to ({:.3}, {:.3}, {:.3}) m",
            move_idx, target.x, target.y, target.z
        );

        let mut record = MoveRecord {
            move_idx,
            target_x_m: target.x,
            target_y_m: target.y,
            target_z_m: target.z,
            num_samples: 0,
            num_cycles: 0,
            completed: false,
        };

        // ---- ARM CONTROL PROCESSING ----

        let traj = match arm_ctrl.proc(&InputData {
            cmd: Some(ArmCmd::MoveTo { target }),
        }) {
            Ok((Some(traj), report)) => {
                debug!("ArmCtrl status: {:?}", report);
                Some(traj)
            }
            Ok((None, _)) => None,
            Err(e) => {
                warn!("Move {} aborted: {}", move_idx, e);
                None
            }
        };

        // ---- TRAJECTORY EXECUTION ----

        if let Some(traj) = traj {
            record.num_samples = traj.len();

            if ctrl_params.save_trajectories {
                if let Err(e) = save_trajectory(&session, move_idx, &traj) {
                    warn!("Could not archive the trajectory of move {}: {}", move_idx, e);
                }
            }

            match run_trajectory(&mut timer, &stop, &mut actuator, &traj) {
                Ok(summary) => {
                    record.num_cycles = summary.num_ticks;
                    record.completed = summary.end == RunEnd::Finished;

                    if record.completed {
                        info!("Move {} complete after {} cycles", move_idx, summary.num_ticks);
                    } else {
                        warn!(
                            "Move {} stopped after {} of {} cycles",
                            move_idx,
                            summary.num_ticks,
                            traj.len()
                        );
                    }
                }
                Err(RunError::Timer(e)) => {
                    return Err(e).wrap_err("Cycle timer failed");
                }
                Err(RunError::Action { tick, error }) => {
                    record.num_cycles = tick;
                    warn!("Move {} aborted on cycle {}: {}", move_idx, tick, error);
                }
            }
        }

        if !record.completed {
            num_aborted += 1;
        }
        if let Err(e) = move_arch.serialise(record) {
            warn!("Could not archive move {}: {}", move_idx, e);
        }

        if timer.stats().num_consec_overruns > MAX_CONSEC_CYCLE_OVERRUNS {
            raise_error!(
                "More than {} consecutive cycle overruns!",
                MAX_CONSEC_CYCLE_OVERRUNS
            );
        }

        // Plan the next move from wherever the arm actually ended up
        stop.reset();
        let state = actuator
            .get_state()
            .wrap_err("Failed to read the arm state")?;
        arm_ctrl.set_current_config(state.pos_rad);
    }

    // ---- SHUTDOWN ----

    actuator.brake();

    move_arch.flush().wrap_err("Failed to write the move archive")?;

    let stats = timer.stats();
    info!(
        "Finished {} moves ({} aborted), {} cycles with {} overruns (max {:.06} s)",
        ctrl_params.num_moves,
        num_aborted,
        stats.num_ticks,
        stats.num_overruns,
        stats.max_overrun.as_secs_f64()
    );

    Ok(())
}

/// Send each sample of the trajectory to the actuators, one per cycle.
///
/// Demands the actuators reject are skipped, but more than
/// `MAX_ACTUATOR_ERROR_LIMIT` consecutive rejections stop the move. A disabled
/// or unreachable actuator ends the move straight away.
fn run_trajectory<A: ArmActuator>(
    timer: &mut CycleTimer,
    stop: &StopFlag,
    actuator: &mut A,
    traj: &Trajectory,
) -> Result<RunSummary, RunError<ActuatorError>> {
    timer.restart()?;

    let mut num_consec_errors = 0;

    timer.run(stop, Some(traj.len() as u64), |tick| {
        let sample = match traj.sample(tick as usize) {
            Some(s) => s,
            None => return Ok(Tick::Finished),
        };

        match actuator.set_angles(&sample.pos_rad) {
            Ok(()) => num_consec_errors = 0,
            Err(e @ ActuatorError::TorqueDisabled) | Err(e @ ActuatorError::Comms(_)) => {
                return Err(e)
            }
            Err(e) => {
                num_consec_errors += 1;
                warn!("Actuators rejected sample {}: {}", tick, e);

                if num_consec_errors > MAX_ACTUATOR_ERROR_LIMIT {
                    stop.request_stop();
                }
            }
        }

        if sample.index + 1 >= traj.len() {
            Ok(Tick::Finished)
        } else {
            Ok(Tick::Continue)
        }
    })
}

/// Archive a trajectory as CSV in the session's archive directory.
fn save_trajectory(session: &Session, move_idx: usize, traj: &Trajectory) -> Result<(), Report> {
    let mut arch = Archiver::from_path(session, format!("traj_{:03}.csv", move_idx))?;
    traj.archive(&mut arch)?;

    debug!("Trajectory archived to {:?}", arch.path());

    Ok(())
}
