//! Implementations for the ArmCtrl state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, info};
use serde::Serialize;

// Internal
use super::{ArmCmd, ArmCtrlError, Params};
use crate::arm_params::{ArmParams, JointConfig, NUM_JOINTS};
use crate::kin::ArmKinematics;
use crate::traj_plan::{TrajPlanner, Trajectory, TrapezoidProfileParams};
use util::{module::State, time::frequency_to_period};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Arm control module state
#[derive(Debug, Default)]
pub struct ArmCtrl {
    pub(crate) arm: ArmParams,

    pub(crate) params: Params,

    pub(crate) planner: TrajPlanner,

    /// Trajectory sample period, the cycle period truncated to whole
    /// nanoseconds.
    pub(crate) period_s: f64,

    pub(crate) report: StatusReport,

    pub(crate) current_cmd: Option<ArmCmd>,

    pub(crate) current_config: JointConfig,
}

/// Initialisation data for Arm Control.
#[derive(Debug, Clone, Default)]
pub struct InitData {
    pub arm: ArmParams,
    pub ctrl: Params,
}

/// Input data to Arm Control.
#[derive(Debug, Clone, Default)]
pub struct InputData {
    /// The command to be executed, or `None` if there is no new command on
    /// this cycle.
    pub cmd: Option<ArmCmd>,
}

/// Status report for ArmCtrl processing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct StatusReport {
    /// Configuration the latest trajectory ends at.
    pub target_config: Option<JointConfig>,

    /// Timing law of the latest trajectory.
    pub profile: Option<TrapezoidProfileParams>,

    /// Joint which governed the latest trajectory's timing.
    pub governing_joint: Option<usize>,

    pub num_samples: usize,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl State for ArmCtrl {
    type InitData = InitData;
    type InitError = ArmCtrlError;

    type InputData = InputData;
    type OutputData = Option<Trajectory>;
    type StatusReport = StatusReport;
    type ProcError = ArmCtrlError;

    /// Initialise the ArmCtrl module.
    ///
    /// The arm is assumed to start in the all zero configuration until told
    /// otherwise with `set_current_config`.
    fn init(&mut self, init_data: Self::InitData) -> Result<(), Self::InitError> {
        init_data.arm.validate()?;

        self.period_s = frequency_to_period(init_data.ctrl.cycle_frequency_hz)
            .ok_or(ArmCtrlError::InvalidCycleFrequency(
                init_data.ctrl.cycle_frequency_hz,
            ))?
            .as_secs_f64();

        self.planner = TrajPlanner::new(init_data.ctrl.max_traj_samples);
        self.arm = init_data.arm;
        self.params = init_data.ctrl;
        self.current_cmd = None;
        self.current_config = [0.0; NUM_JOINTS];

        info!(
            "ArmCtrl initialised in {} mode, {} Hz, {} s moves",
            self.params.mode, self.params.cycle_frequency_hz, self.params.move_duration_s
        );

        Ok(())
    }

    /// Perform cyclic processing of Arm Control.
    ///
    /// If there is a new command a trajectory from the current configuration
    /// is planned and output, and the current configuration moves to the end
    /// of that trajectory. Otherwise no trajectory is output.
    ///
    /// On error the current configuration is left unchanged.
    fn proc(
        &mut self,
        input_data: &Self::InputData,
    ) -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError> {
        // Clear the status report
        self.report = StatusReport::default();

        let cmd = match &input_data.cmd {
            Some(c) => c,
            None => return Ok((None, self.report)),
        };

        debug!("New ArmCtrl ArmCmd::{:?}", cmd);
        self.current_cmd = Some(cmd.clone());

        let target = self.calc_target_config(cmd)?;
        let traj = self.plan_to(&target, cmd)?;

        self.report = StatusReport {
            target_config: Some(target),
            profile: Some(traj.profile),
            governing_joint: traj.governing_joint,
            num_samples: traj.len(),
        };
        self.current_config = target;

        Ok((Some(traj), self.report))
    }
}

impl ArmCtrl {
    /// Tell ArmCtrl where the arm actually is, for example from actuator
    /// feedback after a motion is interrupted.
    pub fn set_current_config(&mut self, config: JointConfig) {
        self.current_config = config;
    }

    pub fn current_config(&self) -> &JointConfig {
        &self.current_config
    }

    pub fn current_cmd(&self) -> Option<&ArmCmd> {
        self.current_cmd.as_ref()
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn arm_params(&self) -> &ArmParams {
        &self.arm
    }

    /// Trajectory sample period.
    ///
    /// Units: seconds
    pub fn period_s(&self) -> f64 {
        self.period_s
    }

    /// Configuration the command asks the arm to reach.
    fn calc_target_config(&self, cmd: &ArmCmd) -> Result<JointConfig, ArmCtrlError> {
        let kin = ArmKinematics::new(&self.arm);

        match cmd {
            ArmCmd::Stop => Ok(self.current_config),
            ArmCmd::MoveTo { target } => Ok(kin.inverse(self.params.mode, target)?),
            ArmCmd::MoveJoints { target } => {
                kin.check_joint_ranges(target)?;
                Ok(*target)
            }
        }
    }

    /// Plan from the current configuration to `target`.
    ///
    /// Stopping holds position for a single cycle rather than a whole move.
    fn plan_to(&self, target: &JointConfig, cmd: &ArmCmd) -> Result<Trajectory, ArmCtrlError> {
        let duration_s = match cmd {
            ArmCmd::Stop => self.period_s,
            _ => self.params.move_duration_s,
        };

        Ok(self.planner.plan(
            &self.current_config,
            target,
            self.params.max_speed_rads,
            duration_s,
            self.period_s,
        )?)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::arm_params::{ELBOW_JOINT, SHOULDER_JOINT, WAIST_JOINT};
    use crate::kin::{CartesianPoint, DofMode, KinError};
    use crate::traj_plan::PlanError;

    fn arm_ctrl() -> ArmCtrl {
        let mut ac = ArmCtrl::default();
        ac.init(InitData::default()).unwrap();
        ac
    }

    fn move_to(x: f64, y: f64, z: f64) -> InputData {
        InputData {
            cmd: Some(ArmCmd::MoveTo {
                target: CartesianPoint::new(x, y, z),
            }),
        }
    }

    #[test]
    fn test_init() {
        let ac = arm_ctrl();
        assert_eq!(ac.period_s(), 0.005);
        assert_eq!(ac.current_config(), &[0.0; NUM_JOINTS]);

        let mut ac = ArmCtrl::default();
        let mut bad = InitData::default();
        bad.ctrl.cycle_frequency_hz = 0.0;
        assert_eq!(ac.init(bad), Err(ArmCtrlError::InvalidCycleFrequency(0.0)));

        let mut bad = InitData::default();
        bad.arm.links[2].length_m = -0.25;
        assert!(matches!(ac.init(bad), Err(ArmCtrlError::InvalidArmParams(_))));
    }

    #[test]
    fn test_no_cmd() {
        let mut ac = arm_ctrl();
        let (traj, report) = ac.proc(&InputData::default()).unwrap();
        assert!(traj.is_none());
        assert_eq!(report, StatusReport::default());
    }

    #[test]
    fn test_move_to() {
        let mut ac = arm_ctrl();
        let (traj, report) = ac.proc(&move_to(0.15, 0.15, 0.15)).unwrap();
        let traj = traj.unwrap();

        // 1 s at 200 Hz
        assert_eq!(traj.len(), 201);
        assert_eq!(report.num_samples, 201);

        let target = report.target_config.unwrap();
        assert_eq!(traj.pos_rad[0], [0.0; NUM_JOINTS]);
        assert_eq!(ac.current_config(), &target);

        let end = traj.last().unwrap().pos_rad;
        for j in [WAIST_JOINT, SHOULDER_JOINT, ELBOW_JOINT].iter() {
            assert!((end[*j] - target[*j]).abs() < 1e-9);
        }

        let kin = ArmKinematics::new(ac.arm_params());
        let p = kin.forward(DofMode::ThreeDof, &end);
        assert!((p - CartesianPoint::new(0.15, 0.15, 0.15)).norm() < 1e-6);
    }

    #[test]
    fn test_move_joints() {
        let mut ac = arm_ctrl();

        let mut target = [0.0; NUM_JOINTS];
        target[SHOULDER_JOINT] = 1.0;
        target[ELBOW_JOINT] = -0.5;
        let (traj, report) = ac
            .proc(&InputData {
                cmd: Some(ArmCmd::MoveJoints { target }),
            })
            .unwrap();

        let end = traj.unwrap().last().unwrap().pos_rad;
        for j in 0..NUM_JOINTS {
            assert!((end[j] - target[j]).abs() < 1e-9);
        }
        assert_eq!(report.governing_joint, Some(SHOULDER_JOINT));

        // Elbow can't bend positively
        target[ELBOW_JOINT] = 0.5;
        assert!(matches!(
            ac.proc(&InputData {
                cmd: Some(ArmCmd::MoveJoints { target }),
            }),
            Err(ArmCtrlError::Kinematics(KinError::OutOfRange {
                joint: ELBOW_JOINT,
                ..
            }))
        ));
    }

    #[test]
    fn test_failed_cmd_keeps_config() {
        let mut ac = arm_ctrl();
        ac.proc(&move_to(0.3, 0.2, 0.15)).unwrap();
        let before = *ac.current_config();

        assert!(matches!(
            ac.proc(&move_to(1.0, 1.0, 1.0)),
            Err(ArmCtrlError::Kinematics(KinError::Unreachable { .. }))
        ));
        assert_eq!(ac.current_config(), &before);

        // Too long a move for the trajectory capacity
        let mut init = InitData::default();
        init.ctrl.max_traj_samples = 100;
        ac.init(init).unwrap();
        assert!(matches!(
            ac.proc(&move_to(0.3, 0.2, 0.15)),
            Err(ArmCtrlError::Planning(PlanError::CapacityExceeded { .. }))
        ));
        assert_eq!(ac.current_config(), &[0.0; NUM_JOINTS]);
    }

    #[test]
    fn test_stop_holds() {
        let mut ac = arm_ctrl();

        let mut config = [0.0; NUM_JOINTS];
        config[SHOULDER_JOINT] = 0.7;
        ac.set_current_config(config);

        let (traj, report) = ac
            .proc(&InputData {
                cmd: Some(ArmCmd::Stop),
            })
            .unwrap();
        let traj = traj.unwrap();

        assert!(traj.profile.is_stationary());
        assert_eq!(report.governing_joint, None);
        for s in traj.iter() {
            assert_eq!(s.pos_rad, config);
            assert_eq!(s.rate_rads, [0.0; NUM_JOINTS]);
        }
        assert_eq!(ac.current_cmd(), Some(&ArmCmd::Stop));
    }
}
