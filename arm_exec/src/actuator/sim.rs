//! Simulated arm actuator

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::{debug, info};

use super::{ActuatorError, ArmActuator, JointState};
use crate::arm_params::{JointConfig, JointRange, NUM_JOINTS};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Actuator which reaches every demand instantly.
///
/// Joint rates are estimated by differencing successive demands over the
/// demand period, as a servo bus reporting finite-difference velocity would.
/// No torque is modelled.
#[derive(Debug, Clone)]
pub struct SimActuator {
    joint_ranges: [JointRange; NUM_JOINTS],

    /// Expected time between demands.
    ///
    /// Units: seconds
    demand_period_s: f64,

    torque_enabled: bool,

    state: JointState,

    num_demands: u64,
}

// ------------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// ------------------------------------------------------------------------------------------------

impl SimActuator {
    /// Create a new simulated arm at rest at `initial_pos_rad` with torque disabled.
    pub fn new(
        joint_ranges: [JointRange; NUM_JOINTS],
        demand_period_s: f64,
        initial_pos_rad: JointConfig,
    ) -> Self {
        Self {
            joint_ranges,
            demand_period_s,
            torque_enabled: false,
            state: JointState::at_rest(initial_pos_rad),
            num_demands: 0,
        }
    }

    pub fn is_torque_enabled(&self) -> bool {
        self.torque_enabled
    }

    /// Number of demands accepted so far.
    pub fn num_demands(&self) -> u64 {
        self.num_demands
    }
}

impl ArmActuator for SimActuator {
    fn set_angles(&mut self, pos_rad: &JointConfig) -> Result<(), ActuatorError> {
        if !self.torque_enabled {
            return Err(ActuatorError::TorqueDisabled);
        }

        for (joint, (angle_rad, range)) in pos_rad.iter().zip(self.joint_ranges.iter()).enumerate()
        {
            if !angle_rad.is_finite() {
                return Err(ActuatorError::NonFiniteDemand(joint));
            }
            if !range.contains(*angle_rad) {
                return Err(ActuatorError::DemandOutOfRange {
                    joint,
                    angle_rad: *angle_rad,
                });
            }
        }

        for j in 0..NUM_JOINTS {
            self.state.rate_rads[j] = (pos_rad[j] - self.state.pos_rad[j]) / self.demand_period_s;
        }
        self.state.pos_rad = *pos_rad;
        self.num_demands += 1;

        Ok(())
    }

    fn get_state(&mut self) -> Result<JointState, ActuatorError> {
        Ok(self.state)
    }

    fn set_torque_enable(&mut self, enable: bool) -> Result<(), ActuatorError> {
        info!(
            "Simulated arm torque {}",
            if enable { "enabled" } else { "disabled" }
        );
        self.torque_enabled = enable;
        Ok(())
    }

    fn brake(&mut self) {
        debug!("Simulated arm braking at {:?}", self.state.pos_rad);
        self.state = JointState::at_rest(self.state.pos_rad);
    }
}
