//! # Actuator module
//!
//! This module provides a unified interface to the arm's joint actuators,
//! abstracting over the servo bus that actually drives them. All conversion
//! between joint angles and servo units lives behind this interface.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// [`ArmActuator`] implementation which tracks demands perfectly, for running without hardware.
mod sim;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::Serialize;

use crate::arm_params::{JointConfig, NUM_JOINTS};
pub use sim::*;

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// Trait to provide a unified API for driving the arm's joints.
pub trait ArmActuator {
    /// Demand the given angle from every joint.
    ///
    /// ## Arguments
    /// - `pos_rad` - The demanded angle of each joint. A demand outside a joint's range is
    ///   rejected and no joint is moved.
    fn set_angles(&mut self, pos_rad: &JointConfig) -> Result<(), ActuatorError>;

    /// Read back the current position, rate and torque of every joint.
    fn get_state(&mut self) -> Result<JointState, ActuatorError>;

    /// Enable or disable holding torque on every joint. Angle demands are rejected while torque
    /// is disabled.
    fn set_torque_enable(&mut self, enable: bool) -> Result<(), ActuatorError>;

    /// Stop all joints where they are as quickly as possible.
    ///
    /// Must not fail, this is used on the way out of error paths.
    fn brake(&mut self);
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Measured state of every joint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct JointState {
    /// Units: radians
    pub pos_rad: JointConfig,

    /// Units: radians/second
    pub rate_rads: JointConfig,

    /// Units: newton meters
    pub torque_nm: JointConfig,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ActuatorError {
    #[error("Joint {joint} demand of {angle_rad} rad is outside its range")]
    DemandOutOfRange { joint: usize, angle_rad: f64 },

    #[error("Joint {0} demand is not a finite number")]
    NonFiniteDemand(usize),

    #[error("Cannot demand a position while torque is disabled")]
    TorqueDisabled,

    #[error("Communication with the actuators failed: {0}")]
    Comms(String),
}

impl JointState {
    /// State of an arm at rest at the given position.
    pub fn at_rest(pos_rad: JointConfig) -> Self {
        Self {
            pos_rad,
            rate_rads: [0.0; NUM_JOINTS],
            torque_nm: [0.0; NUM_JOINTS],
        }
    }
}
