//! Arm control module
//!
//! Turns arm commands into joint space trajectories: Cartesian targets are
//! solved with the kinematic solver, joint targets are range checked, and a
//! trajectory is then planned from the arm's current configuration.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// Internal
use crate::arm_params::{JointConfig, ParamsError};
use crate::kin::{CartesianPoint, KinError};
use crate::traj_plan::PlanError;
pub use params::*;
pub use state::*;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Commands which can be given to ArmCtrl.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ArmCmd {
    /// Hold the current configuration.
    Stop,

    /// Move the wrist to a point in the base frame, using the configured
    /// kinematic model.
    MoveTo { target: CartesianPoint },

    /// Move every joint to the given angle.
    MoveJoints { target: JointConfig },
}

/// Possible errors that can occur during ArmCtrl operation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ArmCtrlError {
    #[error("Invalid arm parameters: {0}")]
    InvalidArmParams(#[from] ParamsError),

    #[error("Invalid cycle frequency of {0} Hz")]
    InvalidCycleFrequency(f64),

    #[error("Could not solve the arm command: {0}")]
    Kinematics(#[from] KinError),

    #[error("Could not plan the motion: {0}")]
    Planning(#[from] PlanError),
}
