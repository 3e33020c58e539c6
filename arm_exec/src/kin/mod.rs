//! # Kinematics module
//!
//! Analytical forward and inverse kinematics for two reduced models of the
//! arm, which share the arm's joint index space:
//!
//! - A 2 DOF planar model driving the shoulder and elbow pitch axes, working
//!   in the vertical plane of the arm (base frame X and Y).
//! - A 3 DOF spatial model adding the waist yaw axis.
//!
//! All joints not driven by a model are held at zero, and every solution is
//! validated against the full joint range table, including those held axes.
//!
//! The elbow of this arm can only bend in the negative direction, so where the
//! inverse problem has two solutions the non-positive elbow angle is always
//! chosen.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod planar;
mod spatial;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// Internal
use crate::arm_params::{ArmParams, JointConfig};
pub use util::linalg::Point3;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A position in the base frame of the arm.
///
/// Units: meters
pub type CartesianPoint = Point3<f64>;

/// Kinematic solver for the arm.
///
/// The solver only borrows the arm parameters and holds no other state, so any
/// number of solvers can share a single set of parameters.
#[derive(Debug, Clone, Copy)]
pub struct ArmKinematics<'a> {
    params: &'a ArmParams,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Selects the reduced kinematic model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DofMode {
    /// Shoulder and elbow pitch only, target in the X/Y plane.
    #[serde(rename = "2dof")]
    TwoDof,

    /// Waist yaw, shoulder pitch and elbow pitch.
    #[serde(rename = "3dof")]
    ThreeDof,
}

/// Errors which can occur while solving kinematics.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum KinError {
    #[error(
        "Target is outside the reach envelope: squared distance {dist_sq_m2} m^2 is not \
         within [{min_sq_m2}, {max_sq_m2}] m^2"
    )]
    Unreachable {
        dist_sq_m2: f64,
        min_sq_m2: f64,
        max_sq_m2: f64,
    },

    #[error("Joint {joint} solved to {angle_rad} rad, outside its range [{min_rad}, {max_rad}]")]
    OutOfRange {
        joint: usize,
        angle_rad: f64,
        min_rad: f64,
        max_rad: f64,
    },
}

/// Error when parsing a `DofMode` from a string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown DOF mode \"{0}\", expected \"2dof\" or \"3dof\"")]
pub struct ParseDofModeError(String);

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl<'a> ArmKinematics<'a> {
    /// Create a new solver over the given parameters.
    pub fn new(params: &'a ArmParams) -> Self {
        Self { params }
    }

    /// The parameters this solver uses.
    pub fn params(&self) -> &ArmParams {
        self.params
    }

    /// Forward kinematics using the given reduced model.
    pub fn forward(&self, mode: DofMode, theta: &JointConfig) -> CartesianPoint {
        match mode {
            DofMode::TwoDof => self.forward_2dof(theta),
            DofMode::ThreeDof => self.forward_3dof(theta),
        }
    }

    /// Inverse kinematics using the given reduced model.
    pub fn inverse(&self, mode: DofMode, target: &CartesianPoint) -> Result<JointConfig, KinError> {
        match mode {
            DofMode::TwoDof => self.inverse_2dof(target),
            DofMode::ThreeDof => self.inverse_3dof(target),
        }
    }

    /// Check every joint of the configuration against its range.
    ///
    /// The first joint (in index order) found outside its range is reported.
    pub fn check_joint_ranges(&self, theta: &JointConfig) -> Result<(), KinError> {
        for (joint, (angle_rad, range)) in theta
            .iter()
            .zip(self.params.joint_ranges().iter())
            .enumerate()
        {
            if !range.contains(*angle_rad) {
                return Err(KinError::OutOfRange {
                    joint,
                    angle_rad: *angle_rad,
                    min_rad: range.min_rad,
                    max_rad: range.max_rad,
                });
            }
        }

        Ok(())
    }

    /// Lengths of the two links making up the reach triangle.
    fn reach_lengths_m(&self) -> (f64, f64) {
        (self.params.upper_arm_length_m(), self.params.forearm_length_m())
    }
}

/// Reject targets whose squared distance from the shoulder lies outside the
/// closed annulus the two links can reach.
fn check_reach(dist_sq_m2: f64, len_a_m: f64, len_b_m: f64) -> Result<(), KinError> {
    let min_sq_m2 = (len_a_m - len_b_m).powi(2);
    let max_sq_m2 = (len_a_m + len_b_m).powi(2);

    // Written so that a NaN distance is rejected
    if min_sq_m2 <= dist_sq_m2 && dist_sq_m2 <= max_sq_m2 {
        Ok(())
    } else {
        Err(KinError::Unreachable {
            dist_sq_m2,
            min_sq_m2,
            max_sq_m2,
        })
    }
}

impl fmt::Display for DofMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DofMode::TwoDof => write!(f, "2dof"),
            DofMode::ThreeDof => write!(f, "3dof"),
        }
    }
}

impl FromStr for DofMode {
    type Err = ParseDofModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "2dof" | "2" => Ok(DofMode::TwoDof),
            "3dof" | "3" => Ok(DofMode::ThreeDof),
            _ => Err(ParseDofModeError(s.to_string())),
        }
    }
}
