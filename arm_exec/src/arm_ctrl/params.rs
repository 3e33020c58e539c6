//! Parameters structure for ArmCtrl

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use crate::kin::{CartesianPoint, DofMode};
use crate::traj_plan::MAX_TRAJ_SAMPLES;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for Arm control.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Params {
    // ---- KINEMATICS ----
    /// Reduced kinematic model used to solve Cartesian targets.
    pub mode: DofMode,

    // ---- MOTION ----
    /// Speed cap on the joint which moves furthest during a motion.
    ///
    /// Units: radians/second
    pub max_speed_rads: f64,

    /// Duration of every motion.
    ///
    /// Units: seconds
    pub move_duration_s: f64,

    /// Rate at which trajectory samples are sent to the actuators.
    ///
    /// Units: hertz
    pub cycle_frequency_hz: f64,

    /// Maximum number of samples in a single trajectory.
    pub max_traj_samples: usize,

    // ---- DEMO SEQUENCE ----
    /// Cartesian targets visited in turn, wrapping around to the first.
    ///
    /// Units: meters
    pub targets_m: Vec<[f64; 3]>,

    /// Number of motions to make through the target list.
    pub num_moves: usize,

    /// If true every planned trajectory is exported as CSV into the session
    /// archive.
    pub save_trajectories: bool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Params {
    /// The `i`th target of the demo sequence, wrapping around the list.
    pub fn target(&self, i: usize) -> Option<CartesianPoint> {
        if self.targets_m.is_empty() {
            return None;
        }

        let t = self.targets_m[i % self.targets_m.len()];
        Some(CartesianPoint::new(t[0], t[1], t[2]))
    }
}

impl Default for Params {
    /// A square at 0.15 m height in front of the arm, visited once.
    fn default() -> Self {
        Self {
            mode: DofMode::ThreeDof,
            max_speed_rads: 0.6,
            move_duration_s: 1.0,
            cycle_frequency_hz: 200.0,
            max_traj_samples: MAX_TRAJ_SAMPLES,
            targets_m: vec![
                [0.10, 0.20, 0.15],
                [0.30, 0.20, 0.15],
                [0.30, -0.20, 0.15],
                [0.10, -0.20, 0.15],
            ],
            num_moves: 4,
            save_trajectories: false,
        }
    }
}
