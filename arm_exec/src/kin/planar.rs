//! 2 DOF planar kinematics

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::trace;
use util::maths::acos_clamped;

// Internal imports
use super::*;
use crate::arm_params::{ELBOW_JOINT, NUM_JOINTS, SHOULDER_JOINT};

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl<'a> ArmKinematics<'a> {
    /// Position of the wrist for the given shoulder and elbow angles.
    ///
    /// Only the shoulder and elbow joints are read. The result lies in the
    /// base frame's X/Y plane (`z = 0`).
    pub fn forward_2dof(&self, theta: &JointConfig) -> CartesianPoint {
        let (l1_m, l2_m) = self.reach_lengths_m();

        let t1 = theta[SHOULDER_JOINT];
        let t12 = t1 + theta[ELBOW_JOINT];

        CartesianPoint::new(
            l1_m * t1.cos() + l2_m * t12.cos(),
            l1_m * t1.sin() + l2_m * t12.sin(),
            0.0,
        )
    }

    /// Solve the shoulder and elbow angles placing the wrist at the target.
    ///
    /// Only the X and Y components of the target are used. All other joints
    /// are set to zero.
    ///
    /// The elbow angle comes from the law of cosines over the triangle formed
    /// by the two links and the shoulder-target line, taking the negative
    /// branch. The shoulder angle is then the direction of the target
    /// corrected by the angle the elbow bend introduces.
    pub fn inverse_2dof(&self, target: &CartesianPoint) -> Result<JointConfig, KinError> {
        let (l1_m, l2_m) = self.reach_lengths_m();
        let (x, y) = (target.x, target.y);

        let dist_sq_m2 = x * x + y * y;
        check_reach(dist_sq_m2, l1_m, l2_m)?;

        // Elbow
        let elbow_rad =
            -acos_clamped((dist_sq_m2 - l1_m * l1_m - l2_m * l2_m) / (2.0 * l1_m * l2_m));
        let (s2, c2) = elbow_rad.sin_cos();

        // Shoulder
        let k1 = l1_m + l2_m * c2;
        let k2 = l2_m * s2;
        let shoulder_rad = (-k2 * x + k1 * y).atan2(k1 * x + k2 * y);

        let mut theta = [0.0; NUM_JOINTS];
        theta[SHOULDER_JOINT] = shoulder_rad;
        theta[ELBOW_JOINT] = elbow_rad;

        trace!(
            "IK 2DOF ({:.4}, {:.4}) -> shoulder {:.6} rad, elbow {:.6} rad",
            x,
            y,
            shoulder_rad,
            elbow_rad
        );

        self.check_joint_ranges(&theta)?;

        Ok(theta)
    }
}
