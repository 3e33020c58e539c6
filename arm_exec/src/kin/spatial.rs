//! 3 DOF spatial kinematics

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::trace;
use util::linalg::{self, Matrix4};
use util::maths::acos_clamped;

// Internal imports
use super::*;
use crate::arm_params::{ELBOW_JOINT, NUM_JOINTS, SHOULDER_JOINT, WAIST_JOINT};

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl<'a> ArmKinematics<'a> {
    /// Position of the wrist for the given waist, shoulder and elbow angles.
    pub fn forward_3dof(&self, theta: &JointConfig) -> CartesianPoint {
        let (l2_m, l3_m) = self.reach_lengths_m();

        let t1 = theta[SHOULDER_JOINT];
        let t12 = t1 + theta[ELBOW_JOINT];

        // Horizontal reach from the waist axis
        let radial_m = l2_m * t1.cos() + l3_m * t12.cos();
        let (s0, c0) = theta[WAIST_JOINT].sin_cos();

        CartesianPoint::new(
            c0 * radial_m,
            s0 * radial_m,
            l2_m * t1.sin() + l3_m * t12.sin(),
        )
    }

    /// Homogeneous transform from the base frame to the wrist frame.
    ///
    /// The waist yaws about base Z, and the shoulder and elbow pitch about
    /// the local Y axis with positive angles raising the arm. The translation
    /// part equals `forward_3dof`.
    pub fn frame_3dof(&self, theta: &JointConfig) -> Matrix4<f64> {
        let (l2_m, l3_m) = self.reach_lengths_m();

        linalg::rot_z(theta[WAIST_JOINT])
            * linalg::rot_y(-theta[SHOULDER_JOINT])
            * linalg::translation(l2_m, 0.0, 0.0)
            * linalg::rot_y(-theta[ELBOW_JOINT])
            * linalg::translation(l3_m, 0.0, 0.0)
    }

    /// Solve the waist, shoulder and elbow angles placing the wrist at the
    /// target.
    ///
    /// The waist points the arm's vertical plane at the target, after which
    /// the shoulder and elbow are solved in that plane over the radial
    /// distance and height of the target.
    pub fn inverse_3dof(&self, target: &CartesianPoint) -> Result<JointConfig, KinError> {
        let (l2_m, l3_m) = self.reach_lengths_m();
        let (x, y, z) = (target.x, target.y, target.z);

        let dist_sq_m2 = x * x + y * y + z * z;
        check_reach(dist_sq_m2, l2_m, l3_m)?;

        // Waist
        let waist_rad = y.atan2(x);

        // Elbow
        let elbow_rad =
            -acos_clamped((dist_sq_m2 - l2_m * l2_m - l3_m * l3_m) / (2.0 * l2_m * l3_m));
        let (s3, c3) = elbow_rad.sin_cos();

        // Shoulder
        let radial_m = (x * x + y * y).sqrt();
        let k1 = l2_m + l3_m * c3;
        let k2 = l3_m * s3;
        let shoulder_rad = (-k2 * radial_m + k1 * z).atan2(k1 * radial_m + k2 * z);

        let mut theta = [0.0; NUM_JOINTS];
        theta[WAIST_JOINT] = waist_rad;
        theta[SHOULDER_JOINT] = shoulder_rad;
        theta[ELBOW_JOINT] = elbow_rad;

        trace!(
            "IK 3DOF ({:.4}, {:.4}, {:.4}) -> waist {:.6} rad, shoulder {:.6} rad, elbow {:.6} rad",
            x,
            y,
            z,
            waist_rad,
            shoulder_rad,
            elbow_rad
        );

        self.check_joint_ranges(&theta)?;

        Ok(theta)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::arm_params::ArmParams;
    use std::f64::consts::FRAC_PI_4;

    const TOL: f64 = 1e-9;

    fn config(waist: f64, shoulder: f64, elbow: f64) -> JointConfig {
        let mut theta = [0.0; NUM_JOINTS];
        theta[WAIST_JOINT] = waist;
        theta[SHOULDER_JOINT] = shoulder;
        theta[ELBOW_JOINT] = elbow;
        theta
    }

    #[test]
    fn test_forward_then_inverse_3dof() {
        let params = ArmParams::crane_x7();
        let kin = ArmKinematics::new(&params);

        let configs = [
            config(0.244979, 1.664740, -2.071451),
            config(-1.0, 0.5, -0.5),
            config(2.0, 2.2, -1.5),
            config(0.0, 1.0, -0.01),
        ];

        for theta in configs.iter() {
            let solved = kin.inverse_3dof(&kin.forward_3dof(theta)).unwrap();

            for j in [WAIST_JOINT, SHOULDER_JOINT, ELBOW_JOINT].iter() {
                assert!(
                    (solved[*j] - theta[*j]).abs() < TOL,
                    "joint {}: {} != {}",
                    j,
                    solved[*j],
                    theta[*j]
                );
            }
        }
    }

    #[test]
    fn test_inverse_3dof() {
        let params = ArmParams::crane_x7();
        let kin = ArmKinematics::new(&params);

        let target = CartesianPoint::new(0.15, 0.15, 0.15);
        let theta = kin.inverse_3dof(&target).unwrap();

        assert!((theta[WAIST_JOINT] - FRAC_PI_4).abs() < TOL);
        assert!(theta[ELBOW_JOINT] < 0.0);
        assert!((kin.forward_3dof(&theta) - target).norm() < 1e-6);
    }

    #[test]
    fn test_reach_boundary_3dof() {
        let params = ArmParams::crane_x7();
        let kin = ArmKinematics::new(&params);

        // Straight up, exactly at full reach
        let theta = kin.inverse_3dof(&CartesianPoint::new(0.0, 0.0, 0.5)).unwrap();
        assert!((theta[SHOULDER_JOINT] - std::f64::consts::FRAC_PI_2).abs() < TOL);
        assert_eq!(theta[ELBOW_JOINT], 0.0);

        assert!(matches!(
            kin.inverse_3dof(&CartesianPoint::new(0.0, 0.0, 0.5 + 1e-9)),
            Err(KinError::Unreachable { .. })
        ));
    }

    #[test]
    fn test_elbow_never_positive_3dof() {
        let params = ArmParams::crane_x7();
        let kin = ArmKinematics::new(&params);

        for i in 0..=10 {
            for j in 0..=10 {
                for k in 0..=10 {
                    let target = CartesianPoint::new(
                        -0.5 + 0.1 * i as f64,
                        -0.5 + 0.1 * j as f64,
                        -0.5 + 0.1 * k as f64,
                    );
                    if let Ok(theta) = kin.inverse_3dof(&target) {
                        assert!(theta[ELBOW_JOINT] <= 0.0);
                    }
                }
            }
        }
    }

    #[test]
    fn test_frame_matches_forward_3dof() {
        let params = ArmParams::crane_x7();
        let kin = ArmKinematics::new(&params);

        for theta in [config(0.3, 1.2, -0.8), config(-2.0, 0.1, -2.5)].iter() {
            let origin = linalg::frame_origin(&kin.frame_3dof(theta));
            assert!((origin - kin.forward_3dof(theta)).norm() < TOL);
        }
    }

    #[test]
    fn test_forward_dispatch() {
        let params = ArmParams::crane_x7();
        let kin = ArmKinematics::new(&params);
        let theta = config(0.5, 1.0, -1.0);

        let p2 = kin.forward(DofMode::TwoDof, &theta);
        let p3 = kin.forward(DofMode::ThreeDof, &theta);

        // The planar model ignores the waist and lives in z = 0
        assert_eq!(p2.z, 0.0);
        assert!((p2.y - p3.z).abs() < TOL);
        assert!(((p3.x * p3.x + p3.y * p3.y).sqrt() - p2.x).abs() < TOL);
    }
}
