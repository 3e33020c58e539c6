//! # Trajectory planning module
//!
//! Generates synchronised joint space trajectories between two arm
//! configurations using a trapezoidal velocity profile.
//!
//! A single timing law is shared by all joints: the path parameter `s` goes
//! from 0 to 1 over the motion's duration and each joint interpolates linearly
//! between its start and end angles along `s`. Every joint therefore arrives
//! at exactly the same time, and the joint with the largest displacement sets
//! how fast the shared law may run under the speed cap.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod profile;
mod trajectory;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::debug;
use util::maths::max_abs_diff;

// Internal
use crate::arm_params::{JointConfig, NUM_JOINTS};
pub use profile::*;
pub use trajectory::*;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Default maximum number of samples in a single trajectory.
pub const MAX_TRAJ_SAMPLES: usize = 10_000;

/// Relative tolerance applied to `duration / period` before flooring, so that
/// ratios which are whole numbers on paper but fall fractionally short in
/// floating point (e.g. `0.3 / 0.1`) are not truncated a sample early. A
/// sample gained this way lies at or just past the duration and so evaluates
/// as the end of the motion.
const SAMPLE_COUNT_REL_TOL: f64 = 1e-9;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Trajectory planner.
///
/// Holds only the maximum trajectory length, planning is otherwise stateless.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrajPlanner {
    capacity: usize,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors which can occur during planning. All are detected before any sample
/// is generated.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PlanError {
    #[error("Trajectory would need {requested} samples, the capacity is {capacity}")]
    CapacityExceeded { requested: usize, capacity: usize },

    #[error("Trajectory duration must be positive and finite, got {0} s")]
    InvalidDuration(f64),

    #[error("Sample period must be positive and finite, got {0} s")]
    InvalidPeriod(f64),

    #[error("Joint speed cap must be positive and finite, got {0} rad/s")]
    InvalidVelocityCap(f64),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl TrajPlanner {
    /// Create a planner producing at most `capacity` samples per trajectory.
    pub fn new(capacity: usize) -> Self {
        Self { capacity }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Plan a trajectory from `start` to `end`.
    ///
    /// # Inputs
    /// - `max_speed_rads`: speed cap applied to the most displaced joint.
    /// - `duration_s`: time at which every joint reaches `end`.
    /// - `period_s`: sample period, `floor(duration_s / period_s) + 1` samples
    ///   are generated.
    ///
    /// # Outputs
    /// - The trajectory, whose first sample is `start` at rest. Its last
    ///   sample is at `floor(duration_s / period_s) * period_s`, which is `end`
    ///   at rest only when `duration_s` is a whole number of periods. Otherwise
    ///   the last sample lies part way through deceleration, short of `end`
    ///   and still moving.
    /// - A `PlanError` if the inputs are invalid or the trajectory would not
    ///   fit within the planner's capacity.
    pub fn plan(
        &self,
        start: &JointConfig,
        end: &JointConfig,
        max_speed_rads: f64,
        duration_s: f64,
        period_s: f64,
    ) -> Result<Trajectory, PlanError> {
        if !(duration_s.is_finite() && duration_s > 0.0) {
            return Err(PlanError::InvalidDuration(duration_s));
        }
        if !(period_s.is_finite() && period_s > 0.0) {
            return Err(PlanError::InvalidPeriod(period_s));
        }
        if !(max_speed_rads.is_finite() && max_speed_rads > 0.0) {
            return Err(PlanError::InvalidVelocityCap(max_speed_rads));
        }

        let num_samples = self.num_samples(duration_s, period_s)?;

        // Governing joint
        let (joint, max_disp_rad) = max_abs_diff(start, end).unwrap_or((0, 0.0));
        let governing_joint = if max_disp_rad > 0.0 { Some(joint) } else { None };

        let profile = TrapezoidProfileParams::new(max_disp_rad, max_speed_rads, duration_s);

        debug!(
            "Planning {} samples over {} s, governing joint {:?} moves {:.6} rad, profile {:?}",
            num_samples, duration_s, governing_joint, max_disp_rad, profile
        );

        let mut delta_rad = [0.0; NUM_JOINTS];
        for j in 0..NUM_JOINTS {
            delta_rad[j] = end[j] - start[j];
        }

        let mut pos_rad = Vec::with_capacity(num_samples);
        let mut rate_rads = Vec::with_capacity(num_samples);
        let mut accel_rads2 = Vec::with_capacity(num_samples);

        for i in 0..num_samples {
            let pp = profile.eval(i as f64 * period_s);

            let mut pos = [0.0; NUM_JOINTS];
            let mut rate = [0.0; NUM_JOINTS];
            let mut accel = [0.0; NUM_JOINTS];

            for j in 0..NUM_JOINTS {
                pos[j] = start[j] * (1.0 - pp.s) + end[j] * pp.s;
                rate[j] = delta_rad[j] * pp.s_dot;
                accel[j] = delta_rad[j] * pp.s_ddot;
            }

            pos_rad.push(pos);
            rate_rads.push(rate);
            accel_rads2.push(accel);
        }

        Ok(Trajectory {
            profile,
            governing_joint,
            period_s,
            pos_rad,
            rate_rads,
            accel_rads2,
        })
    }

    /// Number of samples needed for the given duration and period, checked
    /// against the capacity.
    fn num_samples(&self, duration_s: f64, period_s: f64) -> Result<usize, PlanError> {
        let num_steps = (duration_s / period_s * (1.0 + SAMPLE_COUNT_REL_TOL)).floor();
        let num_samples = num_steps + 1.0;

        if num_samples > self.capacity as f64 {
            return Err(PlanError::CapacityExceeded {
                // Saturates for absurd ratios
                requested: num_samples as usize,
                capacity: self.capacity,
            });
        }

        Ok(num_samples as usize)
    }
}

impl Default for TrajPlanner {
    fn default() -> Self {
        Self::new(MAX_TRAJ_SAMPLES)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const TOL: f64 = 1e-9;

    fn config(vals: &[f64]) -> JointConfig {
        let mut c = [0.0; NUM_JOINTS];
        c[..vals.len()].copy_from_slice(vals);
        c
    }

    fn assert_config_eq(a: &JointConfig, b: &JointConfig, tol: f64) {
        for j in 0..NUM_JOINTS {
            assert!((a[j] - b[j]).abs() < tol, "joint {}: {} != {}", j, a[j], b[j]);
        }
    }

    #[test]
    fn test_num_samples() {
        let p = TrajPlanner::default();
        assert_eq!(p.num_samples(1.0, 0.005), Ok(201));
        assert_eq!(p.num_samples(1.0, 0.01), Ok(101));
        assert_eq!(p.num_samples(1.0, 0.3), Ok(4));
        assert_eq!(p.num_samples(0.001, 0.005), Ok(1));

        // 2.9999999999999996 steps in floating point
        assert_eq!(p.num_samples(0.3, 0.1), Ok(4));
    }

    #[test]
    fn test_plan_endpoints() {
        let planner = TrajPlanner::default();
        let start = config(&[0.2, 1.6, 0.0, -2.0]);
        let end = config(&[0.7, 1.2, 0.0, -1.1]);

        for &(v_max, duration_s, period_s) in &[(1.0, 1.0, 0.005), (0.6, 2.0, 0.01), (10.0, 0.5, 0.001)] {
            let traj = planner.plan(&start, &end, v_max, duration_s, period_s).unwrap();

            let first = traj.sample(0).unwrap();
            assert_eq!(first.time_s, 0.0);
            assert_config_eq(&first.pos_rad, &start, TOL);
            assert_config_eq(&first.rate_rads, &[0.0; NUM_JOINTS], TOL);

            let last = traj.last().unwrap();
            assert!((last.time_s - duration_s).abs() < 1e-9);
            assert_config_eq(&last.pos_rad, &end, TOL);
            assert_config_eq(&last.rate_rads, &[0.0; NUM_JOINTS], 1e-6);
        }
    }

    #[test]
    fn test_plan_partial_last_period() {
        let planner = TrajPlanner::default();
        let start = config(&[0.0]);
        let end = config(&[1.0]);

        // 1 s does not divide into 0.3 s periods, the last sample is at 0.9 s
        // with a tenth of a second of deceleration still to go.
        let traj = planner.plan(&start, &end, 1.5, 1.0, 0.3).unwrap();
        assert_eq!(traj.len(), 4);
        assert!((traj.profile.blend_time_s - 1.0 / 3.0).abs() < TOL);

        let last = traj.last().unwrap();
        assert!((last.time_s - 0.9).abs() < TOL);
        assert!((last.pos_rad[0] - 0.9775).abs() < 1e-9);
        assert!((last.rate_rads[0] - 0.45).abs() < 1e-9);
        assert!((last.accel_rads2[0] + 4.5).abs() < 1e-9);
    }

    #[test]
    fn test_plan_extra_sample_at_end() {
        let planner = TrajPlanner::default();
        let start = config(&[0.0, 1.0]);
        let end = config(&[0.5, 2.0]);

        // Fractionally short of 1000 periods, the tolerance adds a sample
        // which falls just past the duration.
        let duration_s = 0.9999999995;
        let traj = planner.plan(&start, &end, 1.5, duration_s, 0.001).unwrap();
        assert_eq!(traj.len(), 1001);

        let last = traj.last().unwrap();
        assert!(last.time_s > duration_s);
        assert_config_eq(&last.pos_rad, &end, TOL);
        assert_config_eq(&last.rate_rads, &[0.0; NUM_JOINTS], TOL);
    }

    #[test]
    fn test_plan_velocity_continuity() {
        let planner = TrajPlanner::default();
        let start = config(&[0.0, 1.0, 0.0, -1.0]);
        let end = config(&[1.0, 2.0, 0.0, -0.2]);
        let period_s = 1e-3;

        let traj = planner.plan(&start, &end, 1.5, 1.0, period_s).unwrap();
        let tb = traj.profile.blend_time_s;
        assert!(tb > 0.0 && tb < 0.5);

        // Adjacent samples never jump by more than the peak acceleration
        // allows over one period.
        let max_step = traj.profile.accel * period_s;
        for w in traj.rate_rads.windows(2) {
            for j in 0..NUM_JOINTS {
                let disp = (end[j] - start[j]).abs();
                assert!((w[1][j] - w[0][j]).abs() <= max_step * disp + TOL);
            }
        }

        // The governing joint peaks at the capped speed
        assert_eq!(traj.governing_joint, Some(0));
        let peak = traj.rate_rads.iter().map(|r| r[0]).fold(0.0, f64::max);
        assert!((peak - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_plan_stationary() {
        let planner = TrajPlanner::default();
        let start = config(&[0.3, 1.5, 0.0, -1.2]);

        let traj = planner.plan(&start, &start, 1.0, 1.0, 0.01).unwrap();

        assert_eq!(traj.len(), 101);
        assert_eq!(traj.governing_joint, None);
        assert_eq!(traj.profile.peak_rate, 0.0);
        assert_eq!(traj.profile.accel, 0.0);
        assert_eq!(traj.profile.blend_time_s, 0.0);

        for s in traj.iter() {
            assert_eq!(s.pos_rad, start);
            assert_eq!(s.rate_rads, [0.0; NUM_JOINTS]);
            assert_eq!(s.accel_rads2, [0.0; NUM_JOINTS]);
        }
    }

    #[test]
    fn test_plan_slow_cap() {
        let planner = TrajPlanner::default();
        let start = config(&[0.0, 1.0]);
        let end = config(&[0.0, 3.0]);

        // 0.1 rad/s would take 20 s for a 2 rad move, the path rate is
        // clamped to 1/T.
        let traj = planner.plan(&start, &end, 0.1, 2.0, 0.01).unwrap();

        assert_eq!(traj.profile.peak_rate, 0.5);
        assert_eq!(traj.profile.blend_time_s, 0.0);
        assert!(traj.profile.accel.is_infinite());

        assert_config_eq(&traj.pos_rad[0], &start, TOL);
        assert_config_eq(&traj.rate_rads[0], &[0.0; NUM_JOINTS], TOL);
        assert_config_eq(&traj.pos_rad[100], &config(&[0.0, 2.0]), TOL);
        assert!((traj.rate_rads[100][1] - 1.0).abs() < TOL);
        assert_config_eq(&traj.pos_rad[200], &end, TOL);
        assert_config_eq(&traj.rate_rads[200], &[0.0; NUM_JOINTS], TOL);
    }

    #[test]
    fn test_plan_capacity_exceeded() {
        let planner = TrajPlanner::new(100);
        let start = config(&[0.0]);
        let end = config(&[1.0]);

        assert_eq!(
            planner.plan(&start, &end, 1.0, 1.0, 0.005),
            Err(PlanError::CapacityExceeded {
                requested: 201,
                capacity: 100
            })
        );

        // Exactly at capacity is fine
        assert_eq!(planner.plan(&start, &end, 1.0, 0.99, 0.01).unwrap().len(), 100);
    }

    #[test]
    fn test_plan_invalid_inputs() {
        let planner = TrajPlanner::default();
        let c = [0.0; NUM_JOINTS];

        assert_eq!(planner.plan(&c, &c, 1.0, 0.0, 0.01), Err(PlanError::InvalidDuration(0.0)));
        assert_eq!(planner.plan(&c, &c, 1.0, -1.0, 0.01), Err(PlanError::InvalidDuration(-1.0)));
        assert_eq!(planner.plan(&c, &c, 1.0, 1.0, 0.0), Err(PlanError::InvalidPeriod(0.0)));
        assert_eq!(planner.plan(&c, &c, 0.0, 1.0, 0.01), Err(PlanError::InvalidVelocityCap(0.0)));
        assert!(matches!(
            planner.plan(&c, &c, 1.0, f64::INFINITY, 0.01),
            Err(PlanError::InvalidDuration(_))
        ));
    }

    #[test]
    fn test_plan_deterministic() {
        let planner = TrajPlanner::default();
        let start = config(&[0.1, 1.0, 0.0, -0.5]);
        let end = config(&[-0.4, 2.0, 0.0, -1.5]);

        let a = planner.plan(&start, &end, 0.8, 1.5, 0.005).unwrap();
        let b = planner.plan(&start, &end, 0.8, 1.5, 0.005).unwrap();
        assert_eq!(a, b);
    }
}
