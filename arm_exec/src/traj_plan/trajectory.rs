//! Sampled joint space trajectory

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Serialize;
use util::archive::{ArchiveError, Archiver};

// Internal
use super::TrapezoidProfileParams;
use crate::arm_params::{JointConfig, NUM_JOINTS};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A joint space trajectory sampled at a fixed period.
///
/// Positions, rates and accelerations are stored as parallel arrays of equal
/// length, sample `i` being at `i * period_s` seconds after the start.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trajectory {
    /// Timing law shared by all joints.
    pub profile: TrapezoidProfileParams,

    /// Index of the joint with the largest displacement, or `None` if no
    /// joint moves.
    pub governing_joint: Option<usize>,

    /// Units: seconds
    pub period_s: f64,

    /// Units: radians
    pub pos_rad: Vec<JointConfig>,

    /// Units: radians/second
    pub rate_rads: Vec<JointConfig>,

    /// Units: radians/second^2
    pub accel_rads2: Vec<JointConfig>,
}

/// A single sample of a trajectory.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrajSample {
    pub index: usize,

    /// Units: seconds
    pub time_s: f64,

    /// Units: radians
    pub pos_rad: JointConfig,

    /// Units: radians/second
    pub rate_rads: JointConfig,

    /// Units: radians/second^2
    pub accel_rads2: JointConfig,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Trajectory {
    /// Number of samples.
    pub fn len(&self) -> usize {
        self.pos_rad.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pos_rad.is_empty()
    }

    /// Time of the given sample from the start of the trajectory.
    ///
    /// Units: seconds
    pub fn time_s(&self, index: usize) -> f64 {
        index as f64 * self.period_s
    }

    /// Get a sample, or `None` if the index is past the end.
    pub fn sample(&self, index: usize) -> Option<TrajSample> {
        Some(TrajSample {
            index,
            time_s: self.time_s(index),
            pos_rad: *self.pos_rad.get(index)?,
            rate_rads: *self.rate_rads.get(index)?,
            accel_rads2: *self.accel_rads2.get(index)?,
        })
    }

    /// Iterate over all samples in order.
    pub fn iter(&self) -> impl Iterator<Item = TrajSample> + '_ {
        (0..self.len()).filter_map(move |i| self.sample(i))
    }

    /// Final sample, `None` only for an empty trajectory.
    pub fn last(&self) -> Option<TrajSample> {
        self.len().checked_sub(1).and_then(|i| self.sample(i))
    }

    /// Write every sample as a CSV row of time followed by the position, rate
    /// and acceleration of each joint.
    pub fn archive(&self, arch: &mut Archiver) -> Result<(), ArchiveError> {
        let mut header = vec![String::from("time_s")];
        for quantity in &["pos_rad", "rate_rads", "accel_rads2"] {
            for j in 0..NUM_JOINTS {
                header.push(format!("{}_{}", quantity, j));
            }
        }
        arch.write_header(&header)?;

        for sample in self.iter() {
            arch.write_row(
                std::iter::once(sample.time_s)
                    .chain(sample.pos_rad.iter().copied())
                    .chain(sample.rate_rads.iter().copied())
                    .chain(sample.accel_rads2.iter().copied()),
            )?;
        }

        arch.flush()
    }
}
