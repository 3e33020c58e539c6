//! # Arm parameter model
//!
//! Static physical description of the arm: the mass, length, centre of mass
//! and inertia tensor of each link, and the movable range of each joint.
//!
//! An `ArmParams` is built once, either from the built-in CRANE-X7 table or
//! from a parameter file, validated, and then only ever borrowed immutably by
//! the solver and planner.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Deserialize, Serialize};

// Internal
use util::linalg::{self, Matrix3};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Number of joint slots on the arm (7 axes plus the end effector).
pub const NUM_JOINTS: usize = 8;

/// Number of links in the 2 degree of freedom planar reduction.
pub const NUM_LINKS_2DOF: usize = 2;

/// Number of links in the 3 degree of freedom spatial reduction.
pub const NUM_LINKS_3DOF: usize = 3;

/// Joint index of the waist (yaw) axis.
pub const WAIST_JOINT: usize = 0;

/// Joint index of the shoulder (pitch) axis.
pub const SHOULDER_JOINT: usize = 1;

/// Joint index of the elbow (pitch) axis.
pub const ELBOW_JOINT: usize = 3;

/// Absolute tolerance on inertia tensor symmetry.
///
/// Units: kg m^2
const INERTIA_SYMMETRY_TOL: f64 = 1e-12;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// An angle for each joint slot of the arm, in joint order.
///
/// Units: radians (or radians/second, radians/second^2 for rates)
pub type JointConfig = [f64; NUM_JOINTS];

/// Physical parameters of a single link.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinkParameter {
    /// Units: kilograms
    pub mass_kg: f64,

    /// Distance between the joint at the start of the link and the joint at
    /// the end of it.
    ///
    /// Units: meters
    pub length_m: f64,

    /// Position of the centre of mass in the link's local frame.
    ///
    /// Units: meters
    pub com_m: [f64; 3],

    /// Inertia tensor about the centre of mass, row-major.
    ///
    /// Units: kg m^2
    pub inertia_kgm2: [[f64; 3]; 3],
}

/// Movable range of a joint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JointRange {
    /// Units: radians
    pub min_rad: f64,

    /// Units: radians
    pub max_rad: f64,
}

/// Parameters of the whole arm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArmParams {
    /// The fixed base link.
    pub base_link: LinkParameter,

    /// Links of the 3 DOF reduction: waist, upper arm, forearm. The 2 DOF
    /// reduction uses the last two.
    pub links: [LinkParameter; NUM_LINKS_3DOF],

    /// Movable range of each joint slot.
    pub joint_ranges: [JointRange; NUM_JOINTS],
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Reasons a set of arm parameters can be rejected.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParamsError {
    #[error("Joint {joint} has an invalid range [{min_rad}, {max_rad}]")]
    InvalidJointRange {
        joint: usize,
        min_rad: f64,
        max_rad: f64,
    },

    #[error("The base link is invalid: {0}")]
    InvalidBaseLink(LinkError),

    #[error("Link {link} is invalid: {error}")]
    InvalidLink { link: usize, error: LinkError },
}

/// Reasons a single link's parameters can be rejected.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum LinkError {
    #[error("length of {0} m")]
    InvalidLength(f64),

    #[error("mass of {0} kg")]
    InvalidMass(f64),

    #[error("inertia tensor is not symmetric")]
    AsymmetricInertia,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl LinkParameter {
    /// Check the link has a positive length, a non-negative mass and a
    /// symmetric inertia tensor.
    pub fn validate(&self) -> Result<(), LinkError> {
        if !(self.length_m.is_finite() && self.length_m > 0.0) {
            return Err(LinkError::InvalidLength(self.length_m));
        }
        if !(self.mass_kg.is_finite() && self.mass_kg >= 0.0) {
            return Err(LinkError::InvalidMass(self.mass_kg));
        }
        if !linalg::is_symmetric(&self.inertia(), INERTIA_SYMMETRY_TOL) {
            return Err(LinkError::AsymmetricInertia);
        }

        Ok(())
    }

    /// Inertia tensor as a matrix.
    pub fn inertia(&self) -> Matrix3<f64> {
        linalg::mat3_from_rows(&self.inertia_kgm2)
    }

    /// Inverse of the inertia tensor, `None` if it is singular.
    pub fn inertia_inverse(&self) -> Option<Matrix3<f64>> {
        linalg::inverse_3d(&self.inertia())
    }
}

impl JointRange {
    /// Create a new range. No checks are made, see `ArmParams::validate`.
    pub const fn new(min_rad: f64, max_rad: f64) -> Self {
        Self { min_rad, max_rad }
    }

    /// True if the angle lies within the closed range.
    pub fn contains(&self, angle_rad: f64) -> bool {
        self.min_rad <= angle_rad && angle_rad <= self.max_rad
    }

    fn is_valid(&self) -> bool {
        self.min_rad.is_finite() && self.max_rad.is_finite() && self.min_rad <= self.max_rad
    }
}

impl ArmParams {
    /// Parameters of the CRANE-X7 arm.
    pub fn crane_x7() -> Self {
        Self {
            base_link: LinkParameter {
                mass_kg: 0.388,
                length_m: 0.041,
                com_m: [-6.734e-3, -0.001e-3, 17.921e-3],
                inertia_kgm2: [
                    [324812.981e-9, 1.195e-9, -47122.898e-9],
                    [1.195e-9, 482993.163e-9, 19.475e-9],
                    [-47122.898e-9, 19.475e-9, 585569.734e-9],
                ],
            },
            links: [
                LinkParameter {
                    mass_kg: 0.253,
                    length_m: 0.064,
                    com_m: [0.243e-3, -0.105e-3, 46.95e-3],
                    inertia_kgm2: [
                        [178706.106e-9, -73.234e-9, 888.676e-9],
                        [-73.234e-9, 176299.332e-9, 623.013e-9],
                        [888.676e-9, 623.013e-9, 89586.08e-9],
                    ],
                },
                LinkParameter {
                    mass_kg: 0.451,
                    length_m: 0.250,
                    com_m: [122.346e-3, 9.596e-3, 0.097e-3],
                    inertia_kgm2: [
                        [273465.146e-9, -127207.638e-9, -5428.565e-9],
                        [-127207.638e-9, 3498438.202e-9, 1007.993e-9],
                        [-5428.565e-9, 1007.993e-9, 3545676.16e-9],
                    ],
                },
                LinkParameter {
                    mass_kg: 0.712,
                    length_m: 0.250,
                    com_m: [186.265e-3, 1.924e-3, 0.357e-3],
                    inertia_kgm2: [
                        [344745.452e-9, 279720.99e-9, -11963.306e-9],
                        [279720.99e-9, 5739146.215e-9, 52.649e-9],
                        [-11963.306e-9, 52.649e-9, 5783803.266e-9],
                    ],
                },
            ],
            joint_ranges: [
                JointRange::new(-2.740, 2.740),
                JointRange::new(0.000, 3.141),
                JointRange::new(-2.740, 2.740),
                JointRange::new(-2.740, 0.000),
                JointRange::new(-2.740, 2.740),
                JointRange::new(-1.570, 1.570),
                JointRange::new(-2.914, 2.914),
                // End effector
                JointRange::new(-0.087, 1.570),
            ],
        }
    }

    /// Check the parameters describe a physically meaningful arm.
    pub fn validate(&self) -> Result<(), ParamsError> {
        for (joint, range) in self.joint_ranges.iter().enumerate() {
            if !range.is_valid() {
                return Err(ParamsError::InvalidJointRange {
                    joint,
                    min_rad: range.min_rad,
                    max_rad: range.max_rad,
                });
            }
        }

        self.base_link.validate().map_err(ParamsError::InvalidBaseLink)?;

        for (link, p) in self.links.iter().enumerate() {
            p.validate().map_err(|error| ParamsError::InvalidLink { link, error })?;
        }

        Ok(())
    }

    /// The base link.
    pub fn base_link(&self) -> &LinkParameter {
        &self.base_link
    }

    /// Links of the 2 DOF planar reduction (upper arm, forearm).
    pub fn links_2dof(&self) -> &[LinkParameter] {
        &self.links[NUM_LINKS_3DOF - NUM_LINKS_2DOF..]
    }

    /// Links of the 3 DOF spatial reduction (waist, upper arm, forearm).
    pub fn links_3dof(&self) -> &[LinkParameter; NUM_LINKS_3DOF] {
        &self.links
    }

    /// Range of a single joint, `None` if the index is out of bounds.
    pub fn joint_range(&self, joint: usize) -> Option<&JointRange> {
        self.joint_ranges.get(joint)
    }

    /// Ranges of all joints.
    pub fn joint_ranges(&self) -> &[JointRange; NUM_JOINTS] {
        &self.joint_ranges
    }

    /// Length of the upper arm (shoulder to elbow).
    ///
    /// Units: meters
    pub fn upper_arm_length_m(&self) -> f64 {
        self.links[1].length_m
    }

    /// Length of the forearm (elbow to wrist).
    ///
    /// Units: meters
    pub fn forearm_length_m(&self) -> f64 {
        self.links[2].length_m
    }

    /// Total mass of the base and the modelled links.
    ///
    /// Units: kilograms
    pub fn total_mass_kg(&self) -> f64 {
        self.base_link.mass_kg + self.links.iter().map(|l| l.mass_kg).sum::<f64>()
    }
}

impl Default for ArmParams {
    fn default() -> Self {
        Self::crane_x7()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_crane_x7_valid() {
        let p = ArmParams::crane_x7();
        assert_eq!(p.validate(), Ok(()));

        assert_eq!(p.links_2dof().len(), NUM_LINKS_2DOF);
        assert_eq!(p.links_2dof()[0], p.links[1]);
        assert_eq!(p.upper_arm_length_m(), 0.25);
        assert_eq!(p.forearm_length_m(), 0.25);
        assert!((p.total_mass_kg() - 1.804).abs() < 1e-12);

        // All inertia tensors are invertible
        for l in p.links_3dof().iter() {
            assert!(l.inertia_inverse().is_some());
        }
        assert!(p.base_link().inertia_inverse().is_some());
    }

    #[test]
    fn test_joint_range() {
        let p = ArmParams::crane_x7();
        let shoulder = p.joint_range(SHOULDER_JOINT).unwrap();
        assert!(shoulder.contains(0.0));
        assert!(shoulder.contains(3.141));
        assert!(!shoulder.contains(-1e-9));

        assert!(p.joint_range(NUM_JOINTS).is_none());
    }

    #[test]
    fn test_validate() {
        let mut p = ArmParams::crane_x7();
        p.joint_ranges[5] = JointRange::new(1.0, -1.0);
        assert_eq!(
            p.validate(),
            Err(ParamsError::InvalidJointRange {
                joint: 5,
                min_rad: 1.0,
                max_rad: -1.0
            })
        );

        let mut p = ArmParams::crane_x7();
        p.links[2].length_m = 0.0;
        assert_eq!(
            p.validate(),
            Err(ParamsError::InvalidLink {
                link: 2,
                error: LinkError::InvalidLength(0.0)
            })
        );

        let mut p = ArmParams::crane_x7();
        p.links[1].inertia_kgm2[0][1] = 1.0;
        assert_eq!(
            p.validate(),
            Err(ParamsError::InvalidLink {
                link: 1,
                error: LinkError::AsymmetricInertia
            })
        );
    }

    #[test]
    fn test_validate_base_link() {
        let mut p = ArmParams::crane_x7();
        p.base_link.mass_kg = -0.388;
        assert_eq!(
            p.validate(),
            Err(ParamsError::InvalidBaseLink(LinkError::InvalidMass(-0.388)))
        );

        let mut p = ArmParams::crane_x7();
        p.base_link.inertia_kgm2[2][0] = 0.0;
        assert_eq!(
            p.validate(),
            Err(ParamsError::InvalidBaseLink(LinkError::AsymmetricInertia))
        );

        let mut p = ArmParams::crane_x7();
        p.base_link.length_m = f64::NAN;
        assert!(matches!(
            p.validate(),
            Err(ParamsError::InvalidBaseLink(LinkError::InvalidLength(_)))
        ));
    }

    #[test]
    fn test_toml_round_trip() {
        let p = ArmParams::crane_x7();
        let s = toml::to_string(&p).unwrap();
        let q: ArmParams = toml::from_str(&s).unwrap();
        assert_eq!(p, q);
    }

    #[test]
    fn test_param_file_matches_builtin() {
        let q: ArmParams = toml::from_str(include_str!("../../params/arm.toml")).unwrap();
        assert_eq!(q, ArmParams::crane_x7());
    }
}
