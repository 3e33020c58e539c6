//! # Arm library.
//!
//! This library allows other crates in the workspace to access items defined inside the arm
//! crate.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Actuator interface - drives the arm's joints, with a simulated implementation
pub mod actuator;

/// Arm control module - converts arm commands into joint space trajectories
pub mod arm_ctrl;

/// Arm parameters - link and joint range tables of the arm
pub mod arm_params;

/// Cycle timer - runs an action at a fixed rate without drifting
pub mod cycle_timer;

/// Kinematics - forward and inverse kinematics of the reduced arm models
pub mod kin;

/// Trajectory planner - trapezoidal velocity profile trajectories between joint configurations
pub mod traj_plan;
