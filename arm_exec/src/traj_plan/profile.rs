//! Trapezoidal velocity profile over a normalised path parameter

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Serialize;
use util::maths::clamp;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters of a trapezoidal timing law for the path parameter `s`, which
/// runs from 0 at the start of the motion to 1 at its end.
///
/// Because `s` is dimensionless all rates here are per second rather than
/// radians per second. A joint's actual rate is its displacement multiplied by
/// the path rate.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct TrapezoidProfileParams {
    /// Path rate during the cruise segment, in `[1/T, 2/T]` for a moving
    /// profile and zero for a stationary one.
    ///
    /// Units: 1/seconds
    pub peak_rate: f64,

    /// Path acceleration during the blend segments. Infinite when the blend
    /// time is zero, in which case the profile is pure cruise.
    ///
    /// Units: 1/seconds^2
    pub accel: f64,

    /// Length of each of the acceleration and deceleration segments.
    ///
    /// Units: seconds
    pub blend_time_s: f64,

    /// Total length of the motion.
    ///
    /// Units: seconds
    pub duration_s: f64,
}

/// Value of the path parameter and its derivatives at an instant.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PathPoint {
    pub s: f64,
    pub s_dot: f64,
    pub s_ddot: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl TrapezoidProfileParams {
    /// Derive the profile for a motion whose most displaced joint moves by
    /// `max_disp_rad`, limited by `max_speed_rads` and lasting `duration_s`.
    ///
    /// The candidate path rate `max_speed_rads / max_disp_rad` is clamped into
    /// `[1/T, 2/T]`: any slower and the motion cannot finish in `T`, any faster
    /// and there is no cruise segment left. The blend time and acceleration
    /// are then derived from the clamped rate.
    ///
    /// `duration_s` must be strictly positive.
    pub fn new(max_disp_rad: f64, max_speed_rads: f64, duration_s: f64) -> Self {
        // Nothing moves
        if !(max_disp_rad > 0.0) {
            return Self {
                duration_s,
                ..Self::default()
            };
        }

        let min_rate = 1.0 / duration_s;
        let max_rate = 2.0 / duration_s;

        let peak_rate = clamp(&(max_speed_rads / max_disp_rad), &min_rate, &max_rate);
        let blend_time_s = duration_s - 1.0 / peak_rate;

        if blend_time_s > 0.0 {
            Self {
                peak_rate,
                accel: peak_rate / blend_time_s,
                blend_time_s,
                duration_s,
            }
        } else {
            // Rate clamped to (or rounded onto) 1/T, no room to blend
            Self {
                peak_rate,
                accel: f64::INFINITY,
                blend_time_s: 0.0,
                duration_s,
            }
        }
    }

    /// True if the profile describes no motion.
    pub fn is_stationary(&self) -> bool {
        self.peak_rate == 0.0
    }

    /// Evaluate the path parameter at `t_s` seconds after the start.
    ///
    /// Times past the end of the motion evaluate as the end itself.
    pub fn eval(&self, t_s: f64) -> PathPoint {
        if self.is_stationary() {
            return PathPoint::default();
        }

        let tb = self.blend_time_s;
        let tf = self.duration_s;
        let t_s = t_s.min(tf);

        // Pure cruise: rest at both ends, constant rate in between
        if tb == 0.0 {
            return if t_s <= 0.0 {
                PathPoint::default()
            } else if t_s >= tf {
                PathPoint {
                    s: 1.0,
                    ..PathPoint::default()
                }
            } else {
                PathPoint {
                    s: self.peak_rate * t_s,
                    s_dot: self.peak_rate,
                    s_ddot: 0.0,
                }
            };
        }

        if t_s <= tb {
            // Accelerate
            PathPoint {
                s: 0.5 * self.accel * t_s * t_s,
                s_dot: self.accel * t_s,
                s_ddot: self.accel,
            }
        } else if t_s <= tf - tb {
            // Cruise
            PathPoint {
                s: self.peak_rate * (t_s - 0.5 * tb),
                s_dot: self.peak_rate,
                s_ddot: 0.0,
            }
        } else {
            // Decelerate
            let t_left_s = tf - t_s;
            PathPoint {
                s: 1.0 - 0.5 * self.accel * t_left_s * t_left_s,
                s_dot: self.accel * t_left_s,
                s_ddot: -self.accel,
            }
        }
    }
}
