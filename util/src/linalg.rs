//! Linear algebra primitives
//!
//! Thin helpers over `nalgebra` for the 3D and 4D (homogeneous) quantities used
//! by the arm kinematics.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

pub use nalgebra::{Matrix3, Matrix4, Point3, Vector3, Vector4};

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Build a 3x3 matrix from row-major nested arrays.
#[rustfmt::skip]
pub fn mat3_from_rows(rows: &[[f64; 3]; 3]) -> Matrix3<f64> {
    Matrix3::new(
        rows[0][0], rows[0][1], rows[0][2],
        rows[1][0], rows[1][1], rows[1][2],
        rows[2][0], rows[2][1], rows[2][2],
    )
}

/// Invert a 3x3 matrix, returning `None` if it is singular.
pub fn inverse_3d(mat: &Matrix3<f64>) -> Option<Matrix3<f64>> {
    if mat.determinant() == 0.0 {
        return None;
    }

    mat.try_inverse()
}

/// Check that a 3x3 matrix is symmetric to within `tol` (absolute).
pub fn is_symmetric(mat: &Matrix3<f64>, tol: f64) -> bool {
    (mat - mat.transpose()).iter().all(|e| e.abs() <= tol)
}

/// Homogeneous rotation about the X axis.
#[rustfmt::skip]
pub fn rot_x(angle_rad: f64) -> Matrix4<f64> {
    let (s, c) = angle_rad.sin_cos();
    Matrix4::new(
        1.0, 0.0, 0.0, 0.0,
        0.0,   c,  -s, 0.0,
        0.0,   s,   c, 0.0,
        0.0, 0.0, 0.0, 1.0,
    )
}

/// Homogeneous rotation about the Y axis.
#[rustfmt::skip]
pub fn rot_y(angle_rad: f64) -> Matrix4<f64> {
    let (s, c) = angle_rad.sin_cos();
    Matrix4::new(
          c, 0.0,   s, 0.0,
        0.0, 1.0, 0.0, 0.0,
         -s, 0.0,   c, 0.0,
        0.0, 0.0, 0.0, 1.0,
    )
}

/// Homogeneous rotation about the Z axis.
#[rustfmt::skip]
pub fn rot_z(angle_rad: f64) -> Matrix4<f64> {
    let (s, c) = angle_rad.sin_cos();
    Matrix4::new(
          c,  -s, 0.0, 0.0,
          s,   c, 0.0, 0.0,
        0.0, 0.0, 1.0, 0.0,
        0.0, 0.0, 0.0, 1.0,
    )
}

/// Homogeneous translation.
#[rustfmt::skip]
pub fn translation(x: f64, y: f64, z: f64) -> Matrix4<f64> {
    Matrix4::new(
        1.0, 0.0, 0.0,   x,
        0.0, 1.0, 0.0,   y,
        0.0, 0.0, 1.0,   z,
        0.0, 0.0, 0.0, 1.0,
    )
}

/// Apply a homogeneous transform to a point.
pub fn transform_point(frame: &Matrix4<f64>, point: &Point3<f64>) -> Point3<f64> {
    let p = frame * Vector4::new(point.x, point.y, point.z, 1.0);
    Point3::new(p[0], p[1], p[2])
}

/// Origin of a homogeneous frame, i.e. its translation part.
pub fn frame_origin(frame: &Matrix4<f64>) -> Point3<f64> {
    Point3::new(frame[(0, 3)], frame[(1, 3)], frame[(2, 3)])
}
