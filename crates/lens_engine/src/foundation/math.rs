//! Math utilities and types
//!
//! Thin aliases over nalgebra so shader uniforms and the camera share one vocabulary.
//!
//! Matrix aliases follow GLSL naming (`matCxR`, columns first), while nalgebra names its
//! types rows first. `Mat2x3` is therefore nalgebra's `Matrix3x2`: two columns of three rows.

pub use nalgebra::{
    Vector2, Vector3, Vector4,
    Matrix2, Matrix3, Matrix4,
    Matrix3x2, Matrix4x3,
};

/// 2D vector type
pub type Vec2 = Vector2<f32>;

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4D vector type
pub type Vec4 = Vector4<f32>;

/// 2x2 matrix type
pub type Mat2 = Matrix2<f32>;

/// 3x3 matrix type
pub type Mat3 = Matrix3<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// GLSL `mat2x3`: 2 columns, 3 rows
pub type Mat2x3 = Matrix3x2<f32>;

/// GLSL `mat3x4`: 3 columns, 4 rows
pub type Mat3x4 = Matrix4x3<f32>;

/// 3D point type
pub type Point3 = nalgebra::Point3<f32>;

/// Math helpers
pub mod utils {
    use super::Vec3;

    /// Convert degrees to radians
    pub fn deg_to_rad(degrees: f32) -> f32 {
        degrees.to_radians()
    }

    /// Normalize `v`, or return `fallback` when `v` is too short to have a direction
    pub fn normalize_or(v: Vec3, fallback: Vec3) -> Vec3 {
        v.try_normalize(f32::EPSILON).unwrap_or(fallback)
    }
}
