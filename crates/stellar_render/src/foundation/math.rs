//! Math utilities and types
//!
//! Provides the vector and matrix aliases used by the scene graph together with
//! the handful of matrix constructors the renderer needs.
//!
//! # Conventions
//! - Column vectors, so a point is transformed as `M * p`
//! - Right-handed world space, Y-up
//! - Cameras (and directional light spaces) look down their local -Z axis
//! - Clip space follows the OpenGL convention, NDC in `[-1, 1]` on every axis

pub use nalgebra::{
    Vector2, Vector3, Vector4,
    Matrix3, Matrix4,
    Rotation3,
    Unit, UnitQuaternion,
};

/// 2D vector type
pub type Vec2 = Vector2<f32>;

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4D vector type
pub type Vec4 = Vector4<f32>;

/// 3x3 matrix type
pub type Mat3 = Matrix3<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// Quaternion type for rotations
pub type Quat = UnitQuaternion<f32>;

/// Math utility functions
pub mod utils {
    /// Convert degrees to radians
    pub fn deg_to_rad(degrees: f32) -> f32 {
        degrees.to_radians()
    }

    /// Linear interpolation
    pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
        a + (b - a) * t
    }

    /// Component-wise linear interpolation of RGB(A) arrays
    pub fn lerp_array<const N: usize>(a: [f32; N], b: [f32; N], t: f32) -> [f32; N] {
        let mut result = a;
        for (value, target) in result.iter_mut().zip(b) {
            *value = lerp(*value, target, t);
        }
        result
    }
}

/// Extension trait for Mat4 with the constructors and accessors used by the scene graph
pub trait Mat4Ext {
    /// Translation matrix moving points by `v`
    fn translation(v: &Vec3) -> Mat4;

    /// Rotation matrix around an arbitrary axis (the axis does not need to be normalized)
    fn rotation(axis: &Vec3, angle: f32) -> Mat4;

    /// Non-uniform scaling matrix
    fn scaling(factors: &Vec3) -> Mat4;

    /// Orientation matrix whose local -Z axis points along `direction`
    ///
    /// The result maps local (object) space to world space. Its transpose maps world
    /// space into the space of an observer looking along `direction`.
    fn looking_towards(direction: &Vec3) -> Mat4;

    /// OpenGL style perspective projection (vertical field of view in radians)
    fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4;

    /// OpenGL style orthographic projection of a box centered on the view axis
    fn orthographic(half_width: f32, half_height: f32, near: f32, far: f32) -> Mat4;

    /// The translation part of an affine matrix
    fn translation_vector(&self) -> Vec3;

    /// Transforms the point `p` (w = 1) and returns the homogeneous result
    fn transform_point4(&self, p: &Vec3) -> Vec4;
}

impl Mat4Ext for Mat4 {
    fn translation(v: &Vec3) -> Mat4 {
        Mat4::new_translation(v)
    }

    fn rotation(axis: &Vec3, angle: f32) -> Mat4 {
        Mat4::from_axis_angle(&Unit::new_normalize(*axis), angle)
    }

    fn scaling(factors: &Vec3) -> Mat4 {
        Mat4::new_nonuniform_scaling(factors)
    }

    fn looking_towards(direction: &Vec3) -> Mat4 {
        let back = -direction.normalize();
        // Pick an up vector that is not parallel to the viewing direction
        let up = if back.y.abs() > 0.999 { Vec3::z() } else { Vec3::y() };
        let right = up.cross(&back).normalize();
        let true_up = back.cross(&right);
        Mat4::new(
            right.x, true_up.x, back.x, 0.0,
            right.y, true_up.y, back.y, 0.0,
            right.z, true_up.z, back.z, 0.0,
            0.0, 0.0, 0.0, 1.0,
        )
    }

    fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
        Mat4::new_perspective(aspect, fov_y, near, far)
    }

    fn orthographic(half_width: f32, half_height: f32, near: f32, far: f32) -> Mat4 {
        Mat4::new_orthographic(-half_width, half_width, -half_height, half_height, near, far)
    }

    fn translation_vector(&self) -> Vec3 {
        Vec3::new(self[(0, 3)], self[(1, 3)], self[(2, 3)])
    }

    fn transform_point4(&self, p: &Vec3) -> Vec4 {
        self * Vec4::new(p.x, p.y, p.z, 1.0)
    }
}

/// Converts the rotation part of an orientation matrix to a unit quaternion
pub fn quat_from_orientation(matrix: &Mat4) -> Quat {
    let rotation: Mat3 = matrix.fixed_view::<3, 3>(0, 0).into_owned();
    Quat::from_rotation_matrix(&Rotation3::from_matrix_unchecked(rotation))
}

/// Spherical interpolation between two orientation matrices
pub fn slerp_orientation(from: &Mat4, to: &Mat4, t: f32) -> Mat4 {
    quat_from_orientation(from)
        .slerp(&quat_from_orientation(to), t)
        .to_homogeneous()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_looking_towards_maps_negative_z_to_direction() {
        let direction = Vec3::new(1.0, -1.0, 0.5).normalize();
        let orientation = Mat4::looking_towards(&direction);
        let forward = orientation.transform_vector(&-Vec3::z());
        assert_relative_eq!(forward, direction, epsilon = 1e-5);
    }

    #[test]
    fn test_looking_towards_straight_down() {
        let orientation = Mat4::looking_towards(&Vec3::new(0.0, -1.0, 0.0));
        let forward = orientation.transform_vector(&-Vec3::z());
        assert_relative_eq!(forward, Vec3::new(0.0, -1.0, 0.0), epsilon = 1e-5);
    }

    #[test]
    fn test_translation_roundtrip() {
        let v = Vec3::new(1.0, 2.0, 3.0);
        assert_eq!(Mat4::translation(&v).translation_vector(), v);
        let point = Mat4::translation(&v).transform_point4(&Vec3::zeros());
        assert_eq!(point, Vec4::new(1.0, 2.0, 3.0, 1.0));
    }

    #[test]
    fn test_slerp_halfway() {
        let from = Mat4::identity();
        let to = Mat4::rotation(&Vec3::y(), utils::deg_to_rad(90.0));
        let halfway = slerp_orientation(&from, &to, 0.5);
        let expected = Mat4::rotation(&Vec3::y(), utils::deg_to_rad(45.0));
        assert_relative_eq!(halfway, expected, epsilon = 1e-5);
    }
}
