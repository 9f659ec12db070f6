use glam::{DMat3, DQuat, DVec3};

use crate::error::CameraError;

/// Tolerance used to accept a matrix as a rotation.
pub const ROTATION_TOLERANCE: f64 = 1e-6;

/// Compute the rotation matrix from an axis-angle (Rodrigues) vector.
///
/// The direction of `rvec` is the rotation axis and its norm the angle in
/// radians. A zero vector maps to the identity.
///
/// Example:
///
/// ```
/// use glam::DVec3;
/// use kornia_camera::transforms::axis_angle_to_rotation_matrix;
///
/// let rvec = DVec3::new(std::f64::consts::FRAC_PI_2, 0.0, 0.0);
/// let rotation = axis_angle_to_rotation_matrix(&rvec);
/// assert!((rotation.col(1).z - 1.0).abs() < 1e-12);
/// ```
pub fn axis_angle_to_rotation_matrix(rvec: &DVec3) -> DMat3 {
    DMat3::from_quat(DQuat::from_scaled_axis(*rvec))
}

/// Compute the axis-angle (Rodrigues) vector of a rotation matrix.
///
/// The returned angle is in `[0, pi]`.
///
/// PRECONDITION: `rotation` is orthonormal with a positive determinant.
pub fn rotation_matrix_to_axis_angle(rotation: &DMat3) -> DVec3 {
    quaternion_to_axis_angle(&DQuat::from_mat3(rotation))
}

/// Compute the axis-angle (Rodrigues) vector of a unit quaternion.
pub fn quaternion_to_axis_angle(quat: &DQuat) -> DVec3 {
    // q and -q are the same rotation, pick the one with the shorter angle
    let q = if quat.w < 0.0 { -*quat } else { *quat };
    q.normalize().to_scaled_axis()
}

/// Check that a matrix is orthonormal with determinant +1.
pub fn check_rotation_matrix(rotation: &DMat3) -> Result<(), CameraError> {
    if !rotation.is_finite() {
        return Err(CameraError::InvalidRotation(
            "matrix has non finite entries".to_string(),
        ));
    }

    let gram = rotation.transpose() * *rotation;
    if !gram.abs_diff_eq(DMat3::IDENTITY, ROTATION_TOLERANCE) {
        return Err(CameraError::InvalidRotation(
            "matrix is not orthonormal".to_string(),
        ));
    }

    let det = rotation.determinant();
    if (det - 1.0).abs() > ROTATION_TOLERANCE {
        return Err(CameraError::InvalidRotation(format!(
            "determinant is {det}, expected 1"
        )));
    }

    Ok(())
}
