use glam::{DMat3, DQuat, DVec3};
use serde::{Deserialize, Serialize};

use crate::error::CameraError;
use crate::transforms::{check_rotation_matrix, quaternion_to_axis_angle, ROTATION_TOLERANCE};

/// Represents the extrinsic parameters (pose) of a camera.
///
/// The pose maps world points into the camera frame as `p_c = R * p_w + t`.
/// The rotation is stored as a unit quaternion. Deserialization rejects
/// quaternions that are not unit length.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ExtrinsicsData")]
pub struct Extrinsics {
    rotation: DQuat,
    translation: DVec3,
}

#[derive(Deserialize)]
struct ExtrinsicsData {
    rotation: DQuat,
    translation: DVec3,
}

impl TryFrom<ExtrinsicsData> for Extrinsics {
    type Error = CameraError;

    fn try_from(data: ExtrinsicsData) -> Result<Self, Self::Error> {
        let norm = data.rotation.length();
        if (norm - 1.0).abs() > ROTATION_TOLERANCE {
            return Err(CameraError::InvalidRotation(format!(
                "quaternion norm is {norm}, expected 1"
            )));
        }
        if !data.translation.is_finite() {
            return Err(CameraError::InvalidRotation(
                "translation has non finite entries".to_string(),
            ));
        }
        Self::from_quaternion(data.rotation, data.translation)
    }
}

impl Default for Extrinsics {
    fn default() -> Self {
        Self::identity()
    }
}

impl Extrinsics {
    /// Create the extrinsics from a rotation matrix and a translation vector.
    pub fn new(rotation: DMat3, translation: DVec3) -> Result<Self, CameraError> {
        check_rotation_matrix(&rotation)?;
        Ok(Self {
            rotation: DQuat::from_mat3(&rotation).normalize(),
            translation,
        })
    }

    /// Create the extrinsics from a quaternion and a translation vector.
    ///
    /// The quaternion is normalized.
    pub fn from_quaternion(rotation: DQuat, translation: DVec3) -> Result<Self, CameraError> {
        let norm = rotation.length();
        if !norm.is_finite() || norm < 1e-12 {
            return Err(CameraError::InvalidRotation(
                "quaternion has zero or non finite norm".to_string(),
            ));
        }
        Ok(Self {
            rotation: rotation / norm,
            translation,
        })
    }

    /// Create the extrinsics from an axis-angle vector and a translation vector.
    pub fn from_axis_angle(rvec: DVec3, translation: DVec3) -> Self {
        Self {
            rotation: DQuat::from_scaled_axis(rvec),
            translation,
        }
    }

    /// The camera at the origin looking down the z axis.
    pub fn identity() -> Self {
        Self {
            rotation: DQuat::IDENTITY,
            translation: DVec3::ZERO,
        }
    }

    /// Simulate a camera at identity.
    pub fn simulate() -> Self {
        Self::identity()
    }

    /// The rotation matrix.
    pub fn rotation(&self) -> DMat3 {
        DMat3::from_quat(self.rotation)
    }

    /// The translation vector.
    pub fn translation(&self) -> DVec3 {
        self.translation
    }

    /// The rotation as a unit quaternion.
    pub fn quaternion(&self) -> DQuat {
        self.rotation
    }

    /// The rotation as an axis-angle (Rodrigues) vector.
    pub fn rvec(&self) -> DVec3 {
        quaternion_to_axis_angle(&self.rotation)
    }

    /// Transform a point: `R * p + t`.
    pub fn transform_point(&self, point: DVec3) -> DVec3 {
        self.rotation * point + self.translation
    }

    /// The inverse transform.
    pub fn inverse(&self) -> Self {
        let rotation = self.rotation.conjugate();
        Self {
            rotation,
            translation: -(rotation * self.translation),
        }
    }

    /// Compose two transforms, `self * other`, applying `other` first.
    pub fn compose(&self, other: &Extrinsics) -> Self {
        Self {
            rotation: (self.rotation * other.rotation).normalize(),
            translation: self.rotation * other.translation + self.translation,
        }
    }

    /// The 3x4 matrix `[R | t]` in row-major order.
    pub fn to_matrix(&self) -> [[f64; 4]; 3] {
        let r = self.rotation();
        let t = self.translation;
        let mut rt = [[0.0; 4]; 3];
        for (i, row) in rt.iter_mut().enumerate() {
            let r_row = r.row(i);
            *row = [r_row.x, r_row.y, r_row.z, t[i]];
        }
        rt
    }
}
