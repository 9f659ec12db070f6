use glam::{DMat3, DVec2, DVec3};
use serde::{Deserialize, Serialize};

use crate::error::CameraError;
use crate::extrinsics::Extrinsics;
use crate::intrinsics::Intrinsics;
use crate::kinect_v1;
use crate::ops::{decompose_projection_matrix, project_points, ProjectionFactors};

/// A pinhole camera made of its intrinsic and extrinsic parameters.
///
/// The camera owns both parameter sets. The projection matrix is derived on
/// every call so it always reflects the current pose.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    intrinsics: Intrinsics,
    extrinsics: Extrinsics,
}

impl Camera {
    /// Create a camera from intrinsics and extrinsics.
    pub fn new(intrinsics: Intrinsics, extrinsics: Extrinsics) -> Self {
        Self {
            intrinsics,
            extrinsics,
        }
    }

    /// Create a camera from the calibration matrix, rotation and translation.
    pub fn from_parts(k: DMat3, r: DMat3, t: DVec3) -> Result<Self, CameraError> {
        Ok(Self::new(Intrinsics::from_matrix(k)?, Extrinsics::new(r, t)?))
    }

    /// Simulate a 640x480 camera with 500 focal length at identity.
    pub fn simulate() -> Self {
        Self::new(Intrinsics::simulate(), Extrinsics::simulate())
    }

    /// A camera with the Kinect v1 depth sensor calibration.
    pub fn kinect(r: DMat3, t: DVec3) -> Result<Self, CameraError> {
        Self::from_parts(kinect_v1::k_depth(), r, t)
    }

    /// The intrinsic parameters.
    pub fn intrinsics(&self) -> &Intrinsics {
        &self.intrinsics
    }

    /// Mutable access to the intrinsic parameters, e.g. to set the image shape.
    pub fn intrinsics_mut(&mut self) -> &mut Intrinsics {
        &mut self.intrinsics
    }

    /// The extrinsic parameters.
    pub fn extrinsics(&self) -> &Extrinsics {
        &self.extrinsics
    }

    /// The rotation matrix of the pose.
    pub fn rotation(&self) -> DMat3 {
        self.extrinsics.rotation()
    }

    /// The translation vector of the pose.
    pub fn translation(&self) -> DVec3 {
        self.extrinsics.translation()
    }

    /// Replace the pose of the camera.
    pub fn set_pose(&mut self, pose: Extrinsics) {
        self.extrinsics = pose;
    }

    /// The field of view per axis, see [`Intrinsics::field_of_view`].
    pub fn field_of_view(&self) -> [f64; 2] {
        self.intrinsics.field_of_view()
    }

    /// The 3x4 projection matrix `P = K [R | t]` in row-major order.
    pub fn projection_matrix(&self) -> [[f64; 4]; 3] {
        let k = self.intrinsics.k();
        let rt = self.extrinsics.to_matrix();
        let mut p = [[0.0; 4]; 3];
        for (i, row) in p.iter_mut().enumerate() {
            let k_row = k.row(i);
            for (j, val) in row.iter_mut().enumerate() {
                *val = k_row.x * rt[0][j] + k_row.y * rt[1][j] + k_row.z * rt[2][j];
            }
        }
        p
    }

    /// Project world points onto the image plane.
    ///
    /// Returns one pixel per input point in the same order. Points behind the
    /// camera are `NaN`.
    pub fn project(&self, points: &[[f64; 3]]) -> Vec<[f64; 2]> {
        let distortion = self.intrinsics.distortion();
        project_points(
            points,
            &self.extrinsics.rvec(),
            &self.extrinsics.translation(),
            &self.intrinsics,
            distortion.has_distortion().then_some(distortion),
        )
    }

    /// The depth (camera frame z) of each world point.
    pub fn camera_frame_depths(&self, points: &[[f64; 3]]) -> Vec<f64> {
        points
            .iter()
            .map(|p| self.extrinsics.transform_point(DVec3::from_array(*p)).z)
            .collect()
    }

    /// Factor the projection matrix back into `K`, `R` and `t`.
    ///
    /// The round trip is approximate: `K` comes back normalized with
    /// `K[2,2] = 1`.
    pub fn factor(&self) -> Result<ProjectionFactors, CameraError> {
        decompose_projection_matrix(&self.projection_matrix())
    }

    /// The principal point `(cx, cy)` of the camera.
    pub fn center(&self) -> Result<DVec2, CameraError> {
        let (cx, cy) = (self.intrinsics.cx(), self.intrinsics.cy());
        if !cx.is_finite() || !cy.is_finite() {
            return Err(CameraError::MissingPrincipalPoint);
        }
        Ok(DVec2::new(cx, cy))
    }
}
