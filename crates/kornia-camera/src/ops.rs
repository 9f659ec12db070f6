use glam::{DMat3, DVec3};
use serde::{Deserialize, Serialize};

use crate::distortion::PolynomialDistortion;
use crate::error::CameraError;
use crate::intrinsics::Intrinsics;
use crate::linalg::{frobenius_norm, mat3_from_rows, rq_decomposition};
use crate::transforms::axis_angle_to_rotation_matrix;

/// Project 3D points to 2D image coordinates.
///
/// The world points are moved into the camera frame with the axis-angle
/// rotation `rvec` and the translation `tvec`, divided by depth, distorted with
/// `distortion` and mapped to pixels with the focal lengths and principal
/// point of `intrinsics`.
///
/// # Arguments
///
/// * `points_3d` - Array of 3D points in world coordinates
/// * `rvec` - Rotation as an axis-angle (Rodrigues) vector
/// * `tvec` - Translation vector
/// * `intrinsics` - Camera intrinsic parameters
/// * `distortion` - Optional distortion parameters. If `None`, no distortion is applied.
///
/// # Returns
///
/// A vector of 2D image coordinates `[u, v]` for each input 3D point.
/// Points behind the camera (z <= 0) will have NaN coordinates.
///
/// # Example
///
/// ```
/// use glam::DVec3;
/// use kornia_camera::intrinsics::Intrinsics;
/// use kornia_camera::ops::project_points;
///
/// let points_3d = vec![[1.0, 2.0, 5.0], [0.0, 0.0, 3.0]];
/// let intrinsics = Intrinsics::new(500.0, 500.0, 320.0, 240.0).unwrap();
///
/// let points_2d = project_points(&points_3d, &DVec3::ZERO, &DVec3::ZERO, &intrinsics, None);
/// assert_eq!(points_2d.len(), 2);
/// assert_eq!(points_2d[1], [320.0, 240.0]);
/// ```
pub fn project_points(
    points_3d: &[[f64; 3]],
    rvec: &DVec3,
    tvec: &DVec3,
    intrinsics: &Intrinsics,
    distortion: Option<&PolynomialDistortion>,
) -> Vec<[f64; 2]> {
    let rotation = axis_angle_to_rotation_matrix(rvec);
    let (fx, fy, cx, cy) = (
        intrinsics.fx(),
        intrinsics.fy(),
        intrinsics.cx(),
        intrinsics.cy(),
    );

    points_3d
        .iter()
        .map(|p| {
            // transform to camera coordinates: pc = R * pw + t
            let pc = rotation * DVec3::from_array(*p) + *tvec;

            if pc.z <= 0.0 {
                return [f64::NAN, f64::NAN];
            }

            let (x, y) = (pc.x / pc.z, pc.y / pc.z);
            let (x, y) = match distortion {
                Some(dist) => dist.distort_normalized(x, y),
                None => (x, y),
            };

            [fx * x + cx, fy * y + cy]
        })
        .collect()
}

const SINGULAR_EPS: f64 = 1e-12;

/// The factors `K`, `R`, `t` of a projection matrix `P ~ K [R | t]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProjectionFactors {
    /// Calibration matrix, upper triangular with `K[2,2] = 1`.
    pub k: DMat3,
    /// Rotation matrix.
    pub r: DMat3,
    /// Translation vector.
    pub t: DVec3,
}

/// Factor a 3x4 projection matrix into `K`, `R` and `t` such that `P ~ K [R | t]`.
///
/// The left 3x3 block is RQ decomposed, the diagonal of `K` is forced
/// positive and `K` is normalized so that `K[2,2] = 1`. The result only
/// recovers `P` up to scale and, for a negative scale, up to sign.
pub fn decompose_projection_matrix(p: &[[f64; 4]; 3]) -> Result<ProjectionFactors, CameraError> {
    let m = mat3_from_rows(&[
        [p[0][0], p[0][1], p[0][2]],
        [p[1][0], p[1][1], p[1][2]],
        [p[2][0], p[2][1], p[2][2]],
    ]);
    let p4 = DVec3::new(p[0][3], p[1][3], p[2][3]);

    if !m.is_finite() || !p4.is_finite() {
        return Err(CameraError::Degenerate(
            "projection matrix has non finite entries".to_string(),
        ));
    }

    let (k, mut r) = rq_decomposition(&m);

    // thresholds follow the magnitude of P, which is only defined up to scale
    let norm = frobenius_norm(&m);
    let scale = k.z_axis.z;
    if norm == 0.0
        || k.determinant().abs() <= SINGULAR_EPS * norm.powi(3)
        || scale.abs() <= SINGULAR_EPS * norm
    {
        return Err(CameraError::SingularIntrinsics);
    }

    let mut t = k.inverse() * p4;

    if r.determinant() < 0.0 {
        r = -r;
        t = -t;
    }

    Ok(ProjectionFactors {
        k: k * (1.0 / scale),
        r,
        t,
    })
}

/// Median of the values, reordering them in place. `NaN` for an empty slice.
pub(crate) fn median_in_place(values: &mut [f64]) -> f64 {
    values.sort_by(|a, b| a.total_cmp(b));
    let n = values.len();
    if n == 0 {
        return f64::NAN;
    }
    if n % 2 == 1 {
        values[n / 2]
    } else {
        0.5 * (values[n / 2 - 1] + values[n / 2])
    }
}
