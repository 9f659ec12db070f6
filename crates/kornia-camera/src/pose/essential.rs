use glam::{DMat3, DVec3};

use crate::error::CameraError;
use crate::linalg::{mat3_from_rows, mat3_to_faer, right_null_vector};

const EPIPOLE_EPS: f64 = 1e-12;

/// Build an essential matrix from a fundamental matrix and the shared camera intrinsics.
///
/// E = K^T * F * K
pub fn compute_essential(f: &DMat3, k: &DMat3) -> DMat3 {
    k.transpose() * *f * *k
}

/// Compute the right epipole of a fundamental matrix, `F * e = 0`.
///
/// The epipole is returned in homogeneous coordinates with `e[2] = 1`. Use the
/// transposed matrix for the left epipole.
///
/// # Errors
///
/// [`CameraError::EpipoleAtInfinity`] when the third coordinate vanishes, i.e.
/// the epipolar lines are parallel.
pub fn compute_epipole(f: &DMat3) -> Result<[f64; 3], CameraError> {
    let e = right_null_vector(&mat3_to_faer(f));
    let norm = e.iter().map(|v| v * v).sum::<f64>().sqrt();
    if !norm.is_finite() || e[2].abs() <= EPIPOLE_EPS * norm {
        return Err(CameraError::EpipoleAtInfinity);
    }
    Ok([e[0] / e[2], e[1] / e[2], 1.0])
}

/// Decompose an essential matrix into four possible (R, t) solutions.
///
/// Returns the candidate poses where R is a rotation and t is a unit 3-vector.
/// The physically valid one puts the observed points in front of both cameras.
pub fn decompose_essential(e: &DMat3) -> [(DMat3, DVec3); 4] {
    let svd = mat3_to_faer(e).svd();
    let u = svd.u();
    let v = svd.v();
    let mut u = mat3_from_rows(&[
        [u.read(0, 0), u.read(0, 1), u.read(0, 2)],
        [u.read(1, 0), u.read(1, 1), u.read(1, 2)],
        [u.read(2, 0), u.read(2, 1), u.read(2, 2)],
    ]);
    let mut v = mat3_from_rows(&[
        [v.read(0, 0), v.read(0, 1), v.read(0, 2)],
        [v.read(1, 0), v.read(1, 1), v.read(1, 2)],
        [v.read(2, 0), v.read(2, 1), v.read(2, 2)],
    ]);

    if u.determinant() < 0.0 {
        u.z_axis = -u.z_axis;
    }
    if v.determinant() < 0.0 {
        v.z_axis = -v.z_axis;
    }

    let w = DMat3::from_cols(
        DVec3::new(0.0, 1.0, 0.0),
        DVec3::new(-1.0, 0.0, 0.0),
        DVec3::new(0.0, 0.0, 1.0),
    );

    let r1 = u * w * v.transpose();
    let r2 = u * w.transpose() * v.transpose();
    let t = u.z_axis.normalize_or_zero();

    [(r1, t), (r1, -t), (r2, t), (r2, -t)]
}
