use glam::{DMat3, DVec3};

use crate::error::CameraError;
use crate::linalg::{enforce_rank2, mat3_from_rows, right_null_space_2d, right_null_vector, solve_cubic_real};

const SCALE_EPS: f64 = 1e-12;

/// Estimate the fundamental matrix using the normalized 8-point algorithm.
///
/// - `x1`: points in image 1 as `&[[f64; 2]]` (length >= 8)
/// - `x2`: corresponding points in image 2 as `&[[f64; 2]]` (same length)
///
/// The result satisfies `x2^T * F * x1 = 0`, has rank 2 and is scaled so that
/// `F[2,2] = 1` when that entry is not zero (unit Frobenius norm otherwise).
pub fn fundamental_8point(x1: &[[f64; 2]], x2: &[[f64; 2]]) -> Result<DMat3, CameraError> {
    check_correspondences(x1, x2, 8)?;

    // normalize points with similarity transforms T1, T2 to have zero mean and avg sqrt(2) distance
    let (x1n, t1) = normalize_points_2d(x1)?;
    let (x2n, t2) = normalize_points_2d(x2)?;

    // solve A f = 0 via SVD: take the last column of V
    let fvec = right_null_vector(&design_matrix(&x1n, &x2n));
    let f = mat3_from_rows(&[
        [fvec[0], fvec[1], fvec[2]],
        [fvec[3], fvec[4], fvec[5]],
        [fvec[6], fvec[7], fvec[8]],
    ]);

    // denormalize: F = T2^T * F * T1
    let f = t2.transpose() * enforce_rank2(&f) * t1;
    normalize_scale(&f)
}

/// Estimate the fundamental matrix using the 7-point algorithm.
///
/// Seven correspondences leave a two dimensional family `a * F1 + (1 - a) * F2`
/// of solutions; the rank-2 constraint `det(F) = 0` is a cubic in `a`. Every
/// real root yields one candidate, so up to three matrices are returned.
/// With more than seven points the family is fitted in the least squares sense.
pub fn fundamental_7point(x1: &[[f64; 2]], x2: &[[f64; 2]]) -> Result<Vec<DMat3>, CameraError> {
    check_correspondences(x1, x2, 7)?;

    let (x1n, t1) = normalize_points_2d(x1)?;
    let (x2n, t2) = normalize_points_2d(x2)?;

    let (f1, f2) = right_null_space_2d(&design_matrix(&x1n, &x2n));
    let f1 = mat3_from_rows(&[[f1[0], f1[1], f1[2]], [f1[3], f1[4], f1[5]], [f1[6], f1[7], f1[8]]]);
    let f2 = mat3_from_rows(&[[f2[0], f2[1], f2[2]], [f2[3], f2[4], f2[5]], [f2[6], f2[7], f2[8]]]);

    // det(a * F1 + (1 - a) * F2) sampled at a = 0, 1, -1, 2 gives the cubic coefficients
    let det_at = |a: f64| (f1 * a + f2 * (1.0 - a)).determinant();
    let (d0, d1, dm1, d2) = (det_at(0.0), det_at(1.0), det_at(-1.0), det_at(2.0));
    let c0 = d0;
    let c2 = (d1 + dm1) / 2.0 - c0;
    let odd = (d1 - dm1) / 2.0;
    let c3 = (d2 - 4.0 * c2 - c0 - 2.0 * odd) / 6.0;
    let c1 = odd - c3;

    let roots = solve_cubic_real(c3, c2, c1, c0);
    log::debug!("7-point solver found {} real roots", roots.len());

    let mut solutions = Vec::with_capacity(roots.len());
    for a in roots {
        let f = t2.transpose() * (f1 * a + f2 * (1.0 - a)) * t1;
        match normalize_scale(&f) {
            Ok(f) => solutions.push(f),
            Err(_) => continue,
        }
    }

    if solutions.is_empty() {
        return Err(CameraError::Degenerate(
            "7-point solver found no real solution".to_string(),
        ));
    }

    Ok(solutions)
}

/// Sampson distance of a correspondence to the epipolar geometry `F`.
///
/// This is the first-order approximation of the squared reprojection error,
/// in squared pixels.
pub fn sampson_distance(f: &DMat3, x1: &[f64; 2], x2: &[f64; 2]) -> f64 {
    let x1h = DVec3::new(x1[0], x1[1], 1.0);
    let x2h = DVec3::new(x2[0], x2[1], 1.0);
    let fx1 = *f * x1h;
    let ftx2 = f.transpose() * x2h;
    let x2tfx1 = x2h.dot(fx1);
    let denom = fx1.x * fx1.x + fx1.y * fx1.y + ftx2.x * ftx2.x + ftx2.y * ftx2.y;
    if denom <= 0.0 {
        return f64::INFINITY;
    }
    x2tfx1 * x2tfx1 / denom
}

/// Normalize 2D points to zero mean and an average distance of `sqrt(2)` to the origin.
///
/// Returns the normalized points and the similarity transform `T` that maps
/// the input points onto them.
pub fn normalize_points_2d(x: &[[f64; 2]]) -> Result<(Vec<[f64; 2]>, DMat3), CameraError> {
    let n = x.len() as f64;
    let (mut mx, mut my) = (0.0, 0.0);
    for p in x {
        mx += p[0];
        my += p[1];
    }
    mx /= n;
    my /= n;

    let mut mean_dist = 0.0;
    for p in x {
        mean_dist += (p[0] - mx).hypot(p[1] - my);
    }
    mean_dist /= n;
    if !mean_dist.is_finite() || mean_dist < SCALE_EPS {
        return Err(CameraError::Degenerate(
            "points are coincident or not finite".to_string(),
        ));
    }
    let scale = std::f64::consts::SQRT_2 / mean_dist;

    let xn = x
        .iter()
        .map(|p| [(p[0] - mx) * scale, (p[1] - my) * scale])
        .collect();

    // similarity transform T = [[s,0,-s*mx],[0,s,-s*my],[0,0,1]]
    let t = mat3_from_rows(&[
        [scale, 0.0, -scale * mx],
        [0.0, scale, -scale * my],
        [0.0, 0.0, 1.0],
    ]);
    Ok((xn, t))
}

pub(crate) fn check_correspondences(
    x1: &[[f64; 2]],
    x2: &[[f64; 2]],
    required: usize,
) -> Result<(), CameraError> {
    if x1.len() != x2.len() {
        return Err(CameraError::LengthMismatch(x1.len(), x2.len()));
    }
    if x1.len() < required {
        return Err(CameraError::NotEnoughPoints {
            required,
            actual: x1.len(),
        });
    }
    Ok(())
}

// one row per correspondence for x2^T * F * x1 = 0
fn design_matrix(x1: &[[f64; 2]], x2: &[[f64; 2]]) -> faer::Mat<f64> {
    faer::Mat::<f64>::from_fn(x1.len(), 9, |i, j| {
        let (x, y) = (x1[i][0], x1[i][1]);
        let (xp, yp) = (x2[i][0], x2[i][1]);
        match j {
            0 => xp * x,
            1 => xp * y,
            2 => xp,
            3 => yp * x,
            4 => yp * y,
            5 => yp,
            6 => x,
            7 => y,
            _ => 1.0,
        }
    })
}

fn normalize_scale(f: &DMat3) -> Result<DMat3, CameraError> {
    if !f.is_finite() {
        return Err(CameraError::Degenerate(
            "fundamental matrix has non finite entries".to_string(),
        ));
    }
    let f22 = f.z_axis.z;
    if f22.abs() > SCALE_EPS {
        return Ok(*f * (1.0 / f22));
    }
    let norm = f.to_cols_array().iter().map(|v| v * v).sum::<f64>().sqrt();
    if norm < SCALE_EPS {
        return Err(CameraError::Degenerate(
            "fundamental matrix is zero".to_string(),
        ));
    }
    Ok(*f * (1.0 / norm))
}
