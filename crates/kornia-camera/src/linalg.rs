use glam::DMat3;

/// Relative tolerance below which a Givens rotation is skipped.
const GIVENS_EPS: f64 = 1e-15;

/// Build a 3x3 matrix from row-major data.
///
/// Example:
///
/// ```
/// use kornia_camera::linalg::mat3_from_rows;
///
/// let m = mat3_from_rows(&[[1.0, 2.0, 3.0], [4.0, 5.0, 6.0], [7.0, 8.0, 9.0]]);
/// assert_eq!(m.col(2).x, 3.0);
/// ```
pub fn mat3_from_rows(rows: &[[f64; 3]; 3]) -> DMat3 {
    // glam is column-major: reading rows as columns and transposing gives the rows back
    DMat3::from_cols_array_2d(rows).transpose()
}

/// Return the row-major data of a 3x3 matrix.
pub fn mat3_to_rows(m: &DMat3) -> [[f64; 3]; 3] {
    m.transpose().to_cols_array_2d()
}

/// The Frobenius norm of a 3x3 matrix.
pub fn frobenius_norm(m: &DMat3) -> f64 {
    m.to_cols_array().iter().map(|v| v * v).sum::<f64>().sqrt()
}

pub(crate) fn mat3_to_faer(m: &DMat3) -> faer::Mat<f64> {
    let rows = mat3_to_rows(m);
    faer::Mat::<f64>::from_fn(3, 3, |i, j| rows[i][j])
}

/// Return the right singular vector of `a` with the smallest singular value.
///
/// For a rank deficient matrix this is a vector of its right null space,
/// i.e. `a * x ~ 0`. Wide matrices are padded with zero rows so that the
/// decomposition always yields a full `V`.
pub fn right_null_vector(a: &faer::Mat<f64>) -> Vec<f64> {
    let ncols = a.ncols();
    let padded;
    let a = if a.nrows() < ncols {
        padded = faer::Mat::<f64>::from_fn(ncols, ncols, |i, j| {
            if i < a.nrows() {
                a.read(i, j)
            } else {
                0.0
            }
        });
        &padded
    } else {
        a
    };

    let svd = a.svd();
    let v = svd.v();
    (0..ncols).map(|i| v.read(i, ncols - 1)).collect()
}

/// Return the two right singular vectors of `a` with the smallest singular values.
///
/// The last vector of the pair belongs to the smallest singular value.
pub(crate) fn right_null_space_2d(a: &faer::Mat<f64>) -> (Vec<f64>, Vec<f64>) {
    let ncols = a.ncols();
    let nrows = a.nrows().max(ncols);
    let padded = faer::Mat::<f64>::from_fn(nrows, ncols, |i, j| {
        if i < a.nrows() {
            a.read(i, j)
        } else {
            0.0
        }
    });

    let svd = padded.svd();
    let v = svd.v();
    let first = (0..ncols).map(|i| v.read(i, ncols - 2)).collect();
    let second = (0..ncols).map(|i| v.read(i, ncols - 1)).collect();
    (first, second)
}

/// Enforce a rank-2 matrix by zeroing its smallest singular value.
pub fn enforce_rank2(m: &DMat3) -> DMat3 {
    let svd = mat3_to_faer(m).svd();
    let u = svd.u();
    let s = svd.s_diagonal();
    let v = svd.v();

    let mut rows = [[0.0; 3]; 3];
    for (i, row) in rows.iter_mut().enumerate() {
        for (j, val) in row.iter_mut().enumerate() {
            *val = (0..2).map(|k| u.read(i, k) * s.read(k) * v.read(j, k)).sum();
        }
    }
    mat3_from_rows(&rows)
}

/// RQ decomposition of a 3x3 matrix.
///
/// Returns `(K, Q)` with `K` upper triangular with a non-negative diagonal
/// and `Q` orthogonal such that `m = K * Q`. The decomposition is computed
/// with three Givens rotations.
///
/// Example:
///
/// ```
/// use glam::DMat3;
/// use kornia_camera::linalg::rq_decomposition;
///
/// let (k, q) = rq_decomposition(&DMat3::IDENTITY);
/// assert!(k.abs_diff_eq(DMat3::IDENTITY, 1e-12));
/// assert!(q.abs_diff_eq(DMat3::IDENTITY, 1e-12));
/// ```
pub fn rq_decomposition(m: &DMat3) -> (DMat3, DMat3) {
    let mut k = mat3_to_rows(m);
    let mut g = mat3_to_rows(&DMat3::IDENTITY);
    let tol = GIVENS_EPS * frobenius_norm(m);

    // zero (2,1), then (2,0), then (1,0); each rotation acts on columns (i, j)
    for &(row, i, j) in &[(2, 1, 2), (2, 0, 2), (1, 0, 1)] {
        let (a, b) = (k[row][i], k[row][j]);
        let norm = a.hypot(b);
        if norm <= tol {
            continue;
        }
        let (c, s) = (b / norm, -a / norm);
        rotate_columns(&mut k, i, j, c, s);
        rotate_columns(&mut g, i, j, c, s);
    }

    // m * G = K  =>  m = K * G^T
    let mut q = mat3_to_rows(&mat3_from_rows(&g).transpose());

    for i in 0..3 {
        if k[i][i] < 0.0 {
            for row in k.iter_mut() {
                row[i] = -row[i];
            }
            for val in q[i].iter_mut() {
                *val = -*val;
            }
        }
    }

    (mat3_from_rows(&k), mat3_from_rows(&q))
}

fn rotate_columns(m: &mut [[f64; 3]; 3], i: usize, j: usize, c: f64, s: f64) {
    for row in m.iter_mut() {
        let (mi, mj) = (row[i], row[j]);
        row[i] = mi * c + mj * s;
        row[j] = -mi * s + mj * c;
    }
}

/// Real roots of `a x^3 + b x^2 + c x + d = 0`.
pub(crate) fn solve_cubic_real(a: f64, b: f64, c: f64, d: f64) -> Vec<f64> {
    if a.abs() < 1e-12 {
        return solve_quadratic_real(b, c, d);
    }

    let (b, c, d) = (b / a, c / a, d / a);

    // depressed cubic t^3 + p t + q = 0 with x = t - b / 3
    let p = c - b * b / 3.0;
    let q = 2.0 * b.powi(3) / 27.0 - b * c / 3.0 + d;
    let shift = -b / 3.0;

    if p.abs() < 1e-14 {
        return vec![(-q).cbrt() + shift];
    }

    let disc = q * q / 4.0 + p.powi(3) / 27.0;
    if disc > 0.0 {
        let sq = disc.sqrt();
        let u = (-q / 2.0 + sq).cbrt();
        let v = (-q / 2.0 - sq).cbrt();
        return vec![u + v + shift];
    }

    let r = (-p / 3.0).sqrt();
    let phi = (-q / (2.0 * r.powi(3))).clamp(-1.0, 1.0).acos();
    (0..3)
        .map(|k| 2.0 * r * ((phi + 2.0 * std::f64::consts::PI * k as f64) / 3.0).cos() + shift)
        .collect()
}

fn solve_quadratic_real(a: f64, b: f64, c: f64) -> Vec<f64> {
    if a.abs() < 1e-12 {
        if b.abs() < 1e-12 {
            return Vec::new();
        }
        return vec![-c / b];
    }
    let disc = b * b - 4.0 * a * c;
    if disc < 0.0 {
        return Vec::new();
    }
    let sq = disc.sqrt();
    vec![(-b + sq) / (2.0 * a), (-b - sq) / (2.0 * a)]
}
