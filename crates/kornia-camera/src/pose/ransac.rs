use glam::DMat3;
use rand::prelude::*;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::error::CameraError;
use crate::ops::median_in_place;
use crate::pose::fundamental::{
    check_correspondences, fundamental_7point, fundamental_8point, sampson_distance,
};

const SAMPLE_SIZE: usize = 8;

// lower bound of the LMedS inlier threshold in pixels
const LMEDS_MIN_THRESHOLD: f64 = 0.001;

/// Parameters for RANSAC model estimation.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RansacParams {
    /// Maximum number of RANSAC iterations.
    pub max_iterations: usize,
    /// Inlier threshold in pixels, compared against the square root of the Sampson distance.
    pub threshold: f64,
    /// Desired probability of drawing at least one outlier free sample.
    pub confidence: f64,
    /// Minimum number of inliers required for acceptance.
    pub min_inliers: usize,
    /// Optional RNG seed for deterministic runs.
    pub random_seed: Option<u64>,
}

impl Default for RansacParams {
    fn default() -> Self {
        Self {
            max_iterations: 2000,
            threshold: 3.0,
            confidence: 0.99,
            min_inliers: SAMPLE_SIZE,
            random_seed: Some(0),
        }
    }
}

/// Parameters for Least-Median-of-Squares estimation.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LmedsParams {
    /// Number of random minimal samples to evaluate.
    pub max_iterations: usize,
    /// Optional RNG seed for deterministic runs.
    pub random_seed: Option<u64>,
}

impl Default for LmedsParams {
    fn default() -> Self {
        Self {
            max_iterations: 1000,
            random_seed: Some(0),
        }
    }
}

/// The algorithm used by [`compute_fundamental`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum FundamentalMethod {
    /// 7-point algorithm, needs at least 7 correspondences.
    SevenPoint,
    /// Normalized 8-point algorithm, needs at least 8 correspondences.
    EightPoint,
    /// RANSAC around the 8-point solver.
    Ransac(RansacParams),
    /// Least-Median-of-Squares around the 8-point solver.
    Lmeds(LmedsParams),
}

impl Default for FundamentalMethod {
    fn default() -> Self {
        Self::Ransac(RansacParams::default())
    }
}

/// A fundamental matrix with the correspondences that support it.
#[derive(Clone, Debug, PartialEq)]
pub struct FundamentalEstimate {
    /// The fundamental matrix, `x2^T * F * x1 = 0`.
    pub fundamental: DMat3,
    /// Per-correspondence inlier mask.
    pub inliers: Vec<bool>,
}

impl FundamentalEstimate {
    /// Number of inlier correspondences.
    pub fn inlier_count(&self) -> usize {
        self.inliers.iter().filter(|&&inlier| inlier).count()
    }
}

/// Compute the fundamental matrix from corresponding points.
///
/// # Arguments
///
/// * `x1` - Points in the first image.
/// * `x2` - Corresponding points in the second image.
/// * `method` - The estimation algorithm.
///
/// # Returns
///
/// The fundamental matrix and the inlier mask. The direct solvers mark every
/// correspondence as inlier; the 7-point solver returns its first solution.
pub fn compute_fundamental(
    x1: &[[f64; 2]],
    x2: &[[f64; 2]],
    method: &FundamentalMethod,
) -> Result<FundamentalEstimate, CameraError> {
    match method {
        FundamentalMethod::SevenPoint => {
            let solutions = fundamental_7point(x1, x2)?;
            let fundamental = solutions.into_iter().next().ok_or_else(|| {
                CameraError::EstimationFailed("7-point solver found no solution".to_string())
            })?;
            Ok(FundamentalEstimate {
                fundamental,
                inliers: vec![true; x1.len()],
            })
        }
        FundamentalMethod::EightPoint => Ok(FundamentalEstimate {
            fundamental: fundamental_8point(x1, x2)?,
            inliers: vec![true; x1.len()],
        }),
        FundamentalMethod::Ransac(params) => ransac_fundamental(x1, x2, params),
        FundamentalMethod::Lmeds(params) => lmeds_fundamental(x1, x2, params),
    }
}

/// Estimate a fundamental matrix with RANSAC using the 8-point solver.
///
/// The iteration count shrinks as better models are found so that an outlier
/// free sample is drawn with probability `confidence`. The best model is refit
/// on all its inliers.
pub fn ransac_fundamental(
    x1: &[[f64; 2]],
    x2: &[[f64; 2]],
    params: &RansacParams,
) -> Result<FundamentalEstimate, CameraError> {
    check_correspondences(x1, x2, SAMPLE_SIZE)?;

    let mut rng = make_rng(params.random_seed);
    let n = x1.len();
    let threshold = params.threshold * params.threshold;

    let mut best_model = None;
    let mut best_inliers = Vec::new();
    let mut best_count = 0usize;
    let mut best_score = f64::INFINITY;
    let mut degenerate = 0usize;

    let mut max_iterations = params.max_iterations;
    let mut iteration = 0usize;
    while iteration < max_iterations {
        iteration += 1;

        let (s1, s2) = draw_sample(&mut rng, x1, x2);
        let f = match fundamental_8point(&s1, &s2) {
            Ok(f) => f,
            Err(_) => {
                degenerate += 1;
                continue;
            }
        };

        let (inliers, count, score) = classify(&f, x1, x2, threshold);
        if count > best_count || (count == best_count && score < best_score) {
            best_model = Some(f);
            best_inliers = inliers;
            best_count = count;
            best_score = score;

            max_iterations = max_iterations.min(adaptive_iterations(
                params.confidence,
                count as f64 / n as f64,
                params.max_iterations,
            ));
            log::debug!(
                "RANSAC iteration {iteration}: {count}/{n} inliers, bound {max_iterations}"
            );
        }
    }

    if degenerate > 0 {
        log::warn!("RANSAC discarded {degenerate} degenerate samples");
    }

    let model = match best_model {
        Some(m) if best_count >= params.min_inliers.max(SAMPLE_SIZE) => m,
        _ => {
            return Err(CameraError::EstimationFailed(format!(
                "RANSAC found {best_count} inliers, need {}",
                params.min_inliers.max(SAMPLE_SIZE)
            )))
        }
    };

    Ok(refit(model, best_inliers, x1, x2, threshold))
}

/// Estimate a fundamental matrix with Least-Median-of-Squares using the 8-point solver.
///
/// The model minimizing the median Sampson distance wins. Inliers are the
/// correspondences within `2.5 * sigma` of the robust standard deviation
/// `sigma = 1.4826 * (1 + 5 / (n - 7)) * sqrt(median)`.
pub fn lmeds_fundamental(
    x1: &[[f64; 2]],
    x2: &[[f64; 2]],
    params: &LmedsParams,
) -> Result<FundamentalEstimate, CameraError> {
    check_correspondences(x1, x2, SAMPLE_SIZE)?;

    let mut rng = make_rng(params.random_seed);
    let n = x1.len();

    let mut best_model = None;
    let mut best_median = f64::INFINITY;
    let mut degenerate = 0usize;

    for iteration in 0..params.max_iterations {
        let (s1, s2) = draw_sample(&mut rng, x1, x2);
        let f = match fundamental_8point(&s1, &s2) {
            Ok(f) => f,
            Err(_) => {
                degenerate += 1;
                continue;
            }
        };

        let mut residuals: Vec<f64> = x1
            .iter()
            .zip(x2.iter())
            .map(|(a, b)| sampson_distance(&f, a, b))
            .collect();
        let median = median_in_place(&mut residuals);

        if median < best_median {
            best_median = median;
            best_model = Some(f);
            log::debug!("LMedS iteration {iteration}: median residual {median:.3e}");
        }
    }

    if degenerate > 0 {
        log::warn!("LMedS discarded {degenerate} degenerate samples");
    }

    let model = match best_model {
        Some(m) if best_median.is_finite() => m,
        _ => {
            return Err(CameraError::EstimationFailed(
                "LMedS found no valid model".to_string(),
            ))
        }
    };

    let sigma = 1.4826 * (1.0 + 5.0 / (n - 7) as f64) * best_median.sqrt();
    let threshold = (2.5 * sigma).max(LMEDS_MIN_THRESHOLD).powi(2);

    let (inliers, count, _) = classify(&model, x1, x2, threshold);
    if count < SAMPLE_SIZE {
        return Err(CameraError::EstimationFailed(format!(
            "LMedS found {count} inliers, need {SAMPLE_SIZE}"
        )));
    }

    Ok(refit(model, inliers, x1, x2, threshold))
}

/// Number of iterations needed to draw an outlier free sample with `confidence`.
fn adaptive_iterations(confidence: f64, inlier_ratio: f64, max_iterations: usize) -> usize {
    let p_good = inlier_ratio.powi(SAMPLE_SIZE as i32);
    if p_good >= 1.0 {
        return 1;
    }
    let denom = (1.0 - p_good).ln();
    let num = (1.0 - confidence.clamp(0.0, 1.0 - f64::EPSILON)).ln();
    if denom >= 0.0 || !denom.is_finite() {
        return max_iterations;
    }
    let k = (num / denom).ceil();
    if k.is_finite() && k < max_iterations as f64 {
        (k as usize).max(1)
    } else {
        max_iterations
    }
}

fn make_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => {
            let mut tr = rand::rng();
            StdRng::from_rng(&mut tr)
        }
    }
}

fn draw_sample(
    rng: &mut StdRng,
    x1: &[[f64; 2]],
    x2: &[[f64; 2]],
) -> (Vec<[f64; 2]>, Vec<[f64; 2]>) {
    let sample = rand::seq::index::sample(rng, x1.len(), SAMPLE_SIZE);
    let mut s1 = Vec::with_capacity(SAMPLE_SIZE);
    let mut s2 = Vec::with_capacity(SAMPLE_SIZE);
    for idx in sample.iter() {
        s1.push(x1[idx]);
        s2.push(x2[idx]);
    }
    (s1, s2)
}

fn classify(
    f: &DMat3,
    x1: &[[f64; 2]],
    x2: &[[f64; 2]],
    threshold: f64,
) -> (Vec<bool>, usize, f64) {
    let mut inliers = vec![false; x1.len()];
    let mut count = 0usize;
    let mut score = 0.0f64;
    for (i, (a, b)) in x1.iter().zip(x2.iter()).enumerate() {
        let d = sampson_distance(f, a, b);
        if d <= threshold {
            inliers[i] = true;
            count += 1;
            score += d;
        }
    }
    (inliers, count, score)
}

// re-estimate on all inliers, kept only if it does not lose support
fn refit(
    model: DMat3,
    inliers: Vec<bool>,
    x1: &[[f64; 2]],
    x2: &[[f64; 2]],
    threshold: f64,
) -> FundamentalEstimate {
    let count = inliers.iter().filter(|&&inlier| inlier).count();
    let (s1, s2): (Vec<[f64; 2]>, Vec<[f64; 2]>) = x1
        .iter()
        .zip(x2.iter())
        .zip(inliers.iter())
        .filter(|(_, inlier)| **inlier)
        .map(|((a, b), _)| (*a, *b))
        .unzip();

    if let Ok(refined) = fundamental_8point(&s1, &s2) {
        let (refined_inliers, refined_count, _) = classify(&refined, x1, x2, threshold);
        if refined_count >= count {
            log::debug!("refit on {count} inliers, {refined_count} inliers after refit");
            return FundamentalEstimate {
                fundamental: refined,
                inliers: refined_inliers,
            };
        }
    }

    FundamentalEstimate {
        fundamental: model,
        inliers,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pose::test_utils::{same_up_to_scale, synthetic_scene};

    // replace the correspondences at every `stride`-th index with random pixels
    fn add_outliers(x2: &mut [[f64; 2]], stride: usize, seed: u64) -> Vec<bool> {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut truth = vec![true; x2.len()];
        for (i, p) in x2.iter_mut().enumerate() {
            if i % stride == 0 {
                *p = [rng.random_range(0.0..640.0), rng.random_range(0.0..480.0)];
                truth[i] = false;
            }
        }
        truth
    }

    #[test]
    fn test_ransac_fundamental_with_outliers() -> Result<(), CameraError> {
        let mut scene = synthetic_scene(100, 5);
        let truth = add_outliers(&mut scene.x2, 4, 99);

        let estimate = compute_fundamental(
            &scene.x1,
            &scene.x2,
            &FundamentalMethod::Ransac(RansacParams::default()),
        )?;

        assert_eq!(estimate.inliers.len(), 100);
        // every true inlier is kept
        for (found, expected) in estimate.inliers.iter().zip(truth.iter()) {
            if *expected {
                assert!(*found);
            }
        }
        // random pixels rarely fall within 3 pixels of their epipolar line
        let false_positives = estimate
            .inliers
            .iter()
            .zip(truth.iter())
            .filter(|(found, expected)| **found && !**expected)
            .count();
        assert!(false_positives <= 5);

        let max_inlier_error = scene
            .x1
            .iter()
            .zip(scene.x2.iter())
            .zip(truth.iter())
            .filter(|(_, expected)| **expected)
            .map(|((a, b), _)| sampson_distance(&estimate.fundamental, a, b))
            .fold(0.0, f64::max);
        assert!(max_inlier_error < 1.0);
        Ok(())
    }

    #[test]
    fn test_lmeds_fundamental_with_outliers() -> Result<(), CameraError> {
        let mut scene = synthetic_scene(60, 21);
        let truth = add_outliers(&mut scene.x2, 5, 7);

        let estimate = compute_fundamental(
            &scene.x1,
            &scene.x2,
            &FundamentalMethod::Lmeds(LmedsParams::default()),
        )?;

        for (found, expected) in estimate.inliers.iter().zip(truth.iter()) {
            if *expected {
                assert!(*found);
            }
        }
        assert!(estimate.inlier_count() >= 48);
        assert!(same_up_to_scale(&estimate.fundamental, &scene.fundamental, 1e-3));
        Ok(())
    }

    #[test]
    fn test_direct_methods_mark_all_inliers() -> Result<(), CameraError> {
        let scene = synthetic_scene(7, 2);
        let seven = compute_fundamental(&scene.x1, &scene.x2, &FundamentalMethod::SevenPoint)?;
        assert_eq!(seven.inliers, vec![true; 7]);

        let scene = synthetic_scene(16, 2);
        let eight = compute_fundamental(&scene.x1, &scene.x2, &FundamentalMethod::EightPoint)?;
        assert_eq!(eight.inlier_count(), 16);
        assert!(same_up_to_scale(&eight.fundamental, &scene.fundamental, 1e-6));
        Ok(())
    }

    #[test]
    fn test_compute_fundamental_invalid_input() {
        let x1 = vec![[0.0, 0.0]; 10];
        let x2 = vec![[0.0, 0.0]; 9];
        assert_eq!(
            compute_fundamental(&x1, &x2, &FundamentalMethod::default()),
            Err(CameraError::LengthMismatch(10, 9))
        );
        assert_eq!(
            compute_fundamental(&x1[..7], &x1[..7], &FundamentalMethod::default()),
            Err(CameraError::NotEnoughPoints {
                required: 8,
                actual: 7
            })
        );
        assert_eq!(
            compute_fundamental(&x1[..6], &x1[..6], &FundamentalMethod::SevenPoint),
            Err(CameraError::NotEnoughPoints {
                required: 7,
                actual: 6
            })
        );
    }

    #[test]
    fn test_ransac_degenerate_input_fails() {
        // all points coincide, every sample is degenerate
        let x = vec![[10.0, 10.0]; 20];
        let result = ransac_fundamental(&x, &x, &RansacParams::default());
        assert!(matches!(result, Err(CameraError::EstimationFailed(_))));
    }

    #[test]
    fn test_adaptive_iterations() {
        assert_eq!(adaptive_iterations(0.99, 1.0, 2000), 1);
        assert_eq!(adaptive_iterations(0.99, 0.0, 2000), 2000);
        // 0.5^8 = 1/256 -> ln(0.01) / ln(255/256) = 1177
        assert_eq!(adaptive_iterations(0.99, 0.5, 2000), 1177);
        assert_eq!(adaptive_iterations(0.99, 0.5, 500), 500);
    }
}
